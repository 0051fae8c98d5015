#![forbid(unsafe_code)]

//! Snapshot of tour state handed to presentation layers.

use crate::geometry::{Point, Rect};
use crate::placement::Placement;

/// Presentation-facing copy of the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    /// Tooltip title.
    pub title: String,
    /// Tooltip body.
    pub content: String,
    /// Resolved placement (step preference or orchestrator default).
    pub placement: Placement,
}

/// Everything an overlay and tooltip need to render one frame.
///
/// Owned and detached from the orchestrator: renderers may keep it around,
/// but mutating it has no effect on the tour.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TourView {
    /// Whether a tour is running.
    pub is_active: bool,
    /// Zero-based index of the current step.
    pub current_step_index: usize,
    /// Number of steps in the running tour.
    pub total_steps: usize,
    /// The current step, while active.
    pub current_step: Option<StepView>,
    /// Target bounds to cut out of the overlay.
    pub highlight_rect: Option<Rect>,
    /// Tooltip top-left corner.
    pub tooltip_position: Point,
    /// Whether `tooltip_position` reflects a measurement of the current step.
    pub is_positioned: bool,
}

impl TourView {
    /// The view published while no tour runs.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether the overlay should be shown.
    pub fn shows_overlay(&self) -> bool {
        self.is_active && self.highlight_rect.is_some()
    }

    /// Whether the tooltip should be visible.
    ///
    /// Renderers should keep the tooltip laid out but hidden until this is
    /// true, so that it can be measured without flashing at a stale position.
    pub fn shows_tooltip(&self) -> bool {
        self.shows_overlay() && self.is_positioned && self.current_step.is_some()
    }

    /// Whether the current step is the first.
    pub fn is_first_step(&self) -> bool {
        self.current_step_index == 0
    }

    /// Whether the current step is the last (a "Finish" button replaces "Next").
    pub fn is_last_step(&self) -> bool {
        self.total_steps > 0 && self.current_step_index + 1 == self.total_steps
    }
}
