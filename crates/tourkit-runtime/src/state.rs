#![forbid(unsafe_code)]

//! The tour state machine, free of effects.
//!
//! [`TourRunState`] owns the steps and the current index and answers every
//! navigation request with a [`Transition`]. The engine applies transitions
//! (spawning step work, publishing, firing callbacks); the state machine
//! itself never awaits or calls out.
//!
//! # Invariants
//!
//! 1. While active, `current_step_index < steps.len()`.
//! 2. While idle, `steps` is empty, `tour_id` is `None`, and the index is 0.
//! 3. Every transition to a step clears `highlight_rect` and `is_positioned`.

use tourkit_core::{Placement, Point, Rect, StepView, TourStep, TourView};

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// The tour is now on this step.
    Step(usize),
    /// The tour ended; carries the id it was started with.
    Ended(Option<String>),
}

/// Live state of one tour run.
pub struct TourRunState<H> {
    is_active: bool,
    current_step_index: usize,
    steps: Vec<TourStep<H>>,
    tour_id: Option<String>,
    /// Last measured bounds of the current target.
    pub highlight_rect: Option<Rect>,
    /// Last computed tooltip corner.
    pub tooltip_position: Point,
    /// Whether `tooltip_position` belongs to the current step.
    pub is_positioned: bool,
}

impl<H> TourRunState<H> {
    /// Idle state.
    pub fn new() -> Self {
        Self {
            is_active: false,
            current_step_index: 0,
            steps: Vec::new(),
            tour_id: None,
            highlight_rect: None,
            tooltip_position: Point::ORIGIN,
            is_positioned: false,
        }
    }

    /// Whether a tour is running.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Index of the current step (0 while idle).
    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// Steps of the running tour.
    pub fn steps(&self) -> &[TourStep<H>] {
        &self.steps
    }

    /// Id the running tour was started with.
    pub fn tour_id(&self) -> Option<&str> {
        self.tour_id.as_deref()
    }

    /// The current step, while active.
    pub fn current_step(&self) -> Option<&TourStep<H>> {
        if self.is_active {
            self.steps.get(self.current_step_index)
        } else {
            None
        }
    }

    /// Begin a run. Empty step lists are ignored.
    ///
    /// Starting while active replaces the running tour.
    pub fn start(&mut self, steps: Vec<TourStep<H>>, tour_id: Option<String>) -> Transition {
        if steps.is_empty() {
            return Transition::Unchanged;
        }
        self.is_active = true;
        self.steps = steps;
        self.tour_id = tour_id;
        self.enter(0)
    }

    /// Advance, or end the tour from the last step.
    pub fn next(&mut self) -> Transition {
        if !self.is_active {
            return Transition::Unchanged;
        }
        if self.current_step_index + 1 < self.steps.len() {
            self.enter(self.current_step_index + 1)
        } else {
            self.end()
        }
    }

    /// Go back one step; no-op on the first step.
    pub fn prev(&mut self) -> Transition {
        if !self.is_active || self.current_step_index == 0 {
            return Transition::Unchanged;
        }
        self.enter(self.current_step_index - 1)
    }

    /// Jump to `index`; out-of-range and same-index requests are ignored.
    pub fn go_to(&mut self, index: usize) -> Transition {
        if !self.is_active || index >= self.steps.len() || index == self.current_step_index {
            return Transition::Unchanged;
        }
        self.enter(index)
    }

    /// Return to idle, handing back the tour id.
    pub fn end(&mut self) -> Transition {
        if !self.is_active {
            return Transition::Unchanged;
        }
        let tour_id = self.tour_id.take();
        *self = Self::new();
        Transition::Ended(tour_id)
    }

    /// Record a fresh measurement for the current step, not yet positioned.
    pub fn set_highlight(&mut self, rect: Rect) {
        self.highlight_rect = Some(rect);
        self.is_positioned = false;
    }

    /// Record a successful positioning.
    pub fn set_positioned(&mut self, rect: Rect, position: Point) {
        self.highlight_rect = Some(rect);
        self.tooltip_position = position;
        self.is_positioned = true;
    }

    /// Forget the tooltip position after a pass gave up. Returns whether the
    /// step was positioned before.
    pub fn clear_position(&mut self) -> bool {
        std::mem::replace(&mut self.is_positioned, false)
    }

    /// Presentation snapshot.
    pub fn view(&self, default_placement: Placement) -> TourView {
        TourView {
            is_active: self.is_active,
            current_step_index: self.current_step_index,
            total_steps: self.steps.len(),
            current_step: self.current_step().map(|step| StepView {
                title: step.title.clone(),
                content: step.content.clone(),
                placement: step.placement_or(default_placement),
            }),
            highlight_rect: self.highlight_rect,
            tooltip_position: self.tooltip_position,
            is_positioned: self.is_positioned,
        }
    }

    fn enter(&mut self, index: usize) -> Transition {
        self.current_step_index = index;
        self.highlight_rect = None;
        self.is_positioned = false;
        Transition::Step(index)
    }
}

impl<H> Default for TourRunState<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for TourRunState<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourRunState")
            .field("is_active", &self.is_active)
            .field("current_step_index", &self.current_step_index)
            .field("steps", &self.steps.len())
            .field("tour_id", &self.tour_id)
            .field("highlight_rect", &self.highlight_rect)
            .field("tooltip_position", &self.tooltip_position)
            .field("is_positioned", &self.is_positioned)
            .finish()
    }
}
