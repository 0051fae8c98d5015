#![forbid(unsafe_code)]

//! Tooltip placement relative to a highlighted target.
//!
//! [`compute_position`] is a pure function: given the target rectangle, the
//! preferred [`Placement`], the tooltip's measured size, and the viewport
//! size, it returns the tooltip's top-left corner.
//!
//! # Invariants
//!
//! 1. The tooltip is offset `padding` from the target edge on the requested
//!    side, centered on the target's cross axis.
//! 2. Horizontally the tooltip is clamped into `[padding, viewport - padding]`.
//! 3. Vertically, visibility wins over the requested side: a tooltip that
//!    would start above the top margin flips below the target, and one that
//!    would overflow the bottom margin flips above it.
//! 4. No occlusion detection; only viewport bounds are considered.
//!
//! # Example
//!
//! ```
//! use tourkit_core::{compute_position, GeometryConfig, Placement, Point, Rect, Size};
//!
//! let target = Rect::new(100.0, 0.0, 200.0, 40.0);
//! let pos = compute_position(
//!     target,
//!     Placement::Top,
//!     Size::new(300.0, 100.0),
//!     Size::new(1280.0, 800.0),
//!     &GeometryConfig::default(),
//! );
//! // No room above a target at the viewport top: flipped below.
//! assert_eq!(pos, Point::new(56.0, 50.0));
//! ```

use crate::geometry::{Point, Rect, Size};

/// Preferred side of the target on which the tooltip appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Placement {
    /// Above the target, horizontally centered.
    Top,
    /// Below the target, horizontally centered.
    #[default]
    Bottom,
    /// Left of the target, vertically centered.
    Left,
    /// Right of the target, vertically centered.
    Right,
}

impl Placement {
    /// All placements, in declaration order.
    pub const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// Lowercase name, as used in configuration files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Tunables for the placement solver.
///
/// Defaults match a 400px desktop card that narrows to 320px below a 640px
/// viewport.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryConfig {
    /// Gap between tooltip and target, and minimum margin to viewport edges.
    pub padding: f64,
    /// Fallback tooltip width on wide viewports.
    pub desktop_width: f64,
    /// Fallback tooltip width on narrow viewports.
    pub mobile_width: f64,
    /// Viewports narrower than this use `mobile_width`.
    pub mobile_breakpoint: f64,
    /// Fallback tooltip height.
    pub default_height: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            padding: 16.0,
            desktop_width: 400.0,
            mobile_width: 320.0,
            mobile_breakpoint: 640.0,
            default_height: 200.0,
        }
    }
}

impl GeometryConfig {
    /// Set the padding.
    #[must_use]
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set the desktop fallback width.
    #[must_use]
    pub fn desktop_width(mut self, width: f64) -> Self {
        self.desktop_width = width;
        self
    }

    /// Set the mobile fallback width.
    #[must_use]
    pub fn mobile_width(mut self, width: f64) -> Self {
        self.mobile_width = width;
        self
    }

    /// Set the mobile breakpoint.
    #[must_use]
    pub fn mobile_breakpoint(mut self, breakpoint: f64) -> Self {
        self.mobile_breakpoint = breakpoint;
        self
    }

    /// Set the fallback height.
    #[must_use]
    pub fn default_height(mut self, height: f64) -> Self {
        self.default_height = height;
        self
    }

    /// Effective tooltip size: measured dimensions where positive, responsive
    /// fallbacks otherwise.
    pub fn resolve_tooltip_size(&self, measured: Size, viewport: Size) -> Size {
        let fallback_width = if viewport.width < self.mobile_breakpoint {
            self.mobile_width
                .min(viewport.width - self.padding * 2.0)
        } else {
            self.desktop_width
        };
        let width = if measured.width > 0.0 {
            measured.width
        } else {
            fallback_width
        };
        let height = if measured.height > 0.0 {
            measured.height
        } else {
            self.default_height
        };
        Size::new(width, height)
    }
}

/// Compute the tooltip's top-left corner for `target`.
///
/// See the module docs for the decision rule. Always returns a finite pair
/// for finite inputs.
pub fn compute_position(
    target: Rect,
    placement: Placement,
    tooltip: Size,
    viewport: Size,
    config: &GeometryConfig,
) -> Point {
    let size = config.resolve_tooltip_size(tooltip, viewport);
    let pad = config.padding;

    let (mut top, mut left) = match placement {
        Placement::Top => (
            target.top - size.height - pad,
            target.center_x() - size.width / 2.0,
        ),
        Placement::Bottom => (target.bottom() + pad, target.center_x() - size.width / 2.0),
        Placement::Left => (
            target.center_y() - size.height / 2.0,
            target.left - size.width - pad,
        ),
        Placement::Right => (target.center_y() - size.height / 2.0, target.right() + pad),
    };

    // Horizontal clamp; the right edge wins when the tooltip is wider than
    // the viewport.
    if left < pad {
        left = pad;
    }
    if left + size.width > viewport.width - pad {
        left = viewport.width - size.width - pad;
    }

    // Vertical fallback flips to the opposite side of the target.
    if top < pad {
        top = target.bottom() + pad;
    }
    if top + size.height > viewport.height - pad {
        top = target.top - size.height - pad;
    }

    Point::new(top, left)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1280.0, 800.0);
    const TOOLTIP: Size = Size::new(300.0, 100.0);

    fn place(target: Rect, placement: Placement) -> Point {
        compute_position(target, placement, TOOLTIP, VIEWPORT, &GeometryConfig::default())
    }

    #[test]
    fn bottom_centers_below_target() {
        let target = Rect::new(400.0, 200.0, 100.0, 50.0);
        let pos = place(target, Placement::Bottom);
        assert_eq!(pos, Point::new(266.0, 300.0));
    }

    #[test]
    fn top_centers_above_target() {
        let target = Rect::new(400.0, 300.0, 100.0, 50.0);
        let pos = place(target, Placement::Top);
        assert_eq!(pos, Point::new(184.0, 300.0));
    }

    #[test]
    fn left_centers_beside_target() {
        let target = Rect::new(600.0, 300.0, 100.0, 50.0);
        let pos = place(target, Placement::Left);
        assert_eq!(pos, Point::new(275.0, 284.0));
    }

    #[test]
    fn right_centers_beside_target() {
        let target = Rect::new(300.0, 300.0, 100.0, 50.0);
        let pos = place(target, Placement::Right);
        assert_eq!(pos, Point::new(275.0, 416.0));
    }

    #[test]
    fn top_at_viewport_top_flips_below() {
        let target = Rect::new(100.0, 0.0, 200.0, 40.0);
        let pos = place(target, Placement::Top);
        assert_eq!(pos.top, target.bottom() + 16.0);
    }

    #[test]
    fn bottom_overflow_flips_above() {
        let target = Rect::new(400.0, 700.0, 100.0, 60.0);
        let pos = place(target, Placement::Bottom);
        assert_eq!(pos.top, 700.0 - 100.0 - 16.0);
    }

    #[test]
    fn clamps_to_left_margin() {
        let target = Rect::new(0.0, 300.0, 40.0, 40.0);
        let pos = place(target, Placement::Bottom);
        assert_eq!(pos.left, 16.0);
    }

    #[test]
    fn clamps_to_right_margin() {
        let target = Rect::new(1250.0, 300.0, 30.0, 30.0);
        let pos = place(target, Placement::Bottom);
        assert_eq!(pos.left, 1280.0 - 300.0 - 16.0);
    }

    #[test]
    fn left_placement_without_room_clamps_to_margin() {
        let target = Rect::new(20.0, 300.0, 100.0, 50.0);
        let pos = place(target, Placement::Left);
        assert_eq!(pos.left, 16.0);
    }

    #[test]
    fn unmeasured_tooltip_uses_desktop_defaults() {
        let config = GeometryConfig::default();
        let size = config.resolve_tooltip_size(Size::ZERO, VIEWPORT);
        assert_eq!(size, Size::new(400.0, 200.0));
    }

    #[test]
    fn unmeasured_tooltip_on_mobile_uses_narrow_width() {
        let config = GeometryConfig::default();
        let size = config.resolve_tooltip_size(Size::ZERO, Size::new(375.0, 667.0));
        assert_eq!(size, Size::new(320.0, 200.0));

        let tiny = config.resolve_tooltip_size(Size::ZERO, Size::new(300.0, 600.0));
        assert_eq!(tiny.width, 300.0 - 32.0);
    }

    #[test]
    fn measured_dimensions_take_precedence() {
        let config = GeometryConfig::default();
        let size = config.resolve_tooltip_size(Size::new(250.0, 0.0), VIEWPORT);
        assert_eq!(size, Size::new(250.0, 200.0));
    }

    #[test]
    fn custom_padding_is_respected() {
        let config = GeometryConfig::default().padding(8.0);
        let target = Rect::new(400.0, 200.0, 100.0, 50.0);
        let pos = compute_position(target, Placement::Bottom, TOOLTIP, VIEWPORT, &config);
        assert_eq!(pos.top, 258.0);
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let target = Rect::new(123.5, 456.25, 78.0, 9.5);
        for placement in Placement::ALL {
            assert_eq!(place(target, placement), place(target, placement));
        }
    }

    #[test]
    fn placement_default_is_bottom() {
        assert_eq!(Placement::default(), Placement::Bottom);
        assert_eq!(Placement::Left.as_str(), "left");
    }
}
