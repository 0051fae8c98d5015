#![forbid(unsafe_code)]

//! What the native view tree provides.

use tourkit_core::{Rect, Size};

/// Operating system the host runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeOs {
    /// Android, with a hardware or gesture back action.
    Android,
    /// iOS.
    Ios,
    /// Any other target (desktop, web preview).
    Other,
}

impl NativeOs {
    /// Whether the platform has a hardware (or gesture) back action.
    pub const fn has_back_button(self) -> bool {
        matches!(self, Self::Android)
    }
}

/// Result of an asynchronous view measurement.
///
/// `x`/`y` are relative to the parent view; `page_x`/`page_y` to the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeMeasurement {
    /// Left edge relative to the parent.
    pub x: f64,
    /// Top edge relative to the parent.
    pub y: f64,
    /// Laid-out width.
    pub width: f64,
    /// Laid-out height.
    pub height: f64,
    /// Left edge in window coordinates.
    pub page_x: f64,
    /// Top edge in window coordinates.
    pub page_y: f64,
}

impl NativeMeasurement {
    /// Window-coordinate bounds.
    pub fn page_rect(&self) -> Rect {
        Rect::new(self.page_x, self.page_y, self.width, self.height)
    }
}

/// Callback handed to [`NativeHost::measure`]. Call it at most once; `None`
/// means the view is not mounted.
pub type MeasureReply = Box<dyn FnOnce(Option<NativeMeasurement>)>;

/// View-tree operations implemented by the host toolkit.
pub trait NativeHost: 'static {
    /// View handle type.
    type View: Clone + 'static;

    /// Measure `view` after the current layout pass and call `reply`.
    ///
    /// `reply` may be called synchronously or later from the UI thread.
    /// Dropping it without calling reports the view as absent.
    fn measure(&self, view: &Self::View, reply: MeasureReply);

    /// Window size in density-independent points.
    fn window_size(&self) -> Size;

    /// Host operating system.
    fn os(&self) -> NativeOs;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_rect_uses_window_coordinates() {
        let m = NativeMeasurement {
            x: 4.0,
            y: 8.0,
            width: 100.0,
            height: 40.0,
            page_x: 24.0,
            page_y: 300.0,
        };
        assert_eq!(m.page_rect(), Rect::new(24.0, 300.0, 100.0, 40.0));
        assert_eq!(m.page_rect().bottom(), 340.0);
    }

    #[test]
    fn only_android_has_back() {
        assert!(NativeOs::Android.has_back_button());
        assert!(!NativeOs::Ios.has_back_button());
        assert!(!NativeOs::Other.has_back_button());
    }
}
