#![forbid(unsafe_code)]

//! Output half of the platform boundary.

use tourkit_core::TourView;

/// Receives a fresh [`TourView`] on every state change.
///
/// Renderers typically store the view and schedule a repaint. Closures of
/// type `FnMut(&TourView)` implement this trait.
pub trait TourPresenter {
    /// Render (or schedule rendering of) `view`.
    fn present(&mut self, view: &TourView);
}

impl<F> TourPresenter for F
where
    F: FnMut(&TourView),
{
    fn present(&mut self, view: &TourView) {
        self(view)
    }
}
