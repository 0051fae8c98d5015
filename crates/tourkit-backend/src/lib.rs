#![forbid(unsafe_code)]
#![doc = "Platform adapter contract for tourkit: measurement, input, scheduling, and target resolution."]
#![doc = ""]
#![doc = "This crate defines the boundary between the tour orchestrator (`tourkit-runtime`)"]
#![doc = "and platform-specific implementations (DOM via `tourkit-web`, native view trees via"]
#![doc = "`tourkit-native`). The orchestrator never touches a platform API directly."]

use core::future::Future;
use core::time::Duration;
use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use tourkit_core::{Rect, Size};

pub mod presenter;
pub mod scheduler;
pub mod subscription;
pub mod target;

pub use presenter::TourPresenter;
pub use scheduler::{Delay, HostScheduler};
pub use subscription::{SubscriberList, Subscription};
pub use target::{
    ResolvedTarget, StringTargets, TargetRegistration, TargetRegistry, TargetResolver,
};

/// Opaque handle to a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Wrap a platform frame id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The platform frame id.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Callbacks for the three tour navigation keys.
///
/// Adapters decide which physical inputs map to each action (arrow keys on
/// the web, the hardware back button on Android).
#[derive(Clone)]
pub struct KeyboardHandlers {
    /// Close the tour.
    pub on_escape: Rc<dyn Fn()>,
    /// Advance one step.
    pub on_next: Rc<dyn Fn()>,
    /// Go back one step.
    pub on_prev: Rc<dyn Fn()>,
}

impl KeyboardHandlers {
    /// Bundle the three handlers.
    pub fn new(
        on_escape: impl Fn() + 'static,
        on_next: impl Fn() + 'static,
        on_prev: impl Fn() + 'static,
    ) -> Self {
        Self {
            on_escape: Rc::new(on_escape),
            on_next: Rc::new(on_next),
            on_prev: Rc::new(on_prev),
        }
    }
}

impl fmt::Debug for KeyboardHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyboardHandlers { .. }")
    }
}

/// Everything the orchestrator needs from a platform.
///
/// Implementations run on the host's single UI thread. All futures are
/// local (`!Send`) and are driven by the executor behind
/// [`spawn_local`](Self::spawn_local). Absence is reported as `None`, never
/// as an error.
pub trait PlatformAdapter: 'static {
    /// Element or view handle type.
    type Handle: Clone + 'static;

    /// The resolver consulted before every measurement.
    fn target_resolver(&self) -> &TargetResolver<Self::Handle>;

    /// Measure a resolved target in viewport coordinates.
    ///
    /// `None` when the element cannot be found or is not mounted.
    fn measure_element(
        &self,
        target: &ResolvedTarget<Self::Handle>,
    ) -> impl Future<Output = Option<Rect>>;

    /// Current tooltip size; `Size::ZERO` until it has been laid out.
    fn measure_tooltip(&self) -> Size;

    /// Current viewport (window) size.
    fn viewport_size(&self) -> Size;

    /// Bring the target into view. Best effort; may complete immediately.
    fn scroll_to_element(&self, target: &ResolvedTarget<Self::Handle>) -> impl Future<Output = ()>;

    /// Route navigation keys to `handlers` until the subscription is dropped.
    fn subscribe_to_keyboard(&self, handlers: KeyboardHandlers) -> Subscription;

    /// Call `callback` on resize, scroll, or other layout changes until the
    /// subscription is dropped.
    fn subscribe_to_layout(&self, callback: Rc<dyn Fn()>) -> Subscription;

    /// Run `callback` before the next paint.
    fn schedule_frame(&self, callback: Box<dyn FnOnce()>) -> FrameHandle;

    /// Cancel a frame callback that has not run yet. Unknown handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);

    /// Synchronous element lookup.
    fn find_element(&self, target: &ResolvedTarget<Self::Handle>) -> Option<Self::Handle>;

    /// Complete after `duration` of host time.
    fn delay(&self, duration: Duration) -> impl Future<Output = ()>;

    /// Run a cooperative task on the UI thread.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn frame_handle_round_trips_id() {
        let handle = FrameHandle::new(42);
        assert_eq!(handle.id(), 42);
        assert_eq!(handle, FrameHandle::new(42));
    }

    #[test]
    fn keyboard_handlers_dispatch() {
        let hits = Rc::new(Cell::new(0u8));
        let (a, b, c) = (Rc::clone(&hits), Rc::clone(&hits), Rc::clone(&hits));
        let handlers = KeyboardHandlers::new(
            move || a.set(a.get() | 1),
            move || b.set(b.get() | 2),
            move || c.set(c.get() | 4),
        );
        let copy = handlers.clone();
        (copy.on_escape)();
        (copy.on_prev)();
        assert_eq!(hits.get(), 5);
        (handlers.on_next)();
        assert_eq!(hits.get(), 7);
        assert_eq!(format!("{handlers:?}"), "KeyboardHandlers { .. }");
    }
}
