#![forbid(unsafe_code)]

//! [`WebPlatform`]: the DOM adapter.
//!
//! The glue forwards browser events into the platform:
//!
//! | Browser event              | Call                                  |
//! |----------------------------|---------------------------------------|
//! | `keydown`                  | [`WebPlatform::dispatch_key`]         |
//! | `resize`                   | [`WebPlatform::dispatch_resize`]      |
//! | `scroll` (capture phase)   | [`WebPlatform::dispatch_scroll`]      |
//! | `requestAnimationFrame`    | [`WebPlatform::animation_frame`]      |
//! | timer tick                 | [`WebPlatform::advance`]              |

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use tourkit_backend::{
    FrameHandle, HostScheduler, KeyboardHandlers, PlatformAdapter, ResolvedTarget,
    SubscriberList, Subscription, TargetRegistry, TargetResolver,
};
use tourkit_core::{Rect, Size, TargetRef};

use crate::dom::{DomHost, ScrollIntoViewOptions, find_visible_element};

struct Inner<D: DomHost> {
    host: D,
    scheduler: HostScheduler,
    resolver: TargetResolver<D::Element>,
    tooltip: TargetRef<D::Element>,
    keys: SubscriberList<KeyboardHandlers>,
    layout: SubscriberList<dyn Fn()>,
}

/// DOM platform adapter.
///
/// Cheap to clone; clones share the host, scheduler, and subscriptions.
/// Selectors resolve through [`find_visible_element`]; refs measure the
/// element attached to them.
pub struct WebPlatform<D: DomHost> {
    inner: Rc<Inner<D>>,
}

impl<D: DomHost> Clone for WebPlatform<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: DomHost> WebPlatform<D> {
    /// Create an adapter over `host`.
    pub fn new(host: D) -> Self {
        Self::from_parts(host, TargetResolver::new())
    }

    /// Create an adapter that also resolves registered IDs.
    pub fn with_registry(host: D, registry: TargetRegistry<D::Element>) -> Self {
        Self::from_parts(host, TargetResolver::with_registry(registry))
    }

    fn from_parts(host: D, resolver: TargetResolver<D::Element>) -> Self {
        Self {
            inner: Rc::new(Inner {
                host,
                scheduler: HostScheduler::new(),
                resolver,
                tooltip: TargetRef::new(),
                keys: SubscriberList::new(),
                layout: SubscriberList::new(),
            }),
        }
    }

    /// The DOM host.
    pub fn host(&self) -> &D {
        &self.inner.host
    }

    /// The scheduler timers and frames run on.
    pub fn scheduler(&self) -> &HostScheduler {
        &self.inner.scheduler
    }

    /// Ref the tooltip widget attaches its root element to.
    ///
    /// Until it is attached the tooltip measures as [`Size::ZERO`] and the
    /// solver falls back to its default card size.
    pub fn tooltip_ref(&self) -> TargetRef<D::Element> {
        self.inner.tooltip.clone()
    }

    /// Route a `KeyboardEvent.key` value to the subscribed handlers.
    ///
    /// Returns whether the key is a tour key and someone is listening; the
    /// glue should `preventDefault()` when it is.
    pub fn dispatch_key(&self, key: &str) -> bool {
        let mut handled = false;
        for handlers in self.inner.keys.snapshot() {
            let Some(handler) = key_handler(&handlers, key) else {
                return false;
            };
            handled = true;
            handler();
        }
        if handled {
            tracing::debug!(key, "tour key");
            self.inner.scheduler.run_until_stalled();
        }
        handled
    }

    /// Forward a window `resize`.
    pub fn dispatch_resize(&self) {
        self.notify_layout();
    }

    /// Forward a `scroll` from anywhere in the document.
    pub fn dispatch_scroll(&self) {
        self.notify_layout();
    }

    /// Run the frame callbacks queued since the last animation frame.
    pub fn animation_frame(&self) -> usize {
        self.inner.scheduler.run_frame()
    }

    /// Move host time forward, firing due timers.
    pub fn advance(&self, dt: Duration) {
        self.inner.scheduler.advance(dt);
    }

    fn notify_layout(&self) {
        for callback in self.inner.layout.snapshot() {
            callback();
        }
        self.inner.scheduler.run_until_stalled();
    }

    fn element_of(&self, target: &ResolvedTarget<D::Element>) -> Option<D::Element> {
        let element = match target {
            ResolvedTarget::Selector(selector) => find_visible_element(&self.inner.host, selector),
            ResolvedTarget::Handle(target_ref) => target_ref.get(),
        };
        if element.is_none() {
            tracing::debug!(target = %target.describe(), "no element for tour target");
        }
        element
    }
}

fn key_handler(handlers: &KeyboardHandlers, key: &str) -> Option<Rc<dyn Fn()>> {
    let handler = match key {
        "Escape" => &handlers.on_escape,
        "ArrowRight" => &handlers.on_next,
        "ArrowLeft" => &handlers.on_prev,
        _ => return None,
    };
    Some(Rc::clone(handler))
}

impl<D: DomHost> fmt::Debug for WebPlatform<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPlatform")
            .field("scheduler", &self.inner.scheduler)
            .field("tooltip", &self.inner.tooltip)
            .field("key_listeners", &self.inner.keys.len())
            .field("layout_listeners", &self.inner.layout.len())
            .finish()
    }
}

impl<D: DomHost> PlatformAdapter for WebPlatform<D> {
    type Handle = D::Element;

    fn target_resolver(&self) -> &TargetResolver<D::Element> {
        &self.inner.resolver
    }

    async fn measure_element(&self, target: &ResolvedTarget<D::Element>) -> Option<Rect> {
        let element = self.element_of(target)?;
        Some(self.inner.host.bounding_client_rect(&element))
    }

    fn measure_tooltip(&self) -> Size {
        self.inner
            .tooltip
            .get()
            .map_or(Size::ZERO, |element| self.inner.host.offset_size(&element))
    }

    fn viewport_size(&self) -> Size {
        self.inner.host.inner_size()
    }

    async fn scroll_to_element(&self, target: &ResolvedTarget<D::Element>) {
        if let Some(element) = self.element_of(target) {
            self.inner
                .host
                .scroll_into_view(&element, ScrollIntoViewOptions::centered());
        }
    }

    fn subscribe_to_keyboard(&self, handlers: KeyboardHandlers) -> Subscription {
        self.inner.keys.subscribe(Rc::new(handlers))
    }

    fn subscribe_to_layout(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.inner.layout.subscribe(callback)
    }

    fn schedule_frame(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        self.inner.scheduler.schedule_frame(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.inner.scheduler.cancel_frame(handle);
    }

    fn find_element(&self, target: &ResolvedTarget<D::Element>) -> Option<D::Element> {
        self.element_of(target)
    }

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        self.inner.scheduler.delay(duration)
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.inner.scheduler.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Blank;

    impl DomHost for Blank {
        type Element = u32;

        fn query_selector_all(&self, _selector: &str) -> Vec<u32> {
            Vec::new()
        }

        fn bounding_client_rect(&self, _element: &u32) -> Rect {
            Rect::default()
        }

        fn scroll_into_view(&self, _element: &u32, _options: ScrollIntoViewOptions) {}

        fn inner_size(&self) -> Size {
            Size::new(800.0, 600.0)
        }

        fn offset_size(&self, element: &u32) -> Size {
            Size::new(f64::from(*element), 50.0)
        }
    }

    fn counting(platform: &WebPlatform<Blank>) -> (Rc<[Cell<u32>; 3]>, Subscription) {
        let counts = Rc::new([Cell::new(0), Cell::new(0), Cell::new(0)]);
        let bump = |i: usize| {
            let counts = Rc::clone(&counts);
            move || counts[i].set(counts[i].get() + 1)
        };
        let sub = platform.subscribe_to_keyboard(KeyboardHandlers::new(bump(0), bump(1), bump(2)));
        (counts, sub)
    }

    #[test]
    fn keys_map_to_handlers() {
        let platform = WebPlatform::new(Blank);
        let (counts, _sub) = counting(&platform);

        assert!(platform.dispatch_key("Escape"));
        assert!(platform.dispatch_key("ArrowRight"));
        assert!(platform.dispatch_key("ArrowRight"));
        assert!(platform.dispatch_key("ArrowLeft"));
        assert!(!platform.dispatch_key("Enter"));
        assert!(!platform.dispatch_key("ArrowUp"));

        let seen: Vec<u32> = counts.iter().map(Cell::get).collect();
        assert_eq!(seen, vec![1, 2, 1]);
    }

    #[test]
    fn keys_without_listeners_are_unhandled() {
        let platform = WebPlatform::new(Blank);
        let (_counts, sub) = counting(&platform);
        drop(sub);
        assert!(!platform.dispatch_key("Escape"));
    }

    #[test]
    fn resize_and_scroll_notify_layout() {
        let platform = WebPlatform::new(Blank);
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let sub = platform.subscribe_to_layout(Rc::new(move || seen.set(seen.get() + 1)));
        platform.dispatch_resize();
        platform.dispatch_scroll();
        assert_eq!(hits.get(), 2);
        drop(sub);
        platform.dispatch_resize();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn tooltip_size_follows_attached_element() {
        let platform = WebPlatform::new(Blank);
        assert_eq!(platform.measure_tooltip(), Size::ZERO);
        platform.tooltip_ref().attach(320);
        assert_eq!(platform.measure_tooltip(), Size::new(320.0, 50.0));
        assert_eq!(platform.viewport_size(), Size::new(800.0, 600.0));
    }
}
