#![forbid(unsafe_code)]

//! [`NativePlatform`]: the view-tree adapter.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use tokio::sync::oneshot;
use tourkit_backend::{
    FrameHandle, HostScheduler, KeyboardHandlers, PlatformAdapter, ResolvedTarget,
    StringTargets, SubscriberList, Subscription, TargetRegistration, TargetRegistry,
    TargetResolver,
};
use tourkit_core::{Rect, Size, TargetRef};

use crate::host::NativeHost;

struct Inner<N: NativeHost> {
    host: N,
    scheduler: HostScheduler,
    registry: TargetRegistry<N::View>,
    resolver: TargetResolver<N::View>,
    tooltip: Cell<Size>,
    back: SubscriberList<KeyboardHandlers>,
    layout: SubscriberList<dyn Fn()>,
}

/// Native platform adapter.
///
/// Cheap to clone; clones share the host, registry, and subscriptions.
pub struct NativePlatform<N: NativeHost> {
    inner: Rc<Inner<N>>,
}

impl<N: NativeHost> Clone for NativePlatform<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: NativeHost> NativePlatform<N> {
    /// Create an adapter resolving IDs, and plain-string targets, through
    /// `registry`.
    ///
    /// The registry is shared: screens keep registering into their clone of
    /// it for as long as they are mounted.
    pub fn new(host: N, registry: TargetRegistry<N::View>) -> Self {
        let resolver = TargetResolver::with_registry(registry.clone())
            .strings_as(StringTargets::RegistryIds);
        Self {
            inner: Rc::new(Inner {
                host,
                scheduler: HostScheduler::new(),
                registry,
                resolver,
                tooltip: Cell::new(Size::ZERO),
                back: SubscriberList::new(),
                layout: SubscriberList::new(),
            }),
        }
    }

    /// The host toolkit.
    pub fn host(&self) -> &N {
        &self.inner.host
    }

    /// The scheduler timers and frames run on.
    pub fn scheduler(&self) -> &HostScheduler {
        &self.inner.scheduler
    }

    /// The registry IDs resolve through.
    pub fn registry(&self) -> &TargetRegistry<N::View> {
        &self.inner.registry
    }

    /// Register a fresh ref under `id` for as long as the returned guard
    /// lives. The screen attaches its view to the ref once mounted.
    pub fn register_target(
        &self,
        id: impl Into<String>,
    ) -> (TargetRef<N::View>, TargetRegistration<N::View>) {
        self.inner.registry.register_new(id)
    }

    /// Forward an Android hardware back press.
    ///
    /// Returns `true` when a tour consumed it; the host must then suppress
    /// the default back navigation. Always `false` on other platforms.
    pub fn hardware_back_press(&self) -> bool {
        if !self.inner.host.os().has_back_button() {
            return false;
        }
        let listeners = self.inner.back.snapshot();
        if listeners.is_empty() {
            return false;
        }
        tracing::debug!(listeners = listeners.len(), "hardware back closes tour");
        for handlers in listeners {
            let on_escape = Rc::clone(&handlers.on_escape);
            on_escape();
        }
        self.inner.scheduler.run_until_stalled();
        true
    }

    /// Forward a window dimension change (rotation, split screen, ...).
    pub fn dimensions_changed(&self) {
        for callback in self.inner.layout.snapshot() {
            callback();
        }
        self.inner.scheduler.run_until_stalled();
    }

    /// Record the tooltip's laid-out size.
    pub fn report_tooltip_layout(&self, size: Size) {
        self.inner.tooltip.set(size);
    }

    /// Run the frame callbacks queued since the last frame.
    pub fn animation_frame(&self) -> usize {
        self.inner.scheduler.run_frame()
    }

    /// Move host time forward, firing due timers.
    pub fn advance(&self, dt: Duration) {
        self.inner.scheduler.advance(dt);
    }

    fn view_of(&self, target: &ResolvedTarget<N::View>) -> Option<N::View> {
        let view = match target {
            // The resolver reads strings as IDs; a selector only arrives when
            // built by hand.
            ResolvedTarget::Selector(selector) => {
                tracing::debug!(selector = %selector, "selectors are not supported on native");
                None
            }
            ResolvedTarget::Handle(target_ref) => target_ref.get(),
        };
        if view.is_none() {
            tracing::debug!(target = %target.describe(), "no view for tour target");
        }
        view
    }

    async fn measure_view(&self, view: &N::View) -> Option<Rect> {
        let (tx, rx) = oneshot::channel();
        self.inner.host.measure(
            view,
            Box::new(move |measurement| {
                // The receiver is gone if the step was cancelled meanwhile.
                let _ = tx.send(measurement);
            }),
        );
        match rx.await {
            Ok(measurement) => measurement.map(|m| m.page_rect()),
            Err(_) => {
                tracing::debug!("measure reply dropped by host");
                None
            }
        }
    }
}

impl<N: NativeHost> fmt::Debug for NativePlatform<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativePlatform")
            .field("os", &self.inner.host.os())
            .field("scheduler", &self.inner.scheduler)
            .field("tooltip", &self.inner.tooltip.get())
            .field("back_listeners", &self.inner.back.len())
            .field("layout_listeners", &self.inner.layout.len())
            .finish()
    }
}

impl<N: NativeHost> PlatformAdapter for NativePlatform<N> {
    type Handle = N::View;

    fn target_resolver(&self) -> &TargetResolver<N::View> {
        &self.inner.resolver
    }

    async fn measure_element(&self, target: &ResolvedTarget<N::View>) -> Option<Rect> {
        let view = self.view_of(target)?;
        self.measure_view(&view).await
    }

    /// Zero until the tooltip's first `onLayout`; the positioning retries
    /// cover the gap.
    fn measure_tooltip(&self) -> Size {
        self.inner.tooltip.get()
    }

    fn viewport_size(&self) -> Size {
        self.inner.host.window_size()
    }

    /// Scroll containers are owned by the host; steps that need scrolling
    /// do it in their `before_step` hook.
    async fn scroll_to_element(&self, _target: &ResolvedTarget<N::View>) {}

    fn subscribe_to_keyboard(&self, handlers: KeyboardHandlers) -> Subscription {
        if self.inner.host.os().has_back_button() {
            self.inner.back.subscribe(Rc::new(handlers))
        } else {
            Subscription::noop()
        }
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

    fn find_element(&self, target: &ResolvedTarget<N::View>) -> Option<N::View> {
        self.view_of(target)
    }

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        self.inner.scheduler.delay(duration)
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.inner.scheduler.spawn(task);
    }
}
