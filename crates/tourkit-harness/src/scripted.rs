#![forbid(unsafe_code)]

//! A platform whose layout is a script.
//!
//! Targets are keyed by string: a selector target uses the selector itself,
//! a ref target uses the handle attached to it (handles are `String`s). Each
//! key maps to a [`Response`]; unknown keys measure as absent.
//!
//! Time is virtual. Nothing happens until the test calls
//! [`advance`](ScriptedPlatform::advance),
//! [`run_frame`](ScriptedPlatform::run_frame), or
//! [`settle`](ScriptedPlatform::settle).

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use tourkit_backend::{
    FrameHandle, HostScheduler, KeyboardHandlers, PlatformAdapter, ResolvedTarget,
    SubscriberList, Subscription, TargetRegistry, TargetResolver,
};
use tourkit_core::{Rect, Size};

/// Upper bound on scheduler rounds in [`ScriptedPlatform::settle`].
const SETTLE_ROUNDS: usize = 10_000;

/// Scripted answer for one target.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Always this rectangle.
    Fixed(Rect),
    /// Never found.
    Missing,
    /// One answer per measurement; the last answer repeats.
    Sequence(VecDeque<Option<Rect>>),
}

impl Response {
    /// Sequence from an iterator of answers.
    pub fn sequence(answers: impl IntoIterator<Item = Option<Rect>>) -> Self {
        Self::Sequence(answers.into_iter().collect())
    }

    fn next(&mut self) -> Option<Rect> {
        match self {
            Self::Fixed(rect) => Some(*rect),
            Self::Missing => None,
            Self::Sequence(answers) if answers.len() > 1 => answers.pop_front().flatten(),
            Self::Sequence(answers) => answers.front().copied().flatten(),
        }
    }
}

/// Everything the orchestrator asked the platform to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    /// Target keys, one per `measure_element` call.
    pub measured: Vec<String>,
    /// Target keys, one per `scroll_to_element` call.
    pub scrolled: Vec<String>,
    /// Frames requested.
    pub frames_scheduled: usize,
    /// Frames cancelled before they ran.
    pub frames_cancelled: usize,
}

struct Inner {
    scheduler: HostScheduler,
    resolver: TargetResolver<String>,
    responses: RefCell<HashMap<String, Response>>,
    viewport: Cell<Size>,
    tooltip: Cell<Size>,
    measure_latency: Cell<Duration>,
    keys: SubscriberList<KeyboardHandlers>,
    layout: SubscriberList<dyn Fn()>,
    calls: RefCell<CallLog>,
}

/// Deterministic [`PlatformAdapter`] for tests.
///
/// Clones share state, so a test can keep one handle while the engine owns
/// another.
#[derive(Clone)]
pub struct ScriptedPlatform {
    inner: Rc<Inner>,
}

impl ScriptedPlatform {
    /// A 1280x800 viewport with a measured 300x100 tooltip and no targets.
    pub fn new() -> Self {
        Self::with_registry(TargetRegistry::new())
    }

    /// Like [`new`](Self::new), resolving IDs through `registry`.
    pub fn with_registry(registry: TargetRegistry<String>) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler: HostScheduler::new(),
                resolver: TargetResolver::with_registry(registry),
                responses: RefCell::new(HashMap::new()),
                viewport: Cell::new(Size::new(1280.0, 800.0)),
                tooltip: Cell::new(Size::new(300.0, 100.0)),
                measure_latency: Cell::new(Duration::ZERO),
                keys: SubscriberList::new(),
                layout: SubscriberList::new(),
                calls: RefCell::new(CallLog::default()),
            }),
        }
    }

    /// The registry IDs resolve through.
    pub fn registry(&self) -> Option<&TargetRegistry<String>> {
        self.inner.resolver.registry()
    }

    /// The underlying scheduler.
    pub fn scheduler(&self) -> &HostScheduler {
        &self.inner.scheduler
    }

    /// Script the answer for `key`.
    pub fn respond(&self, key: impl Into<String>, response: Response) {
        self.inner.responses.borrow_mut().insert(key.into(), response);
    }

    /// `key` always measures as `rect`.
    pub fn place(&self, key: impl Into<String>, rect: Rect) {
        self.respond(key, Response::Fixed(rect));
    }

    /// `key` is no longer found.
    pub fn remove(&self, key: &str) {
        self.inner.responses.borrow_mut().remove(key);
    }

    /// Change the viewport size.
    pub fn set_viewport(&self, size: Size) {
        self.inner.viewport.set(size);
    }

    /// Change the reported tooltip size.
    pub fn set_tooltip_size(&self, size: Size) {
        self.inner.tooltip.set(size);
    }

    /// Make every measurement take `latency` of virtual time.
    pub fn set_measure_latency(&self, latency: Duration) {
        self.inner.measure_latency.set(latency);
    }

    /// Copy of the call log.
    pub fn calls(&self) -> CallLog {
        self.inner.calls.borrow().clone()
    }

    /// Number of measurements of `key` so far.
    pub fn measurements(&self, key: &str) -> usize {
        self.inner
            .calls
            .borrow()
            .measured
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        *self.inner.calls.borrow_mut() = CallLog::default();
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.scheduler.now()
    }

    /// Move virtual time forward, firing timers on the way.
    pub fn advance(&self, dt: Duration) {
        self.inner.scheduler.advance(dt);
    }

    /// Shorthand for [`advance`](Self::advance) in milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Run queued frames. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        self.inner.scheduler.run_frame()
    }

    /// Poll tasks without moving time.
    pub fn run_until_stalled(&self) {
        self.inner.scheduler.run_until_stalled();
    }

    /// Run frames and timers until nothing is pending. Returns `false` if
    /// work was still pending after the round limit.
    pub fn settle(&self) -> bool {
        let idle = self.inner.scheduler.run_until_idle(SETTLE_ROUNDS);
        if !idle {
            tracing::warn!(rounds = SETTLE_ROUNDS, "scripted platform did not settle");
        }
        idle
    }

    /// Simulate the escape key.
    pub fn press_escape(&self) {
        self.dispatch(|h| Rc::clone(&h.on_escape));
    }

    /// Simulate the "next" key.
    pub fn press_next(&self) {
        self.dispatch(|h| Rc::clone(&h.on_next));
    }

    /// Simulate the "previous" key.
    pub fn press_prev(&self) {
        self.dispatch(|h| Rc::clone(&h.on_prev));
    }

    /// Simulate a resize or scroll.
    pub fn trigger_layout(&self) {
        for callback in self.inner.layout.snapshot() {
            callback();
        }
        self.run_until_stalled();
    }

    /// Number of live keyboard subscriptions.
    pub fn keyboard_subscribers(&self) -> usize {
        self.inner.keys.len()
    }

    /// Number of live layout subscriptions.
    pub fn layout_subscribers(&self) -> usize {
        self.inner.layout.len()
    }

    fn dispatch(&self, pick: impl Fn(&KeyboardHandlers) -> Rc<dyn Fn()>) {
        for handlers in self.inner.keys.snapshot() {
            pick(&handlers)();
        }
        self.run_until_stalled();
    }

    fn key_of(target: &ResolvedTarget<String>) -> Option<String> {
        match target {
            ResolvedTarget::Selector(selector) => Some(selector.clone()),
            ResolvedTarget::Handle(target_ref) => target_ref.get(),
        }
    }
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPlatform")
            .field("scheduler", &self.inner.scheduler)
            .field("calls", &*self.inner.calls.borrow())
            .finish()
    }
}

impl PlatformAdapter for ScriptedPlatform {
    type Handle = String;

    fn target_resolver(&self) -> &TargetResolver<String> {
        &self.inner.resolver
    }

    async fn measure_element(&self, target: &ResolvedTarget<String>) -> Option<Rect> {
        let key = Self::key_of(target)?;
        self.inner.calls.borrow_mut().measured.push(key.clone());
        let latency = self.inner.measure_latency.get();
        if !latency.is_zero() {
            self.inner.scheduler.delay(latency).await;
        }
        let mut responses = self.inner.responses.borrow_mut();
        responses.get_mut(&key).and_then(Response::next)
    }

    fn measure_tooltip(&self) -> Size {
        self.inner.tooltip.get()
    }

    fn viewport_size(&self) -> Size {
        self.inner.viewport.get()
    }

    async fn scroll_to_element(&self, target: &ResolvedTarget<String>) {
        if let Some(key) = Self::key_of(target) {
            self.inner.calls.borrow_mut().scrolled.push(key);
        }
    }

    fn subscribe_to_keyboard(&self, handlers: KeyboardHandlers) -> Subscription {
        self.inner.keys.subscribe(Rc::new(handlers))
    }

    fn subscribe_to_layout(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.inner.layout.subscribe(callback)
    }

    fn schedule_frame(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        self.inner.calls.borrow_mut().frames_scheduled += 1;
        self.inner.scheduler.schedule_frame(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.inner.calls.borrow_mut().frames_cancelled += 1;
        self.inner.scheduler.cancel_frame(handle);
    }

    fn find_element(&self, target: &ResolvedTarget<String>) -> Option<String> {
        let key = Self::key_of(target)?;
        let found = self
            .inner
            .responses
            .borrow()
            .get(&key)
            .is_some_and(|response| *response != Response::Missing);
        found.then_some(key)
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
    use pretty_assertions::assert_eq;

    #[test]
    fn sequence_repeats_last_answer() {
        let rect = Rect::new(0.0, 0.0, 5.0, 5.0);
        let mut response = Response::sequence([None, Some(Rect::default()), Some(rect)]);
        assert_eq!(response.next(), None);
        assert_eq!(response.next(), Some(Rect::default()));
        assert_eq!(response.next(), Some(rect));
        assert_eq!(response.next(), Some(rect));
    }

    #[test]
    fn empty_sequence_is_missing() {
        let mut response = Response::sequence([]);
        assert_eq!(response.next(), None);
    }

    #[test]
    fn measurements_are_logged_per_key() {
        let platform = ScriptedPlatform::new();
        platform.place("#a", Rect::new(1.0, 2.0, 3.0, 4.0));
        let target = ResolvedTarget::Selector("#a".to_owned());
        let missing = ResolvedTarget::Selector("#b".to_owned());

        let rect = futures_util::FutureExt::now_or_never(platform.measure_element(&target));
        assert_eq!(rect, Some(Some(Rect::new(1.0, 2.0, 3.0, 4.0))));
        let absent = futures_util::FutureExt::now_or_never(platform.measure_element(&missing));
        assert_eq!(absent, Some(None));

        assert_eq!(platform.measurements("#a"), 1);
        assert_eq!(platform.calls().measured, vec!["#a".to_owned(), "#b".to_owned()]);
        assert_eq!(platform.find_element(&target), Some("#a".to_owned()));
        assert_eq!(platform.find_element(&missing), None);
        platform.clear_calls();
        assert_eq!(platform.calls(), CallLog::default());
    }

    #[test]
    fn latency_delays_the_answer() {
        let platform = ScriptedPlatform::new();
        platform.place("#a", Rect::new(0.0, 0.0, 10.0, 10.0));
        platform.set_measure_latency(Duration::from_millis(30));
        let answer = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&answer);
        let adapter = platform.clone();
        platform.spawn_local(Box::pin(async move {
            let target = ResolvedTarget::Selector("#a".to_owned());
            *slot.borrow_mut() = Some(adapter.measure_element(&target).await);
        }));

        platform.run_until_stalled();
        assert_eq!(*answer.borrow(), None);
        platform.advance_ms(29);
        assert_eq!(*answer.borrow(), None);
        platform.advance_ms(1);
        assert_eq!(*answer.borrow(), Some(Some(Rect::new(0.0, 0.0, 10.0, 10.0))));
    }

    #[test]
    fn keyboard_dispatch_reaches_subscribers() {
        let platform = ScriptedPlatform::new();
        let escapes = Rc::new(Cell::new(0));
        let seen = Rc::clone(&escapes);
        let sub = platform.subscribe_to_keyboard(KeyboardHandlers::new(
            move || seen.set(seen.get() + 1),
            || {},
            || {},
        ));
        assert_eq!(platform.keyboard_subscribers(), 1);
        platform.press_escape();
        platform.press_next();
        drop(sub);
        platform.press_escape();
        assert_eq!(escapes.get(), 1);
        assert_eq!(platform.keyboard_subscribers(), 0);
    }
}
