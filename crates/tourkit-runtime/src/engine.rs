#![forbid(unsafe_code)]

//! The tour orchestrator.
//!
//! [`TourEngine`] drives a [`TourRunState`] through a [`PlatformAdapter`].
//! Each time the current step changes it runs the per-step protocol as a
//! local task:
//!
//! 1. Await the step's `before_step` hook, then wait for the UI to settle.
//! 2. Resolve and measure the target once. An absent target skips the step
//!    (or ends the tour from the last step).
//! 3. Publish the highlight, scroll the target into view, and wait for the
//!    scroll to settle.
//! 4. Start a positioning pass: re-measure on successive frames until the
//!    target has a non-degenerate size, then place the tooltip.
//!
//! Layout changes start a fresh positioning pass for the current step.
//!
//! # Cancellation
//!
//! Step work carries a token from the current step generation; positioning
//! passes carry a child token. A step change cancels the generation and
//! aborts both tasks, so no stale measurement is ever written. Aborted tasks
//! drop their pending frame and timer registrations.
//!
//! # Lifetime
//!
//! Pending tasks hold the engine alive. Call [`TourEngine::end_tour`] before
//! dropping the last handle if a tour may still be running.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{AbortHandle, abortable};
use tourkit_backend::{KeyboardHandlers, PlatformAdapter, Subscription, TourPresenter};
use tourkit_core::{TourStep, TourView, compute_position};

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::config::TourConfig;
use crate::frame::NextFrame;
use crate::state::{TourRunState, Transition};

type TourEndCallback = Box<dyn FnMut(Option<String>)>;

/// Generation bookkeeping for in-flight step work.
struct StepTasks {
    step: CancellationSource,
    pass: CancellationSource,
    step_abort: Option<AbortHandle>,
    pass_abort: Option<AbortHandle>,
}

impl StepTasks {
    fn new() -> Self {
        let step = CancellationSource::new();
        let pass = CancellationSource::child(&step.token());
        Self {
            step,
            pass,
            step_abort: None,
            pass_abort: None,
        }
    }

    /// Cancel everything and open a new step generation.
    fn next_step(&mut self) -> CancellationToken {
        self.cancel_all();
        self.step = CancellationSource::new();
        self.pass = CancellationSource::child(&self.step.token());
        self.step.token()
    }

    /// Cancel the in-flight pass and open a new one under the current step.
    fn next_pass(&mut self) -> CancellationToken {
        self.pass.cancel();
        if let Some(handle) = self.pass_abort.take() {
            handle.abort();
        }
        self.pass = CancellationSource::child(&self.step.token());
        self.pass.token()
    }

    fn cancel_all(&mut self) {
        self.step.cancel();
        self.pass.cancel();
        for handle in [self.step_abort.take(), self.pass_abort.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

struct EngineInner<P: PlatformAdapter> {
    adapter: P,
    config: TourConfig,
    state: RefCell<TourRunState<P::Handle>>,
    tasks: RefCell<StepTasks>,
    subscriptions: RefCell<Vec<Subscription>>,
    presenter: RefCell<Option<Box<dyn TourPresenter>>>,
    on_tour_end: RefCell<Option<TourEndCallback>>,
    publishing: Cell<bool>,
    republish: Cell<bool>,
    positioning_passes: Cell<u64>,
}

/// Guided-tour orchestrator over a platform adapter.
///
/// Cheap to clone; clones drive the same tour. All methods are synchronous
/// and return immediately: step work runs as tasks on the adapter's executor.
pub struct TourEngine<P: PlatformAdapter> {
    inner: Rc<EngineInner<P>>,
}

impl<P: PlatformAdapter> Clone for TourEngine<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: PlatformAdapter> TourEngine<P> {
    /// Create an idle engine with the default configuration.
    pub fn new(adapter: P) -> Self {
        Self::with_config(adapter, TourConfig::default())
    }

    /// Create an idle engine.
    pub fn with_config(adapter: P, config: TourConfig) -> Self {
        Self {
            inner: Rc::new(EngineInner {
                adapter,
                config,
                state: RefCell::new(TourRunState::new()),
                tasks: RefCell::new(StepTasks::new()),
                subscriptions: RefCell::new(Vec::new()),
                presenter: RefCell::new(None),
                on_tour_end: RefCell::new(None),
                publishing: Cell::new(false),
                republish: Cell::new(false),
                positioning_passes: Cell::new(0),
            }),
        }
    }

    /// The platform adapter.
    pub fn adapter(&self) -> &P {
        &self.inner.adapter
    }

    /// The active configuration.
    pub fn config(&self) -> &TourConfig {
        &self.inner.config
    }

    /// Install the presenter and publish the current view to it.
    pub fn set_presenter(&self, presenter: impl TourPresenter + 'static) {
        *self.inner.presenter.borrow_mut() = Some(Box::new(presenter));
        self.inner.publish();
    }

    /// Call `callback` with the tour id whenever a tour completes or closes.
    pub fn on_tour_end(&self, callback: impl FnMut(Option<String>) + 'static) {
        *self.inner.on_tour_end.borrow_mut() = Some(Box::new(callback));
    }

    /// Weak handle for presenters to wire their buttons to.
    pub fn controls(&self) -> TourControls<P> {
        TourControls {
            engine: Rc::downgrade(&self.inner),
        }
    }

    /// Start a tour at its first step.
    ///
    /// An empty step list is ignored. Starting while a tour is running
    /// replaces it without firing `on_tour_end`.
    pub fn start_tour(&self, steps: Vec<TourStep<P::Handle>>, tour_id: Option<String>) {
        let inner = &self.inner;
        let total_steps = steps.len();
        let was_active = inner.state.borrow().is_active();
        let transition = inner
            .state
            .borrow_mut()
            .start(steps, tour_id.clone());
        if transition == Transition::Unchanged {
            tracing::debug!(tour_id = ?tour_id, "start_tour ignored: no steps");
            return;
        }
        tracing::info!(tour_id = ?tour_id, total_steps, replaced = was_active, "tour started");
        if !was_active {
            inner.subscribe_inputs();
        }
        inner.apply(transition);
    }

    /// Advance one step, ending the tour from the last step.
    pub fn next_step(&self) {
        self.inner.next_step();
    }

    /// Go back one step. No-op on the first step.
    pub fn prev_step(&self) {
        self.inner.prev_step();
    }

    /// Jump to `index`. Out-of-range or same-index requests are ignored.
    pub fn go_to_step(&self, index: usize) {
        self.inner.go_to_step(index);
    }

    /// End the running tour and fire `on_tour_end`. No-op while idle.
    ///
    /// The engine is reset and the idle view published before the callback
    /// runs, so the callback sees an idle engine (and may start another
    /// tour). The ended tour's id is passed as its argument.
    pub fn end_tour(&self) {
        self.inner.end_tour();
    }

    /// Whether a tour is running.
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_active()
    }

    /// Index of the current step (0 while idle).
    pub fn current_step_index(&self) -> usize {
        self.inner.state.borrow().current_step_index()
    }

    /// Steps of the running tour.
    pub fn steps(&self) -> Vec<TourStep<P::Handle>> {
        self.inner.state.borrow().steps().to_vec()
    }

    /// Id the running tour was started with.
    pub fn tour_id(&self) -> Option<String> {
        self.inner.state.borrow().tour_id().map(str::to_owned)
    }

    /// The current step, while active.
    pub fn current_step(&self) -> Option<TourStep<P::Handle>> {
        self.inner.state.borrow().current_step().cloned()
    }

    /// Snapshot of what the presenter would render now.
    pub fn snapshot(&self) -> TourView {
        self.inner.snapshot()
    }

    /// Positioning passes started since construction.
    pub fn positioning_passes(&self) -> u64 {
        self.inner.positioning_passes.get()
    }
}

impl<P: PlatformAdapter> fmt::Debug for TourEngine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourEngine")
            .field("state", &*self.inner.state.borrow())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Navigation handle that does not keep the engine alive.
///
/// Every method is a no-op once the engine is gone.
pub struct TourControls<P: PlatformAdapter> {
    engine: Weak<EngineInner<P>>,
}

impl<P: PlatformAdapter> TourControls<P> {
    /// End the tour.
    pub fn close(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.end_tour();
        }
    }

    /// Advance one step.
    pub fn next(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.next_step();
        }
    }

    /// Go back one step.
    pub fn prev(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.prev_step();
        }
    }

    /// Jump to a step.
    pub fn go_to_step(&self, index: usize) {
        if let Some(engine) = self.engine.upgrade() {
            engine.go_to_step(index);
        }
    }

    /// Whether the engine still exists.
    pub fn is_alive(&self) -> bool {
        self.engine.strong_count() > 0
    }
}

impl<P: PlatformAdapter> Clone for TourControls<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Weak::clone(&self.engine),
        }
    }
}

impl<P: PlatformAdapter> fmt::Debug for TourControls<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourControls")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<P: PlatformAdapter> EngineInner<P> {
    fn snapshot(&self) -> TourView {
        self.state.borrow().view(self.config.default_placement)
    }

    fn next_step(self: &Rc<Self>) {
        let transition = self.state.borrow_mut().next();
        if transition == Transition::Unchanged {
            tracing::debug!("next_step ignored: no active tour");
        }
        self.apply(transition);
    }

    fn prev_step(self: &Rc<Self>) {
        let transition = self.state.borrow_mut().prev();
        if transition == Transition::Unchanged {
            tracing::debug!("prev_step ignored: idle or on first step");
        }
        self.apply(transition);
    }

    fn go_to_step(self: &Rc<Self>, index: usize) {
        let transition = self.state.borrow_mut().go_to(index);
        if transition == Transition::Unchanged {
            tracing::debug!(index, "go_to_step ignored: idle, out of range, or current");
        }
        self.apply(transition);
    }

    fn end_tour(self: &Rc<Self>) {
        let transition = self.state.borrow_mut().end();
        self.apply(transition);
    }

    fn apply(self: &Rc<Self>, transition: Transition) {
        match transition {
            Transition::Unchanged => {}
            Transition::Step(index) => {
                tracing::debug!(step = index, "tour step");
                self.publish();
                // The presenter may have navigated again; that transition
                // already started its own step work.
                let still_current = {
                    let state = self.state.borrow();
                    state.is_active() && state.current_step_index() == index
                };
                if still_current {
                    self.begin_step(index);
                }
            }
            Transition::Ended(tour_id) => self.finish(tour_id),
        }
    }

    fn finish(self: &Rc<Self>, tour_id: Option<String>) {
        self.tasks.borrow_mut().cancel_all();
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);
        tracing::info!(tour_id = ?tour_id, "tour ended");
        self.publish();

        let callback = self.on_tour_end.borrow_mut().take();
        if let Some(mut callback) = callback {
            callback(tour_id);
            let mut slot = self.on_tour_end.borrow_mut();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }

    fn subscribe_inputs(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let on = |action: fn(&Rc<Self>)| {
            let weak = Weak::clone(&weak);
            move || {
                if let Some(engine) = weak.upgrade() {
                    action(&engine);
                }
            }
        };
        let keyboard = self.adapter.subscribe_to_keyboard(KeyboardHandlers::new(
            on(Self::end_tour),
            on(Self::next_step),
            on(Self::prev_step),
        ));
        let layout = self
            .adapter
            .subscribe_to_layout(Rc::new(on(Self::on_layout_change)));
        self.subscriptions.borrow_mut().extend([keyboard, layout]);
    }

    fn on_layout_change(self: &Rc<Self>) {
        let index = {
            let state = self.state.borrow();
            if !state.is_active() || state.highlight_rect.is_none() {
                return;
            }
            state.current_step_index()
        };
        tracing::debug!(step = index, "layout changed; repositioning");
        self.begin_positioning(index, Duration::ZERO);
    }

    /// Presenter calls that re-enter the engine are coalesced into one more
    /// round instead of recursing.
    fn publish(&self) {
        if self.publishing.get() {
            self.republish.set(true);
            return;
        }
        self.publishing.set(true);
        loop {
            self.republish.set(false);
            let view = self.snapshot();
            let presenter = self.presenter.borrow_mut().take();
            if let Some(mut presenter) = presenter {
                presenter.present(&view);
                let mut slot = self.presenter.borrow_mut();
                if slot.is_none() {
                    *slot = Some(presenter);
                }
            }
            if !self.republish.get() {
                break;
            }
        }
        self.publishing.set(false);
    }

    fn begin_step(self: &Rc<Self>, index: usize) {
        let token = self.tasks.borrow_mut().next_step();
        let (task, handle) = abortable(run_step(Rc::clone(self), index, token));
        self.tasks.borrow_mut().step_abort = Some(handle);
        self.adapter.spawn_local(task.map(|_| ()).boxed_local());
    }

    fn begin_positioning(self: &Rc<Self>, index: usize, initial_delay: Duration) {
        let token = self.tasks.borrow_mut().next_pass();
        let pass = self.positioning_passes.get() + 1;
        self.positioning_passes.set(pass);
        tracing::trace!(step = index, pass, "positioning pass started");
        let (task, handle) = abortable(run_positioning(
            Rc::clone(self),
            index,
            initial_delay,
            token,
        ));
        self.tasks.borrow_mut().pass_abort = Some(handle);
        self.adapter.spawn_local(task.map(|_| ()).boxed_local());
    }

    /// Target missing: move on as if the user pressed next.
    fn skip_step(self: &Rc<Self>) {
        let transition = self.state.borrow_mut().next();
        self.apply(transition);
    }
}

async fn run_step<P: PlatformAdapter>(
    engine: Rc<EngineInner<P>>,
    index: usize,
    token: CancellationToken,
) {
    let Some(step) = engine.state.borrow().steps().get(index).cloned() else {
        return;
    };

    if let Some(hook) = &step.before_step {
        hook.run().await;
        if token.is_cancelled() {
            return;
        }
        engine
            .adapter
            .delay(engine.config.before_step_settle_delay())
            .await;
        if token.is_cancelled() {
            return;
        }
    }

    let resolved = engine.adapter.target_resolver().resolve(&step.target);
    let rect = match &resolved {
        Some(target) => engine.adapter.measure_element(target).await,
        None => None,
    };
    if token.is_cancelled() {
        return;
    }
    let (Some(resolved), Some(rect)) = (resolved, rect) else {
        tracing::debug!(
            step = index,
            target = %step.target.describe(),
            "tour target not found; skipping step"
        );
        engine.skip_step();
        return;
    };

    engine.state.borrow_mut().set_highlight(rect);
    engine.publish();
    if token.is_cancelled() {
        return;
    }

    engine.adapter.scroll_to_element(&resolved).await;
    if token.is_cancelled() {
        return;
    }
    engine.adapter.delay(engine.config.scroll_settle_delay()).await;
    if token.is_cancelled() {
        return;
    }

    engine.begin_positioning(index, engine.config.initial_delay());
}

async fn run_positioning<P: PlatformAdapter>(
    engine: Rc<EngineInner<P>>,
    index: usize,
    initial_delay: Duration,
    token: CancellationToken,
) {
    if !initial_delay.is_zero() {
        engine.adapter.delay(initial_delay).await;
        if token.is_cancelled() {
            return;
        }
    }
    let Some(step) = engine.state.borrow().steps().get(index).cloned() else {
        return;
    };
    let policy = &engine.config.positioning;

    for attempt in 0..policy.max_attempts {
        NextFrame::new(&engine.adapter).await;
        if token.is_cancelled() {
            return;
        }

        let resolved = engine.adapter.target_resolver().resolve(&step.target);
        let rect = match &resolved {
            Some(target) => engine.adapter.measure_element(target).await,
            None => None,
        };
        if token.is_cancelled() {
            return;
        }

        match rect.filter(|rect| !rect.is_degenerate()) {
            Some(rect) => {
                let placement = step.placement_or(engine.config.default_placement);
                let position = compute_position(
                    rect,
                    placement,
                    engine.adapter.measure_tooltip(),
                    engine.adapter.viewport_size(),
                    &engine.config.geometry,
                );
                engine.state.borrow_mut().set_positioned(rect, position);
                tracing::debug!(
                    step = index,
                    attempt,
                    placement = placement.as_str(),
                    top = position.top,
                    left = position.left,
                    "tooltip positioned"
                );
                engine.publish();
                return;
            }
            None => {
                tracing::trace!(step = index, attempt, "target not measurable yet");
                if policy.has_attempt_after(attempt) {
                    engine.adapter.delay(policy.delay(attempt)).await;
                    if token.is_cancelled() {
                        return;
                    }
                }
            }
        }
    }

    tracing::warn!(
        step = index,
        attempts = policy.max_attempts,
        target = %step.target.describe(),
        "tooltip positioning gave up"
    );
    // A position from before a layout change no longer matches the target.
    let was_positioned = engine.state.borrow_mut().clear_position();
    if was_positioned {
        engine.publish();
    }
}
