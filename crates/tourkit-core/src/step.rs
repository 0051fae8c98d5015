#![forbid(unsafe_code)]

//! Tour step descriptors.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;

use crate::placement::Placement;
use crate::target::TourTarget;

/// Side effect run before a step is measured.
///
/// Typically switches a tab, opens a panel, or navigates to the screen that
/// hosts the step's target. The orchestrator awaits the returned future and
/// then waits a short settle delay before measuring. Failures inside the hook
/// are the host's to handle; the hook itself returns `()`.
#[derive(Clone)]
pub struct BeforeStepHook(Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>);

impl BeforeStepHook {
    /// Wrap an asynchronous hook.
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Self(Rc::new(move || hook().boxed_local()))
    }

    /// Wrap a synchronous hook.
    pub fn from_fn<F>(hook: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self(Rc::new(move || {
            hook();
            futures_util::future::ready(()).boxed_local()
        }))
    }

    /// Invoke the hook.
    pub fn run(&self) -> LocalBoxFuture<'static, ()> {
        (self.0)()
    }
}

impl fmt::Debug for BeforeStepHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BeforeStepHook(..)")
    }
}

/// One stop in a tour.
///
/// Immutable once built; the orchestrator owns the step list for the duration
/// of a run. `H` is the platform element handle type.
pub struct TourStep<H> {
    /// The element to highlight.
    pub target: TourTarget<H>,
    /// Tooltip title.
    pub title: String,
    /// Tooltip body.
    pub content: String,
    /// Preferred tooltip side. `None` uses the orchestrator default.
    pub placement: Option<Placement>,
    /// Optional side effect run before measuring.
    pub before_step: Option<BeforeStepHook>,
}

impl<H> TourStep<H> {
    /// Create a step with default placement and no hook.
    pub fn new(
        target: impl Into<TourTarget<H>>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            title: title.into(),
            content: content.into(),
            placement: None,
            before_step: None,
        }
    }

    /// Set the preferred placement.
    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Run an asynchronous hook before the step is measured.
    #[must_use]
    pub fn on_before_step<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.before_step = Some(BeforeStepHook::new(hook));
        self
    }

    /// Run a synchronous hook before the step is measured.
    #[must_use]
    pub fn on_before_step_sync<F>(mut self, hook: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.before_step = Some(BeforeStepHook::from_fn(hook));
        self
    }

    /// Placement to use, falling back to `default`.
    pub fn placement_or(&self, default: Placement) -> Placement {
        self.placement.unwrap_or(default)
    }
}

impl<H> Clone for TourStep<H> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            placement: self.placement,
            before_step: self.before_step.clone(),
        }
    }
}

impl<H> fmt::Debug for TourStep<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourStep")
            .field("target", &self.target)
            .field("title", &self.title)
            .field("content", &self.content)
            .field("placement", &self.placement)
            .field("before_step", &self.before_step.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn string_targets_are_selectors() {
        let step: TourStep<()> = TourStep::new("#save", "Save", "Saves the document");
        assert!(matches!(step.target, TourTarget::Selector(ref s) if s == "#save"));
        assert_eq!(step.placement_or(Placement::Bottom), Placement::Bottom);
        assert!(step.before_step.is_none());
    }

    #[test]
    fn explicit_placement_wins() {
        let step: TourStep<()> =
            TourStep::new(TourTarget::id("menu"), "Menu", "").placement(Placement::Left);
        assert_eq!(step.placement_or(Placement::Bottom), Placement::Left);
    }

    #[test]
    fn sync_hook_runs_when_invoked() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let step: TourStep<()> =
            TourStep::new("#a", "A", "").on_before_step_sync(move || seen.set(seen.get() + 1));
        let hook = step.before_step.clone().expect("hook");
        assert_eq!(calls.get(), 0);
        futures_executor::block_on(hook.run());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn async_hook_is_awaited() {
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        let step: TourStep<()> = TourStep::new("#a", "A", "").on_before_step(move || {
            let flag = Rc::clone(&flag);
            async move { flag.set(true) }
        });
        let hook = step.before_step.expect("hook");
        let fut = hook.run();
        assert!(!done.get());
        futures_executor::block_on(fut);
        assert!(done.get());
    }

    #[test]
    fn clones_share_hook() {
        let step: TourStep<()> = TourStep::new("#a", "A", "").on_before_step_sync(|| {});
        let copy = step.clone();
        assert!(copy.before_step.is_some());
        assert!(format!("{copy:?}").contains("before_step: true"));
    }
}
