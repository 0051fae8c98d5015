#![forbid(unsafe_code)]

//! Host-driven scheduler: virtual clock, timers, frame queue, and a local
//! executor.
//!
//! Adapters for environments without a Rust event loop (a browser driven from
//! JS glue, a native view tree driven from its UI thread) own a
//! [`HostScheduler`] and let the host push time forward:
//!
//! - [`advance`](HostScheduler::advance) moves the clock and fires due timers
//!   in deadline order, running tasks after each one.
//! - [`run_frame`](HostScheduler::run_frame) runs the queued frame callbacks
//!   (the host's "before paint" tick).
//! - [`run_until_stalled`](HostScheduler::run_until_stalled) polls every task
//!   that can make progress without time passing.
//!
//! Nothing reads a wall clock, so the same sequence of host calls always
//! produces the same sequence of task steps.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use futures_executor::{LocalPool, LocalSpawner};
use futures_util::future::LocalBoxFuture;
use futures_util::task::LocalSpawnExt;

use crate::FrameHandle;

struct Timer {
    deadline: Duration,
    waker: Waker,
}

struct SchedulerInner {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    timers: RefCell<BTreeMap<u64, Timer>>,
    frames: RefCell<Vec<(u64, Box<dyn FnOnce()>)>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl SchedulerInner {
    fn alloc_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }
}

/// Deterministic single-threaded scheduler shared by host-driven adapters.
///
/// Clones share the same clock, queues, and executor.
#[derive(Clone)]
pub struct HostScheduler {
    inner: Rc<SchedulerInner>,
}

impl HostScheduler {
    /// Create a scheduler with the clock at zero.
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(SchedulerInner {
                now: Cell::new(Duration::ZERO),
                next_id: Cell::new(0),
                timers: RefCell::new(BTreeMap::new()),
                frames: RefCell::new(Vec::new()),
                pool: RefCell::new(pool),
                spawner,
            }),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    /// A future that completes once the clock reaches `now + duration`.
    pub fn delay(&self, duration: Duration) -> Delay {
        Delay {
            scheduler: Rc::downgrade(&self.inner),
            deadline: self.now().saturating_add(duration),
            id: self.inner.alloc_id(),
        }
    }

    /// Queue a task on the local executor.
    ///
    /// The task first runs on the next [`run_until_stalled`](Self::run_until_stalled).
    pub fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.inner.spawner.spawn_local(task) {
            tracing::error!(error = %err, "host scheduler rejected task");
        }
    }

    /// Queue `callback` for the next [`run_frame`](Self::run_frame).
    pub fn schedule_frame(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        let id = self.inner.alloc_id();
        self.inner.frames.borrow_mut().push((id, callback));
        tracing::trace!(frame_id = id, "frame scheduled");
        FrameHandle::new(id)
    }

    /// Drop a queued frame callback. Unknown or already-run handles are ignored.
    pub fn cancel_frame(&self, handle: FrameHandle) {
        let mut frames = self.inner.frames.borrow_mut();
        let before = frames.len();
        frames.retain(|(id, _)| *id != handle.id());
        if frames.len() != before {
            tracing::trace!(frame_id = handle.id(), "frame cancelled");
        }
    }

    /// Poll every runnable task until none can make progress.
    ///
    /// Re-entrant calls (from inside a task) are ignored.
    pub fn run_until_stalled(&self) {
        match self.inner.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => tracing::trace!("run_until_stalled re-entered; ignoring"),
        }
    }

    /// Run the frame callbacks queued so far, then any tasks they woke.
    ///
    /// Callbacks queued while this runs wait for the next frame. Returns the
    /// number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let frames = std::mem::take(&mut *self.inner.frames.borrow_mut());
        let count = frames.len();
        for (_, callback) in frames {
            callback();
        }
        self.run_until_stalled();
        count
    }

    /// Move the clock forward by `dt`, firing timers in deadline order.
    pub fn advance(&self, dt: Duration) {
        let target = self.now().saturating_add(dt);
        while let Some(deadline) = self.next_deadline().filter(|d| *d <= target) {
            if deadline > self.now() {
                self.inner.now.set(deadline);
            }
            self.fire_due_timers();
            self.run_until_stalled();
        }
        self.inner.now.set(target);
        self.run_until_stalled();
    }

    /// Drive tasks, frames, and timers until nothing is left to do.
    ///
    /// Each round runs stalled tasks, then either one frame or the clock jump
    /// to the next timer. Returns `false` if `max_rounds` was reached with
    /// work still pending. Tasks blocked on something other than a timer or a
    /// frame (a host reply, say) do not count as pending.
    pub fn run_until_idle(&self, max_rounds: usize) -> bool {
        for _ in 0..max_rounds {
            self.run_until_stalled();
            if self.pending_frames() > 0 {
                self.run_frame();
                continue;
            }
            match self.next_deadline() {
                Some(deadline) => self.advance(deadline.saturating_sub(self.now())),
                None => return true,
            }
        }
        false
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .timers
            .borrow()
            .values()
            .map(|timer| timer.deadline)
            .min()
    }

    /// Number of registered timers.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Number of queued frame callbacks.
    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    fn fire_due_timers(&self) {
        let now = self.now();
        let wakers: Vec<Waker> = {
            let mut timers = self.inner.timers.borrow_mut();
            let due: Vec<u64> = timers
                .iter()
                .filter(|(_, timer)| timer.deadline <= now)
                .map(|(id, _)| *id)
                .collect();
            due.into_iter()
                .filter_map(|id| timers.remove(&id))
                .map(|timer| timer.waker)
                .collect()
        };
        for waker in wakers {
            waker.wake();
        }
    }
}

impl Default for HostScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostScheduler")
            .field("now", &self.now())
            .field("pending_timers", &self.pending_timers())
            .field("pending_frames", &self.pending_frames())
            .finish()
    }
}

/// Timer future returned by [`HostScheduler::delay`].
///
/// Dropping it removes its registration. If the scheduler is gone the delay
/// completes immediately.
#[must_use = "futures do nothing unless polled"]
pub struct Delay {
    scheduler: Weak<SchedulerInner>,
    deadline: Duration,
    id: u64,
}

impl Delay {
    /// Virtual time at which the delay completes.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(inner) = self.scheduler.upgrade() else {
            return Poll::Ready(());
        };
        if inner.now.get() >= self.deadline {
            inner.timers.borrow_mut().remove(&self.id);
            return Poll::Ready(());
        }
        inner.timers.borrow_mut().insert(
            self.id,
            Timer {
                deadline: self.deadline,
                waker: cx.waker().clone(),
            },
        );
        Poll::Pending
    }
}

impl Drop for Delay {
    fn drop(&mut self) {
        if let Some(inner) = self.scheduler.upgrade() {
            inner.timers.borrow_mut().remove(&self.id);
        }
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delay")
            .field("deadline", &self.deadline)
            .finish()
    }
}
