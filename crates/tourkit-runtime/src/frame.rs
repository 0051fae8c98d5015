#![forbid(unsafe_code)]

//! Await the platform's next frame.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tourkit_backend::{FrameHandle, PlatformAdapter};

#[derive(Default)]
struct FrameSlot {
    fired: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

/// Completes once the adapter runs a frame scheduled on first poll.
///
/// Dropping it before then cancels the frame.
pub(crate) struct NextFrame<'a, P: PlatformAdapter> {
    adapter: &'a P,
    slot: Rc<FrameSlot>,
    handle: Option<FrameHandle>,
}

impl<'a, P: PlatformAdapter> NextFrame<'a, P> {
    pub(crate) fn new(adapter: &'a P) -> Self {
        Self {
            adapter,
            slot: Rc::new(FrameSlot::default()),
            handle: None,
        }
    }
}

impl<P: PlatformAdapter> Future for NextFrame<'_, P> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.slot.fired.get() {
            this.handle = None;
            return Poll::Ready(());
        }
        *this.slot.waker.borrow_mut() = Some(cx.waker().clone());
        if this.handle.is_none() {
            let slot = Rc::clone(&this.slot);
            this.handle = Some(this.adapter.schedule_frame(Box::new(move || {
                slot.fired.set(true);
                let waker = slot.waker.borrow_mut().take();
                if let Some(waker) = waker {
                    waker.wake();
                }
            })));
            if this.slot.fired.get() {
                this.handle = None;
                return Poll::Ready(());
            }
        }
        Poll::Pending
    }
}

impl<P: PlatformAdapter> Drop for NextFrame<'_, P> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !self.slot.fired.get() {
                self.adapter.cancel_frame(handle);
            }
        }
    }
}
