#![forbid(unsafe_code)]

//! RAII subscriptions and the listener lists adapters keep behind them.
//!
//! A [`Subscription`] owns a teardown closure and runs it exactly once, when
//! [`Subscription::unsubscribe`] is called or the guard is dropped. A
//! [`SubscriberList`] hands out such guards for each listener it stores.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Guard that tears a subscription down when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown closure.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Whether teardown is still pending.
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Tear down now.
    pub fn unsubscribe(mut self) {
        self.run_teardown();
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct ListInner<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Rc<T>)>,
}

/// Shared list of listeners.
///
/// Notification goes through [`snapshot`](Self::snapshot) so that listeners
/// may subscribe or unsubscribe while being notified.
pub struct SubscriberList<T: ?Sized> {
    inner: Rc<RefCell<ListInner<T>>>,
}

impl<T: ?Sized + 'static> SubscriberList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Add a listener; dropping the returned guard removes it.
    pub fn subscribe(&self, listener: Rc<T>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push((id, listener));
            id
        };
        let weak: Weak<RefCell<ListInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Current listeners, in subscription order.
    pub fn snapshot(&self) -> Vec<Rc<T>> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for SubscriberList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for SubscriberList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> fmt::Debug for SubscriberList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.inner.borrow().entries.len())
            .finish()
    }
}
