#![forbid(unsafe_code)]

//! Tour targets: how a step names the element it highlights.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A late-bound, shared slot holding a platform element handle.
///
/// Hosts create a `TargetRef`, hand clones to tour steps or a registry, and
/// [`attach`](Self::attach) the handle once the element is mounted. All
/// clones observe the same slot. An unattached ref measures as absent.
pub struct TargetRef<H> {
    slot: Rc<RefCell<Option<H>>>,
}

impl<H> TargetRef<H> {
    /// Create an unattached ref.
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// Create a ref already attached to `handle`.
    pub fn with_handle(handle: H) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(handle))),
        }
    }

    /// Attach (or replace) the handle.
    pub fn attach(&self, handle: H) {
        *self.slot.borrow_mut() = Some(handle);
    }

    /// Detach the handle, returning the previous one.
    pub fn detach(&self) -> Option<H> {
        self.slot.borrow_mut().take()
    }

    /// Whether a handle is currently attached.
    pub fn is_attached(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Whether two refs share the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<H: Clone> TargetRef<H> {
    /// The attached handle, if any.
    pub fn get(&self) -> Option<H> {
        self.slot.borrow().clone()
    }
}

impl<H> Clone for TargetRef<H> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<H> Default for TargetRef<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for TargetRef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRef")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// The element a step highlights.
pub enum TourTarget<H> {
    /// A CSS selector; resolved by DOM adapters.
    Selector(String),
    /// A string ID registered in a target registry.
    Id(String),
    /// A direct reference to an element.
    Ref(TargetRef<H>),
}

impl<H> TourTarget<H> {
    /// Target a CSS selector.
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector(selector.into())
    }

    /// Target a registered ID.
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Human-readable description for logs.
    pub fn describe(&self) -> Cow<'_, str> {
        match self {
            Self::Selector(s) => Cow::Owned(format!("selector:{s}")),
            Self::Id(id) => Cow::Owned(format!("id:{id}")),
            Self::Ref(r) if r.is_attached() => Cow::Borrowed("ref:attached"),
            Self::Ref(_) => Cow::Borrowed("ref:detached"),
        }
    }
}

impl<H> From<&str> for TourTarget<H> {
    /// Plain strings are selectors. Resolvers for view trees without
    /// selectors read them as registered IDs instead.
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl<H> From<TargetRef<H>> for TourTarget<H> {
    fn from(r: TargetRef<H>) -> Self {
        Self::Ref(r)
    }
}

impl<H> Clone for TourTarget<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Selector(s) => Self::Selector(s.clone()),
            Self::Id(id) => Self::Id(id.clone()),
            Self::Ref(r) => Self::Ref(r.clone()),
        }
    }
}

impl<H> fmt::Debug for TourTarget<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
        }
    }
}
