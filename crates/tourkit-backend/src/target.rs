#![forbid(unsafe_code)]

//! Target resolution and the ID registry used by native view trees.
//!
//! Steps name targets three ways (see [`TourTarget`]). Selectors and direct
//! refs pass straight through to the adapter; string IDs are looked up in a
//! [`TargetRegistry`] that the host populates as views mount and unmount.
//! An ID that is not registered resolves to `None` and the step is treated as
//! absent, exactly like an element that has not rendered yet.
//!
//! View trees without selectors read plain strings as IDs instead
//! ([`StringTargets::RegistryIds`]), so `TourStep::new("welcome-button", ..)`
//! finds the view registered under `"welcome-button"`.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tourkit_core::{TargetRef, TourTarget};

/// A target the adapter can measure.
pub enum ResolvedTarget<H> {
    /// A selector, matched by the adapter.
    Selector(String),
    /// A (possibly still unattached) element ref.
    Handle(TargetRef<H>),
}

impl<H> ResolvedTarget<H> {
    /// The selector, if this is one.
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::Selector(s) => Some(s),
            Self::Handle(_) => None,
        }
    }

    /// The element ref, if this is one.
    pub fn target_ref(&self) -> Option<&TargetRef<H>> {
        match self {
            Self::Selector(_) => None,
            Self::Handle(r) => Some(r),
        }
    }

    /// Human-readable description for logs.
    pub fn describe(&self) -> Cow<'_, str> {
        match self {
            Self::Selector(s) => Cow::Owned(format!("selector:{s}")),
            Self::Handle(r) if r.is_attached() => Cow::Borrowed("ref:attached"),
            Self::Handle(_) => Cow::Borrowed("ref:detached"),
        }
    }
}

impl<H: Clone> ResolvedTarget<H> {
    /// The attached element, for ref targets.
    pub fn handle(&self) -> Option<H> {
        self.target_ref().and_then(TargetRef::get)
    }
}

impl<H> Clone for ResolvedTarget<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Selector(s) => Self::Selector(s.clone()),
            Self::Handle(r) => Self::Handle(r.clone()),
        }
    }
}

impl<H> fmt::Debug for ResolvedTarget<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Handle(r) => f.debug_tuple("Handle").field(r).finish(),
        }
    }
}

type Entries<H> = RefCell<HashMap<String, TargetRef<H>>>;

/// Shared map from string IDs to element refs.
///
/// Clones share the same map. The registry is an explicitly passed service:
/// create one per tour surface and hand clones to the adapter and to the
/// components that register targets.
pub struct TargetRegistry<H> {
    entries: Rc<Entries<H>>,
}

impl<H> TargetRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Register `target` under `id`, returning the ref it replaced.
    pub fn register(&self, id: impl Into<String>, target: TargetRef<H>) -> Option<TargetRef<H>> {
        self.entries.borrow_mut().insert(id.into(), target)
    }

    /// Remove `id`, returning its ref.
    pub fn unregister(&self, id: &str) -> Option<TargetRef<H>> {
        self.entries.borrow_mut().remove(id)
    }

    /// Look up `id`.
    pub fn get(&self, id: &str) -> Option<TargetRef<H>> {
        self.entries.borrow().get(id).cloned()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Number of registered IDs.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Register `target` for as long as the returned guard lives.
    ///
    /// The guard only removes the entry if it still points at `target`, so a
    /// component that re-registers the same ID is not clobbered by the old
    /// guard's drop.
    pub fn register_scoped(
        &self,
        id: impl Into<String>,
        target: TargetRef<H>,
    ) -> TargetRegistration<H> {
        let id = id.into();
        self.register(id.clone(), target.clone());
        TargetRegistration {
            entries: Rc::downgrade(&self.entries),
            id,
            target,
        }
    }

    /// Create a fresh ref, register it, and return both.
    pub fn register_new(&self, id: impl Into<String>) -> (TargetRef<H>, TargetRegistration<H>) {
        let target = TargetRef::new();
        let registration = self.register_scoped(id, target.clone());
        (target, registration)
    }
}

impl<H> Default for TargetRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for TargetRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<H> fmt::Debug for TargetRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.entries.borrow().keys().cloned().collect();
        ids.sort();
        f.debug_struct("TargetRegistry").field("ids", &ids).finish()
    }
}

/// Keeps an ID registered until dropped.
#[must_use = "dropping a TargetRegistration unregisters the target"]
pub struct TargetRegistration<H> {
    entries: Weak<Entries<H>>,
    id: String,
    target: TargetRef<H>,
}

impl<H> TargetRegistration<H> {
    /// The registered ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The registered ref.
    pub fn target(&self) -> &TargetRef<H> {
        &self.target
    }
}

impl<H> Drop for TargetRegistration<H> {
    fn drop(&mut self) {
        let Some(entries) = self.entries.upgrade() else {
            return;
        };
        let mut entries = entries.borrow_mut();
        if entries
            .get(&self.id)
            .is_some_and(|current| current.ptr_eq(&self.target))
        {
            entries.remove(&self.id);
        }
    }
}

impl<H> fmt::Debug for TargetRegistration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistration")
            .field("id", &self.id)
            .finish()
    }
}

/// How a resolver reads plain-string targets ([`TourTarget::Selector`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringTargets {
    /// Passed to the adapter as selectors.
    #[default]
    Selectors,
    /// Looked up in the registry, like [`TourTarget::Id`].
    RegistryIds,
}

/// Turns step targets into something an adapter can measure.
pub struct TargetResolver<H> {
    registry: Option<TargetRegistry<H>>,
    strings: StringTargets,
}

impl<H> TargetResolver<H> {
    /// Resolver without a registry; ID targets never resolve.
    pub fn new() -> Self {
        Self {
            registry: None,
            strings: StringTargets::Selectors,
        }
    }

    /// Resolver that looks IDs up in `registry`.
    pub fn with_registry(registry: TargetRegistry<H>) -> Self {
        Self {
            registry: Some(registry),
            strings: StringTargets::Selectors,
        }
    }

    /// Set how plain-string targets are read.
    #[must_use]
    pub fn strings_as(mut self, strings: StringTargets) -> Self {
        self.strings = strings;
        self
    }

    /// How plain-string targets are read.
    pub fn string_targets(&self) -> StringTargets {
        self.strings
    }

    /// The injected registry, if any.
    pub fn registry(&self) -> Option<&TargetRegistry<H>> {
        self.registry.as_ref()
    }

    /// Resolve `target`; `None` when an ID is unknown or no registry exists.
    pub fn resolve(&self, target: &TourTarget<H>) -> Option<ResolvedTarget<H>> {
        match target {
            TourTarget::Selector(s) => match self.strings {
                StringTargets::Selectors => Some(ResolvedTarget::Selector(s.clone())),
                StringTargets::RegistryIds => self.lookup(s),
            },
            TourTarget::Ref(r) => Some(ResolvedTarget::Handle(r.clone())),
            TourTarget::Id(id) => self.lookup(id),
        }
    }

    fn lookup(&self, id: &str) -> Option<ResolvedTarget<H>> {
        let found = self.registry.as_ref().and_then(|registry| registry.get(id));
        if found.is_none() {
            tracing::debug!(target_id = %id, "tour target id not registered");
        }
        found.map(ResolvedTarget::Handle)
    }
}

impl<H> Default for TargetResolver<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for TargetResolver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetResolver")
            .field("registry", &self.registry)
            .field("strings", &self.strings)
            .finish()
    }
}
