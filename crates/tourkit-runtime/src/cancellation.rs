#![forbid(unsafe_code)]

//! Cooperative cancellation for step and positioning tasks.
//!
//! Every step transition starts a new generation: the previous
//! [`CancellationSource`] is cancelled and tasks holding its tokens stop at
//! their next check. Positioning passes use child sources, so cancelling a
//! step also cancels every pass started for it, while a layout change can
//! cancel just the in-flight pass.
//!
//! Tokens are single-threaded (`Rc`/`Cell`); all tour work runs on the host's
//! UI thread.
//!
//! # Example
//!
//! ```
//! use tourkit_runtime::cancellation::CancellationSource;
//!
//! let step = CancellationSource::new();
//! let pass = CancellationSource::child(&step.token());
//! let token = pass.token();
//!
//! step.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

struct Node {
    cancelled: Cell<bool>,
    parent: Option<Rc<Node>>,
}

impl Node {
    fn is_cancelled(&self) -> bool {
        let mut node = self;
        loop {
            if node.cancelled.get() {
                return true;
            }
            match &node.parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }
}

/// The control handle that triggers cancellation.
///
/// Dropping the source does **not** cancel its tokens; call
/// [`cancel`](Self::cancel) explicitly.
pub struct CancellationSource {
    node: Rc<Node>,
}

impl CancellationSource {
    /// Create a root source.
    pub fn new() -> Self {
        Self {
            node: Rc::new(Node {
                cancelled: Cell::new(false),
                parent: None,
            }),
        }
    }

    /// Create a source whose tokens also observe `parent`.
    pub fn child(parent: &CancellationToken) -> Self {
        Self {
            node: Rc::new(Node {
                cancelled: Cell::new(false),
                parent: Some(Rc::clone(&parent.node)),
            }),
        }
    }

    /// Obtain a token observing this source (and its ancestors).
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            node: Rc::clone(&self.node),
        }
    }

    /// Signal cancellation to every token derived from this source.
    pub fn cancel(&self) {
        self.node.cancelled.set(true);
    }

    /// Whether this source or an ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A cloneable view of a source's cancellation state.
#[derive(Clone)]
pub struct CancellationToken {
    node: Rc<Node>,
}

impl CancellationToken {
    /// Returns `true` if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
