#![forbid(unsafe_code)]

//! Tour orchestration engine for tourkit.
//!
//! [`TourEngine`] owns the step state machine and drives any
//! [`PlatformAdapter`](tourkit_backend::PlatformAdapter): it resolves each
//! step's target, waits out navigation and scrolling, retries measurement
//! until layout settles, and places the tooltip with
//! [`compute_position`](tourkit_core::compute_position).
//!
//! # Example
//!
//! ```ignore
//! use tourkit_core::TourStep;
//! use tourkit_runtime::TourEngine;
//!
//! let engine = TourEngine::new(platform);
//! engine.set_presenter(|view: &tourkit_core::TourView| render(view));
//! engine.on_tour_end(|id| println!("finished {id:?}"));
//! engine.start_tour(
//!     vec![
//!         TourStep::new("#new-doc", "Create", "Start a new document here."),
//!         TourStep::new("#share", "Share", "Invite collaborators."),
//!     ],
//!     Some("onboarding".into()),
//! );
//! ```

pub mod cancellation;
pub mod config;
pub mod engine;
mod frame;
pub mod retry;
pub mod state;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{TourConfig, TourConfigError};
pub use engine::{TourControls, TourEngine};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use state::{TourRunState, Transition};
