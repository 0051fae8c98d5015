#![forbid(unsafe_code)]

//! tourkit public facade crate.
//!
//! Re-exports the types most hosts need and offers a prelude. Platform
//! adapters are behind features:
//!
//! - `web`: [`WebPlatform`] over a [`DomHost`].
//! - `native`: [`NativePlatform`] over a [`NativeHost`].
//! - `tour-config`: load [`TourConfig`] from TOML or JSON.
//!
//! ```ignore
//! use tourkit::prelude::*;
//!
//! let engine = TourEngine::new(platform);
//! engine.set_presenter(|view: &TourView| overlay.render(view));
//! engine.start_tour(
//!     vec![
//!         TourStep::new("#inbox", "Inbox", "New messages land here.")
//!             .placement(Placement::Right),
//!         TourStep::new("#compose", "Compose", "Start a conversation."),
//!     ],
//!     Some("onboarding".into()),
//! );
//! ```

// --- Core re-exports -------------------------------------------------------

pub use tourkit_core::{
    BeforeStepHook, GeometryConfig, Placement, Point, Rect, Size, StepView, TargetRef,
    TourStep, TourTarget, TourView, compute_position,
};

// --- Backend re-exports ----------------------------------------------------

pub use tourkit_backend::{
    FrameHandle, HostScheduler, KeyboardHandlers, PlatformAdapter, ResolvedTarget, StringTargets,
    Subscription, TargetRegistration, TargetRegistry, TargetResolver, TourPresenter,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tourkit_runtime::{
    BackoffStrategy, RetryPolicy, TourConfig, TourConfigError, TourControls, TourEngine,
};

// --- Adapters --------------------------------------------------------------

#[cfg(feature = "web")]
pub use tourkit_web::{DomHost, ScrollIntoViewOptions, WebPlatform, find_visible_element};

#[cfg(feature = "native")]
pub use tourkit_native::{NativeHost, NativeMeasurement, NativeOs, NativePlatform};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        PlatformAdapter, Placement, Rect, Size, TargetRef, TargetRegistry, TourConfig,
        TourControls, TourEngine, TourStep, TourTarget, TourView,
    };

    #[cfg(feature = "web")]
    pub use crate::{DomHost, WebPlatform};

    #[cfg(feature = "native")]
    pub use crate::{NativeHost, NativePlatform};

    pub use crate::{backend, core, runtime};
}

pub use tourkit_backend as backend;
pub use tourkit_core as core;
pub use tourkit_runtime as runtime;
