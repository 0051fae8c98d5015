#![forbid(unsafe_code)]

//! Core types for tourkit guided tours.
//!
//! Everything in this crate is platform-independent: viewport geometry,
//! the pure tooltip placement solver, the step/target model, and the
//! snapshot type handed to presentation layers. Platform specifics live
//! behind `tourkit-backend`.

pub mod geometry;
pub mod placement;
pub mod step;
pub mod target;
pub mod view;

pub use geometry::{Point, Rect, Size};
pub use placement::{GeometryConfig, Placement, compute_position};
pub use step::{BeforeStepHook, TourStep};
pub use target::{TargetRef, TourTarget};
pub use view::{StepView, TourView};
