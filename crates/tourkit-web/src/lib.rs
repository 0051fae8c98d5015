#![forbid(unsafe_code)]

//! `tourkit-web` provides a DOM [`PlatformAdapter`](tourkit_backend::PlatformAdapter)
//! for tourkit.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS glue) implements
//!   [`DomHost`] and forwards `keydown`, `resize`, `scroll`, and
//!   `requestAnimationFrame` into [`WebPlatform`].
//! - **Deterministic time**: timers and frames run on a
//!   [`HostScheduler`](tourkit_backend::HostScheduler) the host advances.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`; the glue layer owns the
//! `web_sys` calls.

pub mod dom;
pub mod platform;

pub use dom::{
    DomHost, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, find_visible_element,
};
pub use platform::WebPlatform;
