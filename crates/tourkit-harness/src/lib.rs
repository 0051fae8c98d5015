#![forbid(unsafe_code)]

//! Test harness for tourkit.
//!
//! - [`ScriptedPlatform`]: a [`PlatformAdapter`](tourkit_backend::PlatformAdapter)
//!   whose measurements are scripted per target and whose time only moves
//!   when the test says so.
//! - [`init_test_logging`]: route `tracing` output to the test writer,
//!   filtered by `RUST_LOG`.

pub mod logging;
pub mod scripted;

pub use logging::init_test_logging;
pub use scripted::{CallLog, Response, ScriptedPlatform};
