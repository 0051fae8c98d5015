#![forbid(unsafe_code)]

//! Native view-tree adapter for tourkit.
//!
//! The host UI toolkit implements [`NativeHost`]; [`NativePlatform`] turns it
//! into a [`PlatformAdapter`](tourkit_backend::PlatformAdapter). Targets are
//! string IDs registered in a [`TargetRegistry`](tourkit_backend::TargetRegistry)
//! (see [`NativePlatform::register_target`]) or direct refs. Plain strings
//! such as `TourStep::new("welcome-button", ..)` are read as IDs, since there
//! are no selectors on native.
//!
//! The host forwards platform events:
//!
//! | Platform event                   | Call                                     |
//! |----------------------------------|------------------------------------------|
//! | Android `hardwareBackPress`      | [`NativePlatform::hardware_back_press`]  |
//! | window dimension change          | [`NativePlatform::dimensions_changed`]   |
//! | tooltip `onLayout`               | [`NativePlatform::report_tooltip_layout`]|
//! | vsync / animation frame          | [`NativePlatform::animation_frame`]      |
//! | timer tick                       | [`NativePlatform::advance`]              |

pub mod host;
pub mod platform;

pub use host::{MeasureReply, NativeHost, NativeMeasurement, NativeOs};
pub use platform::NativePlatform;
