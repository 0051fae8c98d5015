#![forbid(unsafe_code)]

//! Tunables for the tour orchestrator.
//!
//! [`TourConfig::default()`] reproduces the stock timing: 100 ms settle after
//! a `before_step` hook, 350 ms for smooth scrolling, 50 ms before the first
//! positioning attempt, and up to 20 attempts 100 ms apart.
//!
//! # Loading
//!
//! With the `tour-config` feature, configs load from TOML or JSON. Omitted
//! fields keep their defaults and the result is validated.
//!
//! ```toml
//! scroll_settle_ms = 500
//! default_placement = "top"
//!
//! [positioning]
//! max_attempts = 30
//! backoff = { kind = "fixed", delay_ms = 50 }
//!
//! [geometry]
//! padding = 12.0
//! ```
//!
//! ```rust,ignore
//! let config = TourConfig::from_toml_file("tour.toml")?;
//! ```

use std::error::Error as StdError;
#[cfg(feature = "tour-config")]
use std::path::Path;
use std::time::Duration;

use tourkit_core::{GeometryConfig, Placement};

use crate::retry::{BackoffStrategy, RetryPolicy};

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "tour-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "tour-config", serde(default))]
pub struct TourConfig {
    /// Wait after a `before_step` hook completes, before measuring.
    pub before_step_settle_ms: u64,
    /// Wait after scrolling a target into view.
    pub scroll_settle_ms: u64,
    /// Wait before the first attempt of a step's positioning pass.
    pub initial_position_delay_ms: u64,
    /// Attempt bound and backoff for positioning passes.
    pub positioning: RetryPolicy,
    /// Placement for steps that do not choose one.
    pub default_placement: Placement,
    /// Placement solver tunables.
    pub geometry: GeometryConfig,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            before_step_settle_ms: 100,
            scroll_settle_ms: 350,
            initial_position_delay_ms: 50,
            positioning: RetryPolicy::default(),
            default_placement: Placement::Bottom,
            geometry: GeometryConfig::default(),
        }
    }
}

impl TourConfig {
    /// Set the post-hook settle delay.
    #[must_use]
    pub fn before_step_settle(mut self, delay: Duration) -> Self {
        self.before_step_settle_ms = duration_ms(delay);
        self
    }

    /// Set the post-scroll settle delay.
    #[must_use]
    pub fn scroll_settle(mut self, delay: Duration) -> Self {
        self.scroll_settle_ms = duration_ms(delay);
        self
    }

    /// Set the delay before a step's first positioning attempt.
    #[must_use]
    pub fn initial_position_delay(mut self, delay: Duration) -> Self {
        self.initial_position_delay_ms = duration_ms(delay);
        self
    }

    /// Set the positioning retry policy.
    #[must_use]
    pub fn positioning(mut self, policy: RetryPolicy) -> Self {
        self.positioning = policy;
        self
    }

    /// Set the default placement.
    #[must_use]
    pub fn default_placement(mut self, placement: Placement) -> Self {
        self.default_placement = placement;
        self
    }

    /// Set the placement solver tunables.
    #[must_use]
    pub fn geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Zero every delay. Useful when the host has no notion of time.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.before_step_settle_ms = 0;
        self.scroll_settle_ms = 0;
        self.initial_position_delay_ms = 0;
        self.positioning.backoff = BackoffStrategy::Fixed { delay_ms: 0 };
        self
    }

    /// Post-hook settle delay.
    pub fn before_step_settle_delay(&self) -> Duration {
        Duration::from_millis(self.before_step_settle_ms)
    }

    /// Post-scroll settle delay.
    pub fn scroll_settle_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    /// Delay before a step's first positioning attempt.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_position_delay_ms)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.positioning.max_attempts == 0 {
            errors.push("positioning.max_attempts must be at least 1".to_owned());
        }
        match self.positioning.backoff {
            BackoffStrategy::Exponential { base_ms, max_ms }
            | BackoffStrategy::Linear { base_ms, max_ms }
                if max_ms < base_ms =>
            {
                errors.push(format!(
                    "positioning.backoff.max_ms ({max_ms}) must be >= base_ms ({base_ms})"
                ));
            }
            _ => {}
        }

        let geometry = &self.geometry;
        if !(geometry.padding.is_finite() && geometry.padding >= 0.0) {
            errors.push(format!(
                "geometry.padding must be finite and >= 0, got {}",
                geometry.padding
            ));
        }
        for (name, value) in [
            ("desktop_width", geometry.desktop_width),
            ("mobile_width", geometry.mobile_width),
            ("default_height", geometry.default_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("geometry.{name} must be finite and > 0, got {value}"));
            }
        }
        if !(geometry.mobile_breakpoint.is_finite() && geometry.mobile_breakpoint >= 0.0) {
            errors.push(format!(
                "geometry.mobile_breakpoint must be finite and >= 0, got {}",
                geometry.mobile_breakpoint
            ));
        }

        errors
    }

    /// Return `self` if it validates cleanly.
    pub fn validated(self) -> Result<Self, TourConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(TourConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "tour-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, TourConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| TourConfigError::Toml(Box::new(e)))?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "tour-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TourConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "tour-config")]
    pub fn from_json_str(s: &str) -> Result<Self, TourConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| TourConfigError::Json(Box::new(e)))?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "tour-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TourConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Errors that can occur when loading a tour configuration.
#[derive(Debug, thiserror::Error)]
pub enum TourConfigError {
    /// I/O error reading a file.
    #[error("failed to read tour config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("invalid TOML tour config: {0}")]
    Toml(#[source] Box<dyn StdError + Send + Sync>),
    /// JSON parse error.
    #[error("invalid JSON tour config: {0}")]
    Json(#[source] Box<dyn StdError + Send + Sync>),
    /// Validation errors.
    #[error("tour config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}
