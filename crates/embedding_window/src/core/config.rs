//! # Manager Configuration
//!
//! Settings that shape the process-wide state of an embedding window manager:
//! the native window class it registers, the hidden container window, and the
//! double-click timing applied when the class is first registered.
//!
//! Configuration can be built in code with the `with_*` methods or loaded from
//! a TOML or RON file through the [`Config`] trait.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Double-click interval that matches GTK's default
pub const DEFAULT_DOUBLE_CLICK_TIME_MS: u32 = 250;

/// # Embedding Window Manager Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name the native window class is registered under
    pub window_class_name: String,
    /// Title of the hidden container window
    pub hidden_window_title: String,
    /// System double-click time to apply at initialization, if any
    ///
    /// A config file that omits the key gets the GTK-matching default. In a
    /// file, `0` stands for `None` (leave the system setting alone).
    #[serde(with = "zero_means_unset")]
    pub double_click_time_ms: Option<u32>,
    /// Log level used when the host does not set `RUST_LOG`
    pub log_level: String,
}

impl ManagerConfig {
    /// Create a configuration with the default class name
    pub fn new() -> Self {
        Self {
            window_class_name: "Embedding Window".to_string(),
            hidden_window_title: "Embedding Window".to_string(),
            double_click_time_ms: Some(DEFAULT_DOUBLE_CLICK_TIME_MS),
            log_level: "info".to_string(),
        }
    }

    /// Set the window class name
    pub fn with_window_class_name(mut self, name: impl Into<String>) -> Self {
        self.window_class_name = name.into();
        self
    }

    /// Set the hidden container window title
    pub fn with_hidden_window_title(mut self, title: impl Into<String>) -> Self {
        self.hidden_window_title = title.into();
        self
    }

    /// Set, or with `None` leave alone, the system double-click time
    pub const fn with_double_click_time(mut self, millis: Option<u32>) -> Self {
        self.double_click_time_ms = millis;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_class_name.trim().is_empty() {
            return Err(ConfigError::Invalid("window class name cannot be empty".to_string()));
        }

        // Win32 class names are limited to 256 characters
        if self.window_class_name.chars().count() > 256 {
            return Err(ConfigError::Invalid(format!(
                "window class name is {} characters, the limit is 256",
                self.window_class_name.chars().count()
            )));
        }

        if self.double_click_time_ms == Some(0) {
            return Err(ConfigError::Invalid("double-click time must be at least 1 ms".to_string()));
        }

        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }

        Ok(())
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ManagerConfig {}

/// Stores `Option<u32>` as a plain integer with `0` for `None`
///
/// TOML has no null, so a skipped `None` would come back as the default.
mod zero_means_unset {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(value.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let millis = u32::deserialize(deserializer)?;
        Ok((millis != 0).then_some(millis))
    }
}
