//! # Core Module
//!
//! Shared configuration for the embedding window manager.

pub mod config;

pub use config::{Config, ConfigError, ManagerConfig, DEFAULT_DOUBLE_CLICK_TIME_MS};
