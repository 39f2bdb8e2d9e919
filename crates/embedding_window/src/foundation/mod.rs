//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Collections backing the headless window table
//! - Logging utilities

pub mod collections;
pub mod logging;
