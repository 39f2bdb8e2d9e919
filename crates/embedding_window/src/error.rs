//! Error types for the embedding window manager

use thiserror::Error;

use crate::config::ConfigError;
use crate::handle::WindowHandle;

/// Failure reported by a native windowing call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed (native error {code}): {message}")]
pub struct NativeError {
    /// Name of the native call that failed
    pub operation: &'static str,
    /// Platform error code
    pub code: i32,
    /// Human readable description from the platform
    pub message: String,
}

impl NativeError {
    /// Create a new native error
    pub fn new(operation: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }
}

/// Result type for backend calls
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors surfaced to callers of manager operations
#[derive(Error, Debug)]
pub enum EmbedError {
    /// An underlying native windowing call failed
    #[error("platform window error: {0}")]
    Platform(#[from] NativeError),

    /// The handle has no window record (never created, or already destroyed)
    #[error("unknown embedding window {0}")]
    UnknownWindow(WindowHandle),

    /// The manager configuration was rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl EmbedError {
    /// Native error code, if this error came from the platform
    pub const fn native_code(&self) -> Option<i32> {
        match self {
            Self::Platform(native) => Some(native.code),
            _ => None,
        }
    }
}

/// Result type for manager operations
pub type EmbedResult<T> = Result<T, EmbedError>;

/// A forwarded callback failed
///
/// Never returned from an operation. The dispatcher logs it and carries on so
/// the native message loop is not disturbed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{event} handler for window {window} failed: {reason}")]
pub struct EventForwardingError {
    /// Window the event was destined for
    pub window: WindowHandle,
    /// Handler method that failed
    pub event: &'static str,
    /// Error message or panic payload
    pub reason: String,
}
