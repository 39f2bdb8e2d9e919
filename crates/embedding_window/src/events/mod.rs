//! Event forwarding between native windows and the host
//! Key principles:
//! - Native messages are translated into a small closed set (`NativeMessage`)
//! - Handlers report failure through `HandlerResult`, never by unwinding the loop
//! - The router decides whether the platform's default handling still applies

use std::error::Error;

use crate::handle::WindowHandle;

/// Error type handlers may return
pub type HandlerError = Box<dyn Error>;

/// Result type returned by every handler method
pub type HandlerResult = Result<(), HandlerError>;

/// Host-side recipient of events for one embedding window
///
/// Methods run synchronously on the thread that owns the window's message
/// queue. A handler may call back into the manager, including destroying its
/// own window.
pub trait EventTarget {
    /// Pointer moved to window-relative `(x, y)`
    fn on_mouse_move(&self, x: i32, y: i32) -> HandlerResult;

    /// The window needs painting
    ///
    /// Call `EmbeddingWindowManager::paint_black` from here to fill the
    /// invalid region before a renderer takes over.
    fn on_paint(&self) -> HandlerResult;

    /// Primary button double-clicked at window-relative `(x, y)`
    fn on_double_click(&self, x: i32, y: i32) -> HandlerResult;
}

/// Native window message, reduced to what the manager cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMessage {
    /// Pointer moved inside the window
    PointerMove {
        /// Window-relative X coordinate
        x: i32,
        /// Window-relative Y coordinate
        y: i32,
    },
    /// Part of the window was invalidated and must be repainted
    Paint,
    /// Primary button double click
    DoubleClick {
        /// Window-relative X coordinate
        x: i32,
        /// Window-relative Y coordinate
        y: i32,
    },
    /// The window is being destroyed, directly or along with an ancestor
    ///
    /// The handle dies once routing returns.
    Destroyed,
    /// Any other message, identified by its platform code
    Other {
        /// Platform message identifier
        code: u32,
    },
}

/// What the backend should do after routing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDisposition {
    /// The manager consumed the message
    Handled,
    /// Apply the platform's default handling
    Default,
}

/// Receives translated messages from a windowing backend
pub trait MessageRouter {
    /// Route one message for `window`
    fn route(&self, window: WindowHandle, message: NativeMessage) -> MessageDisposition;
}

/// Event delivered to an `EventTarget`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForwardedEvent {
    MouseMove { x: i32, y: i32 },
    Paint,
    DoubleClick { x: i32, y: i32 },
}

impl ForwardedEvent {
    /// Name of the handler method this event calls
    pub(crate) const fn method_name(self) -> &'static str {
        match self {
            Self::MouseMove { .. } => "on_mouse_move",
            Self::Paint => "on_paint",
            Self::DoubleClick { .. } => "on_double_click",
        }
    }

    pub(crate) fn deliver(self, target: &dyn EventTarget) -> HandlerResult {
        match self {
            Self::MouseMove { x, y } => target.on_mouse_move(x, y),
            Self::Paint => target.on_paint(),
            Self::DoubleClick { x, y } => target.on_double_click(x, y),
        }
    }
}
