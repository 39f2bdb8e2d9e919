//! Backend-agnostic native windowing trait
//!
//! Every platform call the manager makes goes through [`WindowingBackend`].
//! The manager owns the bookkeeping (records, lazy initialization, event
//! de-duplication); a backend only performs native operations and feeds
//! translated messages to the bound [`MessageRouter`].
//!
//! # Re-entrancy
//! A backend may deliver messages to the router synchronously from inside any
//! of these calls, the way `ShowWindow` or `DestroyWindow` send messages on
//! Win32. Implementations must not hold internal borrows while routing.

use std::rc::Weak;

use crate::error::NativeResult;
use crate::events::MessageRouter;
use crate::handle::{WindowHandle, WindowRect};

pub mod headless;

#[cfg(windows)]
#[allow(unsafe_code)]
pub mod win32;

/// Native operations needed to host embedding windows
///
/// # Thread Safety
/// Native windows belong to the thread that created them. Implementations are
/// expected to be used from that thread only, which is why no method requires
/// `Send` or `Sync`.
pub trait WindowingBackend {
    /// Install the router that receives this backend's translated messages
    ///
    /// Called once, while the manager is being constructed.
    fn bind_router(&self, router: Weak<dyn MessageRouter>);

    /// Register the window class used for the container and embedding windows
    fn register_class(&self, class_name: &str) -> NativeResult<()>;

    /// Set the system double-click interval
    fn set_double_click_time(&self, millis: u32) -> NativeResult<()>;

    /// Create the hidden top-level container window
    fn create_container(&self, class_name: &str, title: &str) -> NativeResult<WindowHandle>;

    /// Create a hidden child window of `parent`
    fn create_child(&self, class_name: &str, parent: WindowHandle) -> NativeResult<WindowHandle>;

    /// Move `window` under a new parent
    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> NativeResult<()>;

    /// Move and resize `window` within its parent
    ///
    /// With `repaint` the affected region is invalidated and redrawn.
    fn move_window(&self, window: WindowHandle, rect: WindowRect, repaint: bool) -> NativeResult<()>;

    /// Show or hide `window`
    fn set_visible(&self, window: WindowHandle, visible: bool) -> NativeResult<()>;

    /// Destroy `window` and its descendants; their handles are dead afterwards
    ///
    /// Each destroyed window is routed a [`NativeMessage::Destroyed`] before
    /// its handle dies.
    ///
    /// [`NativeMessage::Destroyed`]: crate::events::NativeMessage::Destroyed
    fn destroy_window(&self, window: WindowHandle) -> NativeResult<()>;

    /// Run one native paint cycle that fills the invalid region with black
    fn fill_black(&self, window: WindowHandle) -> NativeResult<()>;

    /// Mark the whole window as painted without drawing
    fn validate(&self, window: WindowHandle) -> NativeResult<()>;
}
