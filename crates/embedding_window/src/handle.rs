//! Opaque window handles and window-relative geometry

use std::ffi::c_void;
use std::fmt;

use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
use serde::{Deserialize, Serialize};

/// Opaque handle identifying a live embedding window
///
/// Wraps the pointer-sized native identifier (an `HWND` on Windows). A handle
/// is valid between `create` and `destroy`; afterwards the manager reports it
/// as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(isize);

impl WindowHandle {
    /// Wrap a raw native identifier
    pub const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    /// The raw native identifier, for handing to code outside this crate
    pub const fn as_raw(self) -> isize {
        self.0
    }

    /// Describe this handle as a Win32 window for an external renderer
    ///
    /// Video sinks that accept a `RawWindowHandle` can draw straight into the
    /// embedding window with this.
    pub fn to_win32_raw_window_handle(self) -> RawWindowHandle {
        let mut handle = Win32WindowHandle::empty();
        handle.hwnd = self.0 as *mut c_void;
        RawWindowHandle::Win32(handle)
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Rectangle in the coordinate space of a window's parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl WindowRect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the same size anchored at the origin
    pub const fn client(self) -> Self {
        Self::new(0, 0, self.width, self.height)
    }

    /// Whether the rectangle covers no pixels
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}
