//! # Embedding Window
//!
//! Native child windows that act as rendering surfaces for externally managed
//! content (typically a video sink), plus the glue that forwards a small set of
//! native events from those windows back to the host application.
//!
//! ## Features
//!
//! - **Window lifecycle**: create, attach, reposition, detach and destroy embedding windows
//! - **Event forwarding**: pointer motion (de-duplicated), paint requests and double clicks
//! - **Failure isolation**: handler errors and panics never cross the native callback
//! - **Backends**: Win32 on Windows, a headless in-memory window system everywhere
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use embedding_window::prelude::*;
//!
//! struct VideoSurface;
//!
//! impl EventTarget for VideoSurface {
//!     fn on_mouse_move(&self, _x: i32, _y: i32) -> HandlerResult { Ok(()) }
//!     fn on_paint(&self) -> HandlerResult { Ok(()) }
//!     fn on_double_click(&self, _x: i32, _y: i32) -> HandlerResult { Ok(()) }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = EmbeddingWindowManager::new(HeadlessWindowing::new(), ManagerConfig::default())?;
//!     let window = manager.create(Rc::new(VideoSurface))?;
//!     manager.set_motion_events(window, true)?;
//!     manager.destroy(window)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod foundation;
pub mod handle;
pub mod host;

mod manager;

pub use error::{EmbedError, EmbedResult, EventForwardingError};
pub use handle::{WindowHandle, WindowRect};
pub use manager::{DispatchStats, EmbeddingWindowManager};

/// Common imports for host applications
pub mod prelude {
    pub use crate::{
        backend::{headless::HeadlessWindowing, WindowingBackend},
        core::config::ManagerConfig,
        events::{EventTarget, HandlerResult, MessageDisposition, MessageRouter, NativeMessage},
        host::{HostContext, NoHostContext},
        DispatchStats, EmbedError, EmbedResult, EmbeddingWindowManager, WindowHandle, WindowRect,
    };

    #[cfg(windows)]
    pub use crate::backend::win32::Win32Windowing;
}
