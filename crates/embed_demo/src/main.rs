//! Embedding window demo
//!
//! Plays a scripted session against the headless window system: a player
//! widget gets a video surface, the pointer wanders over it, the user
//! double-clicks, the widget is resized, hidden and finally torn down.
//!
//! Usage: `embed_demo [config.toml|config.ron]`

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use embedding_window::config::Config;
use embedding_window::foundation::logging;
use embedding_window::prelude::*;

type Manager = EmbeddingWindowManager<HeadlessWindowing>;

/// Video sink stand-in that blanks its window while no frame is available
struct PlaybackSurface {
    manager: Weak<Manager>,
    window: Cell<Option<WindowHandle>>,
    fullscreen: Cell<bool>,
    pointer_trail: RefCell<Vec<(i32, i32)>>,
}

impl PlaybackSurface {
    fn new(manager: &Rc<Manager>) -> Rc<Self> {
        Rc::new(Self {
            manager: Rc::downgrade(manager),
            window: Cell::new(None),
            fullscreen: Cell::new(false),
            pointer_trail: RefCell::new(Vec::new()),
        })
    }
}

impl EventTarget for PlaybackSurface {
    fn on_mouse_move(&self, x: i32, y: i32) -> HandlerResult {
        log::trace!("Pointer at ({x}, {y})");
        self.pointer_trail.borrow_mut().push((x, y));
        Ok(())
    }

    fn on_paint(&self) -> HandlerResult {
        let (Some(manager), Some(window)) = (self.manager.upgrade(), self.window.get()) else {
            return Err("surface is not bound to a window".into());
        };
        // No decoded frame yet
        manager.paint_black(window)?;
        Ok(())
    }

    fn on_double_click(&self, x: i32, y: i32) -> HandlerResult {
        let fullscreen = !self.fullscreen.get();
        self.fullscreen.set(fullscreen);
        log::info!("Double click at ({x}, {y}), fullscreen {}", if fullscreen { "on" } else { "off" });
        Ok(())
    }
}

fn load_config() -> Result<ManagerConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(ManagerConfig::load_from_file(&path)?),
        None => Ok(ManagerConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level)?;

    log::info!("Starting embedding window demo");

    let manager = EmbeddingWindowManager::new(HeadlessWindowing::new(), config)?;
    let backend = manager.backend();
    let player = backend.create_host_window(WindowRect::new(0, 0, 1280, 720));

    let surface = PlaybackSurface::new(&manager);
    let window = manager.create(surface.clone())?;
    surface.window.set(Some(window));
    manager.set_motion_events(window, true)?;

    manager.attach(window, player, WindowRect::new(0, 0, 1280, 660))?;
    backend.pump();

    for (x, y) in [(100, 80), (100, 80), (140, 90), (140, 90), (180, 120)] {
        backend.send_pointer_move(window, x, y)?;
    }
    backend.send_double_click(window, 180, 120)?;
    backend.pump();
    log::info!("Pointer trail: {:?}", surface.pointer_trail.borrow());

    manager.reposition(window, WindowRect::new(0, 0, 1920, 1020))?;
    backend.pump();

    // Hiding and re-showing repeats the last pointer position
    manager.detach(window)?;
    manager.attach(window, player, WindowRect::new(0, 0, 1920, 1020))?;
    backend.pump();

    if let Some(state) = backend.surface(window) {
        log::info!(
            "Surface {window}: {} black fill(s), {} redraw(s)",
            state.black_fills.len(),
            state.redraws
        );
    }

    manager.detach(window)?;
    manager.destroy(window)?;
    backend.pump();

    let stats = manager.stats();
    log::info!(
        "Dispatch: {} forwarded, {} suppressed, {} failed",
        stats.forwarded,
        stats.suppressed,
        stats.failed
    );
    log::info!("Demo finished");
    Ok(())
}
