//! Embedding window manager
//!
//! Owns the per-window records and the lazily created process state (window
//! class and hidden container), and translates routed native messages into
//! calls on each window's [`EventTarget`].
//!
//! Every operation takes `&self` so a handler can call back into the manager
//! while it is being dispatched to. No `RefCell` borrow is held across a
//! backend call or a handler call.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::backend::WindowingBackend;
use crate::core::config::ManagerConfig;
use crate::error::{EmbedError, EmbedResult, EventForwardingError};
use crate::events::{EventTarget, ForwardedEvent, MessageDisposition, MessageRouter, NativeMessage};
use crate::handle::{WindowHandle, WindowRect};
use crate::host::{HostContext, HostScope, NoHostContext};

/// Per-window bookkeeping
struct WindowRecord {
    event_target: Rc<dyn EventTarget>,
    motion_enabled: bool,
    last_pointer_position: Option<(i32, i32)>,
}

impl WindowRecord {
    fn new(event_target: Rc<dyn EventTarget>) -> Self {
        Self {
            event_target,
            motion_enabled: false,
            last_pointer_position: None,
        }
    }
}

enum PointerDecision {
    NoRecord,
    Suppress,
    Forward(Rc<dyn EventTarget>),
}

/// Counters describing what the dispatcher did with routed events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Handler calls that returned `Ok`
    pub forwarded: u64,
    /// Pointer moves dropped because motion was disabled or the position repeated
    pub suppressed: u64,
    /// Handler calls that returned an error or panicked
    pub failed: u64,
}

/// Creates, positions and destroys embedding windows and forwards their events
///
/// Construct one per UI thread with [`EmbeddingWindowManager::new`]. The
/// manager is deliberately neither `Send` nor `Sync`: native windows belong
/// to the thread that created them.
pub struct EmbeddingWindowManager<B: WindowingBackend> {
    backend: B,
    config: ManagerConfig,
    host: Box<dyn HostContext>,
    records: RefCell<HashMap<WindowHandle, WindowRecord>>,
    class_registered: Cell<bool>,
    container: Cell<Option<WindowHandle>>,
    /// Windows whose `on_paint` is currently running, innermost last
    painting: RefCell<Vec<WindowHandle>>,
    stats: Cell<DispatchStats>,
}

impl<B: WindowingBackend + 'static> EmbeddingWindowManager<B> {
    /// Create a manager for a host that needs no callback context
    pub fn new(backend: B, config: ManagerConfig) -> EmbedResult<Rc<Self>> {
        Self::with_host_context(backend, config, Box::new(NoHostContext))
    }

    /// Create a manager that enters `host` around every forwarded event
    ///
    /// Nothing native happens here; the window class and hidden container are
    /// created by the first operation that needs them.
    pub fn with_host_context(
        backend: B,
        config: ManagerConfig,
        host: Box<dyn HostContext>,
    ) -> EmbedResult<Rc<Self>> {
        config.validate()?;

        Ok(Rc::new_cyclic(|weak: &Weak<Self>| {
            let router: Weak<dyn MessageRouter> = weak.clone();
            backend.bind_router(router);

            Self {
                backend,
                config,
                host,
                records: RefCell::new(HashMap::new()),
                class_registered: Cell::new(false),
                container: Cell::new(None),
                painting: RefCell::new(Vec::new()),
                stats: Cell::new(DispatchStats::default()),
            }
        }))
    }
}

impl<B: WindowingBackend> EmbeddingWindowManager<B> {
    /// Register the window class and create the hidden container, once
    ///
    /// A failure is returned to the caller and the next call tries again. A
    /// class that was registered before the failure is not registered twice.
    fn ensure_initialized(&self) -> EmbedResult<WindowHandle> {
        if let Some(container) = self.container.get() {
            return Ok(container);
        }

        let class_name = &self.config.window_class_name;
        if !self.class_registered.get() {
            self.backend.register_class(class_name)?;
            self.class_registered.set(true);
            log::debug!("Registered window class '{class_name}'");

            if let Some(millis) = self.config.double_click_time_ms {
                if let Err(err) = self.backend.set_double_click_time(millis) {
                    log::warn!("Could not set double-click time to {millis} ms: {err}");
                }
            }
        }

        let container = self
            .backend
            .create_container(class_name, &self.config.hidden_window_title)?;
        self.container.set(Some(container));
        log::debug!("Created hidden container window {container}");
        Ok(container)
    }

    fn require_record(&self, window: WindowHandle) -> EmbedResult<()> {
        if self.records.borrow().contains_key(&window) {
            Ok(())
        } else {
            Err(EmbedError::UnknownWindow(window))
        }
    }

    /// Create an embedding window whose events go to `event_target`
    ///
    /// The window starts hidden under the container with motion events off.
    /// The manager keeps `event_target` alive until [`destroy`](Self::destroy).
    pub fn create(&self, event_target: Rc<dyn EventTarget>) -> EmbedResult<WindowHandle> {
        let container = self.ensure_initialized()?;

        // On failure `event_target` is dropped here, so no reference is kept
        let window = self.backend.create_child(&self.config.window_class_name, container)?;

        let previous = self
            .records
            .borrow_mut()
            .insert(window, WindowRecord::new(event_target));
        if previous.is_some() {
            log::warn!("Native handle {window} was reused while still registered");
        }

        log::debug!("Created embedding window {window}");
        Ok(window)
    }

    /// Enable or disable pointer-motion forwarding for `window`
    pub fn set_motion_events(&self, window: WindowHandle, enabled: bool) -> EmbedResult<()> {
        let mut records = self.records.borrow_mut();
        let record = records.get_mut(&window).ok_or(EmbedError::UnknownWindow(window))?;
        record.motion_enabled = enabled;
        Ok(())
    }

    /// Reparent `window` under `parent`, place it at `rect` and show it
    ///
    /// The move does not repaint; the window paints itself once it is shown.
    /// A failed reparent or move is returned and the remaining steps are
    /// skipped.
    pub fn attach(&self, window: WindowHandle, parent: WindowHandle, rect: WindowRect) -> EmbedResult<()> {
        self.require_record(window)?;

        self.backend.set_parent(window, parent)?;
        self.backend.move_window(window, rect, false)?;
        self.backend.set_visible(window, true)?;

        log::debug!("Attached {window} to {parent} at {rect:?}");
        Ok(())
    }

    /// Move and resize an attached window, redrawing the affected region
    pub fn reposition(&self, window: WindowHandle, rect: WindowRect) -> EmbedResult<()> {
        self.require_record(window)?;
        self.backend.move_window(window, rect, true)?;
        Ok(())
    }

    /// Hide `window` and park it under the hidden container
    ///
    /// The window and its record survive, ready for another `attach`.
    pub fn detach(&self, window: WindowHandle) -> EmbedResult<()> {
        self.require_record(window)?;
        let container = self.ensure_initialized()?;

        self.backend.set_visible(window, false)?;
        self.backend.set_parent(window, container)?;

        log::debug!("Detached {window}");
        Ok(())
    }

    /// Destroy `window` and release its event target
    ///
    /// Embedding windows attached under `window` are destroyed with it and
    /// lose their records too. If the native destroy fails the record is kept
    /// so the call can be retried.
    pub fn destroy(&self, window: WindowHandle) -> EmbedResult<()> {
        self.require_record(window)?;
        self.backend.destroy_window(window)?;

        // Normally already gone through the routed destroy notification
        self.forget(window);
        Ok(())
    }

    /// Drop the record of a window whose native window is going away
    fn forget(&self, window: WindowHandle) {
        let record = self.records.borrow_mut().remove(&window);
        if record.is_some() {
            log::debug!("Destroyed embedding window {window}");
        }
        // Dropped outside the borrow: the target's own drop may use the manager
        drop(record);
    }

    /// Fill the invalid region of `window` with black
    ///
    /// Only meaningful from inside the window's `on_paint`, where it runs the
    /// native paint cycle. Called at any other time it does nothing and
    /// returns `Ok(())`.
    pub fn paint_black(&self, window: WindowHandle) -> EmbedResult<()> {
        self.require_record(window)?;

        if !self.painting.borrow().contains(&window) {
            log::debug!("paint_black({window}) outside a paint cycle ignored");
            return Ok(());
        }

        self.backend.fill_black(window)?;
        Ok(())
    }

    /// Whether `window` has a live record
    pub fn contains(&self, window: WindowHandle) -> bool {
        self.records.borrow().contains_key(&window)
    }

    /// Number of live embedding windows
    pub fn window_count(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether pointer-motion forwarding is enabled for `window`
    pub fn motion_events_enabled(&self, window: WindowHandle) -> EmbedResult<bool> {
        self.records
            .borrow()
            .get(&window)
            .map(|record| record.motion_enabled)
            .ok_or(EmbedError::UnknownWindow(window))
    }

    /// The hidden container window, once initialization has happened
    pub fn container(&self) -> Option<WindowHandle> {
        self.container.get()
    }

    /// Dispatch counters since construction
    pub fn stats(&self) -> DispatchStats {
        self.stats.get()
    }

    /// Active configuration
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The windowing backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn update_stats(&self, update: impl FnOnce(&mut DispatchStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    /// Target for `window`, if it has a record
    fn target_of(&self, window: WindowHandle) -> Option<Rc<dyn EventTarget>> {
        self.records
            .borrow()
            .get(&window)
            .map(|record| Rc::clone(&record.event_target))
    }

    /// Pointer-move de-duplication
    fn accept_pointer_move(&self, window: WindowHandle, x: i32, y: i32) -> PointerDecision {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&window) else {
            return PointerDecision::NoRecord;
        };

        // Mapping and unmapping windows produces a move with unchanged coordinates
        if !record.motion_enabled || record.last_pointer_position == Some((x, y)) {
            return PointerDecision::Suppress;
        }
        record.last_pointer_position = Some((x, y));
        PointerDecision::Forward(Rc::clone(&record.event_target))
    }

    /// Call the handler for `event`, containing any failure
    fn forward(&self, window: WindowHandle, target: &Rc<dyn EventTarget>, event: ForwardedEvent) {
        let outcome = {
            let _scope = HostScope::enter(self.host.as_ref());
            panic::catch_unwind(AssertUnwindSafe(|| event.deliver(target.as_ref())))
        };

        let reason = match outcome {
            Ok(Ok(())) => {
                self.update_stats(|stats| stats.forwarded += 1);
                return;
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let failure = EventForwardingError {
            window,
            event: event.method_name(),
            reason,
        };
        log::error!("{failure}");
        self.update_stats(|stats| stats.failed += 1);
    }

    /// Forward a paint, then validate whatever the handler left unpainted
    ///
    /// A region still invalid after a handled paint is re-delivered at once.
    fn forward_paint(&self, window: WindowHandle, target: &Rc<dyn EventTarget>) {
        self.painting.borrow_mut().push(window);
        self.forward(window, target, ForwardedEvent::Paint);

        {
            let mut painting = self.painting.borrow_mut();
            if let Some(index) = painting.iter().rposition(|active| *active == window) {
                painting.remove(index);
            }
        }

        // The handler may have destroyed its own window
        if self.contains(window) {
            if let Err(err) = self.backend.validate(window) {
                log::warn!("Could not validate {window} after paint: {err}");
            }
        }
    }

    fn handle_destroyed(&self, window: WindowHandle) {
        if self.container.get() == Some(window) {
            log::warn!("Hidden container window {window} was destroyed");
            self.container.set(None);
        }
        self.forget(window);
    }
}

impl<B: WindowingBackend> MessageRouter for EmbeddingWindowManager<B> {
    fn route(&self, window: WindowHandle, message: NativeMessage) -> MessageDisposition {
        match message {
            NativeMessage::PointerMove { x, y } => match self.accept_pointer_move(window, x, y) {
                PointerDecision::NoRecord => MessageDisposition::Default,
                PointerDecision::Suppress => {
                    self.update_stats(|stats| stats.suppressed += 1);
                    MessageDisposition::Handled
                }
                PointerDecision::Forward(target) => {
                    self.forward(window, &target, ForwardedEvent::MouseMove { x, y });
                    MessageDisposition::Handled
                }
            },
            NativeMessage::Paint => match self.target_of(window) {
                Some(target) => {
                    self.forward_paint(window, &target);
                    MessageDisposition::Handled
                }
                None => MessageDisposition::Default,
            },
            NativeMessage::DoubleClick { x, y } => match self.target_of(window) {
                Some(target) => {
                    self.forward(window, &target, ForwardedEvent::DoubleClick { x, y });
                    MessageDisposition::Handled
                }
                None => MessageDisposition::Default,
            },
            NativeMessage::Destroyed => {
                self.handle_destroyed(window);
                MessageDisposition::Default
            }
            NativeMessage::Other { .. } => MessageDisposition::Default,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
