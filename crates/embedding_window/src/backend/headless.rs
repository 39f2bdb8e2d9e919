//! In-memory window system
//!
//! `HeadlessWindowing` behaves like a small native windowing layer: it keeps a
//! window tree with geometry, visibility and invalid regions, queues messages
//! the way a native message queue would, and reports stale handles and
//! unregistered classes with Win32-style error codes. Hosts use it to drive
//! the manager in tests and tools where no display is available.
//!
//! Messages are queued by the `send_*` and `invalidate` methods and by the
//! windowing operations themselves (showing a window, repainting moves), and
//! delivered in order by [`HeadlessWindowing::pump`].

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Weak;

use bitflags::bitflags;

use super::WindowingBackend;
use crate::error::{NativeError, NativeResult};
use crate::events::{MessageDisposition, MessageRouter, NativeMessage};
use crate::foundation::collections::{SurfaceKey, SurfaceMap};
use crate::handle::{WindowHandle, WindowRect};

/// Error code for an argument the window system rejects
pub const ERROR_INVALID_PARAMETER: i32 = 87;
/// Error code for a handle that does not name a live window
pub const ERROR_INVALID_WINDOW_HANDLE: i32 = 1400;
/// Error code for creating a window of an unregistered class
pub const ERROR_CANNOT_FIND_WND_CLASS: i32 = 1407;
/// Error code for registering a class twice
pub const ERROR_CLASS_ALREADY_EXISTS: i32 = 1410;

/// Upper bound on messages delivered by one `pump` call
const MAX_PUMPED_MESSAGES: usize = 10_000;

bitflags! {
    /// State bits of a headless window
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u8 {
        /// The window is shown
        const VISIBLE = 1 << 0;
        /// Top-level container created through `create_container`
        const CONTAINER = 1 << 1;
        /// Top-level window standing in for the host toolkit's widget
        const HOST = 1 << 2;
    }
}

/// Backend operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadlessOp {
    /// `register_class`
    RegisterClass,
    /// `set_double_click_time`
    SetDoubleClickTime,
    /// `create_container`
    CreateContainer,
    /// `create_child`
    CreateChild,
    /// `set_parent`
    SetParent,
    /// `move_window`
    MoveWindow,
    /// `set_visible`
    SetVisible,
    /// `destroy_window`
    DestroyWindow,
    /// `fill_black`
    FillBlack,
    /// `validate`
    Validate,
}

impl HeadlessOp {
    /// Name of the Win32 call this operation stands in for
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::RegisterClass => "RegisterClassExW",
            Self::SetDoubleClickTime => "SetDoubleClickTime",
            Self::CreateContainer | Self::CreateChild => "CreateWindowExW",
            Self::SetParent => "SetParent",
            Self::MoveWindow => "MoveWindow",
            Self::SetVisible => "ShowWindow",
            Self::DestroyWindow => "DestroyWindow",
            Self::FillBlack => "BeginPaint",
            Self::Validate => "ValidateRect",
        }
    }
}

/// Observable state of one headless window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    /// Registered class the window was created with; `None` for host windows
    pub class_name: Option<String>,
    /// Current parent; `None` for top-level windows
    pub parent: Option<WindowHandle>,
    /// Geometry in parent coordinates
    pub rect: WindowRect,
    /// Visibility and role
    pub flags: SurfaceFlags,
    /// Region waiting to be painted, in window coordinates
    pub invalid: Option<WindowRect>,
    /// Number of repainting moves
    pub redraws: u32,
    /// Regions filled by completed black paint cycles
    pub black_fills: Vec<WindowRect>,
    /// Last pointer position delivered to this window
    pub last_pointer: Option<(i32, i32)>,
}

impl SurfaceState {
    fn new(class_name: Option<String>, parent: Option<WindowHandle>, rect: WindowRect, flags: SurfaceFlags) -> Self {
        Self {
            class_name,
            parent,
            rect,
            flags,
            invalid: None,
            redraws: 0,
            black_fills: Vec::new(),
            last_pointer: None,
        }
    }

    /// Whether the window is shown
    pub const fn is_visible(&self) -> bool {
        self.flags.contains(SurfaceFlags::VISIBLE)
    }
}

#[derive(Default)]
struct World {
    surfaces: SurfaceMap<SurfaceState>,
    classes: HashSet<String>,
    register_calls: u32,
    double_click_time: Option<u32>,
    queue: VecDeque<(WindowHandle, NativeMessage)>,
    defaulted: Vec<(WindowHandle, NativeMessage)>,
    failures: Vec<(HeadlessOp, i32)>,
}

impl World {
    fn take_failure(&mut self, op: HeadlessOp) -> NativeResult<()> {
        match self.failures.iter().position(|(pending, _)| *pending == op) {
            Some(index) => {
                let (_, code) = self.failures.remove(index);
                Err(NativeError::new(op.native_name(), code, "injected failure"))
            }
            None => Ok(()),
        }
    }

    fn surface(&self, window: WindowHandle, operation: &'static str) -> NativeResult<&SurfaceState> {
        self.surfaces
            .get(SurfaceKey::from_handle(window))
            .ok_or_else(|| invalid_handle(operation, window))
    }

    fn surface_mut(&mut self, window: WindowHandle, operation: &'static str) -> NativeResult<&mut SurfaceState> {
        self.surfaces
            .get_mut(SurfaceKey::from_handle(window))
            .ok_or_else(|| invalid_handle(operation, window))
    }

    fn require_class(&self, class_name: &str) -> NativeResult<()> {
        if self.classes.contains(class_name) {
            Ok(())
        } else {
            Err(NativeError::new(
                "CreateWindowExW",
                ERROR_CANNOT_FIND_WND_CLASS,
                format!("window class '{class_name}' is not registered"),
            ))
        }
    }

    fn post(&mut self, window: WindowHandle, message: NativeMessage) {
        self.queue.push_back((window, message));
    }

    /// Add `region` to the invalid region and queue a paint unless one is pending
    fn invalidate(&mut self, window: WindowHandle, region: WindowRect) -> NativeResult<()> {
        let surface = self.surface_mut(window, "InvalidateRect")?;
        surface.invalid = Some(match surface.invalid {
            Some(existing) => union(existing, region),
            None => region,
        });

        let pending = self
            .queue
            .iter()
            .any(|(queued, message)| *queued == window && *message == NativeMessage::Paint);
        if !pending {
            self.post(window, NativeMessage::Paint);
        }
        Ok(())
    }

    /// Queue the pointer-move repeat a native system emits on map/unmap
    fn repeat_pointer(&mut self, window: WindowHandle) {
        let last = self
            .surfaces
            .get(SurfaceKey::from_handle(window))
            .and_then(|surface| surface.last_pointer);
        if let Some((x, y)) = last {
            self.post(window, NativeMessage::PointerMove { x, y });
        }
    }

    /// Queue another paint if a handled paint left the region invalid
    fn repost_unpainted(&mut self, window: WindowHandle) {
        let unpainted = self
            .surfaces
            .get(SurfaceKey::from_handle(window))
            .is_some_and(|surface| surface.invalid.is_some());
        if unpainted {
            self.post(window, NativeMessage::Paint);
        }
    }

    /// Whether `ancestor` is `window` or one of its parents
    fn is_ancestor_or_self(&self, ancestor: WindowHandle, window: WindowHandle) -> bool {
        let mut current = Some(window);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self
                .surfaces
                .get(SurfaceKey::from_handle(handle))
                .and_then(|surface| surface.parent);
        }
        false
    }

    /// `root` and all its descendants, deepest first
    fn subtree(&self, root: WindowHandle) -> Vec<WindowHandle> {
        let mut found = vec![root];
        let mut next = 0;
        while next < found.len() {
            let parent = found[next];
            next += 1;
            let children: Vec<WindowHandle> = self
                .surfaces
                .iter()
                .filter(|(_, surface)| surface.parent == Some(parent))
                .map(|(key, _)| key.to_handle())
                .filter(|child| !found.contains(child))
                .collect();
            found.extend(children);
        }
        found.reverse();
        found
    }

    fn remove(&mut self, window: WindowHandle) {
        self.surfaces.remove(SurfaceKey::from_handle(window));
        self.queue.retain(|(queued, _)| *queued != window);
    }
}

fn invalid_handle(operation: &'static str, window: WindowHandle) -> NativeError {
    NativeError::new(
        operation,
        ERROR_INVALID_WINDOW_HANDLE,
        format!("invalid window handle {window}"),
    )
}

fn union(a: WindowRect, b: WindowRect) -> WindowRect {
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    let right = (a.x + a.width).max(b.x + b.width);
    let bottom = (a.y + a.height).max(b.y + b.height);
    WindowRect::new(left, top, right - left, bottom - top)
}

/// In-memory implementation of [`WindowingBackend`]
#[derive(Default)]
pub struct HeadlessWindowing {
    world: RefCell<World>,
    router: RefCell<Option<Weak<dyn MessageRouter>>>,
}

impl HeadlessWindowing {
    /// Create an empty window system
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with native error `code`
    pub fn fail_next(&self, op: HeadlessOp, code: i32) {
        self.world.borrow_mut().failures.push((op, code));
    }

    /// Create a visible top-level window standing in for a host widget
    pub fn create_host_window(&self, rect: WindowRect) -> WindowHandle {
        let mut world = self.world.borrow_mut();
        let key = world
            .surfaces
            .insert(SurfaceState::new(None, None, rect, SurfaceFlags::HOST | SurfaceFlags::VISIBLE));
        key.to_handle()
    }

    /// Queue a pointer move at window-relative `(x, y)`
    pub fn send_pointer_move(&self, window: WindowHandle, x: i32, y: i32) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.surface_mut(window, "PostMessageW")?.last_pointer = Some((x, y));
        world.post(window, NativeMessage::PointerMove { x, y });
        Ok(())
    }

    /// Queue a primary-button double click at window-relative `(x, y)`
    pub fn send_double_click(&self, window: WindowHandle, x: i32, y: i32) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.surface(window, "PostMessageW")?;
        world.post(window, NativeMessage::DoubleClick { x, y });
        Ok(())
    }

    /// Queue an arbitrary message the manager does not translate
    pub fn send_message(&self, window: WindowHandle, code: u32) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.surface(window, "PostMessageW")?;
        world.post(window, NativeMessage::Other { code });
        Ok(())
    }

    /// Invalidate the whole client area of `window` and queue a paint
    pub fn invalidate(&self, window: WindowHandle) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        let client = world.surface(window, "InvalidateRect")?.rect.client();
        world.invalidate(window, client)
    }

    /// Deliver queued messages in order until the queue is empty
    ///
    /// Messages queued while delivering are delivered in the same call.
    /// Returns the number of messages delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while delivered < MAX_PUMPED_MESSAGES {
            let next = self.world.borrow_mut().queue.pop_front();
            let Some((window, message)) = next else {
                return delivered;
            };
            delivered += 1;

            match self.route(window, message) {
                MessageDisposition::Default => self.default_handling(window, message),
                MessageDisposition::Handled if message == NativeMessage::Paint => {
                    self.world.borrow_mut().repost_unpainted(window);
                }
                MessageDisposition::Handled => {}
            }
        }

        log::warn!("Headless: stopped pumping after {MAX_PUMPED_MESSAGES} messages");
        delivered
    }

    fn route(&self, window: WindowHandle, message: NativeMessage) -> MessageDisposition {
        let router = self.router.borrow().as_ref().and_then(Weak::upgrade);
        router.map_or(MessageDisposition::Default, |router| router.route(window, message))
    }

    fn default_handling(&self, window: WindowHandle, message: NativeMessage) {
        let mut world = self.world.borrow_mut();
        if message == NativeMessage::Paint {
            // Default paint handling validates the region without drawing
            if let Ok(surface) = world.surface_mut(window, "DefWindowProcW") {
                surface.invalid = None;
            }
        }
        world.defaulted.push((window, message));
    }

    /// Snapshot of a window's state, `None` if the handle is dead
    pub fn surface(&self, window: WindowHandle) -> Option<SurfaceState> {
        self.world.borrow().surfaces.get(SurfaceKey::from_handle(window)).cloned()
    }

    /// Whether `window` names a live window
    pub fn is_live(&self, window: WindowHandle) -> bool {
        self.world.borrow().surfaces.contains_key(SurfaceKey::from_handle(window))
    }

    /// Number of live windows, host windows included
    pub fn live_windows(&self) -> usize {
        self.world.borrow().surfaces.len()
    }

    /// Messages waiting in the queue
    pub fn queued_messages(&self) -> Vec<(WindowHandle, NativeMessage)> {
        self.world.borrow().queue.iter().copied().collect()
    }

    /// Messages that fell through to default handling, in delivery order
    pub fn defaulted_messages(&self) -> Vec<(WindowHandle, NativeMessage)> {
        self.world.borrow().defaulted.clone()
    }

    /// Number of `register_class` calls, successful or not
    pub fn register_calls(&self) -> u32 {
        self.world.borrow().register_calls
    }

    /// Double-click interval last applied
    pub fn double_click_time(&self) -> Option<u32> {
        self.world.borrow().double_click_time
    }
}

impl WindowingBackend for HeadlessWindowing {
    fn bind_router(&self, router: Weak<dyn MessageRouter>) {
        *self.router.borrow_mut() = Some(router);
    }

    fn register_class(&self, class_name: &str) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.register_calls += 1;
        world.take_failure(HeadlessOp::RegisterClass)?;

        if !world.classes.insert(class_name.to_string()) {
            return Err(NativeError::new(
                "RegisterClassExW",
                ERROR_CLASS_ALREADY_EXISTS,
                format!("class '{class_name}' already exists"),
            ));
        }
        Ok(())
    }

    fn set_double_click_time(&self, millis: u32) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::SetDoubleClickTime)?;
        world.double_click_time = Some(millis);
        Ok(())
    }

    fn create_container(&self, class_name: &str, _title: &str) -> NativeResult<WindowHandle> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::CreateContainer)?;
        world.require_class(class_name)?;

        let surface = SurfaceState::new(
            Some(class_name.to_string()),
            None,
            WindowRect::new(0, 0, 1, 1),
            SurfaceFlags::CONTAINER,
        );
        Ok(world.surfaces.insert(surface).to_handle())
    }

    fn create_child(&self, class_name: &str, parent: WindowHandle) -> NativeResult<WindowHandle> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::CreateChild)?;
        world.require_class(class_name)?;
        world.surface(parent, "CreateWindowExW")?;

        let surface = SurfaceState::new(
            Some(class_name.to_string()),
            Some(parent),
            WindowRect::new(0, 0, 1, 1),
            SurfaceFlags::empty(),
        );
        Ok(world.surfaces.insert(surface).to_handle())
    }

    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::SetParent)?;
        world.surface(parent, "SetParent")?;
        world.surface(window, "SetParent")?;
        if world.is_ancestor_or_self(window, parent) {
            return Err(NativeError::new(
                "SetParent",
                ERROR_INVALID_PARAMETER,
                format!("{window} cannot become a child of its descendant {parent}"),
            ));
        }
        world.surface_mut(window, "SetParent")?.parent = Some(parent);
        Ok(())
    }

    fn move_window(&self, window: WindowHandle, rect: WindowRect, repaint: bool) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::MoveWindow)?;

        let surface = world.surface_mut(window, "MoveWindow")?;
        surface.rect = rect;
        if repaint && surface.is_visible() {
            surface.redraws += 1;
            world.invalidate(window, rect.client())?;
        }
        Ok(())
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::SetVisible)?;

        let surface = world.surface_mut(window, "ShowWindow")?;
        if surface.is_visible() == visible {
            return Ok(());
        }
        surface.flags.set(SurfaceFlags::VISIBLE, visible);
        let client = surface.rect.client();

        if visible {
            world.invalidate(window, client)?;
        } else {
            world.surface_mut(window, "ShowWindow")?.invalid = None;
            world
                .queue
                .retain(|(queued, message)| !(*queued == window && *message == NativeMessage::Paint));
        }
        world.repeat_pointer(window);
        Ok(())
    }

    fn destroy_window(&self, window: WindowHandle) -> NativeResult<()> {
        let doomed = {
            let mut world = self.world.borrow_mut();
            world.take_failure(HeadlessOp::DestroyWindow)?;
            world.surface(window, "DestroyWindow")?;
            world.subtree(window)
        };

        // Handles stay valid while their destruction is routed
        for &dying in &doomed {
            self.route(dying, NativeMessage::Destroyed);
        }

        let mut world = self.world.borrow_mut();
        for dying in doomed {
            world.remove(dying);
        }
        Ok(())
    }

    fn fill_black(&self, window: WindowHandle) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::FillBlack)?;

        let surface = world.surface_mut(window, "BeginPaint")?;
        // Begin/end paint validates the region whether or not anything was drawn
        if let Some(region) = surface.invalid.take() {
            surface.black_fills.push(region);
        }
        Ok(())
    }

    fn validate(&self, window: WindowHandle) -> NativeResult<()> {
        let mut world = self.world.borrow_mut();
        world.take_failure(HeadlessOp::Validate)?;
        world.surface_mut(window, "ValidateRect")?.invalid = None;
        Ok(())
    }
}
