//! Shared fixtures for manager integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedding_window::prelude::*;

pub type Manager = EmbeddingWindowManager<HeadlessWindowing>;

/// Handler call observed by a `RecordingTarget`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Move(i32, i32),
    Paint,
    DoubleClick(i32, i32),
}

/// How a `RecordingTarget` misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misbehave {
    Error,
    Panic,
}

/// Event target that records every call it receives
#[derive(Default)]
pub struct RecordingTarget {
    calls: RefCell<Vec<Call>>,
    misbehave: Cell<Option<Misbehave>>,
    paint_hook: RefCell<Option<Box<dyn Fn()>>>,
}

impl RecordingTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn misbehave(&self, how: Option<Misbehave>) {
        self.misbehave.set(how);
    }

    /// Run `hook` inside every `on_paint`, after recording the call
    pub fn on_paint_run(&self, hook: impl Fn() + 'static) {
        *self.paint_hook.borrow_mut() = Some(Box::new(hook));
    }

    fn record(&self, call: Call) -> HandlerResult {
        self.calls.borrow_mut().push(call);
        match self.misbehave.get() {
            None => Ok(()),
            Some(Misbehave::Error) => Err(format!("handler refused {call:?}").into()),
            Some(Misbehave::Panic) => panic!("handler panicked on {call:?}"),
        }
    }
}

impl EventTarget for RecordingTarget {
    fn on_mouse_move(&self, x: i32, y: i32) -> HandlerResult {
        self.record(Call::Move(x, y))
    }

    fn on_paint(&self) -> HandlerResult {
        let result = self.record(Call::Paint);
        if let Some(hook) = self.paint_hook.borrow().as_ref() {
            hook();
        }
        result
    }

    fn on_double_click(&self, x: i32, y: i32) -> HandlerResult {
        self.record(Call::DoubleClick(x, y))
    }
}

/// Host context that tracks nesting depth and entry count
#[derive(Clone, Default)]
pub struct CountingContext {
    pub depth: Rc<Cell<i32>>,
    pub entries: Rc<Cell<u32>>,
}

impl HostContext for CountingContext {
    fn enter(&self) {
        self.depth.set(self.depth.get() + 1);
        self.entries.set(self.entries.get() + 1);
    }

    fn exit(&self) {
        self.depth.set(self.depth.get() - 1);
    }
}

pub fn manager() -> Rc<Manager> {
    EmbeddingWindowManager::new(HeadlessWindowing::new(), ManagerConfig::default()).unwrap()
}

pub fn manager_with_context(context: &CountingContext) -> Rc<Manager> {
    EmbeddingWindowManager::with_host_context(
        HeadlessWindowing::new(),
        ManagerConfig::default(),
        Box::new(context.clone()),
    )
    .unwrap()
}

/// Host widget plus an embedding window attached to it and shown
pub fn attached_window(manager: &Manager, target: &Rc<RecordingTarget>) -> (WindowHandle, WindowHandle) {
    let host = manager.backend().create_host_window(WindowRect::new(0, 0, 800, 600));
    let window = manager.create(target.clone()).unwrap();
    manager.attach(window, host, WindowRect::new(0, 0, 640, 360)).unwrap();
    (host, window)
}
