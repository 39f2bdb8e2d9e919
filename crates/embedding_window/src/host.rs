//! Host execution context for callbacks
//!
//! Some hosts need to take a lock or attach runtime state before native code
//! may call into them (an interpreter lock, a UI-thread token, ...). The
//! manager enters the host context before every forwarded event and leaves it
//! when the event returns, errors, or panics.

/// Whatever the host must hold while one of its handlers runs
///
/// `enter` and `exit` are always paired. Calls may nest when a handler
/// re-enters the manager and triggers another event synchronously.
pub trait HostContext {
    /// Acquire the context before a handler is called
    fn enter(&self);

    /// Release the context after the handler returned
    fn exit(&self);
}

/// Host that needs no preparation before callbacks
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostContext;

impl HostContext for NoHostContext {
    fn enter(&self) {}

    fn exit(&self) {}
}

/// Scope holding a host context; exits it on drop
pub(crate) struct HostScope<'a> {
    context: &'a dyn HostContext,
}

impl<'a> HostScope<'a> {
    pub(crate) fn enter(context: &'a dyn HostContext) -> Self {
        context.enter();
        Self { context }
    }
}

impl Drop for HostScope<'_> {
    fn drop(&mut self) {
        self.context.exit();
    }
}
