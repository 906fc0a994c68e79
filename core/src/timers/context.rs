//! Execution-context capture and restore
//!
//! Some hosts run callbacks "as if" in the scope that registered them (a
//! sub-world, a document, a simulation island). The scheduler treats that
//! scope as an opaque tag: it captures one at registration through the
//! installed [`ContextSwitch`] and restores it via a scoped guard around
//! each firing. With no switch installed, tags are never captured and
//! firing is unwrapped.

use std::rc::Rc;

/// Opaque execution-context value. Meaning is entirely up to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContextTag(pub u64);

/// Host hook for capturing and switching execution context
pub trait ContextSwitch {
    /// The currently active context, captured at timer registration
    fn capture(&self) -> ContextTag;

    /// Make `tag` the active context before a callback fires
    fn enter(&self, tag: ContextTag);

    /// Undo `enter` after the callback returns
    fn leave(&self, tag: ContextTag);
}

/// Scoped restore: enters on construction, leaves on drop
pub(crate) struct ContextGuard {
    switch: Rc<dyn ContextSwitch>,
    tag: ContextTag,
}

impl ContextGuard {
    pub fn enter(switch: Rc<dyn ContextSwitch>, tag: ContextTag) -> Self {
        switch.enter(tag);
        Self { switch, tag }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.switch.leave(self.tag);
    }
}
