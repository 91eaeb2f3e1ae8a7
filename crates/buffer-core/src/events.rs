//! Change notification.
//!
//! Each buffer owns an explicit publish/subscribe channel: consumers (renderers, diff
//! views, persistence) register callbacks and are notified after every successful edit
//! batch with the new version and the edited spans. The buffer never holds references to
//! its consumers.

use crate::edits::ChangeSpan;

/// Event emitted after a successful edit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferChanged {
    /// Document version after the batch.
    pub version: u64,
    /// Edited spans in pre-batch coordinates, ascending.
    pub changes: Vec<ChangeSpan>,
}

/// Change notification callback type.
pub type ChangeCallback = Box<dyn FnMut(&BufferChanged) + Send>;

/// Listener list owned by a buffer.
#[derive(Default)]
pub(crate) struct ChangeDispatcher {
    callbacks: Vec<ChangeCallback>,
}

impl ChangeDispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&mut self, callback: ChangeCallback) {
        self.callbacks.push(callback);
    }

    pub(crate) fn emit(&mut self, event: &BufferChanged) {
        for callback in &mut self.callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
