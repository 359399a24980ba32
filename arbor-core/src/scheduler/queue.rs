//! Render requests.
//!
//! Every state setter holds a clone of the renderer's [`UpdateQueue`].
//! Dispatching an update only marks the queue; the renderer picks the request
//! up on its next driver invocation and starts a fresh work-in-progress root
//! from the committed tree. Requests made while one is already pending
//! coalesce into a single render.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

#[derive(Debug, Default)]
struct QueueState {
    pending: bool,
    dispatched: u64,
}

/// Shared handle for requesting a re-render.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    state: Arc<Mutex<QueueState>>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the renderer for a new render pass from the root.
    pub fn request_render(&self) {
        let mut state = self.state.lock();
        state.pending = true;
        state.dispatched += 1;
        trace!(dispatched = state.dispatched, "render requested");
    }

    /// Whether a render was requested since the last drain.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    /// Total requests made through this queue, coalesced or not.
    pub fn dispatched(&self) -> u64 {
        self.state.lock().dispatched
    }

    /// Clear the pending flag. Returns whether a request was pending.
    pub(crate) fn take(&self) -> bool {
        std::mem::take(&mut self.state.lock().pending)
    }
}
