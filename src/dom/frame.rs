//! Embedded sub-document slots and their one-shot readiness signal
use super::NodeId;
use crate::error::{MarkError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Loading,
    Ready,
    Failed,
}

/// Readiness signal shared between a host that loads a frame and the walker
/// that waits for it. Clones observe and drive the same state.
#[derive(Clone)]
pub struct FrameHandle {
    state: Arc<watch::Sender<FrameState>>,
}

impl Default for FrameHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(FrameState::Loading);
        Self {
            state: Arc::new(sender),
        }
    }

    pub fn state(&self) -> FrameState {
        *self.state.borrow()
    }

    pub fn set_ready(&self) {
        self.state.send_replace(FrameState::Ready);
    }

    pub fn set_failed(&self) {
        self.state.send_replace(FrameState::Failed);
    }

    /// Waits until the frame leaves `Loading`. Without a timeout this waits
    /// for as long as the host takes to signal.
    pub async fn ready(&self, timeout: Option<Duration>) -> Result<FrameState> {
        let mut receiver = self.state.subscribe();
        let settled = async move {
            receiver
                .wait_for(|state| *state != FrameState::Loading)
                .await
                .map(|state| *state)
                .map_err(|_| MarkError::FrameClosed)
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, settled)
                .await
                .map_err(|_| MarkError::FrameTimeout(limit))?,
            None => settled.await,
        }
    }
}

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHandle")
            .field("state", &self.state())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub(crate) handle: FrameHandle,
    pub(crate) content: Option<NodeId>,
}

impl Frame {
    pub fn handle(&self) -> &FrameHandle {
        &self.handle
    }

    pub fn content(&self) -> Option<NodeId> {
        self.content
    }
}
