//! In-memory state store.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::state::StackState;
use crate::error::Result;
use crate::port::outbound::state::StateStore;

/// [`StateStore`] that keeps the state in process memory.
///
/// Clones share the same state, so a test can keep a handle while the
/// orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<RwLock<StackState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`.
    pub fn with_state(state: StackState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StackState {
        self.state.read().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<StackState> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &StackState) -> Result<()> {
        *self.state.write() = state.clone();
        Ok(())
    }
}
