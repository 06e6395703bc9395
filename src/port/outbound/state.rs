//! State persistence port.

use async_trait::async_trait;

use crate::domain::state::StackState;
use crate::error::Result;

/// Persistence for [`StackState`].
///
/// A store that has never been written returns an empty state from
/// [`load`](Self::load).
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current state.
    async fn load(&self) -> Result<StackState>;

    /// Replace the stored state.
    async fn save(&self, state: &StackState) -> Result<()>;
}
