//! Per-worker join state machine.
//!
//! ```text
//! pending -> token-requested -> token-received -> join-issued -> joined
//!    \______________\_________________\_______________\
//!                                                      -> join-failed
//! ```

use std::fmt;

use serde::Serialize;

use super::error::DomainError;

/// Where a worker is in the join sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinState {
    /// Waiting for the mesh and the master install.
    Pending,
    /// `add-node` issued on the master.
    TokenRequested,
    /// A valid token was extracted.
    TokenReceived,
    /// Join command issued on the worker.
    JoinIssued,
    /// The worker is part of the cluster.
    Joined,
    /// Terminal failure; left for manual remediation or a re-run.
    JoinFailed,
}

impl JoinState {
    /// True for `joined` and `join-failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Joined | Self::JoinFailed)
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidJoinTransition`] for anything other
    /// than the single forward step or a failure from a non-terminal state.
    pub fn advance(self, next: JoinState) -> Result<JoinState, DomainError> {
        let allowed = match (self, next) {
            (from, Self::JoinFailed) => !from.is_terminal(),
            (Self::Pending, Self::TokenRequested)
            | (Self::TokenRequested, Self::TokenReceived)
            | (Self::TokenReceived, Self::JoinIssued)
            | (Self::JoinIssued, Self::Joined) => true,
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InvalidJoinTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::TokenRequested => "token-requested",
            Self::TokenReceived => "token-received",
            Self::JoinIssued => "join-issued",
            Self::Joined => "joined",
            Self::JoinFailed => "join-failed",
        }
    }
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
