//! Sequential join of workers to the master.
//!
//! Each worker gets its own `add-node` request on the master; requests never
//! overlap because the engine serializes commands per target. Progress of
//! every worker is tracked through the [`JoinState`] machine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::graph::classify;
use crate::application::commands::{names, MultipassCommands};
use crate::application::deferred::Deferred;
use crate::application::engine::{Engine, OperationSpec};
use crate::domain::token::{parse_join_token, JoinToken};
use crate::domain::{FormationError, JoinState, MalformedOutputError, Node, NodeName};
use crate::error::Result;

/// Join state of every worker.
#[derive(Debug, Clone, Default)]
pub struct JoinTracker {
    states: Arc<Mutex<HashMap<NodeName, JoinState>>>,
}

impl JoinTracker {
    /// Start tracking `node` in [`JoinState::Pending`].
    pub fn register(&self, node: &NodeName) {
        self.states.lock().insert(node.clone(), JoinState::Pending);
    }

    /// Move `node` to `next`; invalid transitions are logged and ignored.
    pub fn advance(&self, node: &NodeName, next: JoinState) {
        let mut states = self.states.lock();
        let current = states.entry(node.clone()).or_insert(JoinState::Pending);
        match current.advance(next) {
            Ok(state) => {
                debug!(node = %node, state = %state, "join state");
                *current = state;
            }
            Err(e) => warn!(node = %node, error = %e, "ignoring join transition"),
        }
    }

    /// Mark `node` failed unless it already reached a terminal state.
    pub fn fail(&self, node: &NodeName) {
        let mut states = self.states.lock();
        let current = states.entry(node.clone()).or_insert(JoinState::Pending);
        if !current.is_terminal() {
            *current = JoinState::JoinFailed;
        }
    }

    /// Current state of `node`, if it is a tracked worker.
    #[must_use]
    pub fn state(&self, node: &NodeName) -> Option<JoinState> {
        self.states.lock().get(node).copied()
    }
}

/// Tokens handed out during this run.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    issued: Arc<Mutex<HashSet<String>>>,
}

impl TokenLedger {
    /// Record `token` as consumed.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedOutputError::DuplicateToken`] when the same token
    /// was already handed to another worker.
    pub fn claim(&self, token: &JoinToken) -> std::result::Result<(), MalformedOutputError> {
        if self.issued.lock().insert(token.expose().to_string()) {
            Ok(())
        } else {
            Err(MalformedOutputError::DuplicateToken)
        }
    }
}

/// Everything a worker's join needs before the token is requested.
#[derive(Debug, Clone)]
pub struct JoinGate {
    /// Every incoming mesh edge applied or skipped, own address resolved.
    pub mesh: Deferred<()>,
    /// Runtime installed on the master.
    pub master_installed: Deferred<()>,
    /// Master address resolved.
    pub master_address: Deferred<()>,
    /// Runtime installed on the worker.
    pub installed: Deferred<()>,
}

/// Declare token request and join for `worker`.
pub fn join_worker(
    engine: &mut Engine,
    commands: &MultipassCommands,
    master: &Node,
    worker: &Node,
    gate: &JoinGate,
    tracker: &JoinTracker,
    ledger: &TokenLedger,
) -> Result<Deferred<()>> {
    let name = worker.name().clone();
    tracker.register(&name);

    let request = {
        let tracker = tracker.clone();
        let name = name.clone();
        Deferred::ready(commands.add_node(master.name())).map(move |command| {
            info!(node = %name, "requesting join token");
            tracker.advance(&name, JoinState::TokenRequested);
            command
        })
    };
    let add_node = engine.declare(
        OperationSpec::new(names::join_command(&name), master.name().as_str(), request)
            .secret()
            .consumed_by(names::join(&name))
            .depends_on(&gate.mesh)
            .depends_on(&gate.master_installed)
            .depends_on(&gate.master_address),
    )?;

    let token = {
        let tracker = tracker.clone();
        let ledger = ledger.clone();
        let name = name.clone();
        add_node.stdout().settle(move |result| {
            let output = result.map_err(|e| {
                classify(e, |reason| FormationError::JoinFailure {
                    node: name.clone(),
                    reason,
                })
            })?;
            let token = parse_join_token(&output).and_then(|token| {
                ledger.claim(&token)?;
                Ok(token)
            });
            match token {
                Ok(token) => {
                    tracker.advance(&name, JoinState::TokenReceived);
                    Ok(token)
                }
                Err(source) => Err(FormationError::TokenExtractionFailure { node: name, source }),
            }
        })
    };

    let join_command = {
        let tracker = tracker.clone();
        let commands = commands.clone();
        let name = name.clone();
        token.map(move |token| {
            tracker.advance(&name, JoinState::JoinIssued);
            commands.join(&name, token.expose())
        })
    };
    let join = engine.declare(
        OperationSpec::new(names::join(&name), name.as_str(), join_command)
            .delete(commands.leave(&name))
            .secret()
            .depends_on(&gate.installed),
    )?;

    let tracker = tracker.clone();
    Ok(join.done().settle(move |result| match result {
        Ok(()) => {
            tracker.advance(&name, JoinState::Joined);
            info!(node = %name, "joined cluster");
            Ok(())
        }
        Err(e) => {
            tracker.fail(&name);
            Err(classify(e, |reason| FormationError::JoinFailure { node: name, reason }))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_follows_forward_steps() {
        let tracker = JoinTracker::default();
        let node = NodeName::new("microk8s-node1");
        tracker.register(&node);
        tracker.advance(&node, JoinState::TokenRequested);
        tracker.advance(&node, JoinState::JoinIssued);
        assert_eq!(tracker.state(&node), Some(JoinState::TokenRequested));

        tracker.fail(&node);
        assert_eq!(tracker.state(&node), Some(JoinState::JoinFailed));
    }

    #[test]
    fn fail_keeps_joined() {
        let tracker = JoinTracker::default();
        let node = NodeName::new("microk8s-node1");
        for state in [
            JoinState::TokenRequested,
            JoinState::TokenReceived,
            JoinState::JoinIssued,
            JoinState::Joined,
        ] {
            tracker.advance(&node, state);
        }
        tracker.fail(&node);
        assert_eq!(tracker.state(&node), Some(JoinState::Joined));
    }

    #[test]
    fn ledger_rejects_reused_tokens() {
        let ledger = TokenLedger::default();
        let first = parse_join_token("banner\nmicrok8s join 10.0.0.1:25000/a").unwrap();
        let again = parse_join_token("banner\nmicrok8s join 10.0.0.1:25000/a").unwrap();
        let other = parse_join_token("banner\nmicrok8s join 10.0.0.1:25000/b").unwrap();

        assert!(ledger.claim(&first).is_ok());
        assert_eq!(ledger.claim(&again), Err(MalformedOutputError::DuplicateToken));
        assert!(ledger.claim(&other).is_ok());
    }
}
