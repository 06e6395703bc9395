//! Domain errors and formation failure kinds.
//!
//! [`DomainError`] covers invariant violations when building domain values.
//! [`MalformedOutputError`] isolates the brittle contracts we have with
//! command output (VM info JSON, `add-node` text). [`FormationError`] is the
//! failure carried through deferred values; it is `Clone` because a single
//! failure is observed by every downstream operation that waits on it.

use thiserror::Error;

use super::id::NodeName;
use super::join::JoinState;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A cluster needs at least the master node.
    #[error("node count must be at least 1")]
    EmptyCluster,

    /// Node prefixes end up in hostnames and shell commands.
    #[error("invalid node prefix '{prefix}': {reason}")]
    InvalidNodePrefix {
        /// The rejected prefix.
        prefix: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The join state machine only moves forward.
    #[error("invalid join transition {from} -> {to}")]
    InvalidJoinTransition {
        /// Current state.
        from: JoinState,
        /// Requested state.
        to: JoinState,
    },
}

/// Command output that does not match the shape we parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedOutputError {
    /// Output had fewer lines than the positional parser needs.
    #[error("expected at least {expected} lines of output, got {actual}")]
    TooFewLines {
        /// Minimum number of lines.
        expected: usize,
        /// Lines actually present.
        actual: usize,
    },

    /// The line holding the value was blank.
    #[error("line {line} of output is empty")]
    EmptyLine {
        /// Zero-based line index.
        line: usize,
    },

    /// The command produced no output at all.
    #[error("command produced no output")]
    EmptyOutput,

    /// Info payload was not the expected JSON document.
    #[error("invalid info payload: {0}")]
    InvalidJson(String),

    /// Info payload has no entry for the instance.
    #[error("no instance named {node} in info payload")]
    MissingInstance {
        /// Instance looked up.
        node: String,
    },

    /// Instance has no IPv4 address yet.
    #[error("no IPv4 address reported for {node}")]
    MissingAddress {
        /// Instance looked up.
        node: String,
    },

    /// First IPv4 entry does not parse.
    #[error("invalid IPv4 address '{value}'")]
    InvalidAddress {
        /// Raw value found in the payload.
        value: String,
    },

    /// The master handed out a token we already consumed.
    #[error("join token was already issued earlier in this run")]
    DuplicateToken,
}

/// Failure kinds of the formation pipeline.
///
/// Each kind is local to the dependency subtree it occurs in. Operations that
/// never ran because an upstream failed report [`FormationError::Blocked`]
/// with the root cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormationError {
    /// VM purge or launch failed.
    #[error("provisioning {node} failed: {reason}")]
    ProvisioningFailure {
        /// Node being provisioned.
        node: NodeName,
        /// Underlying failure.
        reason: String,
    },

    /// VM info payload did not yield an address.
    #[error("could not resolve address of {node}: {source}")]
    AddressResolutionFailure {
        /// Node being resolved.
        node: NodeName,
        /// Parse failure.
        #[source]
        source: MalformedOutputError,
    },

    /// Appending a hosts entry on the target failed.
    #[error("hosts entry for {source_node} on {target} failed: {reason}")]
    MeshPropagationFailure {
        /// Node whose entry was appended.
        source_node: NodeName,
        /// Node whose hosts table was edited.
        target: NodeName,
        /// Underlying failure.
        reason: String,
    },

    /// Runtime install (or master post-install step) failed.
    #[error("runtime install on {node} failed: {reason}")]
    InstallFailure {
        /// Node being installed.
        node: NodeName,
        /// Underlying failure.
        reason: String,
    },

    /// `add-node` output did not contain a usable token.
    #[error("join token for {node} could not be extracted: {source}")]
    TokenExtractionFailure {
        /// Worker the token was requested for.
        node: NodeName,
        /// Parse failure.
        #[source]
        source: MalformedOutputError,
    },

    /// The join command failed or never ran.
    #[error("{node} failed to join the cluster: {reason}")]
    JoinFailure {
        /// Worker attempting to join.
        node: NodeName,
        /// Underlying failure.
        reason: String,
    },

    /// A command exited non-zero.
    #[error("{operation} exited with status {exit_code}: {stderr}")]
    CommandFailed {
        /// Operation name.
        operation: String,
        /// Process exit code.
        exit_code: i32,
        /// Last line of stderr.
        stderr: String,
    },

    /// A command could not be run at all (spawn error, timeout).
    #[error("{operation} could not run: {reason}")]
    Execution {
        /// Operation name.
        operation: String,
        /// Underlying failure.
        reason: String,
    },

    /// An operation never ran because an upstream failed.
    #[error("{operation} blocked by upstream failure: {cause}")]
    Blocked {
        /// Operation that did not run.
        operation: String,
        /// Root cause.
        cause: Box<FormationError>,
    },
}

impl FormationError {
    /// Wrap `cause` as the reason `operation` did not run.
    ///
    /// Nested blocks collapse so the cause is always the root failure.
    #[must_use]
    pub fn blocked(operation: impl Into<String>, cause: FormationError) -> Self {
        Self::Blocked {
            operation: operation.into(),
            cause: Box::new(cause.root_cause().clone()),
        }
    }

    /// The failure that started the chain.
    #[must_use]
    pub fn root_cause(&self) -> &FormationError {
        match self {
            Self::Blocked { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// True when the error only says an upstream failed.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}
