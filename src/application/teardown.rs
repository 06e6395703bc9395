//! Destroy recorded operations in reverse dependency order.
//!
//! Operations are undone one at a time: an operation is only undone once
//! every operation that depended on it is gone. Among operations that are
//! ready at the same time, the most recently applied goes first. Records
//! without a delete command are dropped without running anything.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::error::FormationError;
use crate::domain::state::{OperationRecord, StackState};
use crate::port::outbound::executor::CommandExecutor;

/// Outcome of a destroy pass.
#[derive(Debug, Clone)]
pub struct TeardownReport {
    /// Operations whose delete command ran.
    pub deleted: Vec<String>,
    /// Operations dropped from state without a delete command.
    pub forgotten: Vec<String>,
    /// The delete that stopped the pass, if any.
    pub failed: Option<(String, FormationError)>,
    /// What is left to destroy.
    pub state: StackState,
}

impl TeardownReport {
    /// True when every record was removed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.state.is_empty()
    }
}

/// Order in which records must be undone: dependents before dependencies.
#[must_use]
pub fn teardown_order(records: &[OperationRecord]) -> Vec<&OperationRecord> {
    let names: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();

    // Number of recorded dependents still standing per operation.
    let mut dependents: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for dependency in &record.depends_on {
            if names.contains(dependency.as_str()) {
                *dependents.entry(dependency.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut remaining: Vec<&OperationRecord> = records.iter().collect();
    let mut order = Vec::with_capacity(records.len());

    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .rposition(|r| dependents.get(r.name.as_str()).copied().unwrap_or(0) == 0)
            // A cycle cannot come out of the engine; fall back to list order.
            .unwrap_or(remaining.len() - 1);
        let record = remaining.remove(next);

        for dependency in &record.depends_on {
            if let Some(count) = dependents.get_mut(dependency.as_str()) {
                *count = count.saturating_sub(1);
            }
        }
        order.push(record);
    }

    order
}

/// Undo every record in `state`.
///
/// Stops at the first delete that fails and is not tolerated; the records
/// not yet undone stay in the returned state.
pub async fn teardown(executor: &dyn CommandExecutor, state: StackState) -> TeardownReport {
    let order: Vec<OperationRecord> = teardown_order(&state.operations)
        .into_iter()
        .cloned()
        .collect();

    let mut deleted = Vec::new();
    let mut forgotten = Vec::new();
    let mut removed: HashSet<String> = HashSet::new();
    let mut failed = None;

    for record in order {
        let Some(command) = record.delete.as_deref() else {
            forgotten.push(record.name.clone());
            removed.insert(record.name);
            continue;
        };

        info!(operation = %record.name, target = %record.target, "deleting");
        let outcome = match executor.run(&record.target, command).await {
            Ok(output) if output.success() || record.ignore_failure => Ok(()),
            Ok(output) => Err(FormationError::CommandFailed {
                operation: record.name.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr_tail().to_string(),
            }),
            Err(e) => Err(FormationError::Execution {
                operation: record.name.clone(),
                reason: e.to_string(),
            }),
        };

        match outcome {
            Ok(()) => {
                deleted.push(record.name.clone());
                removed.insert(record.name);
            }
            Err(e) => {
                warn!(operation = %record.name, error = %e, "delete failed, stopping");
                failed = Some((record.name, e));
                break;
            }
        }
    }

    let mut remaining = state;
    remaining
        .operations
        .retain(|record| !removed.contains(&record.name));
    if remaining.operations.is_empty() {
        remaining.outputs = Default::default();
    }

    TeardownReport {
        deleted,
        forgotten,
        failed,
        state: remaining,
    }
}
