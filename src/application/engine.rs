//! In-process operation graph engine.
//!
//! Operations are declared with a target, a create command (possibly built
//! from deferred inputs), an optional delete command and explicit
//! dependencies. Declaring an operation does not run it; [`Engine::run`]
//! drives every declared operation concurrently and each one starts as soon
//! as its own inputs have settled.
//!
//! Rules the engine enforces:
//!
//! - an operation whose dependency or input failed does not run and reports
//!   [`OperationStatus::Blocked`] with the root cause;
//! - commands against the same target never overlap;
//! - an operation recorded in the previous state with the same create
//!   command is not executed again, its recorded stdout is replayed;
//! - an output rejected by its check is neither recorded nor replayed;
//! - outputs marked secret are never logged.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::deferred::{Deferred, Outcome};
use crate::domain::error::FormationError;
use crate::domain::state::{OperationRecord, StackState};
use crate::error::{GraphError, Result};
use crate::port::outbound::executor::CommandExecutor;

type OutputCheck = Arc<dyn Fn(&str) -> Outcome<()> + Send + Sync>;

/// Declaration of one operation.
pub struct OperationSpec {
    name: String,
    target: String,
    create: Deferred<String>,
    delete: Option<String>,
    depends_on: Vec<Deferred<()>>,
    secret: bool,
    ignore_failure: bool,
    delete_may_fail: bool,
    consumed_by: Option<String>,
    check: Option<OutputCheck>,
}

impl std::fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("delete", &self.delete)
            .field("secret", &self.secret)
            .field("consumed_by", &self.consumed_by)
            .finish_non_exhaustive()
    }
}

impl OperationSpec {
    /// Operation whose create command is only known once `create` settles.
    pub fn new(name: impl Into<String>, target: impl Into<String>, create: Deferred<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            create,
            delete: None,
            depends_on: Vec::new(),
            secret: false,
            ignore_failure: false,
            delete_may_fail: false,
            consumed_by: None,
            check: None,
        }
    }

    /// Operation with a fixed create command.
    pub fn command(
        name: impl Into<String>,
        target: impl Into<String>,
        create: impl Into<String>,
    ) -> Self {
        Self::new(name, target, Deferred::ready(create.into()))
    }

    /// Command run by `destroy` to undo this operation.
    #[must_use]
    pub fn delete(mut self, command: impl Into<String>) -> Self {
        self.delete = Some(command.into());
        self
    }

    /// Do not start before `dependency` settles successfully.
    #[must_use]
    pub fn depends_on<T>(mut self, dependency: &Deferred<T>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.depends_on.push(dependency.unit());
        self
    }

    /// Keep stdout out of logs and terminal output.
    #[must_use]
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Accept a non-zero exit of the create and delete commands.
    #[must_use]
    pub fn ignore_failure(mut self) -> Self {
        self.ignore_failure = true;
        self.delete_may_fail = true;
        self
    }

    /// Accept a non-zero exit of the delete command only.
    #[must_use]
    pub fn delete_may_fail(mut self) -> Self {
        self.delete_may_fail = true;
        self
    }

    /// The output is single-use and consumed by `operation`.
    ///
    /// A recorded output is only replayed while `operation` is recorded
    /// too; otherwise the command runs again to get a fresh output.
    #[must_use]
    pub fn consumed_by(mut self, operation: impl Into<String>) -> Self {
        self.consumed_by = Some(operation.into());
        self
    }

    /// Only keep an output that `check` accepts.
    ///
    /// A rejected output fails the operation with the returned error and is
    /// not recorded, so the next run executes the command again. A recorded
    /// output that no longer passes is not replayed.
    #[must_use]
    pub fn check_output<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> Outcome<()> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }
}

/// Handle to a declared operation.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    stdout: Deferred<String>,
}

impl Resource {
    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Captured stdout, available once the operation completes.
    #[must_use]
    pub fn stdout(&self) -> Deferred<String> {
        self.stdout.clone()
    }

    /// Completion of the operation.
    #[must_use]
    pub fn done(&self) -> Deferred<()> {
        self.stdout.unit()
    }
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// The command ran and succeeded.
    Created,
    /// Replayed from the previous state without running.
    Unchanged,
    /// The command ran and failed.
    Failed(FormationError),
    /// An upstream failed so the command never ran.
    Blocked(FormationError),
    /// Never settled.
    Pending,
}

impl OperationStatus {
    /// Short label for reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Failed(_) => "failed",
            Self::Blocked(_) => "blocked",
            Self::Pending => "pending",
        }
    }

    /// True for created and unchanged.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Created | Self::Unchanged)
    }
}

/// Result of one operation in a run.
#[derive(Debug, Clone)]
pub struct OperationReport {
    /// Operation name.
    pub name: String,
    /// Target it ran against.
    pub target: String,
    /// Outcome.
    pub status: OperationStatus,
}

/// A declared operation as shown by `plan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOperation {
    /// Operation name.
    pub name: String,
    /// Target it runs against.
    pub target: String,
    /// Operations it waits for.
    pub depends_on: Vec<String>,
    /// Whether `destroy` has something to undo.
    pub has_delete: bool,
    /// Whether its output is secret.
    pub secret: bool,
    /// Whether the previous state already records it.
    pub recorded: bool,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct EngineRun {
    /// Per-operation outcome in declaration order.
    pub operations: Vec<OperationReport>,
    /// Previous state merged with everything applied in this run.
    pub state: StackState,
}

impl EngineRun {
    /// Number of operations whose command actually ran.
    #[must_use]
    pub fn created(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.status == OperationStatus::Created)
            .count()
    }

    /// Operations that failed or were blocked.
    pub fn failures(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations.iter().filter(|op| !op.status.is_ok())
    }
}

struct Declaration {
    name: String,
    target: String,
    depends_on: Vec<String>,
    has_delete: bool,
    secret: bool,
    completion: Deferred<String>,
}

/// The operation graph for one run.
pub struct Engine {
    executor: Arc<dyn CommandExecutor>,
    previous: Arc<StackState>,
    applied: Arc<Mutex<Vec<OperationRecord>>>,
    locks: Arc<DashMap<String, Arc<AsyncMutex<()>>>>,
    declared: Vec<Declaration>,
}

impl Engine {
    /// Create an engine over the state left by the previous run.
    pub fn new(executor: Arc<dyn CommandExecutor>, previous: StackState) -> Self {
        Self {
            executor,
            previous: Arc::new(previous),
            applied: Arc::new(Mutex::new(Vec::new())),
            locks: Arc::new(DashMap::new()),
            declared: Vec::new(),
        }
    }

    /// Declare an operation.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateOperation`] when the name is taken.
    pub fn declare(&mut self, spec: OperationSpec) -> Result<Resource> {
        if self.declared.iter().any(|d| d.name == spec.name) {
            return Err(GraphError::DuplicateOperation { name: spec.name }.into());
        }

        let mut depends_on: Vec<String> = Vec::new();
        let lineages = spec
            .depends_on
            .iter()
            .map(Deferred::lineage)
            .chain(std::iter::once(spec.create.lineage()));
        for name in lineages.flatten() {
            if !depends_on.contains(name) {
                depends_on.push(name.clone());
            }
        }

        let name = spec.name.clone();
        let target = spec.target.clone();
        let has_delete = spec.delete.is_some();
        let secret = spec.secret;

        let job = Job {
            spec,
            depends_on: depends_on.clone(),
            executor: Arc::clone(&self.executor),
            previous: Arc::clone(&self.previous),
            applied: Arc::clone(&self.applied),
            locks: Arc::clone(&self.locks),
        };
        let completion = Deferred::from_future(job.run()).with_lineage(&[name.clone()]);

        self.declared.push(Declaration {
            name: name.clone(),
            target,
            depends_on,
            has_delete,
            secret,
            completion: completion.clone(),
        });

        Ok(Resource {
            name,
            stdout: completion,
        })
    }

    /// The declared graph, without running anything.
    #[must_use]
    pub fn plan(&self) -> Vec<PlannedOperation> {
        self.declared
            .iter()
            .map(|d| PlannedOperation {
                name: d.name.clone(),
                target: d.target.clone(),
                depends_on: d.depends_on.clone(),
                has_delete: d.has_delete,
                secret: d.secret,
                recorded: self.previous.contains(&d.name),
            })
            .collect()
    }

    /// Drive every declared operation to completion.
    pub async fn run(&self) -> EngineRun {
        info!(
            operations = self.declared.len(),
            executor = self.executor.name(),
            "running operation graph"
        );
        join_all(self.declared.iter().map(|d| d.completion.resolve())).await;

        let applied = self.applied.lock().clone();
        let created: HashSet<&str> = applied.iter().map(|r| r.name.as_str()).collect();

        let operations = self
            .declared
            .iter()
            .map(|d| {
                let status = match d.completion.peek() {
                    Some(Ok(_)) if created.contains(d.name.as_str()) => OperationStatus::Created,
                    Some(Ok(_)) => OperationStatus::Unchanged,
                    Some(Err(e)) if e.is_blocked() => OperationStatus::Blocked(e),
                    Some(Err(e)) => OperationStatus::Failed(e),
                    None => OperationStatus::Pending,
                };
                OperationReport {
                    name: d.name.clone(),
                    target: d.target.clone(),
                    status,
                }
            })
            .collect();

        let mut state = (*self.previous).clone();
        for record in applied {
            state.upsert(record);
        }

        EngineRun { operations, state }
    }
}

struct Job {
    spec: OperationSpec,
    depends_on: Vec<String>,
    executor: Arc<dyn CommandExecutor>,
    previous: Arc<StackState>,
    applied: Arc<Mutex<Vec<OperationRecord>>>,
    locks: Arc<DashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Job {
    async fn run(self) -> Outcome<String> {
        let name = self.spec.name.clone();
        let result = self.apply().await;
        match &result {
            Err(e) if e.is_blocked() => debug!(operation = %name, error = %e, "blocked"),
            Err(e) => warn!(operation = %name, error = %e, "operation failed"),
            Ok(_) => {}
        }
        result
    }

    async fn apply(&self) -> Outcome<String> {
        let spec = &self.spec;
        for dependency in &spec.depends_on {
            dependency
                .resolve()
                .await
                .map_err(|e| FormationError::blocked(&spec.name, e))?;
        }
        let create = spec
            .create
            .resolve()
            .await
            .map_err(|e| FormationError::blocked(&spec.name, e))?;

        if let Some(stdout) = self.replay(&create) {
            debug!(operation = %spec.name, "unchanged, replaying recorded output");
            return Ok(stdout);
        }

        let lock = self
            .locks
            .entry(spec.target.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        info!(operation = %spec.name, target = %spec.target, "applying");
        let output = self
            .executor
            .run(&spec.target, &create)
            .await
            .map_err(|e| FormationError::Execution {
                operation: spec.name.clone(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            if !spec.ignore_failure {
                return Err(FormationError::CommandFailed {
                    operation: spec.name.clone(),
                    exit_code: output.exit_code,
                    stderr: output.stderr_tail().to_string(),
                });
            }
            debug!(
                operation = %spec.name,
                exit_code = output.exit_code,
                "non-zero exit tolerated"
            );
        }
        if !spec.secret {
            debug!(operation = %spec.name, stdout = %output.stdout.trim(), "captured output");
        }
        if let Some(check) = &spec.check {
            check(&output.stdout)?;
        }

        self.applied.lock().push(OperationRecord {
            name: spec.name.clone(),
            target: spec.target.clone(),
            create,
            delete: spec.delete.clone(),
            depends_on: self.depends_on.clone(),
            stdout: output.stdout.clone(),
            secret: spec.secret,
            ignore_failure: spec.delete_may_fail,
            applied_at: Utc::now(),
        });

        Ok(output.stdout)
    }

    fn replay(&self, create: &str) -> Option<String> {
        let recorded = self.previous.get(&self.spec.name)?;
        if recorded.create != create {
            return None;
        }
        if let Some(consumer) = &self.spec.consumed_by {
            if !self.previous.contains(consumer) {
                return None;
            }
        }
        if let Some(check) = &self.spec.check {
            if check(&recorded.stdout).is_err() {
                debug!(operation = %self.spec.name, "recorded output rejected, running again");
                return None;
            }
        }
        Some(recorded.stdout.clone())
    }
}
