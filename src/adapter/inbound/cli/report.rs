//! Rendering of formation, plan and teardown reports.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::application::engine::{OperationReport, OperationStatus, PlannedOperation};
use crate::application::report::{FormationReport, NodeReport};
use crate::application::teardown::TeardownReport;
use crate::domain::ClusterOutputs;

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    name: String,
    #[tabled(rename = "Role")]
    role: &'static str,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Runtime")]
    runtime: &'static str,
    #[tabled(rename = "Hosts")]
    hosts: String,
    #[tabled(rename = "Join")]
    join: String,
}

impl From<&NodeReport> for NodeRow {
    fn from(node: &NodeReport) -> Self {
        let total = node.mesh_applied + node.mesh_skipped + node.mesh_failed;
        let mut hosts = format!("{}/{total}", node.mesh_applied);
        if node.mesh_skipped > 0 {
            hosts.push_str(&format!(" ({} skipped)", node.mesh_skipped));
        }

        Self {
            name: node.name.to_string(),
            role: if node.is_master { "master" } else { "worker" },
            address: node
                .address
                .map_or_else(|| "-".to_string(), |address| address.to_string()),
            runtime: if node.installed { "installed" } else { "-" },
            hosts,
            join: node
                .join
                .map_or_else(|| "-".to_string(), |state| state.to_string()),
        }
    }
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Operation")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Operation")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Depends on")]
    depends_on: String,
    #[tabled(rename = "Undo")]
    undo: &'static str,
    #[tabled(rename = "State")]
    state: &'static str,
}

fn operation_json(op: &OperationReport) -> serde_json::Value {
    let error = match &op.status {
        OperationStatus::Failed(e) | OperationStatus::Blocked(e) => Some(e.to_string()),
        _ => None,
    };
    json!({
        "name": op.name,
        "target": op.target,
        "status": op.status.label(),
        "error": error,
    })
}

fn outputs_json(outputs: &ClusterOutputs, show_secrets: bool) -> serde_json::Value {
    let credential = outputs.cluster_credential.as_ref().map(|credential| {
        if show_secrets {
            credential.expose().to_string()
        } else {
            "[secret]".to_string()
        }
    });
    json!({
        "clusterCredential": credential,
        "masterAddress": outputs.master_address.map(|address| address.to_string()),
    })
}

/// Print the outcome of `up`.
pub fn print_formation(report: &FormationReport) {
    if output::is_json() {
        output::json_output(json!({
            "command": "up",
            "success": report.is_success(),
            "nodes": report.nodes,
            "operations": report.operations.iter().map(operation_json).collect::<Vec<_>>(),
            "outputs": outputs_json(&report.outputs, false),
            "failures": report.failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }));
        return;
    }

    output::section("Nodes");
    let rows: Vec<NodeRow> = report.nodes.iter().map(NodeRow::from).collect();
    output::lines(&Table::new(rows).to_string());

    if output::verbosity() > 0 {
        output::section("Operations");
        let rows: Vec<OperationRow> = report
            .operations
            .iter()
            .map(|op| OperationRow {
                name: op.name.clone(),
                target: op.target.clone(),
                status: op.status.label(),
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }

    let created = report
        .operations
        .iter()
        .filter(|op| op.status == OperationStatus::Created)
        .count();
    let unchanged = report
        .operations
        .iter()
        .filter(|op| op.status == OperationStatus::Unchanged)
        .count();

    output::section("Summary");
    output::field("Executed", output::positive(created));
    output::field("Unchanged", output::muted(unchanged));
    output::field("Joined", report.joined());
    print_outputs(&report.outputs, false);

    if !report.failures.is_empty() {
        output::section("Failures");
        for failure in &report.failures {
            output::warning(&failure.to_string());
        }
        output::hint("fix the cause and run `clusterforge up` again; applied steps are skipped");
    }
}

/// Print the declared graph.
pub fn print_plan(plan: &[PlannedOperation]) {
    if output::is_json() {
        let operations: Vec<_> = plan
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "target": op.target,
                    "dependsOn": op.depends_on,
                    "hasDelete": op.has_delete,
                    "secret": op.secret,
                    "recorded": op.recorded,
                })
            })
            .collect();
        output::json_output(json!({ "command": "plan", "operations": operations }));
        return;
    }

    let rows: Vec<PlanRow> = plan
        .iter()
        .map(|op| PlanRow {
            name: op.name.clone(),
            target: op.target.clone(),
            depends_on: if op.depends_on.is_empty() {
                "-".to_string()
            } else {
                op.depends_on.join(", ")
            },
            undo: if op.has_delete { "yes" } else { "-" },
            state: if op.recorded { "recorded" } else { "new" },
        })
        .collect();

    let recorded = plan.iter().filter(|op| op.recorded).count();
    output::section("Operations");
    output::lines(&Table::new(rows).to_string());
    output::field("Declared", plan.len());
    output::field("Recorded", recorded);
}

/// Print the outcome of `destroy`.
pub fn print_teardown(report: &TeardownReport) {
    if output::is_json() {
        output::json_output(json!({
            "command": "destroy",
            "complete": report.is_complete(),
            "deleted": report.deleted,
            "forgotten": report.forgotten,
            "failed": report.failed.as_ref().map(|(name, e)| json!({
                "operation": name,
                "error": e.to_string(),
            })),
            "remaining": report.state.operations.len(),
        }));
        return;
    }

    for name in &report.deleted {
        output::success(&format!("deleted {name}"));
    }
    if output::verbosity() > 0 {
        for name in &report.forgotten {
            output::note(&format!("forgot {name}"));
        }
    }
    if let Some((name, e)) = &report.failed {
        output::warning(&format!("{name}: {e}"));
        output::field("Remaining", output::negative(report.state.operations.len()));
    }
}

/// Print stack outputs.
pub fn print_outputs(outputs: &ClusterOutputs, show_secrets: bool) {
    if output::is_json() {
        output::json_output(json!({
            "command": "outputs",
            "outputs": outputs_json(outputs, show_secrets),
        }));
        return;
    }

    output::field(
        "Master address",
        outputs
            .master_address
            .map_or_else(|| "-".to_string(), |address| address.to_string()),
    );
    match &outputs.cluster_credential {
        Some(credential) if show_secrets => {
            output::section("Cluster credential");
            output::lines(credential.expose());
        }
        Some(_) => output::field("Credential", output::muted("[secret] (--show-secrets to print)")),
        None => output::field("Credential", "-"),
    }
}
