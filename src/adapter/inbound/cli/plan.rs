//! Handler for the `plan` command.

use crate::adapter::inbound::cli::{output, report, Context};
use crate::error::Result;

/// Execute `plan`. Nothing is run.
pub async fn execute(context: &Context, nodes: Option<usize>) -> Result<()> {
    let count = context.node_count(nodes);
    let plan = context.orchestrator().plan(count).await?;

    if !output::is_json() {
        output::header(env!("CARGO_PKG_VERSION"));
        output::field("Nodes", count);
        output::field("State", context.state_path.display());
    }
    report::print_plan(&plan);
    Ok(())
}
