//! Handler for the `outputs` command.

use crate::adapter::inbound::cli::{output, report, Context};
use crate::error::Result;

/// Execute `outputs`.
pub async fn execute(context: &Context, show_secrets: bool) -> Result<()> {
    let outputs = context.orchestrator().outputs().await?;
    if outputs.is_empty() && !output::is_json() {
        output::note("No outputs recorded. Run `clusterforge up` first.");
        return Ok(());
    }
    report::print_outputs(&outputs, show_secrets);
    Ok(())
}
