//! Handler for the `destroy` command.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::adapter::inbound::cli::{output, report, Context};
use crate::error::{Error, Result};

/// Execute `destroy`.
pub async fn execute(context: &Context, yes: bool) -> Result<()> {
    let orchestrator = context.orchestrator();
    let state = orchestrator.state().await?;
    if state.is_empty() {
        if output::is_json() {
            output::json_output(serde_json::json!({
                "command": "destroy",
                "complete": true,
                "deleted": [],
                "forgotten": [],
                "failed": null,
                "remaining": 0,
            }));
        } else {
            output::note("Nothing to destroy.");
        }
        return Ok(());
    }

    if !yes {
        let undoable = state
            .operations
            .iter()
            .filter(|record| record.delete.is_some())
            .count();
        let confirm = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Undo {undoable} recorded operations in {}?",
                context.state_path.display()
            ))
            .default(false)
            .interact()?;
        if !confirm {
            output::note("Destroy aborted.");
            return Ok(());
        }
    }

    let pb = output::spinner("Destroying cluster");
    let teardown = orchestrator.destroy().await?;
    if teardown.is_complete() {
        output::spinner_success(&pb, "Cluster destroyed");
    } else {
        output::spinner_fail(&pb, "Destroy stopped");
    }
    report::print_teardown(&teardown);

    match teardown.failed {
        None => Ok(()),
        Some((operation, e)) => Err(Error::TeardownIncomplete {
            operation,
            reason: e.to_string(),
        }),
    }
}
