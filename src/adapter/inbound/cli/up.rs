//! Handler for the `up` command.

use crate::adapter::inbound::cli::{output, report, Context};
use crate::error::{Error, Result};

/// Execute `up`.
pub async fn execute(context: &Context, nodes: Option<usize>) -> Result<()> {
    let count = context.node_count(nodes);
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Nodes", count);
    output::field("State", context.state_path.display());

    let pb = output::spinner(&format!("Forming a {count}-node cluster"));
    let result = context.orchestrator().up(count).await;
    let formation = match result {
        Ok(formation) => formation,
        Err(e) => {
            output::spinner_fail(&pb, "Formation aborted");
            return Err(e);
        }
    };

    if formation.is_success() {
        output::spinner_success(&pb, &format!("Cluster formed ({} joined)", formation.joined()));
    } else {
        output::spinner_fail(&pb, "Cluster formed with failures");
    }
    report::print_formation(&formation);

    if formation.is_success() {
        Ok(())
    } else {
        Err(Error::FormationIncomplete {
            count: formation.failures.len(),
        })
    }
}
