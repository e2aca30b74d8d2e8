//! Reconcile command

use anyhow::Result;
use camino::Utf8Path;

use super::{build_reconciler, load_config, select_components};
use crate::cli::ReconcileArgs;
use crate::output;

pub async fn run(args: ReconcileArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let components = select_components(&config, &args.components)?;
    let reconciler = build_reconciler(&config)?;

    let mut outcomes = Vec::with_capacity(components.len());
    for component in &components {
        outcomes.push(reconciler.reconcile(component).await);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            output::outcome(outcome);
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} components failed to reconcile", failed, outcomes.len());
    }
    Ok(())
}
