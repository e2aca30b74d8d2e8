//! Check command

use anyhow::Result;
use camino::Utf8Path;

use super::{build_reconciler, load_config, select_components};
use crate::cli::CheckArgs;
use crate::output;

pub async fn run(args: CheckArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let components = select_components(&config, &args.components)?;
    let reconciler = build_reconciler(&config)?;

    let mut statuses = Vec::with_capacity(components.len());
    let mut failures = 0;
    for component in &components {
        match reconciler.check(component).await {
            Ok(status) => statuses.push(status),
            Err(e) => {
                failures += 1;
                output::error(&format!("{}: {}", component.id(), e));
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        for status in &statuses {
            output::version_status(status);
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} components could not be checked", failures, components.len());
    }
    Ok(())
}
