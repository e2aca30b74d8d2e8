//! Config command

use anyhow::{Context, Result};
use camino::Utf8Path;
use cooler_core::HierarchicalConfigLoader;

use super::load_config;
use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
        ConfigCommands::Path => path(config_path),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    output::header("Components");
    for component in config.managed_components()? {
        output::kv(component.id(), component.release_endpoint().as_str());
    }

    output::header("Runtime configuration");
    let yaml = serde_yaml_ng::to_string(&config).context("Failed to serialize configuration")?;
    println!("{}", yaml);
    Ok(())
}

fn path(config_path: Option<&Utf8Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => HierarchicalConfigLoader::new()?.runtime_config_path(),
    };

    println!("{}", path);
    if !path.exists() {
        output::info("File does not exist, built-in defaults are in effect");
    }
    Ok(())
}
