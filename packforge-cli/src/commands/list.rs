//! `packforge list` - show what is installed for a target.

use std::path::PathBuf;

use clap::Args;
use console::style;
use packforge::install::TargetLayout;
use packforge::registry::Registry;

use crate::commands::common::resolve_target;
use crate::error::CliError;

/// Arguments for the list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Pack name
    pub pack: String,

    /// Install target directory (defaults to the platform data dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Include disabled components only
    #[arg(long)]
    pub disabled: bool,
}

/// Run the list command.
pub fn run(args: ListArgs) -> Result<(), CliError> {
    let target = resolve_target(args.dir, &args.pack)?;
    let layout = TargetLayout::new(&target);
    let registry = Registry::load(&layout.registry_path()).map_err(CliError::Registry)?;

    let entries: Vec<_> = registry
        .entries()
        .iter()
        .filter(|e| !args.disabled || e.disabled)
        .collect();

    if entries.is_empty() {
        println!("No components installed at {}", target.display());
        return Ok(());
    }

    for entry in entries {
        let state = if entry.disabled {
            style("disabled").yellow()
        } else {
            style("enabled").green()
        };
        let kind = entry.install_type.to_string();
        println!(
            "{:<30} {:<12} {:<10} {}",
            entry.name, entry.version, kind, state
        );
        if !entry.description.is_empty() {
            println!("    {}", style(&entry.description).dim());
        }
    }
    Ok(())
}
