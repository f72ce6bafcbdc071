//! `packforge enable` / `packforge disable` - toggle installed
//! components without a reinstall.

use std::path::PathBuf;

use clap::Args;
use console::style;
use packforge::install::TargetLayout;
use packforge::registry::{Registry, ToggleOutcome, Toggler};

use crate::commands::common::resolve_target;
use crate::error::CliError;

/// Arguments shared by enable and disable.
#[derive(Debug, Args)]
pub struct ToggleArgs {
    /// Pack name
    pub pack: String,

    /// Component to toggle
    pub component: String,

    /// Install target directory (defaults to the platform data dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Which direction the toggle goes.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Enable,
    Disable,
}

/// Run an enable or disable command.
pub fn run(args: ToggleArgs, direction: Direction) -> Result<(), CliError> {
    let target = resolve_target(args.dir, &args.pack)?;
    let layout = TargetLayout::new(&target);
    let mut registry = Registry::load(&layout.registry_path()).map_err(CliError::Registry)?;

    let mut toggler = Toggler::new(&layout, &mut registry);
    let outcome = match direction {
        Direction::Enable => toggler.enable(&args.component),
        Direction::Disable => toggler.disable(&args.component),
    }
    .map_err(CliError::Toggle)?;

    match (direction, outcome) {
        (Direction::Enable, ToggleOutcome::Changed) => {
            println!("{} {} enabled", style("✓").green(), args.component);
        }
        (Direction::Disable, ToggleOutcome::Changed) => {
            println!("{} {} disabled", style("✓").green(), args.component);
        }
        (Direction::Enable, ToggleOutcome::Unchanged) => {
            println!("{} is already enabled", args.component);
        }
        (Direction::Disable, ToggleOutcome::Unchanged) => {
            println!("{} is already disabled", args.component);
        }
    }
    Ok(())
}
