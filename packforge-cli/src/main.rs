//! packforge CLI - install and manage modular content packs.
//!
//! This binary provides a command-line interface to the packforge
//! library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use packforge::logging::{default_log_dir, default_log_file, init_logging};

use commands::toggle::Direction;
use error::CliError;

#[derive(Parser)]
#[command(name = "packforge")]
#[command(version = packforge::VERSION)]
#[command(about = "Install and manage modular content packs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a pack version into a target directory
    Install(commands::install::InstallArgs),
    /// Re-enable a disabled component
    Enable(commands::toggle::ToggleArgs),
    /// Disable an installed component
    Disable(commands::toggle::ToggleArgs),
    /// List installed components for a target
    List(commands::list::ListArgs),
}

fn main() {
    let cli = Cli::parse();

    // Keep the guard alive for the whole run so the log file flushes.
    let _logging = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(args),
        Commands::Enable(args) => commands::toggle::run(args, Direction::Enable),
        Commands::Disable(args) => commands::toggle::run(args, Direction::Disable),
        Commands::List(args) => commands::list::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
