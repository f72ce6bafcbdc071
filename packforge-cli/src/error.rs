//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent
//! formatting and appropriate exit codes.

use std::fmt;
use std::process;

use packforge::InstallError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Bad or missing command-line configuration
    Config(String),
    /// Install pipeline failure
    Install(InstallError),
    /// Enable/disable failure
    Toggle(InstallError),
    /// Could not read per-target install state
    Registry(InstallError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Install(InstallError::ManifestUnavailable { .. }) => {
                eprintln!();
                eprintln!("Check that:");
                eprintln!("  1. The pack name and version are spelled correctly");
                eprintln!("  2. At least one --mirror URL is reachable");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Install(e) => write!(f, "Install failed: {}", e),
            CliError::Toggle(e) => write!(f, "Toggle failed: {}", e),
            CliError::Registry(e) => write!(f, "Could not read install state: {}", e),
        }
    }
}

impl std::error::Error for CliError {}
