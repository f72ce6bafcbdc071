//! `packforge install` - install a pack version into a target.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::style;
use packforge::download::{DownloadManager, MirrorPool, ReqwestTransport};
use packforge::install::PackInstaller;
use packforge::manifest::Component;
use packforge::select::SelectionEngine;
use packforge::{InstallContext, InstallError};
use tracing::info;

use crate::commands::common::{
    bar_reporter, cancel_on_interrupt, install_bar, resolve_target, SystemBrowser,
};
use crate::error::CliError;

/// Arguments for the install command.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Pack name
    pub pack: String,

    /// Pack version
    pub version: String,

    /// Distribution mirror base URL (repeatable)
    #[arg(long = "mirror", required = true)]
    pub mirrors: Vec<String>,

    /// Install target directory (defaults to the platform data dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Install the server side of the pack
    #[arg(long)]
    pub server: bool,

    /// Target runtime has no core-module support
    #[arg(long)]
    pub no_coremods: bool,

    /// Select an optional component on top of the defaults (repeatable)
    #[arg(long = "with")]
    pub with: Vec<String>,

    /// Deselect an optional component (repeatable)
    #[arg(long = "without")]
    pub without: Vec<String>,
}

/// Run the install command.
pub fn run(args: InstallArgs) -> Result<(), CliError> {
    let target = resolve_target(args.dir, &args.pack)?;
    let fresh_target = !target.exists();
    let context = if args.server {
        InstallContext::server(&args.pack, &args.version, &target)
    } else {
        InstallContext::client(&args.pack, &args.version, &target)
    }
    .with_core_mods(!args.no_coremods);

    let transport = ReqwestTransport::new()
        .map_err(|e| CliError::Config(format!("Could not create HTTP client: {}", e)))?;
    let pool = Arc::new(MirrorPool::new(args.mirrors));
    let downloads =
        DownloadManager::new(transport, pool).with_opener(Box::new(SystemBrowser));
    let cancel = cancel_on_interrupt()?;

    println!(
        "Fetching manifest for {} {}",
        style(&args.pack).bold(),
        style(&args.version).bold()
    );
    let manifest = downloads
        .fetch_manifest(&context, &cancel)
        .map_err(CliError::Install)?;

    let mut engine = SelectionEngine::new(manifest.components.clone(), context.side);
    for name in &args.with {
        warn_unknown(&manifest.components, name);
        engine.select(name);
    }
    for name in &args.without {
        warn_unknown(&manifest.components, name);
        engine.deselect(name);
    }

    let selection = engine.selected();
    println!(
        "Installing {} components into {}",
        engine.visible_selected_count(),
        target.display()
    );

    let bar = install_bar();
    let progress = bar_reporter(bar.clone());
    let installer = PackInstaller::new(&context, &downloads);
    let report = match installer.install(&manifest, &selection, &progress, &cancel) {
        Ok(report) => report,
        Err(InstallError::Cancelled) => {
            bar.abandon_with_message("cancelled");
            cleanup_cancelled(&target, fresh_target);
            return Err(CliError::Install(InstallError::Cancelled));
        }
        Err(e) => {
            bar.abandon_with_message("failed");
            return Err(CliError::Install(e));
        }
    };
    bar.finish_with_message("done");
    info!(
        pack = %args.pack,
        version = %args.version,
        target = %target.display(),
        "install command completed"
    );

    println!(
        "{} {} components installed",
        style("✓").green(),
        report.installed.len()
    );
    for excluded in &report.excluded {
        println!(
            "{} skipped optional component {}: {}",
            style("!").yellow(),
            style(&excluded.name).bold(),
            excluded.reason
        );
    }
    Ok(())
}

fn warn_unknown(components: &[Component], name: &str) {
    if !components.iter().any(|c| c.name == name) {
        eprintln!(
            "Warning: component '{}' is not in this pack version",
            name
        );
    }
}

/// A cancelled install must not leave a partially-usable target. When
/// the target was created by this run it is deleted outright; an
/// existing target is kept but flagged as incomplete.
fn cleanup_cancelled(target: &Path, fresh_target: bool) {
    if fresh_target {
        match std::fs::remove_dir_all(target) {
            Ok(()) => eprintln!("Removed partial install at {}", target.display()),
            Err(e) => eprintln!(
                "Warning: could not remove partial install at {}: {}",
                target.display(),
                e
            ),
        }
    } else {
        eprintln!(
            "The install at {} is incomplete; re-run the install before using it.",
            target.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_cleanup_cancelled_removes_fresh_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("instance");
        std::fs::create_dir_all(target.join("mods")).unwrap();
        std::fs::write(target.join("mods/partial.zip"), b"half").unwrap();

        cleanup_cancelled(&target, true);
        assert!(!target.exists());
    }

    #[test]
    fn test_cleanup_cancelled_keeps_existing_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("instance");
        std::fs::create_dir_all(target.join("mods")).unwrap();

        cleanup_cancelled(&target, false);
        assert!(target.join("mods").is_dir());
    }
}
