//! Common types and utilities shared across CLI commands.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use indicatif::{ProgressBar, ProgressStyle};
use packforge::context::safe_name;
use packforge::download::BrowserOpener;
use packforge::progress::{ProgressEvent, ProgressReporter};
use packforge::CancelToken;

use crate::error::CliError;

/// Resolve the install target directory: an explicit `--dir`, or the
/// platform data directory under `packforge/<pack-safe-name>`.
pub fn resolve_target(dir: Option<PathBuf>, pack: &str) -> Result<PathBuf, CliError> {
    if let Some(dir) = dir {
        return Ok(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("packforge").join(safe_name(pack)))
        .ok_or_else(|| {
            CliError::Config(
                "No platform data directory found; pass --dir explicitly".to_string(),
            )
        })
}

/// Opens URLs in the user's default browser for manual downloads.
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        #[cfg(target_os = "macos")]
        let command = "open";
        #[cfg(target_os = "windows")]
        let command = "explorer";
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let command = "xdg-open";

        Command::new(command).arg(url).spawn().map(|_| ())
    }
}

/// A cancel token flipped by Ctrl-C.
pub fn cancel_on_interrupt() -> Result<CancelToken, CliError> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, finishing up...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Could not install Ctrl-C handler: {}", e)))?;
    Ok(cancel)
}

/// Build the install progress bar.
pub fn install_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// A reporter that drives an indicatif bar from pipeline events.
pub fn bar_reporter(bar: ProgressBar) -> ProgressReporter {
    ProgressReporter::new(Some(Box::new(move |event: &ProgressEvent| {
        if let Some(percent) = event.percent {
            bar.set_position(u64::from(percent));
        }
        match event.sub_percent {
            Some(sub) => bar.set_message(format!("{} ({}%)", event.step, sub)),
            None => bar.set_message(event.step.clone()),
        }
    })))
}
