//! packforge - modular content pack installation
//!
//! packforge turns a versioned pack manifest into an installed,
//! verified set of components on a local target:
//!
//! - [`manifest`] parses the pack description into components and
//!   post-install actions
//! - [`select`] maintains a consistent user selection under group,
//!   dependency, and nested-option constraints
//! - [`download`] fetches artifacts with hash verification, retry, and
//!   mirror failover
//! - [`install`] places artifacts by type, runs actions, and drives
//!   the end-to-end pipeline
//! - [`registry`] persists what was installed and toggles components
//!   on and off without a reinstall
//!
//! The pipeline is synchronous and side-effect free outside the target
//! root; callers supply an [`context::InstallContext`], a progress
//! callback, and a cancellation token.

pub mod context;
pub mod download;
pub mod error;
pub mod install;
pub mod logging;
pub mod manifest;
pub mod progress;
pub mod registry;
pub mod select;

#[cfg(test)]
pub(crate) mod testutil;

pub use context::{InstallContext, Side};
pub use error::{InstallError, InstallResult};
pub use progress::{CancelToken, ProgressEvent, ProgressReporter};

/// Library version from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
