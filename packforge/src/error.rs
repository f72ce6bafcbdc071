//! Error types for the install pipeline.
//!
//! Component-level recoverable conditions (optional component failed to
//! verify or place, nested path missing) are absorbed inside the install
//! executor and surface only as log entries plus an excluded-component
//! note in the final report. Everything that reaches the caller as an
//! `Err` is fatal to the install as a whole.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur during pack installation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// No readable manifest could be obtained after mirror failover.
    #[error("no readable manifest for {pack} {version}: {reason}")]
    ManifestUnavailable {
        pack: String,
        version: String,
        reason: String,
    },

    /// The fetched bytes never matched the expected hash after all retries.
    #[error("hash verification failed for {file}: expected {expected}, last got {actual}")]
    ArtifactVerificationFailed {
        file: String,
        expected: String,
        actual: String,
    },

    /// Network or connection failure with no remaining source.
    #[error("artifact unavailable: {url}: {reason}")]
    ArtifactUnavailable { url: String, reason: String },

    /// A filesystem placement operation (copy/extract/repack) failed.
    #[error("failed to place {component} at {path}: {reason}")]
    PlacementFailed {
        component: String,
        path: PathBuf,
        reason: String,
    },

    /// A decompress-and-place component's inner path was absent.
    ///
    /// Never fatal on its own; carried here so the executor can log and
    /// skip uniformly.
    #[error("nested path {} not present inside {component}", .path.display())]
    NestedPathMissing { component: String, path: PathBuf },

    /// Cooperative cancellation was observed.
    ///
    /// Not an error in the usual sense: the caller decides what to do
    /// with the partially-written target.
    #[error("operation cancelled")]
    Cancelled,

    /// A named component is not present in the installed registry.
    #[error("component {name} is not installed in this target")]
    UnknownComponent { name: String },

    /// An action referenced components in a way its verb does not allow.
    #[error("invalid {verb} action: {reason}")]
    InvalidAction { verb: String, reason: String },

    /// Underlying filesystem failure outside component placement.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    /// Convenience constructor for filesystem failures.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this condition is recoverable for an optional component.
    ///
    /// Optional components that fail verification or placement are logged
    /// and excluded rather than aborting the install.
    pub fn is_component_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ArtifactVerificationFailed { .. }
                | Self::PlacementFailed { .. }
                | Self::NestedPathMissing { .. }
        )
    }
}
