//! The install context value object.
//!
//! Everything the pipeline needs to know about *where* and *for whom* it
//! is installing travels in one injected value, so the core stays free of
//! ambient global state and is independently testable.

use std::path::{Path, PathBuf};

/// Which side of the pack is being installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// An end-user client installation.
    Client,
    /// A dedicated server installation.
    Server,
}

impl Side {
    /// Check if this is a server-side install.
    pub fn is_server(&self) -> bool {
        matches!(self, Side::Server)
    }
}

/// Context for a single install operation.
#[derive(Debug, Clone)]
pub struct InstallContext {
    /// Identifier of the pack being installed.
    pub pack: String,
    /// URL-safe form of the pack identifier, used in distribution paths.
    pub pack_safe_name: String,
    /// Version string of the pack being installed.
    pub version: String,
    /// Client or server install.
    pub side: Side,
    /// Root directory of the install target.
    pub target_root: PathBuf,
    /// Whether the target runtime supports core modules.
    ///
    /// When false, recompose actions aimed at the core-module directory
    /// fall back to the generic archive-member directory.
    pub supports_core_mods: bool,
}

impl InstallContext {
    /// Create a client-side context with core-module support.
    pub fn client(
        pack: impl Into<String>,
        version: impl Into<String>,
        target_root: impl Into<PathBuf>,
    ) -> Self {
        let pack = pack.into();
        let pack_safe_name = safe_name(&pack);
        Self {
            pack,
            pack_safe_name,
            version: version.into(),
            side: Side::Client,
            target_root: target_root.into(),
            supports_core_mods: true,
        }
    }

    /// Create a server-side context with core-module support.
    pub fn server(
        pack: impl Into<String>,
        version: impl Into<String>,
        target_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            side: Side::Server,
            ..Self::client(pack, version, target_root)
        }
    }

    /// Override core-module support (builder pattern).
    pub fn with_core_mods(mut self, supported: bool) -> Self {
        self.supports_core_mods = supported;
        self
    }

    /// The install target root.
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Relative distribution path of this pack version's manifest.
    pub fn manifest_path(&self) -> String {
        format!(
            "packs/{}/versions/{}/pack.json",
            self.pack_safe_name, self.version
        )
    }
}

/// Normalize a pack name for use in distribution URLs.
///
/// Lowercases and replaces whitespace runs with a single hyphen; strips
/// any character that is not alphanumeric, hyphen, or underscore.
pub fn safe_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_sep {
                out.push('-');
                last_was_sep = true;
            }
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        }
    }
    out
}
