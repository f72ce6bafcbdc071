//! Persisted install state: the installed-component registry and the
//! jar order.
//!
//! Both files live at the target root and are rewritten wholesale on
//! every mutation; concurrent mutation of the same target must be
//! serialized by the caller. Operations against different targets are
//! independent.

mod toggler;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InstallError, InstallResult};
use crate::manifest::InstallType;

pub use toggler::{ToggleOutcome, Toggler};

/// One installed component, as recorded per install target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledComponent {
    pub name: String,
    pub version: String,
    pub optional: bool,
    /// Backing file name inside the active (or holding) directory.
    pub file: String,
    #[serde(rename = "type")]
    pub install_type: InstallType,
    /// Display color hex triplet, when the manifest declared one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: String,
    /// True when the file sits in the disabled-components holding area.
    #[serde(default)]
    pub disabled: bool,
}

/// The flat per-target list of installed components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    entries: Vec<InstalledComponent>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry from disk. A missing file is an empty registry.
    pub fn load(path: &Path) -> InstallResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| InstallError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            InstallError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Persist the registry, rewriting the file wholesale.
    pub fn save(&self, path: &Path) -> InstallResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            InstallError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        fs::write(path, content).map_err(|e| InstallError::io(path, e))
    }

    /// All entries, in install order.
    pub fn entries(&self) -> &[InstalledComponent] {
        &self.entries
    }

    /// Find an entry by component name.
    pub fn get(&self, name: &str) -> Option<&InstalledComponent> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Find a mutable entry by component name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut InstalledComponent> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Insert or replace an entry by name.
    pub fn upsert(&mut self, entry: InstalledComponent) {
        match self.get_mut(&entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

/// Ordered list of archive-member file names for the runtime loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarOrder(Vec<String>);

impl JarOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file name if not already listed.
    pub fn push(&mut self, file: impl Into<String>) {
        let file = file.into();
        if !self.0.contains(&file) {
            self.0.push(file);
        }
    }

    /// Remove a file name, keeping relative order of the rest.
    pub fn remove(&mut self, file: &str) {
        self.0.retain(|f| f != file);
    }

    /// Replace a file name in place, preserving its position.
    pub fn rename(&mut self, from: &str, to: &str) {
        for entry in &mut self.0 {
            if entry == from {
                *entry = to.to_string();
            }
        }
    }

    /// The ordered file names.
    pub fn files(&self) -> &[String] {
        &self.0
    }

    /// Load the jar order from disk. A missing file is an empty order.
    pub fn load(path: &Path) -> InstallResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| InstallError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            InstallError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Persist the jar order, rewriting the file wholesale.
    pub fn save(&self, path: &Path) -> InstallResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            InstallError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        fs::write(path, content).map_err(|e| InstallError::io(path, e))
    }
}
