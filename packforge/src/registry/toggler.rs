//! Enable/disable installed components without a reinstall.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{InstallError, InstallResult};
use crate::install::{merge_jar_stripping_meta, TargetLayout};
use crate::manifest::InstallType;

use super::Registry;

/// What a toggle operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The component's file was moved and the registry updated.
    Changed,
    /// The component was already in the requested state.
    Unchanged,
}

/// Moves installed component files between the active directories and
/// the disabled holding area, keeping the registry in sync.
///
/// The registry is rewritten wholesale after every change; callers
/// toggling the same install target concurrently must serialize.
pub struct Toggler<'a> {
    layout: &'a TargetLayout,
    registry: &'a mut Registry,
}

impl<'a> Toggler<'a> {
    pub fn new(layout: &'a TargetLayout, registry: &'a mut Registry) -> Self {
        Self { layout, registry }
    }

    /// Move a component's file from the disabled holding area back to
    /// its active directory. Loader jars are additionally re-merged
    /// into the launch archive.
    pub fn enable(&mut self, name: &str) -> InstallResult<ToggleOutcome> {
        let (install_type, file, disabled) = self.lookup(name)?;
        if !disabled {
            debug!(component = name, "already enabled");
            return Ok(ToggleOutcome::Unchanged);
        }

        let active = self.active_path(install_type, &file);
        let holding = self.layout.disabledmods().join(&file);

        if let Some(parent) = active.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
        }
        fs::rename(&holding, &active).map_err(|e| InstallError::PlacementFailed {
            component: name.to_string(),
            path: active.clone(),
            reason: e.to_string(),
        })?;

        if install_type == InstallType::Loader {
            let launch = self.layout.launch_archive();
            merge_jar_stripping_meta(&launch, &active).map_err(|e| {
                InstallError::PlacementFailed {
                    component: name.to_string(),
                    path: launch,
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(entry) = self.registry.get_mut(name) {
            entry.disabled = false;
        }
        self.registry.save(&self.layout.registry_path())?;
        info!(component = name, "component enabled");
        Ok(ToggleOutcome::Changed)
    }

    /// Move a component's file from its active directory into the
    /// disabled holding area.
    pub fn disable(&mut self, name: &str) -> InstallResult<ToggleOutcome> {
        let (install_type, file, disabled) = self.lookup(name)?;
        if disabled {
            debug!(component = name, "already disabled");
            return Ok(ToggleOutcome::Unchanged);
        }

        let active = self.active_path(install_type, &file);
        let holding_dir = self.layout.disabledmods();
        fs::create_dir_all(&holding_dir).map_err(|e| InstallError::io(&holding_dir, e))?;
        let holding = holding_dir.join(&file);
        fs::rename(&active, &holding).map_err(|e| InstallError::PlacementFailed {
            component: name.to_string(),
            path: holding,
            reason: e.to_string(),
        })?;

        if let Some(entry) = self.registry.get_mut(name) {
            entry.disabled = true;
        }
        self.registry.save(&self.layout.registry_path())?;
        info!(component = name, "component disabled");
        Ok(ToggleOutcome::Changed)
    }

    fn lookup(&self, name: &str) -> InstallResult<(InstallType, String, bool)> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| InstallError::UnknownComponent {
                name: name.to_string(),
            })?;
        match entry.install_type {
            InstallType::Extract | InstallType::Nested => {
                Err(InstallError::PlacementFailed {
                    component: name.to_string(),
                    path: self.layout.root().to_path_buf(),
                    reason: "extracted components cannot be toggled".to_string(),
                })
            }
            other => Ok((other, entry.file.clone(), entry.disabled)),
        }
    }

    fn active_path(&self, install_type: InstallType, file: &str) -> PathBuf {
        self.layout.dir_for(install_type).join(file)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;
    use crate::registry::InstalledComponent;

    fn entry(name: &str, install_type: InstallType, file: &str, disabled: bool) -> InstalledComponent {
        InstalledComponent {
            name: name.to_string(),
            version: "1.0".to_string(),
            optional: true,
            file: file.to_string(),
            install_type,
            color: None,
            description: String::new(),
            disabled,
        }
    }

    fn write_jar(path: &std::path::Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_disable_moves_file_to_holding_area() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path());
        layout.ensure_base_dirs().unwrap();
        fs::write(layout.mods().join("maps.zip"), b"payload").unwrap();

        let mut registry = Registry::new();
        registry.upsert(entry("maps", InstallType::Mod, "maps.zip", false));

        let mut toggler = Toggler::new(&layout, &mut registry);
        assert_eq!(toggler.disable("maps").unwrap(), ToggleOutcome::Changed);

        assert!(!layout.mods().join("maps.zip").exists());
        assert!(layout.disabledmods().join("maps.zip").exists());
        assert!(registry.get("maps").unwrap().disabled);
        assert!(layout.registry_path().exists());
    }

    #[test]
    fn test_enable_moves_file_back() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path());
        layout.ensure_base_dirs().unwrap();
        fs::write(layout.disabledmods().join("maps.zip"), b"payload").unwrap();

        let mut registry = Registry::new();
        registry.upsert(entry("maps", InstallType::Mod, "maps.zip", true));

        let mut toggler = Toggler::new(&layout, &mut registry);
        assert_eq!(toggler.enable("maps").unwrap(), ToggleOutcome::Changed);

        assert!(layout.mods().join("maps.zip").exists());
        assert!(!layout.disabledmods().join("maps.zip").exists());
        assert!(!registry.get("maps").unwrap().disabled);
    }

    #[test]
    fn test_toggle_is_noop_when_already_in_state() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path());
        layout.ensure_base_dirs().unwrap();

        let mut registry = Registry::new();
        registry.upsert(entry("maps", InstallType::Mod, "maps.zip", false));

        let mut toggler = Toggler::new(&layout, &mut registry);
        assert_eq!(toggler.enable("maps").unwrap(), ToggleOutcome::Unchanged);
        registry.get_mut("maps").unwrap().disabled = true;
        let mut toggler = Toggler::new(&layout, &mut registry);
        assert_eq!(toggler.disable("maps").unwrap(), ToggleOutcome::Unchanged);
    }

    #[test]
    fn test_enable_loader_rebuilds_launch_archive() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path());
        layout.ensure_base_dirs().unwrap();

        write_jar(
            &layout.launch_archive(),
            &[("Main.class", b"base"), ("META-INF/SIG.SF", b"sig")],
        );
        write_jar(
            &layout.disabledmods().join("loader.jar"),
            &[("loader/Hook.class", b"hook")],
        );

        let mut registry = Registry::new();
        registry.upsert(entry("loader", InstallType::Loader, "loader.jar", true));

        let mut toggler = Toggler::new(&layout, &mut registry);
        assert_eq!(toggler.enable("loader").unwrap(), ToggleOutcome::Changed);

        let mut archive =
            zip::ZipArchive::new(File::open(layout.launch_archive()).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"Main.class".to_string()));
        assert!(names.contains(&"loader/Hook.class".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("META-INF/")));
    }

    #[test]
    fn test_unknown_component_is_an_error() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path());
        let mut registry = Registry::new();
        let mut toggler = Toggler::new(&layout, &mut registry);
        assert!(matches!(
            toggler.enable("ghost"),
            Err(InstallError::UnknownComponent { .. })
        ));
    }
}
