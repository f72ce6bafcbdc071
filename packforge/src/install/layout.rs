//! Install target directory layout.
//!
//! Every installed pack instance shares the same conceptual layout
//! under its target root; this type derives all of those paths in one
//! place so nothing else in the executor hard-codes directory names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::manifest::{ArchiveCategory, ExtractTarget, InstallType, NestedPlacement};

/// Path derivation for one install target.
#[derive(Debug, Clone)]
pub struct TargetLayout {
    root: PathBuf,
}

impl TargetLayout {
    /// Create a layout rooted at the install target.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The install target root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mods(&self) -> PathBuf {
        self.root.join("mods")
    }

    pub fn coremods(&self) -> PathBuf {
        self.root.join("coremods")
    }

    pub fn jarmods(&self) -> PathBuf {
        self.root.join("jarmods")
    }

    pub fn texturepacks(&self) -> PathBuf {
        self.root.join("texturepacks")
    }

    pub fn resourcepacks(&self) -> PathBuf {
        self.root.join("resourcepacks")
    }

    pub fn shaderpacks(&self) -> PathBuf {
        self.root.join("shaderpacks")
    }

    pub fn libraries(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Holding area for disabled components.
    pub fn disabledmods(&self) -> PathBuf {
        self.root.join("disabledmods")
    }

    /// The runtime launch archive rebuilt by the toggler.
    pub fn launch_archive(&self) -> PathBuf {
        self.root.join("bin").join("modpack.jar")
    }

    /// Where downloaded artifacts are kept between runs, enabling
    /// hash-verified re-runs to skip the network.
    pub fn cache(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Base for per-component scratch directories.
    pub fn scratch(&self) -> PathBuf {
        self.root.join(".scratch")
    }

    /// Persisted jar-order list.
    pub fn jar_order_path(&self) -> PathBuf {
        self.root.join("jarorder.json")
    }

    /// Persisted installed-component registry.
    pub fn registry_path(&self) -> PathBuf {
        self.root.join("installed.json")
    }

    /// Active directory for a simple-placement install type on a client
    /// target. Loader jars live with the jar mods here; on servers the
    /// executor places them at the root instead.
    pub fn dir_for(&self, install_type: InstallType) -> PathBuf {
        match install_type {
            InstallType::Jar | InstallType::JarMod | InstallType::Loader => self.jarmods(),
            InstallType::Mod | InstallType::Extract | InstallType::Nested => self.mods(),
            InstallType::CoreMod => self.coremods(),
            InstallType::TexturePack | InstallType::TexturePackArchive => self.texturepacks(),
            InstallType::ResourcePack | InstallType::ResourcePackArchive => self.resourcepacks(),
            InstallType::Library => self.libraries(),
        }
    }

    /// Destination for an `extract` component's contents.
    pub fn dir_for_extract(&self, target: ExtractTarget) -> PathBuf {
        match target {
            ExtractTarget::CoreMods => self.coremods(),
            ExtractTarget::Mods => self.mods(),
            ExtractTarget::Root => self.root.clone(),
        }
    }

    /// Destination for a `nested` component's lifted inner path.
    pub fn dir_for_nested(&self, placement: NestedPlacement) -> PathBuf {
        match placement {
            NestedPlacement::Mods => self.mods(),
            NestedPlacement::CoreMods => self.coremods(),
            NestedPlacement::TexturePacks => self.texturepacks(),
            NestedPlacement::ResourcePacks => self.resourcepacks(),
            NestedPlacement::Root => self.root.clone(),
        }
    }

    /// Destination directory for a recompose action's archive.
    ///
    /// Core-module recomposition falls back to the mods directory when
    /// the target runtime has no core-module support.
    pub fn dir_for_category(
        &self,
        category: ArchiveCategory,
        supports_core_mods: bool,
    ) -> PathBuf {
        match category {
            ArchiveCategory::Mods => self.mods(),
            ArchiveCategory::CoreMods if supports_core_mods => self.coremods(),
            ArchiveCategory::CoreMods => self.mods(),
            ArchiveCategory::Launch => self.jarmods(),
        }
    }

    /// Create the directories every install needs up front.
    pub fn ensure_base_dirs(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.mods(),
            self.coremods(),
            self.jarmods(),
            self.texturepacks(),
            self.resourcepacks(),
            self.shaderpacks(),
            self.libraries(),
            self.disabledmods(),
            self.root.join("bin"),
            self.cache(),
            self.scratch(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Remove the scratch base, best effort.
    pub fn clean_scratch(&self) {
        fs::remove_dir_all(self.scratch()).ok();
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_dir_for_simple_types() {
        let layout = TargetLayout::new("/target");
        assert_eq!(layout.dir_for(InstallType::Mod), PathBuf::from("/target/mods"));
        assert_eq!(
            layout.dir_for(InstallType::JarMod),
            PathBuf::from("/target/jarmods")
        );
        assert_eq!(
            layout.dir_for(InstallType::Library),
            PathBuf::from("/target/lib")
        );
    }

    #[test]
    fn test_coremod_category_fallback() {
        let layout = TargetLayout::new("/target");
        assert_eq!(
            layout.dir_for_category(ArchiveCategory::CoreMods, true),
            PathBuf::from("/target/coremods")
        );
        assert_eq!(
            layout.dir_for_category(ArchiveCategory::CoreMods, false),
            PathBuf::from("/target/mods")
        );
        assert_eq!(
            layout.dir_for_category(ArchiveCategory::Launch, true),
            PathBuf::from("/target/jarmods")
        );
    }

    #[test]
    fn test_ensure_base_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = TargetLayout::new(temp.path().join("instance"));
        layout.ensure_base_dirs().unwrap();

        assert!(layout.mods().is_dir());
        assert!(layout.disabledmods().is_dir());
        assert!(layout.scratch().is_dir());
        // The launch archive's parent must exist before the toggler
        // rebuilds it.
        assert!(layout.launch_archive().parent().unwrap().is_dir());

        layout.clean_scratch();
        assert!(!layout.scratch().exists());
    }
}
