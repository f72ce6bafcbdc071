//! Type-dispatched placement of fetched artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::context::InstallContext;
use crate::error::{InstallError, InstallResult};
use crate::manifest::{Component, InstallType, NestedPlacement};

use super::archive::extract_archive;
use super::layout::TargetLayout;

/// Where a component's artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Final file name in its active directory, when the component
    /// placed a single file. Extraction-style components place trees
    /// and carry no single file.
    pub file: Option<String>,
    /// Full path of the placed file, when one exists.
    pub path: Option<PathBuf>,
    /// Whether the placed file belongs in the persisted jar order.
    pub joins_jar_order: bool,
}

/// Places one fetched artifact according to its component's install
/// type. Pure filesystem work; fetching and optional-vs-fatal policy
/// live in the pipeline.
pub struct InstallExecutor<'a> {
    context: &'a InstallContext,
    layout: &'a TargetLayout,
}

impl<'a> InstallExecutor<'a> {
    pub fn new(context: &'a InstallContext, layout: &'a TargetLayout) -> Self {
        Self { context, layout }
    }

    /// Place `artifact` for `component`, returning what was placed.
    ///
    /// # Arguments
    ///
    /// * `component` - The manifest component being installed.
    /// * `artifact` - The verified artifact on local disk.
    pub fn place(&self, component: &Component, artifact: &Path) -> InstallResult<Placement> {
        let side = self.context.side;
        let file = component.file_for(side).to_string();

        match component.install_type {
            InstallType::Jar
            | InstallType::JarMod
            | InstallType::Mod
            | InstallType::CoreMod
            | InstallType::TexturePack
            | InstallType::ResourcePack
            | InstallType::Library => {
                let dest = self.layout.dir_for(component.install_type).join(&file);
                self.copy_file(component, artifact, &dest)?;
                Ok(Placement {
                    joins_jar_order: component.install_type.joins_jar_order(),
                    file: Some(file),
                    path: Some(dest),
                })
            }
            InstallType::Loader => {
                // Servers run the loader jar directly from the root;
                // clients compose it into the launch archive later.
                let dest = if side.is_server() {
                    self.layout.root().join(&file)
                } else {
                    self.layout.jarmods().join(&file)
                };
                self.copy_file(component, artifact, &dest)?;
                Ok(Placement {
                    joins_jar_order: !side.is_server(),
                    file: Some(file),
                    path: Some(dest),
                })
            }
            InstallType::TexturePackArchive => {
                self.extract_into(component, artifact, &self.layout.texturepacks())?;
                Ok(Placement {
                    file: None,
                    path: None,
                    joins_jar_order: false,
                })
            }
            InstallType::ResourcePackArchive => {
                self.extract_into(component, artifact, &self.layout.resourcepacks())?;
                Ok(Placement {
                    file: None,
                    path: None,
                    joins_jar_order: false,
                })
            }
            InstallType::Extract => {
                let target = component.extract_target.ok_or_else(|| {
                    InstallError::PlacementFailed {
                        component: component.name.clone(),
                        path: artifact.to_path_buf(),
                        reason: "extract component without a destination".to_string(),
                    }
                })?;
                self.extract_into(component, artifact, &self.layout.dir_for_extract(target))?;
                Ok(Placement {
                    file: None,
                    path: None,
                    joins_jar_order: false,
                })
            }
            InstallType::Nested => self.place_nested(component, artifact),
        }
    }

    /// Extract a nested component into scratch and lift its declared
    /// inner path into the placement directory.
    fn place_nested(
        &self,
        component: &Component,
        artifact: &Path,
    ) -> InstallResult<Placement> {
        let inner = component.nested_path.as_deref().ok_or_else(|| {
            InstallError::PlacementFailed {
                component: component.name.clone(),
                path: artifact.to_path_buf(),
                reason: "nested component without an inner path".to_string(),
            }
        })?;
        let placement = component
            .nested_placement
            .unwrap_or(NestedPlacement::Mods);

        let scratch = self.scratch_dir(component)?;
        extract_archive(artifact, scratch.path()).map_err(|e| {
            self.placement_error(component, artifact, e.to_string())
        })?;

        let source = scratch.path().join(inner);
        if !source.exists() {
            return Err(InstallError::NestedPathMissing {
                component: component.name.clone(),
                path: source,
            });
        }

        let dest_dir = self.layout.dir_for_nested(placement);
        fs::create_dir_all(&dest_dir)
            .map_err(|e| self.placement_error(component, &dest_dir, e.to_string()))?;

        if source.is_dir() {
            copy_tree(&source, &dest_dir)
                .map_err(|e| self.placement_error(component, &dest_dir, e.to_string()))?;
            debug!(component = %component.name, "nested directory placed");
            Ok(Placement {
                file: None,
                path: None,
                joins_jar_order: false,
            })
        } else {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| component.file.clone());
            let dest = dest_dir.join(&file_name);
            fs::copy(&source, &dest)
                .map_err(|e| self.placement_error(component, &dest, e.to_string()))?;
            debug!(component = %component.name, file = %file_name, "nested file placed");
            Ok(Placement {
                file: Some(file_name),
                path: Some(dest),
                joins_jar_order: false,
            })
        }
    }

    /// Extract an archive artifact through scratch into `dest`.
    fn extract_into(
        &self,
        component: &Component,
        artifact: &Path,
        dest: &Path,
    ) -> InstallResult<()> {
        let scratch = self.scratch_dir(component)?;
        extract_archive(artifact, scratch.path())
            .map_err(|e| self.placement_error(component, artifact, e.to_string()))?;
        fs::create_dir_all(dest)
            .map_err(|e| self.placement_error(component, dest, e.to_string()))?;
        copy_tree(scratch.path(), dest)
            .map_err(|e| self.placement_error(component, dest, e.to_string()))?;
        debug!(component = %component.name, dest = %dest.display(), "archive extracted");
        Ok(())
    }

    fn copy_file(&self, component: &Component, from: &Path, to: &Path) -> InstallResult<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| self.placement_error(component, parent, e.to_string()))?;
        }
        fs::copy(from, to)
            .map_err(|e| self.placement_error(component, to, e.to_string()))?;
        debug!(component = %component.name, dest = %to.display(), "file placed");
        Ok(())
    }

    /// An isolated scratch directory keyed by component name.
    fn scratch_dir(&self, component: &Component) -> InstallResult<TempDir> {
        let base = self.layout.scratch();
        fs::create_dir_all(&base)
            .map_err(|e| self.placement_error(component, &base, e.to_string()))?;
        tempfile::Builder::new()
            .prefix(&component.name)
            .tempdir_in(&base)
            .map_err(|e| self.placement_error(component, &base, e.to_string()))
    }

    fn placement_error(
        &self,
        component: &Component,
        path: &Path,
        reason: String,
    ) -> InstallError {
        InstallError::PlacementFailed {
            component: component.name.clone(),
            path: path.to_path_buf(),
            reason,
        }
    }
}

/// Recursively copy the contents of `src` into `dst`.
fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target: PathBuf = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
