//! Post-placement actions: archive recomposition, renames, and source
//! cleanup.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::context::InstallContext;
use crate::error::{InstallError, InstallResult};
use crate::manifest::{Action, ActionVerb, ArchiveCategory, PostAction};
use crate::registry::JarOrder;

use super::archive::{extract_archive, pack_directory};
use super::layout::TargetLayout;
use super::pipeline::PlacedComponent;

/// Applies a manifest's actions to the components placed this install.
///
/// Actions whose side flags do not match the context are skipped before
/// any scratch directory is created. An action referencing a component
/// that was not placed (excluded or failed optional) is skipped with a
/// warning.
pub struct ActionRunner<'a> {
    context: &'a InstallContext,
    layout: &'a TargetLayout,
}

impl<'a> ActionRunner<'a> {
    pub fn new(context: &'a InstallContext, layout: &'a TargetLayout) -> Self {
        Self { context, layout }
    }

    /// Run every applicable action, mutating the placed set and jar
    /// order to match what ends up on disk.
    pub fn run(
        &self,
        actions: &[Action],
        placed: &mut Vec<PlacedComponent>,
        order: &mut JarOrder,
    ) -> InstallResult<()> {
        for action in actions {
            if !action.applies_to(self.context.side) {
                continue;
            }
            self.run_one(action, placed, order)?;
        }
        Ok(())
    }

    fn run_one(
        &self,
        action: &Action,
        placed: &mut Vec<PlacedComponent>,
        order: &mut JarOrder,
    ) -> InstallResult<()> {
        // Every source must have been placed as a file, or the whole
        // action is skipped.
        let mut sources = Vec::with_capacity(action.sources.len());
        for name in &action.sources {
            match placed.iter().find(|p| &p.name == name && p.file.is_some()) {
                Some(entry) => sources.push(entry.clone()),
                None => {
                    warn!(
                        action = action.verb.name(),
                        component = %name,
                        "action source not installed, skipping action"
                    );
                    return Ok(());
                }
            }
        }

        match &action.verb {
            ActionVerb::Recompose { category, filename } => {
                self.recompose(action, &sources, *category, filename, order)?;
            }
            ActionVerb::Rename { filename } => {
                self.rename(&sources, filename, placed, order)?;
            }
        }

        if action.post == PostAction::DeleteSources {
            self.delete_sources(&sources, placed, order);
        }
        Ok(())
    }

    /// Extract every source into one scratch directory and repack the
    /// result as a single archive in the category directory.
    fn recompose(
        &self,
        action: &Action,
        sources: &[PlacedComponent],
        category: ArchiveCategory,
        filename: &str,
        order: &mut JarOrder,
    ) -> InstallResult<()> {
        if sources.len() < 2 {
            return Err(InstallError::InvalidAction {
                verb: "recompose".to_string(),
                reason: format!("needs at least two sources, got {}", sources.len()),
            });
        }

        let scratch_base = self.layout.scratch();
        fs::create_dir_all(&scratch_base)
            .map_err(|e| InstallError::io(&scratch_base, e))?;
        let scratch = tempfile::Builder::new()
            .prefix("recompose")
            .tempdir_in(&scratch_base)
            .map_err(|e| InstallError::io(&scratch_base, e))?;

        for source in sources {
            let path = self.placed_path(source)?;
            extract_archive(&path, scratch.path()).map_err(|e| {
                InstallError::PlacementFailed {
                    component: source.name.clone(),
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        let dest_dir = self
            .layout
            .dir_for_category(category, self.context.supports_core_mods);
        fs::create_dir_all(&dest_dir).map_err(|e| InstallError::io(&dest_dir, e))?;
        let dest = dest_dir.join(filename);
        pack_directory(scratch.path(), &dest).map_err(|e| {
            InstallError::PlacementFailed {
                component: action.sources.join("+"),
                path: dest.clone(),
                reason: e.to_string(),
            }
        })?;

        if category == ArchiveCategory::Launch {
            order.push(filename);
        }
        info!(archive = %dest.display(), sources = sources.len(), "archive recomposed");
        Ok(())
    }

    /// Rename the single source's installed file in place.
    fn rename(
        &self,
        sources: &[PlacedComponent],
        filename: &str,
        placed: &mut Vec<PlacedComponent>,
        order: &mut JarOrder,
    ) -> InstallResult<()> {
        let [source] = sources else {
            return Err(InstallError::InvalidAction {
                verb: "rename".to_string(),
                reason: format!("needs exactly one source, got {}", sources.len()),
            });
        };

        let from = self.placed_path(source)?;
        let to = from.with_file_name(filename);
        fs::rename(&from, &to).map_err(|e| InstallError::PlacementFailed {
            component: source.name.clone(),
            path: to.clone(),
            reason: e.to_string(),
        })?;

        if let Some(old) = source.file.as_deref() {
            order.rename(old, filename);
        }
        if let Some(entry) = placed.iter_mut().find(|p| p.name == source.name) {
            entry.file = Some(filename.to_string());
            entry.path = Some(to.clone());
        }
        info!(from = %from.display(), to = %to.display(), "component renamed");
        Ok(())
    }

    /// Best-effort removal of each source's installed file.
    fn delete_sources(
        &self,
        sources: &[PlacedComponent],
        placed: &mut Vec<PlacedComponent>,
        order: &mut JarOrder,
    ) {
        for source in sources {
            let Ok(path) = self.placed_path(source) else {
                continue;
            };
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to delete action source");
                continue;
            }
            if let Some(file) = source.file.as_deref() {
                order.remove(file);
            }
            placed.retain(|p| p.name != source.name);
        }
    }

    fn placed_path(&self, source: &PlacedComponent) -> InstallResult<PathBuf> {
        source
            .path
            .clone()
            .ok_or_else(|| InstallError::PlacementFailed {
                component: source.name.clone(),
                path: self.layout.root().to_path_buf(),
                reason: "action source has no installed file".to_string(),
            })
    }
}
