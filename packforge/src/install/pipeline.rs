//! The end-to-end install pipeline.
//!
//! Fetches each selected component's artifact, places it, runs the
//! manifest's post-placement actions, and persists the registry and
//! jar order. Optional components that fail recoverably are logged
//! and excluded; everything else unwinds as a single failure.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::context::InstallContext;
use crate::download::{DownloadManager, Transport};
use crate::error::{InstallError, InstallResult};
use crate::manifest::{Component, InstallType, Manifest};
use crate::progress::{CancelToken, ProgressReporter};
use crate::registry::{InstalledComponent, JarOrder, Registry};

use super::actions::ActionRunner;
use super::executor::{InstallExecutor, Placement};
use super::layout::TargetLayout;

/// Overall percentage consumed by component placement; the remainder
/// covers actions and persistence.
const PLACEMENT_SPAN: u8 = 90;

/// One component that made it onto disk this install.
#[derive(Debug, Clone)]
pub struct PlacedComponent {
    pub name: String,
    pub version: String,
    /// File name in its active directory, for file-style placements.
    pub file: Option<String>,
    /// Full placed path, for file-style placements.
    pub path: Option<PathBuf>,
    pub install_type: InstallType,
    pub optional: bool,
    pub color: Option<String>,
    pub description: String,
}

impl PlacedComponent {
    /// The registry entry recording this placement.
    fn registry_entry(&self) -> InstalledComponent {
        InstalledComponent {
            name: self.name.clone(),
            version: self.version.clone(),
            optional: self.optional,
            file: self.file.clone().unwrap_or_default(),
            install_type: self.install_type,
            color: self.color.clone(),
            description: self.description.clone(),
            disabled: false,
        }
    }
}

/// One component left out of the install, with why.
#[derive(Debug, Clone)]
pub struct ExcludedComponent {
    pub name: String,
    pub reason: String,
}

/// Outcome of a completed install.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Names of components installed, in manifest order.
    pub installed: Vec<String>,
    /// Optional components skipped after recoverable failures.
    pub excluded: Vec<ExcludedComponent>,
}

/// Drives a full pack install for one target.
pub struct PackInstaller<'a, T: Transport> {
    context: &'a InstallContext,
    downloads: &'a DownloadManager<T>,
}

impl<'a, T: Transport> PackInstaller<'a, T> {
    pub fn new(context: &'a InstallContext, downloads: &'a DownloadManager<T>) -> Self {
        Self { context, downloads }
    }

    /// Install the given selection of `manifest`'s components into the
    /// context's target root.
    ///
    /// # Arguments
    ///
    /// * `manifest` - The parsed pack manifest.
    /// * `selection` - Selected components, in manifest order.
    /// * `progress` - Receives percentage and step updates.
    /// * `cancel` - Checked between components and during transfers.
    pub fn install(
        &self,
        manifest: &Manifest,
        selection: &[&Component],
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> InstallResult<InstallReport> {
        let layout = TargetLayout::new(self.context.target_root());
        let result = self.run(manifest, selection, &layout, progress, cancel);
        layout.clean_scratch();
        result
    }

    fn run(
        &self,
        manifest: &Manifest,
        selection: &[&Component],
        layout: &TargetLayout,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> InstallResult<InstallReport> {
        progress.report_indeterminate("preparing install target");
        layout
            .ensure_base_dirs()
            .map_err(|e| InstallError::io(layout.root(), e))?;

        let executor = InstallExecutor::new(self.context, layout);
        let side = self.context.side;
        let total = selection.len().max(1);

        let mut placed: Vec<PlacedComponent> = Vec::new();
        let mut excluded: Vec<ExcludedComponent> = Vec::new();
        let mut order = JarOrder::new();

        for (i, component) in selection.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }
            if !component.applies_to(side) {
                debug!(component = %component.name, "not applicable to this side, skipping");
                continue;
            }

            let base = ((i * PLACEMENT_SPAN as usize) / total) as u8;
            let step = format!("installing {}", component.name);
            progress.report(base, &step);

            match self.install_one(component, &executor, layout, base, &step, progress, cancel)
            {
                Ok(placement) => {
                    // The loop runs in manifest order, so pushing here
                    // keeps the jar order deterministic no matter how
                    // long each fetch took.
                    if placement.joins_jar_order {
                        if let Some(file) = &placement.file {
                            order.push(file.clone());
                        }
                    }
                    placed.push(PlacedComponent {
                        name: component.name.clone(),
                        version: component.version.clone(),
                        file: placement.file,
                        path: placement.path,
                        install_type: component.install_type,
                        optional: component.is_optional(side),
                        color: component.color.clone(),
                        description: component.description.clone(),
                    });
                }
                Err(InstallError::Cancelled) => return Err(InstallError::Cancelled),
                Err(e) if component.is_optional(side) && e.is_component_recoverable() => {
                    warn!(component = %component.name, error = %e, "optional component excluded");
                    excluded.push(ExcludedComponent {
                        name: component.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        progress.report(PLACEMENT_SPAN, "running post-install actions");
        let runner = ActionRunner::new(self.context, layout);
        runner.run(&manifest.actions, &mut placed, &mut order)?;

        progress.report(95, "saving install state");
        self.persist(layout, &placed, &order)?;

        progress.report(100, "install complete");
        info!(
            pack = %self.context.pack,
            version = %self.context.version,
            installed = placed.len(),
            excluded = excluded.len(),
            "install finished"
        );
        Ok(InstallReport {
            installed: placed.into_iter().map(|p| p.name).collect(),
            excluded,
        })
    }

    /// Fetch and place a single component.
    #[allow(clippy::too_many_arguments)]
    fn install_one(
        &self,
        component: &Component,
        executor: &InstallExecutor<'_>,
        layout: &TargetLayout,
        base: u8,
        step: &str,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> InstallResult<Placement> {
        let on_chunk = |received: u64, total: Option<u64>| {
            if let Some(total) = total.filter(|t| *t > 0) {
                let sub = ((received.saturating_mul(100)) / total).min(100) as u8;
                progress.report_sub(base, sub, step);
            }
        };
        let artifact = self.downloads.fetch_component(
            component,
            &layout.cache(),
            self.context.side,
            cancel,
            Some(&on_chunk),
        )?;
        executor.place(component, &artifact)
    }

    /// Rewrite the registry and jar order for this target.
    fn persist(
        &self,
        layout: &TargetLayout,
        placed: &[PlacedComponent],
        order: &JarOrder,
    ) -> InstallResult<()> {
        let mut registry = Registry::load(&layout.registry_path())?;
        for p in placed {
            registry.upsert(p.registry_entry());
        }
        registry.save(&layout.registry_path())?;
        order.save(&layout.jar_order_path())
    }
}
