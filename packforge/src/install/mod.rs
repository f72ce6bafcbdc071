//! Install target layout, artifact placement, and the install pipeline.
//!
//! The flow is leaf-to-root: [`TargetLayout`] knows where everything
//! lives, [`InstallExecutor`] places one artifact by install type,
//! [`ActionRunner`] applies the manifest's post-placement actions, and
//! [`PackInstaller`] drives a whole install end to end.

mod actions;
mod archive;
mod executor;
mod layout;
mod pipeline;

pub use actions::ActionRunner;
pub use archive::{extract_archive, merge_jar_stripping_meta, pack_directory, ArchiveError};
pub use executor::{InstallExecutor, Placement};
pub use layout::TargetLayout;
pub use pipeline::{ExcludedComponent, InstallReport, PackInstaller, PlacedComponent};
