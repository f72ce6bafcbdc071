//! Pack manifest types and parsing.
//!
//! A pack version is described by a manifest document listing component
//! rows (what to install and how) and action rows (post-placement
//! transformations). Manifests are fetched fresh on every version request
//! and never persisted; see [`crate::download::DownloadManager`].

mod action;
mod component;
mod parse;

pub use action::{Action, ActionVerb, ArchiveCategory, PostAction};
pub use component::{Component, DownloadMode, ExtractTarget, InstallType, NestedPlacement};
pub use parse::{parse_manifest, Manifest, ManifestParseError};
