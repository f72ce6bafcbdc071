//! Post-placement action descriptors.

use serde::{Deserialize, Serialize};

use crate::context::Side;

/// Directory category an archive recomposition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCategory {
    /// The generic mods directory.
    Mods,
    /// The core-module directory.
    CoreMods,
    /// The jar-order-tracked launch archive members.
    Launch,
}

impl ArchiveCategory {
    /// Parse a manifest category tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mods" => Some(Self::Mods),
            "coremods" => Some(Self::CoreMods),
            "launch" => Some(Self::Launch),
            _ => None,
        }
    }
}

/// What an action does to its source components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionVerb {
    /// Extract every source into one scratch area and repack the result
    /// as a single archive. Requires at least two sources.
    Recompose {
        category: ArchiveCategory,
        filename: String,
    },
    /// Rename the single source's installed file in place.
    Rename { filename: String },
}

impl ActionVerb {
    /// Short name for logs and error context.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recompose { .. } => "recompose",
            Self::Rename { .. } => "rename",
        }
    }
}

/// Follow-up applied after the primary verb completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostAction {
    #[default]
    None,
    /// Delete each source component's installed file.
    DeleteSources,
}

/// A post-placement transformation over already-installed components.
#[derive(Debug, Clone)]
pub struct Action {
    /// Names of the components this action applies to, in order.
    pub sources: Vec<String>,
    /// The transformation.
    pub verb: ActionVerb,
    /// Follow-up after the verb completes.
    pub post: PostAction,
    /// Applies on client installs.
    pub client: bool,
    /// Applies on server installs.
    pub server: bool,
}

impl Action {
    /// Whether this action applies to the given side.
    pub fn applies_to(&self, side: Side) -> bool {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }
}
