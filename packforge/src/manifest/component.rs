//! Component descriptor types.
//!
//! A [`Component`] is one installable unit described by the pack manifest:
//! a mod, a loader jar, a resource pack, a library, or an archive that
//! needs unpacking. The manifest parser builds these fresh on every
//! version request; nothing here is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::Side;

/// How a component's artifact is placed into the install target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallType {
    /// Merged directly into the launch jar via the jar order.
    Jar,
    /// Loader jar: root copy on servers, jar-order member on clients.
    Loader,
    /// Generic archive member, placed in the mods directory.
    Mod,
    /// Ordered archive member, placed in jarmods and tracked in jar order.
    JarMod,
    /// Core module, placed in the coremods directory.
    CoreMod,
    /// Texture pack file.
    TexturePack,
    /// Resource pack file.
    ResourcePack,
    /// Archive extracted into the texture packs directory.
    #[serde(rename = "texturepack-archive")]
    TexturePackArchive,
    /// Archive extracted into the resource packs directory.
    #[serde(rename = "resourcepack-archive")]
    ResourcePackArchive,
    /// Archive extracted into a declared destination.
    Extract,
    /// Archive whose single declared inner path is placed elsewhere.
    Nested,
    /// Support library with no user-facing meaning.
    Library,
}

impl InstallType {
    /// Parse a manifest type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "jar" => Some(Self::Jar),
            "loader" => Some(Self::Loader),
            "mod" => Some(Self::Mod),
            "jarmod" => Some(Self::JarMod),
            "coremod" => Some(Self::CoreMod),
            "texturepack" => Some(Self::TexturePack),
            "resourcepack" => Some(Self::ResourcePack),
            "texturepack-archive" => Some(Self::TexturePackArchive),
            "resourcepack-archive" => Some(Self::ResourcePackArchive),
            "extract" => Some(Self::Extract),
            "nested" => Some(Self::Nested),
            "library" => Some(Self::Library),
            _ => None,
        }
    }

    /// The manifest tag for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::Loader => "loader",
            Self::Mod => "mod",
            Self::JarMod => "jarmod",
            Self::CoreMod => "coremod",
            Self::TexturePack => "texturepack",
            Self::ResourcePack => "resourcepack",
            Self::TexturePackArchive => "texturepack-archive",
            Self::ResourcePackArchive => "resourcepack-archive",
            Self::Extract => "extract",
            Self::Nested => "nested",
            Self::Library => "library",
        }
    }

    /// Whether placement appends the artifact to the persisted jar order.
    ///
    /// Loader jars join the jar order on clients only; see the executor.
    pub fn joins_jar_order(&self) -> bool {
        matches!(self, Self::Jar | Self::JarMod)
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for InstallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown install type: {}", s))
    }
}

/// Destination for an `extract` component's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractTarget {
    /// The core-module directory.
    CoreMods,
    /// The generic mods directory.
    Mods,
    /// The target root itself.
    Root,
}

impl ExtractTarget {
    /// Parse a manifest extraction-target tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "coremods" => Some(Self::CoreMods),
            "mods" => Some(Self::Mods),
            "root" => Some(Self::Root),
            _ => None,
        }
    }
}

/// Destination chosen by a `nested` component's second type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedPlacement {
    Mods,
    CoreMods,
    TexturePacks,
    ResourcePacks,
    Root,
}

impl NestedPlacement {
    /// Parse a manifest nested-placement tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mods" => Some(Self::Mods),
            "coremods" => Some(Self::CoreMods),
            "texturepacks" => Some(Self::TexturePacks),
            "resourcepacks" => Some(Self::ResourcePacks),
            "root" => Some(Self::Root),
            _ => None,
        }
    }
}

/// How a component's artifact is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadMode {
    /// Direct HTTP GET of the component URL.
    Direct,
    /// Fetched from the distribution network's mirror pool.
    #[default]
    Mirror,
    /// Opened in the user's browser; destination polled until present.
    Browser,
}

impl DownloadMode {
    /// Parse a manifest download-mode tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "direct" => Some(Self::Direct),
            "mirror" => Some(Self::Mirror),
            "browser" => Some(Self::Browser),
            _ => None,
        }
    }
}

/// One installable unit described by the manifest.
#[derive(Debug, Clone)]
pub struct Component {
    /// Identifying name, unique within a manifest.
    pub name: String,
    /// Display version.
    pub version: String,
    /// Primary artifact URL, or a path relative to the distribution base.
    pub url: String,
    /// Artifact file name at the destination.
    pub file: String,
    /// Expected SHA-256 hash, if the manifest carries one.
    pub hash: Option<String>,
    /// Alternate artifact URL used only for server-side installs.
    pub server_url: Option<String>,
    /// Alternate file name for the server artifact.
    pub server_file: Option<String>,
    /// Hash of the server artifact.
    pub server_hash: Option<String>,
    /// Placement behavior.
    pub install_type: InstallType,
    /// Extraction destination, for `extract` components.
    pub extract_target: Option<ExtractTarget>,
    /// Inner path to lift out, for `nested` components.
    pub nested_path: Option<String>,
    /// Destination for the lifted inner path.
    pub nested_placement: Option<NestedPlacement>,
    /// Install on client targets.
    pub client: bool,
    /// Install on server targets.
    pub server: bool,
    /// User may toggle this component on client installs.
    pub optional_client: bool,
    /// User may toggle this component on server installs.
    pub optional_server: bool,
    /// Selected by default; drives group exclusivity.
    pub recommended: bool,
    /// How the artifact is obtained.
    pub download: DownloadMode,
    /// Hidden from selection UIs but still processed.
    pub hidden: bool,
    /// Excluded from user-facing counts; auto-retracted by the selection
    /// engine when its last dependent is deselected.
    pub library: bool,
    /// Group key for recommended-exclusive sets. Empty means no group.
    pub group: String,
    /// Name of the parent component for nested options. Empty means
    /// top-level.
    pub parent: String,
    /// Names of components that must be selected alongside this one.
    pub dependencies: Vec<String>,
    /// Free-text description.
    pub description: String,
    /// Resolved display color as a hex triplet, when declared.
    pub color: Option<String>,
}

impl Component {
    /// Whether this component applies to the given side at all.
    pub fn applies_to(&self, side: Side) -> bool {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }

    /// Whether the user may toggle this component on the given side.
    pub fn is_optional(&self, side: Side) -> bool {
        match side {
            Side::Client => self.optional_client,
            Side::Server => self.optional_server,
        }
    }

    /// Whether this component is mandatory on the given side.
    pub fn is_required(&self, side: Side) -> bool {
        self.applies_to(side) && !self.is_optional(side)
    }

    /// The artifact URL for the given side, honoring the server alternate.
    pub fn url_for(&self, side: Side) -> &str {
        match (side, self.server_url.as_deref()) {
            (Side::Server, Some(url)) => url,
            _ => &self.url,
        }
    }

    /// The artifact file name for the given side.
    pub fn file_for(&self, side: Side) -> &str {
        match (side, self.server_file.as_deref()) {
            (Side::Server, Some(file)) => file,
            _ => &self.file,
        }
    }

    /// The expected hash for the given side.
    pub fn hash_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::Server if self.server_url.is_some() => self.server_hash.as_deref(),
            _ => self.hash.as_deref(),
        }
    }
}
