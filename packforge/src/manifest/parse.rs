//! Attribute-driven manifest parsing.
//!
//! The manifest is a JSON document with a format version, a color table,
//! and flat arrays of component and action rows. Parsing is tolerant at
//! the row level: an unknown or malformed type tag fails only that row,
//! which is logged and skipped, so one bad entry never aborts the whole
//! pack.
//!
//! # Format
//!
//! ```text
//! {
//!   "format": "1.0.0",
//!   "colors": { "gold": "#FFAA00" },
//!   "components": [ { "name": "...", "type": "mod", ... }, ... ],
//!   "actions": [ { "verb": "recompose", "sources": [...], ... }, ... ]
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde_json::Value;
use tracing::{debug, warn};

use super::action::{Action, ActionVerb, ArchiveCategory, PostAction};
use super::component::{
    Component, DownloadMode, ExtractTarget, InstallType, NestedPlacement,
};

/// A parsed pack manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Format version of the manifest document.
    pub format: Version,
    /// Component rows, in manifest order.
    pub components: Vec<Component>,
    /// Action rows, in manifest order.
    pub actions: Vec<Action>,
}

impl Manifest {
    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Error parsing a manifest document.
///
/// Row-level problems are not represented here; they are logged and the
/// offending row is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestParseError {
    /// The document is not valid JSON.
    NotJson(String),
    /// A required top-level field is absent or has the wrong shape.
    MissingField(&'static str),
    /// The format version is not a valid semver string.
    InvalidFormatVersion(String),
}

impl fmt::Display for ManifestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestParseError::NotJson(e) => write!(f, "manifest is not valid JSON: {}", e),
            ManifestParseError::MissingField(name) => {
                write!(f, "manifest is missing required field '{}'", name)
            }
            ManifestParseError::InvalidFormatVersion(s) => {
                write!(f, "invalid manifest format version: {}", s)
            }
        }
    }
}

impl std::error::Error for ManifestParseError {}

/// Parse manifest content.
///
/// Malformed component or action rows are skipped with a warning; only
/// document-level problems produce an error.
pub fn parse_manifest(content: &str) -> Result<Manifest, ManifestParseError> {
    let doc: Value =
        serde_json::from_str(content).map_err(|e| ManifestParseError::NotJson(e.to_string()))?;

    let format_str = doc
        .get("format")
        .and_then(Value::as_str)
        .ok_or(ManifestParseError::MissingField("format"))?;
    let format = Version::from_str(format_str)
        .map_err(|_| ManifestParseError::InvalidFormatVersion(format_str.to_string()))?;

    let colors = parse_color_table(&doc);

    let rows = doc
        .get("components")
        .and_then(Value::as_array)
        .ok_or(ManifestParseError::MissingField("components"))?;

    let mut components = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match parse_component(row, &colors) {
            Ok(component) => components.push(component),
            Err(reason) => {
                warn!(index, %reason, "skipping malformed component row");
            }
        }
    }

    // Actions are optional in the document.
    let mut actions = Vec::new();
    if let Some(rows) = doc.get("actions").and_then(Value::as_array) {
        for (index, row) in rows.iter().enumerate() {
            match parse_action(row) {
                Ok(action) => actions.push(action),
                Err(reason) => {
                    warn!(index, %reason, "skipping malformed action row");
                }
            }
        }
    }

    Ok(Manifest {
        format,
        components,
        actions,
    })
}

/// Extract the symbolic color table, if present.
fn parse_color_table(doc: &Value) -> HashMap<String, String> {
    let mut table = HashMap::new();
    if let Some(map) = doc.get("colors").and_then(Value::as_object) {
        for (name, value) in map {
            if let Some(hex) = value.as_str() {
                table.insert(name.clone(), hex.to_string());
            }
        }
    }
    table
}

fn str_attr<'a>(row: &'a Value, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn required_str(row: &Value, key: &'static str) -> Result<String, String> {
    str_attr(row, key)
        .map(str::to_string)
        .ok_or_else(|| format!("missing attribute '{}'", key))
}

fn bool_attr(row: &Value, key: &str, default: bool) -> bool {
    row.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Split a comma-separated dependency list. A single bare name is a
/// one-element list; empty or absent yields nothing.
fn parse_dependency_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_component(row: &Value, colors: &HashMap<String, String>) -> Result<Component, String> {
    let name = required_str(row, "name")?;

    let type_tag = str_attr(row, "type").ok_or("missing attribute 'type'")?;
    let install_type =
        InstallType::from_tag(type_tag).ok_or_else(|| format!("unknown type '{}'", type_tag))?;

    let extract_target = match install_type {
        InstallType::Extract => {
            let tag = str_attr(row, "extract_to").ok_or("missing attribute 'extract_to'")?;
            Some(
                ExtractTarget::from_tag(tag)
                    .ok_or_else(|| format!("unknown extraction target '{}'", tag))?,
            )
        }
        _ => None,
    };

    let (nested_path, nested_placement) = match install_type {
        InstallType::Nested => {
            let path = required_str(row, "nested_path")?;
            let tag = str_attr(row, "nested_type").ok_or("missing attribute 'nested_type'")?;
            let placement = NestedPlacement::from_tag(tag)
                .ok_or_else(|| format!("unknown nested placement '{}'", tag))?;
            (Some(path), Some(placement))
        }
        _ => (None, None),
    };

    let download = match str_attr(row, "download") {
        Some(tag) => DownloadMode::from_tag(tag)
            .ok_or_else(|| format!("unknown download mode '{}'", tag))?,
        None => DownloadMode::default(),
    };

    // Symbolic color names resolve through the manifest's own table.
    // Resolution failure means no color, never an error.
    let color = str_attr(row, "color").and_then(|symbolic| {
        let resolved = colors.get(symbolic).cloned();
        if resolved.is_none() {
            debug!(component = %name, color = symbolic, "unresolved color name");
        }
        resolved
    });

    Ok(Component {
        version: str_attr(row, "version").unwrap_or("").to_string(),
        url: required_str(row, "url")?,
        file: required_str(row, "file")?,
        hash: str_attr(row, "hash").map(str::to_string),
        server_url: str_attr(row, "server_url").map(str::to_string),
        server_file: str_attr(row, "server_file").map(str::to_string),
        server_hash: str_attr(row, "server_hash").map(str::to_string),
        install_type,
        extract_target,
        nested_path,
        nested_placement,
        client: bool_attr(row, "client", true),
        server: bool_attr(row, "server", true),
        optional_client: bool_attr(row, "optional_client", false),
        optional_server: bool_attr(row, "optional_server", false),
        recommended: bool_attr(row, "recommended", false),
        download,
        hidden: bool_attr(row, "hidden", false),
        library: bool_attr(row, "library", install_type == InstallType::Library),
        group: str_attr(row, "group").unwrap_or("").to_string(),
        parent: str_attr(row, "parent").unwrap_or("").to_string(),
        dependencies: parse_dependency_list(str_attr(row, "depends")),
        description: str_attr(row, "description").unwrap_or("").to_string(),
        color,
        name,
    })
}

fn parse_action(row: &Value) -> Result<Action, String> {
    let sources: Vec<String> = row
        .get("sources")
        .and_then(Value::as_array)
        .ok_or("missing attribute 'sources'")?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if sources.is_empty() {
        return Err("action has no sources".to_string());
    }

    let verb_tag = str_attr(row, "verb").ok_or("missing attribute 'verb'")?;
    let verb = match verb_tag {
        "recompose" => {
            let category_tag = str_attr(row, "into").ok_or("missing attribute 'into'")?;
            let category = ArchiveCategory::from_tag(category_tag)
                .ok_or_else(|| format!("unknown archive category '{}'", category_tag))?;
            ActionVerb::Recompose {
                category,
                filename: required_str(row, "file")?,
            }
        }
        "rename" => ActionVerb::Rename {
            filename: required_str(row, "file")?,
        },
        other => return Err(format!("unknown verb '{}'", other)),
    };

    let post = match str_attr(row, "then") {
        Some("delete-sources") => PostAction::DeleteSources,
        Some("none") | None => PostAction::None,
        Some(other) => return Err(format!("unknown post action '{}'", other)),
    };

    Ok(Action {
        sources,
        verb,
        post,
        client: bool_attr(row, "client", true),
        server: bool_attr(row, "server", true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> &'static str {
        r##"{
            "format": "1.0.0",
            "colors": { "gold": "#FFAA00" },
            "components": [
                {
                    "name": "forge", "version": "14.23", "type": "loader",
                    "url": "loaders/forge.jar", "file": "forge.jar",
                    "hash": "aa11", "color": "gold"
                },
                {
                    "name": "maps", "version": "2.0", "type": "mod",
                    "url": "https://mods.example/maps.zip", "file": "maps.zip",
                    "optional_client": true, "recommended": true,
                    "group": "minimap", "depends": "mapcore, maplib",
                    "download": "direct", "color": "copper"
                },
                {
                    "name": "broken", "type": "zipbomb",
                    "url": "x", "file": "x"
                },
                {
                    "name": "shaders", "version": "1.1", "type": "nested",
                    "url": "extras/shaders.zip", "file": "shaders.zip",
                    "nested_path": "pack/shaders", "nested_type": "root"
                }
            ],
            "actions": [
                {
                    "verb": "recompose", "sources": ["forge", "shaders"],
                    "into": "mods", "file": "bundle.zip",
                    "then": "delete-sources", "server": false
                },
                { "verb": "teleport", "sources": ["forge"] }
            ]
        }"##
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let manifest = parse_manifest(sample_manifest()).unwrap();
        assert_eq!(manifest.format, Version::new(1, 0, 0));
        // "broken" row and "teleport" action are dropped, others survive.
        assert_eq!(manifest.components.len(), 3);
        assert_eq!(manifest.actions.len(), 1);
        assert!(manifest.component("broken").is_none());
    }

    #[test]
    fn test_parse_color_indirection() {
        let manifest = parse_manifest(sample_manifest()).unwrap();
        let forge = manifest.component("forge").unwrap();
        assert_eq!(forge.color.as_deref(), Some("#FFAA00"));
        // "copper" is not in the color table: no color, not an error.
        let maps = manifest.component("maps").unwrap();
        assert_eq!(maps.color, None);
    }

    #[test]
    fn test_parse_dependency_lists() {
        let manifest = parse_manifest(sample_manifest()).unwrap();
        let maps = manifest.component("maps").unwrap();
        assert_eq!(maps.dependencies, vec!["mapcore", "maplib"]);

        assert_eq!(parse_dependency_list(Some("solo")), vec!["solo"]);
        assert!(parse_dependency_list(Some("")).is_empty());
        assert!(parse_dependency_list(None).is_empty());
    }

    #[test]
    fn test_parse_nested_attributes() {
        let manifest = parse_manifest(sample_manifest()).unwrap();
        let shaders = manifest.component("shaders").unwrap();
        assert_eq!(shaders.install_type, InstallType::Nested);
        assert_eq!(shaders.nested_path.as_deref(), Some("pack/shaders"));
        assert_eq!(shaders.nested_placement, Some(NestedPlacement::Root));
    }

    #[test]
    fn test_parse_action_row() {
        let manifest = parse_manifest(sample_manifest()).unwrap();
        let action = &manifest.actions[0];
        assert_eq!(action.sources, vec!["forge", "shaders"]);
        assert!(matches!(
            action.verb,
            ActionVerb::Recompose {
                category: ArchiveCategory::Mods,
                ..
            }
        ));
        assert_eq!(action.post, PostAction::DeleteSources);
        assert!(!action.server);
    }

    #[test]
    fn test_parse_rejects_bad_document() {
        assert!(matches!(
            parse_manifest("not json"),
            Err(ManifestParseError::NotJson(_))
        ));
        assert_eq!(
            parse_manifest(r#"{"components": []}"#).unwrap_err(),
            ManifestParseError::MissingField("format")
        );
        assert_eq!(
            parse_manifest(r#"{"format": "one", "components": []}"#).unwrap_err(),
            ManifestParseError::InvalidFormatVersion("one".to_string())
        );
    }

    #[test]
    fn test_library_flag_defaults_from_type() {
        let manifest = parse_manifest(
            r#"{
                "format": "1.0.0",
                "components": [
                    { "name": "l", "type": "library", "url": "lib/l.jar", "file": "l.jar" }
                ]
            }"#,
        )
        .unwrap();
        assert!(manifest.component("l").unwrap().library);
    }
}
