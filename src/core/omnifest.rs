//! Omnifest documents and the files they include.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::directive;
use crate::error::{Error, Result};
use crate::value::type_name;

/// A loaded omnifest: a YAML mapping bridged into JSON values, plus the
/// include root its relative includes resolve against.
#[derive(Debug, Clone)]
pub struct Omnifest {
    pub tree: Map<String, Value>,
    pub path: PathBuf,
    pub root: PathBuf,
}

impl Omnifest {
    /// Load the top level document. The root must be a mapping carrying
    /// the `omnikit.version` marker.
    pub fn from_path(path: &Path) -> Result<Self> {
        let value = load_value(path)?;
        let tree = match value {
            Value::Object(tree) => tree,
            other => {
                return Err(Error::parse_not_a_mapping(
                    path.display().to_string(),
                    type_name(&other),
                ));
            }
        };
        if !tree.contains_key(directive::VERSION) {
            return Err(Error::parse_version_missing(
                path.display().to_string(),
                directive::VERSION,
            ));
        }

        Ok(Self {
            tree,
            path: path.to_path_buf(),
            root: include_root(path),
        })
    }

    /// Load an included file. Fragments may have any root type and carry
    /// no version marker.
    pub fn load_fragment(path: &Path) -> Result<Value> {
        load_value(path)
    }
}

fn load_value(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::parse_file_unreadable(path.display().to_string(), e.to_string()))?;
    serde_yml::from_str(&text)
        .map_err(|e| Error::parse_invalid_yaml(path.display().to_string(), e.to_string()))
}

/// Directory of the top level omnifest; base for relative include paths.
fn include_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
