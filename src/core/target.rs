//! Target kinds and their manifest serializers.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::value::type_name;

/// A target kind: how a resolved target subtree leaves the compiler.
pub trait Target {
    fn kind(&self) -> &'static str;

    /// Render the resolved subtree as the kind's native manifest text.
    fn serialize(&self, tree: &Value) -> Result<String>;
}

/// Emits osbuild manifests: the resolved target subtree as pretty
/// printed JSON.
pub struct OsbuildTarget;

impl Target for OsbuildTarget {
    fn kind(&self) -> &'static str {
        "osbuild"
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        if !tree.is_object() {
            return Err(Error::directive_type(
                "omnikit.target.osbuild",
                format!("an osbuild target must resolve to a mapping, found {}", type_name(tree)),
            ));
        }
        let rendered = serde_json::to_string_pretty(tree).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize osbuild manifest".to_string()))
        })?;
        Ok(format!("{}\n", rendered))
    }
}

/// Look up the serializer for a kind.
pub fn for_kind(kind: &str) -> Option<Box<dyn Target>> {
    match kind {
        "osbuild" => Some(Box::new(OsbuildTarget)),
        _ => None,
    }
}

/// Kinds the compiler can serialize.
pub fn kinds() -> Vec<String> {
    vec!["osbuild".to_string()]
}
