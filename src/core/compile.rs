//! Compile omnifests into target manifests.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::directive;
use crate::error::{Error, Result};
use crate::omnifest::Omnifest;
use crate::resolve::resolve;
use crate::target;

/// Everything `compile` needs beyond the omnifest itself.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub input: PathBuf,
    /// Target to compile; may stay empty when the omnifest has exactly
    /// one.
    pub target: Option<String>,
    /// Process external directives. When off the generally resolved tree
    /// is emitted instead of a target manifest.
    pub externals: bool,
    pub warn_duplicate_definitions: bool,
}

/// A compiled manifest and the target it came from.
#[derive(Debug)]
pub struct Compiled {
    /// Selected target name; `None` when externals were skipped.
    pub target: Option<String>,
    pub manifest: String,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub targets: Vec<TargetSummary>,
}

pub fn compile(options: &CompileOptions) -> Result<Compiled> {
    let document = Omnifest::from_path(&options.input)?;
    log_info!("include root is '{}'", document.root.display());

    let mut ctx = Context::new(&document.root).with_warnings(options.warn_duplicate_definitions);
    let tree = resolve(&mut ctx, Value::Object(document.tree))?;

    if !options.externals {
        let manifest = render_tree(&tree)?;
        return Ok(Compiled {
            target: None,
            manifest,
        });
    }

    let entries = match tree {
        Value::Object(entries) => entries,
        _ => return Err(Error::target_none(options.input.display().to_string())),
    };

    let available = available_targets(&entries);
    if available.is_empty() {
        return Err(Error::target_none(options.input.display().to_string()));
    }

    let names: Vec<String> = available.iter().map(|(name, _)| name.clone()).collect();
    let name = select_target(options.target.as_deref(), &names)?;
    let subtree = available
        .into_iter()
        .find(|(candidate, _)| candidate == &name)
        .map(|(_, value)| value)
        .unwrap_or(Value::Null);

    let kind = name.split('.').next().unwrap_or(&name).to_string();
    let Some(serializer) = target::for_kind(&kind) else {
        return Err(Error::target_unknown_kind(&kind, target::kinds()));
    };

    log_debug!("resolving target '{}' with kind '{}'", name, kind);
    let mut kind_ctx = ctx.with_kind(&kind);
    let resolved = resolve(&mut kind_ctx, subtree)?;
    let manifest = serializer.serialize(&resolved)?;

    Ok(Compiled {
        target: Some(name),
        manifest,
    })
}

/// Check an omnifest without running external helpers: load, resolve the
/// general phase, and verify every target's kind is known.
pub fn validate(input: &Path, warn_duplicate_definitions: bool) -> Result<ValidationReport> {
    let document = Omnifest::from_path(input)?;
    let mut ctx = Context::new(&document.root).with_warnings(warn_duplicate_definitions);
    let tree = resolve(&mut ctx, Value::Object(document.tree))?;

    let entries = match tree {
        Value::Object(entries) => entries,
        _ => return Err(Error::target_none(input.display().to_string())),
    };

    let available = available_targets(&entries);
    if available.is_empty() {
        return Err(Error::target_none(input.display().to_string()));
    }

    let mut targets = Vec::with_capacity(available.len());
    for (name, _) in available {
        let kind = name.split('.').next().unwrap_or(&name).to_string();
        if target::for_kind(&kind).is_none() {
            return Err(Error::target_unknown_kind(&kind, target::kinds()));
        }
        targets.push(TargetSummary { name, kind });
    }

    Ok(ValidationReport {
        valid: true,
        targets,
    })
}

/// Target entries of a resolved tree, prefix stripped, document order.
fn available_targets(entries: &Map<String, Value>) -> Vec<(String, Value)> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(directive::PREFIX_TARGET)
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect()
}

fn select_target(requested: Option<&str>, available: &[String]) -> Result<String> {
    match requested {
        Some(requested) => {
            if available.iter().any(|name| name == requested) {
                Ok(requested.to_string())
            } else {
                Err(Error::target_not_found(requested, available.to_vec()))
            }
        }
        None => match available {
            [single] => Ok(single.clone()),
            _ => Err(Error::target_ambiguous(available.to_vec())),
        },
    }
}

fn render_tree(tree: &Value) -> Result<String> {
    let rendered = serde_json::to_string_pretty(tree)
        .map_err(|e| Error::internal_json(e.to_string(), Some("render resolved tree".to_string())))?;
    Ok(format!("{}\n", rendered))
}
