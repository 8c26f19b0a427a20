//! Directive keys and the operations behind them.
//!
//! Directives are `omnikit.`-prefixed mapping keys processed during
//! resolution. Plain keys pass through untouched, so omnifests stay
//! ordinary YAML documents that happen to carry instructions for the
//! compiler.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::omnifest::Omnifest;
use crate::resolve::resolve;
use crate::value::type_name;

/// Prefix shared by every directive key.
pub const PREFIX: &str = "omnikit.";

/// Format version marker, required at the top level of an omnifest.
pub const VERSION: &str = "omnikit.version";

/// Defines variables for `${name}` references.
pub const DEFINE: &str = "omnikit.define";

/// Includes another file at the directive's position.
pub const INCLUDE: &str = "omnikit.include";

/// Prefix for tree operations.
pub const PREFIX_OP: &str = "omnikit.op.";

/// Prefix for target sections (`omnikit.target.<kind>.<name>`).
pub const PREFIX_TARGET: &str = "omnikit.target.";

/// Prefix for directives delegated to helper binaries
/// (`omnikit.external.<kind>.<name>`).
pub const PREFIX_EXTERNAL: &str = "omnikit.external.";

/// Joins sequences with sequences or mappings with mappings.
pub const OP_JOIN: &str = "omnikit.op.join";

// Matches `${name}` references inside strings
static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?P<name>[a-zA-Z0-9_.-]+)\}").unwrap());

/// Substitute `${name}` references in a string.
///
/// A string that is exactly one reference takes the variable's value with
/// its type intact, so sequences and mappings can flow through. Embedded
/// references accept only numbers and strings; anything else reports the
/// partially substituted string so the offending reference stays visible.
pub fn substitute_vars(ctx: &Context, data: &str) -> Result<Value> {
    if let Some(captures) = REFERENCE_PATTERN.captures(data) {
        // The match is a substring, so equal length means it spans the
        // whole string.
        if captures[0].len() == data.len() {
            return Ok(ctx.variable(&captures["name"])?.clone());
        }
    }

    let mut current = data.to_string();
    loop {
        let Some(captures) = REFERENCE_PATTERN.captures(&current) else {
            return Ok(Value::String(current));
        };
        let reference = captures[0].to_string();
        let name = captures["name"].to_string();

        let replacement = match ctx.variable(&name)? {
            Value::Number(number) => number.to_string(),
            Value::String(text) => text.clone(),
            other => {
                return Err(Error::directive_type(
                    &reference,
                    format!(
                        "string '{}' resolves to an incorrect type, expected a number or string but got {}",
                        current,
                        type_name(other)
                    ),
                ));
            }
        };

        current = current.replace(&reference, &replacement);
    }
}

/// Process a define block. Entries resolve in order and bind into the
/// context as they go, so later entries can reference earlier ones.
pub fn apply_define(ctx: &mut Context, argument: Value) -> Result<()> {
    let entries = match argument {
        Value::Object(entries) => entries,
        other => {
            return Err(Error::directive_type(
                DEFINE,
                format!(
                    "'{}' expects a mapping of variable definitions, found {}",
                    DEFINE,
                    type_name(&other)
                ),
            ));
        }
    };

    for (name, value) in entries {
        let resolved = resolve(ctx, value)?;
        ctx.define(&name, resolved);
    }

    Ok(())
}

/// Load and resolve another file. Relative paths resolve against the
/// include root, the directory of the top level omnifest.
pub fn include(ctx: &mut Context, argument: Value) -> Result<Value> {
    let resolved = resolve(ctx, argument)?;
    let relative = match &resolved {
        Value::String(path) => path,
        other => {
            return Err(Error::directive_type(
                INCLUDE,
                format!("'{}' expects a string path, found {}", INCLUDE, type_name(other)),
            ));
        }
    };

    let path = ctx.root().join(relative);
    log_debug!("including '{}'", path.display());

    ctx.enter_include(&path)?;
    let outcome = Omnifest::load_fragment(&path).and_then(|fragment| resolve(ctx, fragment));
    ctx.leave_include();
    outcome
}

/// Join a sequence of sequences into one sequence, or a sequence of
/// mappings into one mapping with later entries overriding earlier ones.
pub fn op_join(key: &str, argument: &Value) -> Result<Value> {
    let entries = argument.as_object().ok_or_else(|| {
        Error::directive_type(
            key,
            format!("'{}' expects a mapping argument, found {}", key, type_name(argument)),
        )
    })?;
    let values = entries.get("values").ok_or_else(|| {
        Error::directive_argument(key, format!("'{}' requires a 'values' sequence", key))
    })?;
    let items = values.as_array().ok_or_else(|| {
        Error::directive_type(
            key,
            format!("'{}' 'values' must be a sequence, found {}", key, type_name(values)),
        )
    })?;
    if items.is_empty() {
        return Err(Error::directive_argument(
            key,
            format!("'{}' requires at least one element in 'values'", key),
        ));
    }

    if items.iter().all(Value::is_array) {
        let mut joined = Vec::new();
        for item in items {
            if let Value::Array(elements) = item {
                joined.extend(elements.iter().cloned());
            }
        }
        return Ok(Value::Array(joined));
    }

    if items.iter().all(Value::is_object) {
        let mut joined = serde_json::Map::new();
        for item in items {
            if let Value::Object(entries) = item {
                for (name, value) in entries {
                    joined.insert(name.clone(), value.clone());
                }
            }
        }
        return Ok(Value::Object(joined));
    }

    Err(Error::directive_type(
        key,
        format!("'{}' can only join sequences with sequences or mappings with mappings", key),
    ))
}
