//! Tree resolution: the general phase and the per-target kind phase.
//!
//! Resolution walks a tree and rewrites it: directive keys are
//! processed, `${name}` references in strings are substituted, plain
//! data passes through. The same walk runs twice per compilation, once
//! over the whole document without a kind and once over the selected
//! target with its kind, which is when external directives execute.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::context::Context;
use crate::directive;
use crate::error::{Error, Result};
use crate::external;
use crate::value::type_name;

/// Resolve a subtree against the context.
pub fn resolve(ctx: &mut Context, value: Value) -> Result<Value> {
    match value {
        Value::Object(entries) => resolve_mapping(ctx, entries),
        Value::Array(items) => resolve_sequence(ctx, items),
        Value::String(text) => directive::substitute_vars(ctx, &text),
        other => Ok(other),
    }
}

fn resolve_sequence(ctx: &mut Context, items: Vec<Value>) -> Result<Value> {
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        resolved.push(resolve(ctx, item)?);
    }
    Ok(Value::Array(resolved))
}

fn resolve_mapping(ctx: &mut Context, entries: Map<String, Value>) -> Result<Value> {
    // Defines bind before anything else in the same mapping, so sibling
    // values and include paths can reference them regardless of key
    // order. The version marker is consumed here as well.
    let mut remaining = Map::new();
    for (key, value) in entries {
        if key == directive::VERSION {
            continue;
        }
        if key == directive::DEFINE {
            directive::apply_define(ctx, value)?;
            continue;
        }
        remaining.insert(key, value);
    }

    // A directive standing alone replaces its node wholesale.
    if remaining.len() == 1 {
        let key = remaining.keys().next().cloned().unwrap_or_default();
        if key == directive::INCLUDE {
            let argument = remaining.remove(&key).unwrap_or(Value::Null);
            return directive::include(ctx, argument);
        }
        if key.starts_with(directive::PREFIX_OP) {
            let argument = remaining.remove(&key).unwrap_or(Value::Null);
            return apply_op(ctx, &key, argument);
        }
        if key.starts_with(directive::PREFIX_EXTERNAL) {
            return apply_external(ctx, &key, remaining);
        }
    }

    // An include beside other keys merges underneath them: the fragment
    // must be a mapping, and sibling keys win on collision.
    let mut fragment_entries: Option<Map<String, Value>> = None;
    if let Some(argument) = remaining.get(directive::INCLUDE).cloned() {
        let fragment = directive::include(ctx, argument)?;
        match fragment {
            Value::Object(entries) => fragment_entries = Some(entries),
            other => {
                return Err(Error::directive_type(
                    directive::INCLUDE,
                    format!(
                        "'{}' beside other keys requires the included file to be a mapping, found {}",
                        directive::INCLUDE,
                        type_name(&other)
                    ),
                ));
            }
        }
    }
    let sibling_keys: HashSet<String> = remaining
        .keys()
        .filter(|key| key.as_str() != directive::INCLUDE)
        .cloned()
        .collect();

    let mut resolved = Map::new();
    for (key, value) in remaining {
        if key == directive::INCLUDE {
            if let Some(entries) = fragment_entries.take() {
                for (fragment_key, fragment_value) in entries {
                    if sibling_keys.contains(&fragment_key) {
                        if ctx.warns_duplicate_definitions() {
                            log_warn!(
                                "key '{}' from an included file is overridden by a sibling key",
                                fragment_key
                            );
                        }
                        continue;
                    }
                    resolved.insert(fragment_key, fragment_value);
                }
            }
            continue;
        }
        if key.starts_with(directive::PREFIX_OP) || key.starts_with(directive::PREFIX_EXTERNAL) {
            return Err(Error::directive_argument(
                &key,
                format!("'{}' must be the only key in its mapping", key),
            ));
        }
        if key.starts_with(directive::PREFIX) && !key.starts_with(directive::PREFIX_TARGET) {
            return Err(Error::unknown_directive(&key));
        }
        let value = resolve(ctx, value)?;
        resolved.insert(key, value);
    }

    Ok(Value::Object(resolved))
}

fn apply_op(ctx: &mut Context, key: &str, argument: Value) -> Result<Value> {
    if key != directive::OP_JOIN {
        return Err(Error::unknown_directive(key));
    }
    let resolved = resolve(ctx, argument)?;
    directive::op_join(key, &resolved)
}

/// Handle a sole external directive key. Outside a kind phase the node
/// passes through untouched; the target phase resolves its argument and
/// hands it to the helper.
fn apply_external(ctx: &mut Context, key: &str, mut node: Map<String, Value>) -> Result<Value> {
    let Some(kind) = ctx.kind().map(str::to_string) else {
        return Ok(Value::Object(node));
    };

    let rest = key.strip_prefix(directive::PREFIX_EXTERNAL).unwrap_or(key);
    let Some((helper_kind, helper_name)) = rest.split_once('.') else {
        return Err(Error::unknown_directive(key));
    };
    if helper_kind != kind.as_str() {
        return Err(Error::unknown_directive(key));
    }

    let argument = node.remove(key).unwrap_or(Value::Null);
    let resolved = resolve(ctx, argument)?;
    external::run(helper_kind, helper_name, &resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn resolve_value(value: Value) -> Result<Value> {
        let mut ctx = Context::new("/tmp");
        resolve(&mut ctx, value)
    }

    #[test]
    fn plain_data_passes_through() {
        let value = json!({"name": "fedora", "release": 41, "nested": [true, null]});

        assert_eq!(resolve_value(value.clone()).unwrap(), value);
    }

    #[test]
    fn the_version_marker_is_consumed() {
        let value = json!({"omnikit.version": "1", "name": "fedora"});

        assert_eq!(resolve_value(value).unwrap(), json!({"name": "fedora"}));
    }

    #[test]
    fn defines_bind_variables_for_siblings() {
        let value = json!({
            "omnikit.define": {"release": 41},
            "image": "fedora-${release}",
        });

        assert_eq!(resolve_value(value).unwrap(), json!({"image": "fedora-41"}));
    }

    #[test]
    fn defines_bind_regardless_of_key_order() {
        let value = json!({
            "image": "fedora-${release}",
            "omnikit.define": {"release": 41},
        });

        assert_eq!(resolve_value(value).unwrap(), json!({"image": "fedora-41"}));
    }

    #[test]
    fn whole_references_keep_types_in_subtrees() {
        let value = json!({
            "omnikit.define": {"packages": ["vim", "git"]},
            "install": "${packages}",
        });

        assert_eq!(
            resolve_value(value).unwrap(),
            json!({"install": ["vim", "git"]})
        );
    }

    #[test]
    fn a_sole_join_replaces_its_node() {
        let value = json!({
            "packages": {"omnikit.op.join": {"values": [["a"], ["b"]]}}
        });

        assert_eq!(resolve_value(value).unwrap(), json!({"packages": ["a", "b"]}));
    }

    #[test]
    fn join_values_resolve_before_joining() {
        let value = json!({
            "omnikit.define": {"extra": ["b"]},
            "packages": {"omnikit.op.join": {"values": [["a"], "${extra}"]}}
        });

        assert_eq!(resolve_value(value).unwrap(), json!({"packages": ["a", "b"]}));
    }

    #[test]
    fn a_join_beside_other_keys_is_rejected() {
        let value = json!({
            "omnikit.op.join": {"values": [[1]]},
            "other": 1,
        });

        let err = resolve_value(value).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformDirectiveArgument);
    }

    #[test]
    fn unknown_ops_are_rejected() {
        let value = json!({"omnikit.op.split": {}});

        let err = resolve_value(value).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformUnknownDirective);
    }

    #[test]
    fn unknown_directives_are_rejected() {
        let value = json!({"omnikit.frobnicate": 1});

        let err = resolve_value(value).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformUnknownDirective);
        assert!(err.message.contains("omnikit.frobnicate"));
    }

    #[test]
    fn external_nodes_pass_through_the_general_phase() {
        let value = json!({
            "tree": {"omnikit.external.osbuild.depsolve": {"packages": ["vim"]}}
        });

        assert_eq!(resolve_value(value.clone()).unwrap(), value);
    }

    #[test]
    fn mismatched_external_kinds_are_rejected_in_a_kind_phase() {
        let ctx = Context::new("/tmp");
        let mut kind_ctx = ctx.with_kind("osbuild");

        let err = resolve(
            &mut kind_ctx,
            json!({"omnikit.external.vagrant.provision": {}}),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformUnknownDirective);
    }

    #[test]
    fn an_include_alone_replaces_its_node() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("extra.yaml"), "- 1\n- 2\n").unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"parts": {"omnikit.include": "extra.yaml"}});

        assert_eq!(resolve(&mut ctx, value).unwrap(), json!({"parts": [1, 2]}));
    }

    #[test]
    fn an_include_beside_keys_merges_with_sibling_priority() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("base.yaml"), "a: 1\nb: 1\n").unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"omnikit.include": "base.yaml", "b": 2});

        assert_eq!(resolve(&mut ctx, value).unwrap(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn included_files_resolve_their_own_directives() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("vars.yaml"),
            "omnikit.define:\n  release: 41\nimage: fedora-${release}\n",
        )
        .unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"omnikit.include": "vars.yaml", "tag": "v${release}"});

        assert_eq!(
            resolve(&mut ctx, value).unwrap(),
            json!({"image": "fedora-41", "tag": "v41"})
        );
    }

    #[test]
    fn include_paths_resolve_against_the_root_not_the_includer() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("parts")).unwrap();
        fs::write(
            dir.path().join("parts/outer.yaml"),
            "omnikit.include: parts/inner.yaml\n",
        )
        .unwrap();
        fs::write(dir.path().join("parts/inner.yaml"), "release: 41\n").unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"base": {"omnikit.include": "parts/outer.yaml"}});

        assert_eq!(
            resolve(&mut ctx, value).unwrap(),
            json!({"base": {"release": 41}})
        );
    }

    #[test]
    fn include_cycles_are_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "omnikit.include: b.yaml\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "omnikit.include: a.yaml\n").unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"omnikit.include": "a.yaml"});

        let err = resolve(&mut ctx, value).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformIncludeCycle);
    }

    #[test]
    fn a_non_mapping_include_beside_keys_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("extra.yaml"), "- 1\n").unwrap();

        let mut ctx = Context::new(dir.path());
        let value = json!({"omnikit.include": "extra.yaml", "x": 1});

        let err = resolve(&mut ctx, value).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransformDirectiveType);
    }

    #[test]
    fn sequence_elements_resolve() {
        let mut ctx = Context::new("/tmp");
        ctx.define("a", json!("x"));

        assert_eq!(
            resolve(&mut ctx, json!(["${a}", "plain"])).unwrap(),
            json!(["x", "plain"])
        );
    }

    #[test]
    fn sequence_element_directives_replace_the_element() {
        let value = json!([{"omnikit.op.join": {"values": [[1], [2]]}}]);

        assert_eq!(resolve_value(value).unwrap(), json!([[1, 2]]));
    }

    #[test]
    fn target_keys_survive_with_resolved_values() {
        let value = json!({
            "omnikit.define": {"release": 41},
            "omnikit.target.osbuild.qcow2": {"release": "${release}"},
        });

        assert_eq!(
            resolve_value(value).unwrap(),
            json!({"omnikit.target.osbuild.qcow2": {"release": 41}})
        );
    }
}
