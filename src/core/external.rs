//! Out-of-process directives: helper discovery and the stdin/stdout
//! protocol.
//!
//! An `omnikit.external.<kind>.<name>` directive hands its resolved
//! argument to a helper binary. The helper reads `{"tree": ...}` as JSON
//! on stdin and answers with `{"tree": ...}` on stdout; the reply tree
//! replaces the directive node verbatim.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::utils::command;

/// Colon separated list of directories searched before the builtin
/// locations. Entries may use `~`.
pub const SEARCH_PATH_ENV: &str = "OMNIKIT_EXTERNAL_PATH";

/// Builtin helper directories, searched after `OMNIKIT_EXTERNAL_PATH`.
const BUILTIN_DIRS: [&str; 2] = ["/usr/libexec/omnikit", "/usr/local/libexec/omnikit"];

#[derive(Debug, Serialize)]
struct Request<'a> {
    tree: &'a Value,
}

#[derive(Debug, Deserialize)]
struct Reply {
    tree: Value,
}

/// Helper binary name for a directive: `omnikit.external.osbuild.depsolve.dnf4`
/// runs `osbuild-depsolve-dnf4`.
fn helper_name(kind: &str, name: &str) -> String {
    format!("{}-{}", kind, name.replace('.', "-"))
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(list) = env::var(SEARCH_PATH_ENV) {
        for entry in list.split(':').filter(|entry| !entry.is_empty()) {
            dirs.push(PathBuf::from(shellexpand::tilde(entry).as_ref()));
        }
    }
    dirs.extend(BUILTIN_DIRS.iter().map(PathBuf::from));
    dirs
}

fn find_helper(helper: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(helper))
        .find(|candidate| candidate.is_file())
}

/// Run the helper behind an external directive and return its reply tree.
pub fn run(kind: &str, name: &str, tree: &Value) -> Result<Value> {
    let helper = helper_name(kind, name);
    let dirs = search_dirs();
    let path = find_helper(&helper, &dirs).ok_or_else(|| {
        let searched = dirs.iter().map(|dir| dir.display().to_string()).collect();
        Error::external_not_found(&helper, searched)
            .with_hint(format!("set {} to add helper directories", SEARCH_PATH_ENV))
    })?;

    let request = serde_json::to_string(&Request { tree }).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("encode request for '{}'", helper)))
    })?;

    log_debug!("running external helper '{}'", path.display());
    let output = command::run_with_stdin(&path, &request, &helper)?;

    if !output.status.success() {
        return Err(Error::external_failed(
            &helper,
            output.status.code().unwrap_or(-1),
            command::error_text(&output),
        ));
    }

    let reply: Reply = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::external_protocol(&helper, e.to_string()))?;
    Ok(reply.tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn helper_names_flatten_dots() {
        assert_eq!(helper_name("osbuild", "depsolve.dnf4"), "osbuild-depsolve-dnf4");
        assert_eq!(helper_name("osbuild", "depsolve"), "osbuild-depsolve");
    }

    #[test]
    fn discovery_takes_the_first_matching_directory() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(second.path().join("osbuild-depsolve"), "#!/bin/sh\n").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_helper("osbuild-depsolve", &dirs),
            Some(second.path().join("osbuild-depsolve"))
        );

        fs::write(first.path().join("osbuild-depsolve"), "#!/bin/sh\n").unwrap();
        assert_eq!(
            find_helper("osbuild-depsolve", &dirs),
            Some(first.path().join("osbuild-depsolve"))
        );
    }

    #[test]
    fn discovery_misses_report_none() {
        let empty = tempdir().unwrap();

        assert_eq!(find_helper("osbuild-depsolve", &[empty.path().to_path_buf()]), None);
    }

    #[test]
    fn requests_wrap_the_tree() {
        let tree = json!({"packages": ["vim"]});
        let request = serde_json::to_string(&Request { tree: &tree }).unwrap();

        assert_eq!(request, r#"{"tree":{"packages":["vim"]}}"#);
    }

    #[test]
    fn replies_must_carry_a_tree() {
        assert!(serde_json::from_str::<Reply>(r#"{"tree": {}}"#).is_ok());
        assert!(serde_json::from_str::<Reply>(r#"{"result": {}}"#).is_err());
        assert!(serde_json::from_str::<Reply>("not json").is_err());
    }
}
