use std::fs;
use std::path::PathBuf;

use omnikit::{compile, validate, CompileOptions, ErrorCode};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn options(input: PathBuf) -> CompileOptions {
    CompileOptions {
        input,
        target: None,
        externals: true,
        warn_duplicate_definitions: false,
    }
}

#[test]
fn includes_resolve_against_the_omnifest_root() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "parts/packages.yaml",
        concat!(
            "packages:\n", //
            "  - vim\n",
            "  - git\n",
        ),
    );
    // The outer fragment lives in a subdirectory but still names its
    // include relative to the omnifest.
    write(
        &dir,
        "parts/pipeline.yaml",
        concat!(
            "omnikit.include: parts/packages.yaml\n",
            "name: build\n",
        ),
    );
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  version: \"2\"\n",
            "  pipeline:\n",
            "    omnikit.include: parts/pipeline.yaml\n",
        ),
    );

    let compiled = compile(&options(input)).unwrap();
    assert_eq!(compiled.target.as_deref(), Some("osbuild.qcow2"));
    assert!(compiled.manifest.contains("\"name\": \"build\""));
    assert!(compiled.manifest.contains("\"vim\""));
}

#[test]
fn variables_span_included_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "release.yaml", "image: fedora-${release}\n");
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.define:\n",
            "  release: 41\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  omnikit.include: release.yaml\n",
        ),
    );

    let compiled = compile(&options(input)).unwrap();
    assert!(compiled.manifest.contains("\"image\": \"fedora-41\""));
}

#[test]
fn local_keys_win_over_included_ones() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "defaults.yaml",
        concat!(
            "compression: zstd\n", //
            "size: 2GiB\n",
        ),
    );
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  omnikit.include: defaults.yaml\n",
            "  size: 8GiB\n",
        ),
    );

    let compiled = compile(&options(input)).unwrap();
    assert!(compiled.manifest.contains("\"compression\": \"zstd\""));
    assert!(compiled.manifest.contains("\"size\": \"8GiB\""));
    assert!(!compiled.manifest.contains("2GiB"));
}

#[test]
fn joins_merge_values_from_anywhere() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "base-packages.yaml",
        concat!(
            "- kernel\n", //
            "- systemd\n",
        ),
    );
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  packages:\n",
            "    omnikit.op.join:\n",
            "      values:\n",
            "        - omnikit.include: base-packages.yaml\n",
            "        - - vim\n",
        ),
    );

    let compiled = compile(&options(input)).unwrap();
    assert!(compiled.manifest.contains("\"kernel\""));
    assert!(compiled.manifest.contains("\"vim\""));
}

#[test]
fn targets_can_be_chosen_by_name() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  image: qcow2\n",
            "omnikit.target.osbuild.iso:\n",
            "  image: iso\n",
        ),
    );

    let mut options = options(input);
    options.target = Some("osbuild.iso".to_string());

    let compiled = compile(&options).unwrap();
    assert_eq!(compiled.target.as_deref(), Some("osbuild.iso"));
    assert!(compiled.manifest.contains("\"image\": \"iso\""));
}

#[test]
fn choosing_among_targets_is_required() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2: {}\n",
            "omnikit.target.osbuild.iso: {}\n",
        ),
    );

    let err = compile(&options(input)).unwrap_err();
    assert_eq!(err.code, ErrorCode::TargetAmbiguous);
    assert!(err.message.contains("osbuild.qcow2"));
    assert!(err.message.contains("osbuild.iso"));
}

#[test]
fn unknown_target_kinds_are_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.mikos.image:\n",
            "  image: qcow2\n",
        ),
    );

    let err = compile(&options(input)).unwrap_err();
    assert_eq!(err.code, ErrorCode::TargetUnknownKind);
    assert!(err.message.contains("mikos"));
    assert!(err.message.contains("osbuild"));
}

#[test]
fn undefined_variables_fail_the_compile() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  image: fedora-${release}\n",
        ),
    );

    let err = compile(&options(input)).unwrap_err();
    assert_eq!(err.code, ErrorCode::TransformUndefinedVariable);
    assert!(err.message.contains("release"));
}

#[test]
fn validation_reports_each_target() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2: {}\n",
            "omnikit.target.osbuild.iso: {}\n",
        ),
    );

    let report = validate(&input, false).unwrap();
    assert!(report.valid);
    assert_eq!(report.targets.len(), 2);
    assert_eq!(report.targets[0].name, "osbuild.qcow2");
    assert_eq!(report.targets[0].kind, "osbuild");
    assert_eq!(report.targets[1].name, "osbuild.iso");
}

#[test]
fn validation_leaves_externals_alone() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        concat!(
            "omnikit.version: \"1\"\n",
            "omnikit.target.osbuild.qcow2:\n",
            "  pipelines:\n",
            "    omnikit.external.osbuild.depsolve:\n",
            "      packages:\n",
            "        - vim\n",
        ),
    );

    // No helper exists anywhere, yet validation passes: externals only
    // run during the target's kind phase.
    let report = validate(&input, false).unwrap();
    assert!(report.valid);
}
