//! CLI behaviour tests: subcommands, exit codes and console output.

#![allow(deprecated)]

use assert_cmd::Command;
use installfix_edit::{DEFAULT_HEADER_PATH, UV_LOOP_FIND, UV_LOOP_REPLACE};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn installfix() -> Command {
    let mut cmd = Command::cargo_bin("installfix").expect("installfix binary");
    cmd.env_remove("RUST_LOG")
        .env_remove("INSTALLFIX_PYTHON")
        .env_remove("PYTHON");
    cmd
}

fn create_temp_project() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    fs::write(
        td.path().join("package.json"),
        r#"{ "name": "demo", "version": "1.0.0" }"#,
    )
    .unwrap();
    td
}

fn install_header(root: &Path, contents: &str) -> PathBuf {
    let path = root.join(DEFAULT_HEADER_PATH);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_patch_header_end_to_end() {
    let temp = create_temp_project();
    let header = install_header(temp.path(), &format!("a\n{}\nb\n", UV_LOOP_FIND));

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully patched get-uv-event-loop-napi.h",
        ));

    assert_eq!(
        fs::read_to_string(&header).unwrap(),
        format!("a\n{}\nb\n", UV_LOOP_REPLACE)
    );
}

#[test]
fn test_patch_header_twice_is_idempotent() {
    let temp = create_temp_project();
    let header = install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    for _ in 0..2 {
        installfix()
            .current_dir(temp.path())
            .arg("patch-header")
            .assert()
            .success();
    }

    assert_eq!(
        fs::read_to_string(&header).unwrap(),
        format!("{}\n", UV_LOOP_REPLACE)
    );
}

#[test]
fn test_patch_header_missing_exits_1() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_patch_header_project_root_flag() {
    let temp = create_temp_project();
    let header = install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    installfix()
        .arg("--project-root")
        .arg(temp.path())
        .arg("patch-header")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&header).unwrap(),
        format!("{}\n", UV_LOOP_REPLACE)
    );
}

#[test]
fn test_patch_header_dry_run_prints_diff() {
    let temp = create_temp_project();
    let original = format!("{}\n", UV_LOOP_FIND);
    let header = install_header(temp.path(), &original);

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("reinterpret_cast<get_uv_event_loop_fn>"))
        .stdout(predicate::str::contains(format!(
            "--- a/{0}\n+++ b/{0}\n",
            DEFAULT_HEADER_PATH
        )))
        .stdout(predicate::str::contains("a/./").not());

    assert_eq!(fs::read_to_string(&header).unwrap(), original);
}

#[test]
fn test_patch_header_dry_run_with_absolute_root_uses_relative_paths() {
    let temp = create_temp_project();
    install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    installfix()
        .arg("--project-root")
        .arg(temp.path())
        .arg("patch-header")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "diff --git a/{0} b/{0}\n",
            DEFAULT_HEADER_PATH
        )))
        .stdout(predicate::str::contains("a//").not());
}

#[test]
fn test_patch_header_json_format() {
    let temp = create_temp_project();
    install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status": "patched""#));
}

#[test]
fn test_patch_header_invalid_format() {
    installfix()
        .arg("patch-header")
        .arg("--format")
        .arg("yaml")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("invalid").or(predicate::str::contains("possible values")),
        );
}

#[test]
fn test_config_overrides_header_patch() {
    let temp = create_temp_project();
    fs::create_dir_all(temp.path().join("include")).unwrap();
    fs::write(temp.path().join("include/loop.h"), "int a = b;\n").unwrap();
    fs::write(
        temp.path().join("installfix.toml"),
        r#"
[header]
path = "include/loop.h"
find = "int a = b;"
replace = "int a = (int)b;"
"#,
    )
    .unwrap();

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully patched loop.h"));

    assert_eq!(
        fs::read_to_string(temp.path().join("include/loop.h")).unwrap(),
        "int a = (int)b;\n"
    );
}

#[test]
fn test_invalid_config_exits_1() {
    let temp = create_temp_project();
    fs::write(temp.path().join("installfix.toml"), "[header\n").unwrap();

    installfix()
        .current_dir(temp.path())
        .arg("clean")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("installfix.toml"));
}

#[test]
fn test_empty_find_in_config_exits_1() {
    let temp = create_temp_project();
    install_header(temp.path(), "content\n");
    fs::write(temp.path().join("installfix.toml"), "[header]\nfind = \"\"\n").unwrap();

    installfix()
        .current_dir(temp.path())
        .arg("patch-header")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid patch"));
}

#[test]
fn test_clean_removes_node_modules() {
    let temp = create_temp_project();
    install_header(temp.path(), "x");

    installfix()
        .current_dir(temp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned node_modules"));

    assert!(!temp.path().join("node_modules").exists());
    assert!(temp.path().join("package.json").exists());
}

#[test]
fn test_clean_removes_node_modules_file() {
    let temp = create_temp_project();
    fs::write(temp.path().join("node_modules"), "stray file").unwrap();

    installfix()
        .current_dir(temp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned node_modules"));

    assert!(!temp.path().join("node_modules").exists());
}

#[test]
fn test_clean_without_node_modules_is_silent() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_clean_dry_run_keeps_tree() {
    let temp = create_temp_project();
    install_header(temp.path(), "x");

    installfix()
        .current_dir(temp.path())
        .arg("clean")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove"));

    assert!(temp.path().join("node_modules").exists());
}

#[test]
fn test_fix_ffi_skip_rebuild_with_missing_header() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("fix-ffi")
        .arg("--skip-rebuild")
        .assert()
        .success()
        .stdout(predicate::str::contains("not installed"));
}

#[test]
fn test_fix_ffi_missing_package_manager_exits_1() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("fix-ffi")
        .arg("--package-manager")
        .arg("installfix-no-such-package-manager")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to spawn"));
}

#[cfg(unix)]
#[test]
fn test_fix_ffi_patches_and_rebuilds() {
    let temp = create_temp_project();
    let header = install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    installfix()
        .current_dir(temp.path())
        .arg("fix-ffi")
        .arg("--package-manager")
        .arg("true")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt ffi-napi"));

    assert_eq!(
        fs::read_to_string(&header).unwrap(),
        format!("{}\n", UV_LOOP_REPLACE)
    );
}

#[cfg(unix)]
#[test]
fn test_fix_ffi_rebuild_failure_exits_1() {
    let temp = create_temp_project();
    install_header(temp.path(), &format!("{}\n", UV_LOOP_FIND));

    installfix()
        .current_dir(temp.path())
        .arg("fix-ffi")
        .arg("--package-manager")
        .arg("false")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("postinstall failed"));
}

#[cfg(unix)]
#[test]
fn test_preinstall_runs_python_and_cache_clean() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("preinstall")
        .arg("--python")
        .arg("true")
        .arg("--package-manager")
        .arg("true")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using Python interpreter true"))
        .stdout(predicate::str::contains("Cleaned package cache"));
}

#[cfg(unix)]
#[test]
fn test_preinstall_python_from_env() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .env("INSTALLFIX_PYTHON", "true")
        .arg("preinstall")
        .arg("--skip-cache-clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using Python interpreter true"))
        .stdout(predicate::str::contains("Cleaned package cache").not());
}

#[cfg(unix)]
#[test]
fn test_preinstall_bad_python_exits_1() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("preinstall")
        .arg("--python")
        .arg("false")
        .arg("--package-manager")
        .arg("true")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("preinstall failed"));
}

#[cfg(unix)]
#[test]
fn test_preinstall_falls_back_to_python_env() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .env("PYTHON", "true")
        .arg("preinstall")
        .arg("--skip-cache-clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using Python interpreter true"));
}

#[cfg(unix)]
#[test]
fn test_preinstall_config_python_beats_python_env() {
    let temp = create_temp_project();
    fs::write(
        temp.path().join("installfix.toml"),
        "[preinstall]\npython = \"true\"\nclean_cache = false\n",
    )
    .unwrap();

    installfix()
        .current_dir(temp.path())
        .env("PYTHON", "false")
        .arg("preinstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using Python interpreter true"));
}

#[cfg(unix)]
#[test]
fn test_preinstall_blank_python_env_uses_config() {
    let temp = create_temp_project();
    fs::write(
        temp.path().join("installfix.toml"),
        "[preinstall]\npython = \"true\"\nclean_cache = false\n",
    )
    .unwrap();

    installfix()
        .current_dir(temp.path())
        .env("INSTALLFIX_PYTHON", "")
        .env("PYTHON", "false")
        .arg("preinstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using Python interpreter true"));
}

#[test]
fn test_show_config_prints_defaults() {
    let temp = create_temp_project();

    installfix()
        .current_dir(temp.path())
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""addon": "ffi-napi""#))
        .stdout(predicate::str::contains(r#""package_manager": "npm""#));
}

#[test]
fn test_unknown_subcommand_fails() {
    installfix().arg("frobnicate").assert().failure();
}
