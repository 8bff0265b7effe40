use std::fs;

use clap::Parser;
use tempfile::tempdir;
use todoboard::cache;
use todoboard::cli::Cli;
use todoboard::error::ExitCode;
use todoboard::persist::ResultStore;
use todoboard::run_app;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["todoboard", "-q", "--no-color"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_scan_exit_codes() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    assert_eq!(run(&["scan", root]).unwrap(), ExitCode::NoAnnotations);

    fs::write(dir.path().join("a.ts"), "// @TODO(high) ship it [release]\n").unwrap();
    assert_eq!(run(&["scan", root, "-o", "json"]).unwrap(), ExitCode::Success);
}

#[test]
fn test_scan_persists_results_and_cache() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO one\nlet a;\n// @TODO two\n").unwrap();

    run(&["scan", root, "-o", "csv"]).unwrap();

    let stored = ResultStore::for_workspace(dir.path()).load();
    assert_eq!(stored.len(), 2);
    assert!(cache::cache_path(dir.path()).exists());
}

#[test]
fn test_scan_no_save_and_no_cache() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO one\n").unwrap();

    assert_eq!(
        run(&["scan", root, "--no-save", "--no-cache"]).unwrap(),
        ExitCode::Success
    );
    assert!(!ResultStore::for_workspace(dir.path()).path().exists());
    assert!(!cache::cache_path(dir.path()).exists());
}

#[test]
fn test_scan_pattern_flag_replaces_terms() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO default only\n").unwrap();

    assert_eq!(
        run(&["scan", root, "--pattern", "FIXME", "--no-save"]).unwrap(),
        ExitCode::NoAnnotations
    );
}

#[test]
fn test_scan_exclude_flag() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::create_dir_all(dir.path().join("generated")).unwrap();
    fs::write(dir.path().join("generated/api.ts"), "// @TODO generated\n").unwrap();

    assert_eq!(
        run(&["scan", root, "--exclude", "generated", "--no-save"]).unwrap(),
        ExitCode::NoAnnotations
    );
}

#[test]
fn test_scan_rejects_missing_and_file_paths() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let file = dir.path().join("a.ts");
    fs::write(&file, "// @TODO x\n").unwrap();

    let err = run(&["scan", missing.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("Path not found"));

    let err = run(&["scan", file.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("Not a directory"));
}

#[test]
fn test_scan_missing_explicit_config_is_an_error() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let config = dir.path().join("absent.toml");

    let err = run(&["scan", root, "--config", config.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
fn test_list_filters_stored_results() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::write(
        dir.path().join("a.ts"),
        "// @TODO fix [bug]\nlet a;\n// @TODO polish [ui]\n",
    )
    .unwrap();
    run(&["scan", root]).unwrap();

    assert_eq!(run(&["list", root, "--label", "bug"]).unwrap(), ExitCode::Success);
    assert_eq!(
        run(&["list", root, "--label", "docs", "-o", "json"]).unwrap(),
        ExitCode::NoAnnotations
    );
    assert_eq!(
        run(&["list", root, "--sort", "newest", "-o", "csv"]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_list_without_stored_results() {
    let dir = tempdir().unwrap();
    assert_eq!(
        run(&["list", dir.path().to_str().unwrap()]).unwrap(),
        ExitCode::NoAnnotations
    );
}

#[test]
fn test_clear_cache_command() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO x\n").unwrap();
    run(&["scan", root, "--no-save"]).unwrap();
    assert!(cache::cache_path(dir.path()).exists());

    assert_eq!(run(&["clear-cache", root]).unwrap(), ExitCode::Success);
    assert!(!cache::cache_path(dir.path()).exists());
    assert_eq!(run(&["clear-cache", root]).unwrap(), ExitCode::Success);
}

#[test]
fn test_config_command() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".todo-board.toml"), "max_todo_lines = 6\n").unwrap();
    assert_eq!(
        run(&["config", dir.path().to_str().unwrap()]).unwrap(),
        ExitCode::Success
    );
}
