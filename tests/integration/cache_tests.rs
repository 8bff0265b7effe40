use std::fs;
use std::path::Path;

use filetime::{set_file_mtime, FileTime};
use serde_json::{json, Value};
use tempfile::tempdir;
use todoboard::cache::{self, CACHE_VERSION, STATE_DIR};
use todoboard::identity::generate_id;
use todoboard::scanner::{Scanner, ScannerConfig};

fn file_key(root: &Path, rel: &str) -> String {
    root.join(rel).to_string_lossy().into_owned()
}

#[test]
fn test_cache_file_layout_after_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "let x;\n// @TODO cached [c]\n").unwrap();
    set_file_mtime(dir.path().join("a.ts"), FileTime::from_unix_time(1_700_000_000, 250_000_000))
        .unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    scanner.scan(dir.path());
    scanner.flush();

    let content = fs::read_to_string(cache::cache_path(dir.path())).unwrap();
    let value: Value = serde_json::from_str(&content).unwrap();
    let key = file_key(dir.path(), "a.ts");

    assert_eq!(value["version"], CACHE_VERSION);
    assert_eq!(value["files"][&key]["mtime"], 1_700_000_000_250u64);
    let hit = &value["files"][&key]["hits"][0];
    assert_eq!(hit["line"], 1);
    assert_eq!(hit["text"], "@TODO cached [c]");
    assert_eq!(hit["id"], generate_id(&key, 1, "@TODO cached [c]"));
}

#[test]
fn test_corrupt_cache_falls_back_to_full_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO survives\n").unwrap();
    fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
    fs::write(cache::cache_path(dir.path()), "{\"files\": ").unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    let result = scanner.scan(dir.path());
    scanner.flush();

    assert_eq!(result.scanned, 1);
    assert_eq!(result.reused, 0);
    assert_eq!(cache::try_read(dir.path()).unwrap().len(), 1);
}

#[test]
fn test_legacy_cache_is_reused_and_upgraded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.ts");
    fs::write(&path, "// @TODO from disk\n").unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    fs::write(dir.path().join("b.ts"), "// @TODO fresh\n").unwrap();

    let key = file_key(dir.path(), "a.ts");
    let legacy = json!({
        "files": {
            key.clone(): {
                "mtime": 1_700_000_000_000.0,
                "hits": [{ "line": 0, "text": "@TODO from legacy cache" }]
            }
        }
    });
    fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
    fs::write(cache::cache_path(dir.path()), legacy.to_string()).unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    let result = scanner.scan(dir.path());
    scanner.flush();

    assert_eq!(result.reused, 1);
    assert_eq!(result.scanned, 1);
    let reused = result.hits.iter().find(|h| h.file == key).unwrap();
    assert_eq!(reused.text, "@TODO from legacy cache");
    assert_eq!(reused.id, generate_id(&key, 0, "@TODO from legacy cache"));

    let upgraded = cache::try_read(dir.path()).unwrap();
    assert_eq!(upgraded.version, CACHE_VERSION);
    assert_eq!(upgraded.len(), 2);
}

#[test]
fn test_clear_forces_rescan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO again\n").unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    scanner.scan(dir.path());
    scanner.flush();
    assert!(cache::clear(dir.path()).unwrap());
    assert!(!cache::cache_path(dir.path()).exists());

    let result = scanner.scan(dir.path());
    assert_eq!(result.reused, 0);
    assert_eq!(result.scanned, 1);
}

#[test]
fn test_deleted_file_stays_in_cache_but_not_in_results() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO a\n").unwrap();
    fs::write(dir.path().join("b.ts"), "// @TODO b\n").unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    scanner.scan(dir.path());
    fs::remove_file(dir.path().join("b.ts")).unwrap();

    let result = scanner.scan(dir.path());
    scanner.flush();

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].text, "@TODO a");
}
