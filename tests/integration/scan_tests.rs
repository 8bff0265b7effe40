use std::fs;
use std::path::Path;
use std::sync::Arc;

use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;
use todoboard::cache;
use todoboard::cancel::CancellationToken;
use todoboard::progress::ProgressCallback;
use todoboard::scanner::{Scanner, ScannerConfig, Walker, WalkerConfig};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn pin_mtime(root: &Path, rel: &str, secs: i64) {
    set_file_mtime(root.join(rel), FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let mut scanner = Scanner::new(ScannerConfig::default());

    let result = scanner.scan(dir.path());

    assert!(result.hits.is_empty());
    assert_eq!(result.files_processed, 0);
    assert!(!result.cancelled);
}

#[test]
fn test_scan_line_comment_continuation() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "src/app.ts",
        "// @TODO first\n// line two\nconst x = 1;\n",
    );

    let mut scanner = Scanner::new(ScannerConfig::default());
    let result = scanner.scan(dir.path());

    assert_eq!(result.hits.len(), 1);
    let hit = &result.hits[0];
    assert_eq!(hit.line, 0);
    assert_eq!(hit.text, "@TODO first\nline two");
    assert!(hit.file.ends_with("app.ts"));
    assert_eq!(result.scanned, 1);
    assert_eq!(result.reused, 0);
}

#[test]
fn test_scan_block_and_html_comments() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "C.java",
        "/* @TODO(java) start\n * middle\n */\nclass C {}\n",
    );
    write(
        dir.path(),
        "index.html",
        "<!-- @TODO html todo\nnext line\n-->\n<div></div>\n",
    );

    let mut scanner = Scanner::new(ScannerConfig::default());
    let mut hits = scanner.scan(dir.path()).hits;
    hits.sort_by(todoboard::annotation::by_location);

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "@TODO(java) start\nmiddle");
    assert_eq!(hits[1].text, "@TODO html todo\nnext line");
}

#[test]
fn test_scan_respects_aggregation_ceiling() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "a.ts",
        "// @TODO one\n// two\n// three\n// @TODO four\n",
    );

    let config = ScannerConfig::default().with_max_todo_lines(2);
    let mut scanner = Scanner::new(config);
    let mut hits = scanner.scan(dir.path()).hits;
    hits.sort_by_key(|h| h.line);

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "@TODO one\ntwo");
    assert!(!hits[0].text.contains("three"));
    assert_eq!(hits[1].line, 3);
    assert_eq!(hits[1].text, "@TODO four");
}

#[test]
fn test_scan_ignores_unlisted_extensions_and_excluded_dirs() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep.ts", "// @TODO keep\n");
    write(dir.path(), "notes.txt", "// @TODO wrong extension\n");
    write(dir.path(), "node_modules/lib/index.js", "// @TODO vendored\n");
    write(dir.path(), "dist/out.js", "// @TODO built\n");

    let mut scanner = Scanner::new(ScannerConfig::default());
    let result = scanner.scan(dir.path());

    assert_eq!(result.files_processed, 1);
    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].text, "@TODO keep");
}

#[test]
fn test_scan_skips_oversized_files() {
    let dir = tempdir().unwrap();
    let mut big = String::from("// @TODO hidden in a big file\n");
    for i in 0..20 {
        big.push_str(&format!("const v{i} = {i};\n"));
    }
    write(dir.path(), "big.ts", &big);
    write(dir.path(), "small.ts", "// @TODO visible\n");

    let config = ScannerConfig::default().with_max_file_lines(10);
    let mut scanner = Scanner::new(config);
    let result = scanner.scan(dir.path());

    assert_eq!(result.files_processed, 2);
    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].text, "@TODO visible");
}

#[test]
fn test_second_scan_reuses_unchanged_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "// @TODO alpha\nlet a;\n// @TODO beta\n");
    write(dir.path(), "b.ts", "// @TODO gamma\n");
    pin_mtime(dir.path(), "a.ts", 1_700_000_000);
    pin_mtime(dir.path(), "b.ts", 1_700_000_000);

    let mut scanner = Scanner::new(ScannerConfig::default());
    let first = scanner.scan(dir.path());
    assert_eq!(first.scanned, 3);
    assert_eq!(first.reused, 0);

    let second = scanner.scan(dir.path());
    assert_eq!(second.scanned, 0);
    assert_eq!(second.reused, 3);
    assert_eq!(second.files_processed, 2);

    let mut a: Vec<_> = first.hits.iter().map(|h| h.id.clone()).collect();
    let mut b: Vec<_> = second.hits.iter().map(|h| h.id.clone()).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn test_cache_hit_does_not_read_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "// @TODO original\n");
    pin_mtime(dir.path(), "a.ts", 1_700_000_000);

    Scanner::new(ScannerConfig::default()).scan(dir.path());

    // Same mtime, different bytes: the cached hits must win.
    write(dir.path(), "a.ts", "// @TODO replaced\n");
    pin_mtime(dir.path(), "a.ts", 1_700_000_000);

    let result = Scanner::new(ScannerConfig::default()).scan(dir.path());
    assert_eq!(result.reused, 1);
    assert_eq!(result.hits[0].text, "@TODO original");
}

#[test]
fn test_changed_mtime_triggers_rescan() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "// @TODO stays\n");
    write(dir.path(), "b.ts", "// @TODO old text\n");
    pin_mtime(dir.path(), "a.ts", 1_700_000_000);
    pin_mtime(dir.path(), "b.ts", 1_700_000_000);

    let mut scanner = Scanner::new(ScannerConfig::default());
    scanner.scan(dir.path());

    write(dir.path(), "b.ts", "// @TODO new text\n// @TODO and another\n");
    pin_mtime(dir.path(), "b.ts", 1_700_000_500);

    let result = scanner.scan(dir.path());
    assert_eq!(result.reused, 1);
    assert_eq!(result.scanned, 2);
    assert!(result.hits.iter().any(|h| h.text == "@TODO new text"));
    assert!(!result.hits.iter().any(|h| h.text == "@TODO old text"));
}

#[test]
fn test_no_cache_reads_everything_and_writes_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "// @TODO alpha\n");

    let mut scanner = Scanner::new(ScannerConfig::default().with_cache(false));
    scanner.scan(dir.path());
    let result = scanner.scan(dir.path());
    scanner.flush();

    assert_eq!(result.scanned, 1);
    assert_eq!(result.reused, 0);
    assert!(!cache::cache_path(dir.path()).exists());
}

#[test]
fn test_cancelled_scan_leaves_cache_untouched() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write(dir.path(), &format!("f{i}.ts"), &format!("// @TODO item {i}\n"));
    }

    let mut scanner = Scanner::new(ScannerConfig::default());
    scanner.scan(dir.path());
    scanner.flush();
    let cache_file = cache::cache_path(dir.path());
    let before = fs::read(&cache_file).unwrap();

    for i in 0..6 {
        write(dir.path(), &format!("f{i}.ts"), &format!("// @TODO changed {i}\n"));
        pin_mtime(dir.path(), &format!("f{i}.ts"), 1_600_000_000 + i);
    }

    let token = CancellationToken::new();
    token.cancel();
    let mut cancelled = Scanner::new(ScannerConfig::default().with_cancellation(token));
    let result = cancelled.scan(dir.path());
    cancelled.flush();

    assert!(result.cancelled);
    assert!(result.files_processed < 6);
    assert_eq!(fs::read(&cache_file).unwrap(), before);
}

#[test]
fn test_cancellation_during_pool_processing() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        write(dir.path(), &format!("f{i}.ts"), "// @TODO x\n");
    }
    let candidates = Walker::new(dir.path(), WalkerConfig::default()).collect_candidates();
    assert_eq!(candidates.len(), 4);

    let token = CancellationToken::new();
    token.cancel();
    let mut scanner = Scanner::new(ScannerConfig::default().with_cancellation(token));
    let result = scanner.scan_files(Some(dir.path()), &candidates);
    scanner.flush();

    assert!(result.cancelled);
    assert_eq!(result.files_processed, 0);
    assert!(result.hits.is_empty());
    assert!(!cache::cache_path(dir.path()).exists());
}

/// Requests cancellation as soon as the first file finishes.
struct CancelAfterFirstFile {
    token: CancellationToken,
}

impl ProgressCallback for CancelAfterFirstFile {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, _path: &str) {
        self.token.cancel();
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_cancel_mid_scan_finishes_in_flight_file_only() {
    let dir = tempdir().unwrap();
    for i in 0..8 {
        write(dir.path(), &format!("f{i}.ts"), &format!("// @TODO item {i}\n"));
    }

    let token = CancellationToken::new();
    let config = ScannerConfig::default()
        .with_concurrency(1)
        .with_cancellation(token.clone())
        .with_progress_callback(Arc::new(CancelAfterFirstFile { token }));
    let mut scanner = Scanner::new(config);
    let result = scanner.scan(dir.path());
    scanner.flush();

    assert!(result.cancelled);
    assert_eq!(result.files_processed, 1);
    assert_eq!(result.hits.len(), 1);
    assert!(!cache::cache_path(dir.path()).exists());
}

#[test]
fn test_scan_files_without_root_skips_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "// @TODO alpha\n");
    let candidates = vec![dir.path().join("a.ts"), dir.path().join("missing.ts")];

    let mut scanner = Scanner::new(ScannerConfig::default());
    let result = scanner.scan_files(None, &candidates);
    scanner.flush();

    assert_eq!(result.files_processed, 2);
    assert_eq!(result.hits.len(), 1);
    assert!(!cache::cache_path(dir.path()).exists());
}

#[test]
fn test_custom_search_patterns() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "a.py",
        "# FIXME(high) tighten this\nx = 1\n# @TODO default marker\n",
    );

    let config = ScannerConfig::default().with_search_patterns(vec!["FIXME".into()]);
    let mut scanner = Scanner::new(config);
    let result = scanner.scan(dir.path());

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].text, "FIXME(high) tighten this");
}
