use std::fs;

use tempfile::tempdir;
use todoboard::annotation::{AnnotationHit, IssueLink};
use todoboard::cache::STATE_DIR;
use todoboard::persist::{ResultStore, RESULTS_FILE};
use todoboard::scanner::{Scanner, ScannerConfig};

fn link(key: &str) -> IssueLink {
    IssueLink {
        id: "42".into(),
        key: key.into(),
        link: format!("https://tracker.example/browse/{key}"),
    }
}

#[test]
fn test_store_location() {
    let dir = tempdir().unwrap();
    let store = ResultStore::for_workspace(dir.path());
    assert_eq!(store.path(), dir.path().join(STATE_DIR).join(RESULTS_FILE));
}

#[test]
fn test_rescan_keeps_issue_links() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "// @TODO link me\nlet a;\n// @TODO other\n").unwrap();

    let mut scanner = Scanner::new(ScannerConfig::default());
    let store = ResultStore::for_workspace(dir.path());

    let mut first = store.merge_with_existing(scanner.scan(dir.path()).hits);
    first.sort_by_key(|h| h.line);
    first[0].issue = Some(link("WEB-12"));
    store.try_save(&first).unwrap();

    // Different text, same location: the link follows the location.
    fs::write(dir.path().join("a.ts"), "// @TODO link me, reworded\nlet a;\n// @TODO other\n")
        .unwrap();
    filetime::set_file_mtime(
        dir.path().join("a.ts"),
        filetime::FileTime::from_unix_time(1_800_000_000, 0),
    )
    .unwrap();

    let mut merged = store.merge_with_existing(scanner.scan(dir.path()).hits);
    merged.sort_by_key(|h| h.line);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].text, "@TODO link me, reworded");
    assert_eq!(merged[0].issue.as_ref().map(|i| i.key.as_str()), Some("WEB-12"));
    assert!(merged[1].issue.is_none());
}

#[test]
fn test_new_decoration_wins_over_stored_one() {
    let dir = tempdir().unwrap();
    let store = ResultStore::for_workspace(dir.path());

    let mut old = AnnotationHit::new("1".repeat(16), "/w/a.ts".into(), 3, "@TODO x".into());
    old.issue = Some(link("OLD-1"));
    store.try_save(&[old]).unwrap();

    let mut fresh = AnnotationHit::new("2".repeat(16), "/w/a.ts".into(), 3, "@TODO x".into());
    fresh.issue = Some(link("NEW-2"));
    let merged = store.merge_with_existing(vec![fresh]);

    assert_eq!(merged[0].issue.as_ref().unwrap().key, "NEW-2");
}

#[test]
fn test_merge_without_stored_results_is_identity() {
    let dir = tempdir().unwrap();
    let store = ResultStore::for_workspace(dir.path());
    let hits = vec![AnnotationHit::new("3".repeat(16), "/w/b.ts".into(), 0, "@TODO y".into())];

    assert_eq!(store.merge_with_existing(hits.clone()), hits);
}

#[test]
fn test_load_tolerates_garbage() {
    let dir = tempdir().unwrap();
    let store = ResultStore::for_workspace(dir.path());
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();

    fs::write(store.path(), "not json").unwrap();
    assert!(store.load().is_empty());

    fs::write(store.path(), "{\"hits\": []}").unwrap();
    assert!(store.try_load().is_err());
    assert!(store.load().is_empty());
}

#[test]
fn test_saved_document_is_camel_case_array() {
    let dir = tempdir().unwrap();
    let store = ResultStore::for_workspace(dir.path());
    let mut hit = AnnotationHit::new("4".repeat(16), "/w/c.ts".into(), 7, "@TODO z".into());
    hit.days_old = Some(12);
    store.try_save(&[hit]).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["daysOld"], 12);
    assert_eq!(value[0]["line"], 7);
    assert!(value[0].get("issue").is_none());
}
