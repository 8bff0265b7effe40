use proptest::prelude::*;
use tempfile::TempDir;
use todoboard::cache::{self, CacheData, CacheEntry, CachedHit};
use todoboard::identity::{generate_id, is_valid_id};
use todoboard::pattern::TermPatterns;
use todoboard::sanitize::sanitize;
use todoboard::scanner::extract_hits;

fn cached_hit() -> impl Strategy<Value = CachedHit> {
    ("[0-9a-f]{16}", 0usize..100_000, "\\PC*").prop_map(|(id, line, text)| CachedHit {
        id,
        line,
        text,
    })
}

fn cache_data() -> impl Strategy<Value = CacheData> {
    prop::collection::btree_map(
        "/[a-z]{1,8}/[a-z]{1,8}\\.ts",
        (any::<u64>(), prop::collection::vec(cached_hit(), 0..5)),
        0..8,
    )
    .prop_map(|files| {
        let mut cache = CacheData::new();
        for (file, (mtime, hits)) in files {
            cache.update(file, CacheEntry { mtime, hits });
        }
        cache
    })
}

proptest! {
    #[test]
    fn test_id_determinism(file in "\\PC*", line in 0usize..1_000_000, text in "\\PC*") {
        let a = generate_id(&file, line, &text);
        let b = generate_id(&file, line, &text);
        prop_assert!(is_valid_id(&a));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_id_changes_with_each_input(
        file in "[a-z/]{1,20}",
        other_file in "[a-z/]{1,20}",
        line in 0usize..10_000,
        text in "[a-zA-Z ]{0,30}[a-z]",
        other_text in "[a-zA-Z ]{0,30}[a-z]",
    ) {
        let base = generate_id(&file, line, &text);
        if file != other_file {
            prop_assert_ne!(&base, &generate_id(&other_file, line, &text));
        }
        prop_assert_ne!(&base, &generate_id(&file, line + 1, &text));
        if text.trim() != other_text.trim() {
            prop_assert_ne!(&base, &generate_id(&file, line, &other_text));
        }
    }

    #[test]
    fn test_sanitize_idempotent(s in "\\PC*") {
        let once = sanitize(&s);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_idempotent_on_comment_artifacts(
        parts in prop::collection::vec(
            prop_oneof![
                Just("*/".to_string()),
                Just("-->".to_string()),
                Just("\\\"".to_string()),
                Just("\\n".to_string()),
                Just("\"\"".to_string()),
                Just(" ".to_string()),
                "[a-z@()]{0,4}",
            ],
            0..12,
        )
    ) {
        let raw = parts.concat();
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_cache_round_trip(cache in cache_data()) {
        let dir = TempDir::new().unwrap();
        cache::try_write(dir.path(), &cache).unwrap();
        prop_assert_eq!(cache::try_read(dir.path()).unwrap(), cache);
    }

    #[test]
    fn test_extracted_hits_are_ordered_and_identified(
        lines in prop::collection::vec(
            prop_oneof![
                Just("// @TODO item".to_string()),
                Just("// more".to_string()),
                Just("let x = 1;".to_string()),
                Just("/* @TODO block".to_string()),
                Just(" */".to_string()),
                Just("".to_string()),
            ],
            0..30,
        ),
        max_lines in 1usize..6,
    ) {
        let content = lines.join("\n");
        let hits = extract_hits("/w/p.ts", &content, &TermPatterns::default(), max_lines);

        for pair in hits.windows(2) {
            prop_assert!(pair[0].line < pair[1].line);
        }
        for hit in &hits {
            prop_assert_eq!(&hit.id, &generate_id("/w/p.ts", hit.line, &hit.text));
            prop_assert!(hit.text.split('\n').count() <= max_lines);
        }
    }
}
