use proptest::prelude::*;

use super::*;

use crate::db::{DbError, FORMAT};

#[test]
fn test_hello_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    data.insert(
        "hello".to_string(),
        vec![RawEntry::new("world", 5.0), RawEntry::new("there", 2.0)],
    );
    let db = build_and_load(&dir.path().join("predict.db"), &data);

    let candidates = db.lookup("hello").unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(db.entry_text(&candidates.get(0).unwrap()), "world");
    assert!(db.lookup("goodbye").is_none());
}

#[test]
fn test_roundtrip_preserves_order_and_weights() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_data();
    let db = build_and_load(&dir.path().join("predict.db"), &data);

    for (key, raw) in &data {
        let candidates = db.lookup(key).unwrap();
        assert_eq!(candidates.len(), raw.len(), "key {key}");
        for (entry, expected) in candidates.iter().zip(raw) {
            assert_eq!(db.entry_text(&entry), expected.text);
            assert_eq!(entry.weight, expected.weight as f32);
        }
    }
}

#[test]
fn test_order_is_not_resorted_by_weight() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    data.insert(
        "a".to_string(),
        vec![
            RawEntry::new("low", 0.5),
            RawEntry::new("high", 10.0),
            RawEntry::new("mid", 3.0),
        ],
    );
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert_eq!(texts(&db, "a"), vec!["low", "high", "mid"]);
}

#[test]
fn test_lookup_misses() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_and_load(&dir.path().join("predict.db"), &sample_data());
    assert!(db.lookup("hell").is_none());
    assert!(db.lookup("helloo").is_none());
    assert!(db.lookup("").is_none());
    assert!(db.lookup("今").is_none());
}

#[test]
fn test_empty_candidate_list_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = sample_data();
    data.insert("empty".to_string(), Vec::new());
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert!(db.lookup("empty").is_none());
    assert!(db.lookup("hello").is_some());
}

#[test]
fn test_shared_texts_are_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    data.insert(
        "a".to_string(),
        vec![RawEntry::new("same", 1.0), RawEntry::new("x", 1.0)],
    );
    data.insert(
        "b".to_string(),
        vec![RawEntry::new("y", 1.0), RawEntry::new("same", 2.0)],
    );
    let db = build_and_load(&dir.path().join("predict.db"), &data);

    let from_a = db.lookup("a").unwrap().get(0).unwrap();
    let from_b = db.lookup("b").unwrap().get(1).unwrap();
    assert_eq!(from_a.text_id, from_b.text_id);
    assert_eq!(db.text_count(), 3);
    // Stored weights stay per-entry.
    assert_eq!(from_a.weight, 1.0);
    assert_eq!(from_b.weight, 2.0);
}

#[test]
fn test_lookup_works_right_after_build() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = PredictDb::new(dir.path().join("predict.db"));
    db.build(&sample_data()).unwrap();
    assert!(db.is_open());
    assert_eq!(texts(&db, "good"), vec!["morning", "night", "bye"]);
}

#[test]
fn test_save_requires_build() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = PredictDb::new(dir.path().join("predict.db"));
    assert!(matches!(db.save(), Err(DbError::NotBuilt)));
}

#[test]
fn test_save_shrinks_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    let mut db = PredictDb::new(&path);
    db.build(&sample_data()).unwrap();
    let before = std::fs::metadata(&path).unwrap().len();
    db.save().unwrap();
    let after = std::fs::metadata(&path).unwrap().len();
    assert!(after < before);
    // Still queryable after the remap.
    assert_eq!(texts(&db, "hello"), vec!["world", "there"]);
}

#[test]
fn test_large_candidate_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    let candidates: Vec<RawEntry> = (0..2000)
        .map(|i| RawEntry::new(format!("candidate-{i:05}-{}", "x".repeat(40)), i as f64))
        .collect();
    data.insert("k".to_string(), candidates);
    let db = build_and_load(&dir.path().join("predict.db"), &data);

    let found = db.lookup("k").unwrap();
    assert_eq!(found.len(), 2000);
    let last = found.get(1999).unwrap();
    assert!(db.entry_text(&last).starts_with("candidate-01999-"));
}

#[test]
fn test_empty_input_builds_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    data.insert("nothing".to_string(), Vec::new());
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert!(db.lookup("nothing").is_none());
    assert_eq!(db.text_count(), 0);
    assert_eq!(db.key_count(), 0);
}

#[test]
fn test_empty_key_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = sample_data();
    data.insert(String::new(), vec![RawEntry::new("orphan", 1.0)]);
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert!(db.lookup("").is_none());
    assert_eq!(db.key_count(), 4);
    assert_eq!(texts(&db, "hello"), vec!["world", "there"]);
}

#[test]
fn test_very_long_key() {
    let dir = tempfile::tempdir().unwrap();
    let long_key = "a".repeat(20_000);
    let mut data = RawData::new();
    data.insert(long_key.clone(), vec![RawEntry::new("end", 1.0)]);
    data.insert("a".to_string(), vec![RawEntry::new("b", 1.0)]);
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert_eq!(texts(&db, &long_key), vec!["end"]);
    assert_eq!(texts(&db, "a"), vec!["b"]);
    assert!(db.lookup(&long_key[..19_999]).is_none());
}

#[test]
fn test_metadata_written() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_and_load(&dir.path().join("predict.db"), &sample_data());
    let meta = db.metadata().unwrap();
    assert_eq!(meta.format, FORMAT);
    assert_ne!(meta.key_trie_offset, 0);
    assert_ne!(meta.string_table_offset, 0);
    assert!(meta.key_trie_size > 0);
    assert_eq!(db.key_count(), 4);
}

#[test]
fn test_checksum_depends_on_input() {
    let dir = tempfile::tempdir().unwrap();
    let a = build_and_load(&dir.path().join("a.db"), &sample_data());
    let b = build_and_load(&dir.path().join("b.db"), &sample_data());
    assert_eq!(
        a.metadata().unwrap().checksum,
        b.metadata().unwrap().checksum
    );

    let mut changed = sample_data();
    changed.get_mut("hello").unwrap()[0].weight = 6.0;
    let c = build_and_load(&dir.path().join("c.db"), &changed);
    assert_ne!(
        a.metadata().unwrap().checksum,
        c.metadata().unwrap().checksum
    );
}

#[test]
fn test_candidates_at_reresolves_span() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_and_load(&dir.path().join("predict.db"), &sample_data());
    let span = db.lookup("good").unwrap().span();
    let again = db.candidates_at(span).unwrap();
    assert_eq!(again.len(), 3);
    assert_eq!(db.entry_text(&again.get(2).unwrap()), "bye");
}

#[test]
fn test_weight_narrowed_to_f32() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = RawData::new();
    data.insert("k".to_string(), vec![RawEntry::new("v", 0.1)]);
    let db = build_and_load(&dir.path().join("predict.db"), &data);
    assert_eq!(db.lookup("k").unwrap().get(0).unwrap().weight, 0.1f32);
}

fn raw_data() -> impl Strategy<Value = RawData> {
    let key = prop_oneof![
        "[a-c]{1,4}",
        "(今|日|は|\\$){1,3}",
    ];
    // A small text alphabet so texts repeat across keys.
    let entry = ("[xyz]{1,2}|(明|天)", -1.0e6f64..1.0e6)
        .prop_map(|(text, weight)| RawEntry::new(text, weight));
    prop::collection::btree_map(key, prop::collection::vec(entry, 0..6), 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_build_load_lookup_roundtrip(data in raw_data()) {
        let dir = tempfile::tempdir().unwrap();
        let db = build_and_load(&dir.path().join("predict.db"), &data);

        let non_empty = data.values().filter(|c| !c.is_empty()).count();
        prop_assert_eq!(db.key_count(), non_empty);
        for (key, raw) in &data {
            if raw.is_empty() {
                prop_assert!(db.lookup(key).is_none());
                continue;
            }
            let candidates = db.lookup(key).unwrap();
            prop_assert_eq!(candidates.len(), raw.len());
            for (entry, expected) in candidates.iter().zip(raw) {
                prop_assert_eq!(db.entry_text(&entry), expected.text.as_str());
                prop_assert_eq!(entry.weight, expected.weight as f32);
            }
        }
        prop_assert!(db.lookup("not-a-key").is_none());
    }
}
