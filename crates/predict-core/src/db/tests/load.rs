use std::fs;

use super::*;

use crate::db::{DbError, FORMAT_MAX_LENGTH, METADATA_SIZE};

fn write_valid(path: &Path) {
    let mut db = PredictDb::new(path);
    db.build(&sample_data()).unwrap();
    db.save().unwrap();
}

fn patch(path: &Path, at: usize, bytes: &[u8]) {
    let mut data = fs::read(path).unwrap();
    data[at..at + bytes.len()].copy_from_slice(bytes);
    fs::write(path, data).unwrap();
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = PredictDb::new(dir.path().join("absent.db"));
    assert!(matches!(db.load(), Err(DbError::Open { .. })));
    assert!(!db.is_open());
}

#[test]
fn test_load_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    fs::write(&path, b"").unwrap();
    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::MetadataMissing)));
    assert!(!db.is_open());
}

#[test]
fn test_load_truncated_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.db");
    fs::write(&path, vec![0u8; METADATA_SIZE - 1]).unwrap();
    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::MetadataMissing)));
}

#[test]
fn test_load_rejects_foreign_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    let mut tag = [0u8; FORMAT_MAX_LENGTH];
    tag[..9].copy_from_slice(b"Rime::Tab");
    patch(&path, 0, &tag);

    let mut db = PredictDb::new(&path);
    match db.load() {
        Err(DbError::InvalidFormat(format)) => assert_eq!(format, "Rime::Tab"),
        other => panic!("expected InvalidFormat, got {other:?}"),
    }
    assert!(!db.is_open());
    assert!(db.lookup("hello").is_none());
}

#[test]
fn test_load_accepts_other_versions_of_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    let mut tag = [0u8; FORMAT_MAX_LENGTH];
    tag[..17].copy_from_slice(b"Rime::Predict/2.0");
    patch(&path, 0, &tag);

    let mut db = PredictDb::new(&path);
    db.load().unwrap();
    assert_eq!(texts(&db, "hello"), vec!["world", "there"]);
}

#[test]
fn test_uncommitted_header_never_validates() {
    // A build interrupted before the final tag write leaves zeros there.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    patch(&path, 0, &[0u8; FORMAT_MAX_LENGTH]);

    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::InvalidFormat(_))));
}

#[test]
fn test_load_missing_key_trie() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    patch(&path, FORMAT_MAX_LENGTH + 4, &0u32.to_le_bytes());

    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::MissingKeyTrie)));
}

#[test]
fn test_load_missing_string_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    patch(&path, FORMAT_MAX_LENGTH + 12, &0u32.to_le_bytes());

    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::MissingStringTable)));
}

#[test]
fn test_load_out_of_bounds_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    patch(&path, FORMAT_MAX_LENGTH + 12, &u32::MAX.to_le_bytes());

    let mut db = PredictDb::new(&path);
    assert!(matches!(db.load(), Err(DbError::OutOfBounds(_))));
}

#[test]
fn test_checksum_is_not_verified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);
    patch(&path, FORMAT_MAX_LENGTH, &0xdead_beefu32.to_le_bytes());

    let mut db = PredictDb::new(&path);
    db.load().unwrap();
    assert_eq!(db.metadata().unwrap().checksum, 0xdead_beef);
}

#[test]
fn test_reload_and_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    write_valid(&path);

    let mut db = PredictDb::new(&path);
    db.load().unwrap();
    db.load().unwrap();
    assert!(db.lookup("good").is_some());

    db.close();
    assert!(!db.is_open());
    assert!(db.lookup("good").is_none());
    assert!(db.metadata().is_none());
}

#[test]
fn test_failed_build_leaves_nothing_loadable() {
    let dir = tempfile::tempdir().unwrap();
    // A directory at the target path makes file creation fail.
    let path = dir.path().join("occupied");
    fs::create_dir(&path).unwrap();

    let mut db = PredictDb::new(&path);
    assert!(matches!(
        db.build(&sample_data()),
        Err(DbError::Create { .. })
    ));
    assert!(!db.is_open());
    assert!(matches!(db.save(), Err(DbError::NotBuilt)));
}
