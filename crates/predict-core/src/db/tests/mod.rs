mod build;
mod load;

use std::path::Path;

use super::{PredictDb, RawData, RawEntry};

pub(super) fn sample_data() -> RawData {
    let mut data = RawData::new();
    data.insert(
        "hello".to_string(),
        vec![RawEntry::new("world", 5.0), RawEntry::new("there", 2.0)],
    );
    data.insert(
        "good".to_string(),
        vec![
            RawEntry::new("morning", 9.0),
            RawEntry::new("night", 7.5),
            RawEntry::new("bye", 1.25),
        ],
    );
    data.insert("$".to_string(), vec![RawEntry::new("hello", 3.0)]);
    data.insert("今日".to_string(), vec![RawEntry::new("は", 4.0)]);
    data
}

/// Build + save at `path`, then return a freshly loaded read-side instance.
pub(super) fn build_and_load(path: &Path, data: &RawData) -> PredictDb {
    let mut writer = PredictDb::new(path);
    writer.build(data).unwrap();
    writer.save().unwrap();
    drop(writer);

    let mut reader = PredictDb::new(path);
    reader.load().unwrap();
    reader
}

pub(super) fn texts(db: &PredictDb, query: &str) -> Vec<String> {
    let candidates = db.lookup(query).unwrap();
    candidates
        .iter()
        .map(|e| db.entry_text(&e).to_string())
        .collect()
}
