use std::fs;
use std::path::Path;

use predict_core::db::PredictDb;

fn open_db(db_file: &str) -> PredictDb {
    let mut db = PredictDb::new(Path::new(db_file));
    die!(db.load(), "Error opening predict db: {}");
    db
}

pub fn lookup(db_file: &str, query: &str) {
    let db = open_db(db_file);
    let Some(candidates) = db.lookup(query) else {
        println!("{query}: not found");
        return;
    };
    println!("{query}: {} candidates", candidates.len());
    for entry in candidates.iter() {
        println!("  {}\tweight={}", db.entry_text(&entry), entry.weight);
    }
}

pub fn info(db_file: &str) {
    let db = open_db(db_file);
    let Some(meta) = db.metadata() else {
        eprintln!("Error: {db_file} has no metadata");
        std::process::exit(1);
    };
    let file_size = fs::metadata(db_file).map(|m| m.len()).unwrap_or(0);

    println!("Predict db:   {db_file}");
    println!("Format:       {}", meta.format);
    println!("File size:    {:.1} KB", file_size as f64 / 1024.0);
    println!("Checksum:     {:08x}", meta.checksum);
    println!(
        "Key trie:     {} keys ({} bytes) at {}",
        db.key_count(),
        meta.key_trie_size,
        meta.key_trie_offset
    );
    println!(
        "String table: {} bytes at {}",
        meta.string_table_size, meta.string_table_offset
    );
    println!("Texts:        {}", db.text_count());

    let sample_keys = ["$", "的", "我"];
    println!();
    println!("Sample lookups:");
    for key in &sample_keys {
        match db.lookup(key) {
            Some(candidates) => {
                let texts: Vec<&str> = candidates
                    .iter()
                    .take(5)
                    .map(|e| db.entry_text(&e))
                    .collect();
                println!("  {key} → {}", texts.join(", "));
            }
            None => println!("  {key} → (not found)"),
        }
    }
}
