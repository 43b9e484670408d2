use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use predict_core::db::{DbError, PredictDb, RawData};
use tracing::{error, info};

use crate::data_source;

/// Build a database at `output` by way of `OUTPUT.tmp`, so a failed build
/// never replaces an existing file. Returns the final file size.
pub fn build_file(data: &RawData, output: &Path) -> Result<u64, DbError> {
    let mut tmp = output.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut db = PredictDb::new(&tmp);
    info!(path = %output.display(), "creating predict db");
    let built = db.build(data).and_then(|()| db.save());
    drop(db);
    if let Err(e) = built {
        error!(path = %output.display(), error = %e, "failed to create predict db");
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, output)?;
    info!(path = %output.display(), "created predict db");
    Ok(fs::metadata(output)?.len())
}

pub fn build(input: Option<&str>, output: &str) {
    let text = match input {
        Some(file) => die!(fs::read_to_string(file), "Error reading {file}: {}"),
        None => {
            let mut buf = String::new();
            die!(
                io::stdin().read_to_string(&mut buf),
                "Error reading stdin: {}"
            );
            buf
        }
    };
    let data = die!(data_source::parse_triples(&text), "Error parsing input: {}");

    let key_count = data.len();
    let entry_count: usize = data.values().map(|v| v.len()).sum();
    eprintln!("Building predict db from {key_count} keys ({entry_count} entries)...");

    let size = die!(
        build_file(&data, Path::new(output)),
        "Error building predict db: {}"
    );
    eprintln!("Wrote {output} ({:.1} KB)", size as f64 / 1024.0);
}
