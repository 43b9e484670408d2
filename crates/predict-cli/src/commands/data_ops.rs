use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use tracing::info;

use crate::data_source::{write_triples, NgramTable};

pub fn make_data(files: &[String], filter_weight: Option<u32>, max_candidates: Option<usize>) {
    let mut table = NgramTable::new(filter_weight);
    for file in files {
        info!(file = %file, "reading n-gram file");
        let f = die!(File::open(file), "Error opening {file}: {}");
        die!(
            table.read(BufReader::new(f)),
            "Error reading {file}: {}"
        );
    }
    let data = table.finish(max_candidates);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    die!(write_triples(&mut out, &data), "Error writing output: {}");
    die!(out.flush(), "Error writing output: {}");
}
