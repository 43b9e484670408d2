mod ngram;

use std::io;

use predict_core::db::{RawData, RawEntry};
use tracing::debug;

pub use ngram::{write_triples, NgramTable, PredictionPairs};

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Parse build input: whitespace-separated `key text weight` triples, read
/// until the input runs out of keys.
///
/// Each candidate is appended to its key's list in input order.
pub fn parse_triples(input: &str) -> Result<RawData, DataSourceError> {
    let mut data = RawData::new();
    let mut count = 0usize;
    let mut tokens = input
        .lines()
        .enumerate()
        .flat_map(|(index, line)| line.split_whitespace().map(move |t| (index + 1, t)));
    while let Some((line, key)) = tokens.next() {
        let (_, text) = tokens.next().ok_or_else(|| DataSourceError::Parse {
            line,
            reason: format!("missing text for key '{key}'"),
        })?;
        let (_, weight) = tokens.next().ok_or_else(|| DataSourceError::Parse {
            line,
            reason: format!("missing weight for '{key} {text}'"),
        })?;
        let weight: f64 = weight.parse().map_err(|_| DataSourceError::Parse {
            line,
            reason: format!("invalid weight '{weight}'"),
        })?;
        data.entry(key.to_string())
            .or_default()
            .push(RawEntry::new(text, weight));
        count += 1;
    }
    debug!(keys = data.len(), entries = count, "parsed build input");
    Ok(data)
}
