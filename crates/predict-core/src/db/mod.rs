//! Memory-mapped prediction database.
//!
//! `PredictDb` builds, saves, loads and queries one flat file: a metadata
//! header at offset 0 followed by an arena of per-key candidate arrays, the
//! key trie image and the string table image. All cross-references inside
//! the file are offsets from the start of the file.

mod layout;
mod mapped_file;
mod predict_db;
#[cfg(test)]
mod tests;

pub use layout::{
    CandidateEntry, CandidateSpan, Candidates, Metadata, CANDIDATE_ENTRY_SIZE, FORMAT,
    FORMAT_MAX_LENGTH, FORMAT_PREFIX, METADATA_SIZE,
};
pub use predict_db::PredictDb;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use crate::string_table::StringTableError;
use crate::trie::TrieError;

/// One build-input candidate for a key.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub text: String,
    pub weight: f64,
}

impl RawEntry {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

/// Build input: trigger key → candidates in insertion order.
pub type RawData = BTreeMap<String, Vec<RawEntry>>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("error creating predict db file '{path}': {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("error opening predict db '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("error allocating {what} in predict db: {source}")]
    Allocate {
        what: &'static str,
        source: io::Error,
    },

    #[error("predict db exceeds the u32 offset range")]
    TooLarge,

    #[error("double-array trie: {0}")]
    Trie(#[from] TrieError),

    #[error("string table: {0}")]
    StringTable(#[from] StringTableError),

    #[error("the trie has not been constructed")]
    NotBuilt,

    #[error("metadata not found")]
    MetadataMissing,

    #[error("invalid metadata (format {0:?})")]
    InvalidFormat(String),

    #[error("double array image not found")]
    MissingKeyTrie,

    #[error("string table not found")]
    MissingStringTable,

    #[error("{0} lies outside the file")]
    OutOfBounds(&'static str),
}
