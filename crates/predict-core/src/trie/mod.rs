//! Exact-match key trie.
//!
//! Keys are stored in a `lexime_trie` double array, which numbers them by
//! sorted position. A value table indexed by that number maps each key back
//! to the value it was built with. `KeyTrie` owns both at build time;
//! `KeyTrieRef` reads the serialized image in place (e.g. a region of a
//! mapped file).

mod key_trie;

pub use key_trie::{KeyTrie, KeyTrieRef};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("empty key at index {0}")]
    EmptyKey(usize),

    #[error("duplicate key at index {0}")]
    DuplicateKey(usize),

    #[error("key count ({keys}) does not match value count ({values})")]
    LengthMismatch { keys: usize, values: usize },

    #[error("too many keys ({0})")]
    TooManyKeys(usize),

    #[error("trie image truncated ({0} bytes)")]
    TruncatedData(usize),

    #[error("invalid double array image: {0}")]
    Image(#[from] lexime_trie::TrieError),
}
