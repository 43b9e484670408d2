//! Storage engine for next-word prediction.
//!
//! A `PredictDb` maps trigger strings to ranked candidate arrays inside one
//! memory-mappable file: a double-array trie indexes the keys and a string
//! table interns candidate texts.

pub mod db;
pub mod settings;
pub mod string_table;
pub mod trie;
