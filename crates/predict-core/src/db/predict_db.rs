use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, debug_span, error, info, warn};

use super::layout::{array_size, write_array, ARRAY_HEADER_SIZE};
use super::mapped_file::MappedFile;
use super::{
    CandidateEntry, CandidateSpan, Candidates, DbError, Metadata, RawData, CANDIDATE_ENTRY_SIZE,
    FORMAT, METADATA_SIZE,
};
use crate::string_table::{StringTable, StringTableBuilder};
use crate::trie::{KeyTrie, KeyTrieRef};

// Slack for the build-time size estimate; the arena grows if it is exceeded.
const RESERVED_SIZE: usize = 1024;
// Rough double-array cost per key byte, for the same estimate.
const TRIE_BYTES_PER_LABEL: usize = 24;

/// Byte ranges of the two images inside the file, validated at build or load.
#[derive(Debug, Clone)]
struct Layout {
    key_trie: Range<usize>,
    string_table: Range<usize>,
}

/// Prediction database backed by one memory-mapped file.
///
/// A write-side instance runs `build` then `save`; a read-side instance runs
/// `load`. Views returned by `lookup` borrow the mapping and end with it.
pub struct PredictDb {
    file: MappedFile,
    layout: Option<Layout>,
    /// Image size of the trie produced by the last successful `build`.
    built_trie_size: usize,
}

impl std::fmt::Debug for PredictDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictDb")
            .field("path", &self.file.path())
            .field("loaded", &self.layout.is_some())
            .finish()
    }
}

impl PredictDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: MappedFile::new(path.into()),
            layout: None,
            built_trie_size: 0,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// True once `load` or `build` has produced a queryable database.
    pub fn is_open(&self) -> bool {
        self.file.is_open() && self.layout.is_some()
    }

    pub fn close(&mut self) {
        self.file.close();
        self.layout = None;
        self.built_trie_size = 0;
    }

    /// Open the file read-only and validate its header.
    ///
    /// On failure the file is closed and the reason is logged.
    pub fn load(&mut self) -> Result<(), DbError> {
        info!(path = %self.path().display(), "loading predict db");
        match self.load_layout() {
            Ok(layout) => {
                self.layout = Some(layout);
                Ok(())
            }
            Err(e) => {
                error!(path = %self.path().display(), error = %e, "failed to load predict db");
                self.close();
                Err(e)
            }
        }
    }

    fn load_layout(&mut self) -> Result<Layout, DbError> {
        self.close();
        self.file
            .open_read_only()
            .map_err(|source| DbError::Open {
                path: self.path().to_path_buf(),
                source,
            })?;

        let bytes = self.file.bytes();
        let metadata = Metadata::read(bytes).ok_or(DbError::MetadataMissing)?;
        if !metadata.has_valid_format() {
            return Err(DbError::InvalidFormat(metadata.format));
        }

        if metadata.key_trie_offset == 0 {
            return Err(DbError::MissingKeyTrie);
        }
        debug!(size = metadata.key_trie_size, "found key trie image");
        let key_trie = checked_range(
            bytes,
            metadata.key_trie_offset,
            metadata.key_trie_size as usize,
            "key trie image",
        )?;
        KeyTrieRef::from_bytes(&bytes[key_trie.clone()])?;

        if metadata.string_table_offset == 0 {
            return Err(DbError::MissingStringTable);
        }
        debug!(size = metadata.string_table_size, "found string table");
        let string_table = checked_range(
            bytes,
            metadata.string_table_offset,
            metadata.string_table_size as usize,
            "string table image",
        )?;
        StringTable::from_bytes(&bytes[string_table.clone()])?;

        Ok(Layout {
            key_trie,
            string_table,
        })
    }

    /// Shrink the file to its used size. Requires a preceding `build`.
    pub fn save(&mut self) -> Result<(), DbError> {
        info!(path = %self.path().display(), "saving predict db");
        if self.built_trie_size == 0 {
            error!(path = %self.path().display(), "the trie has not been constructed");
            return Err(DbError::NotBuilt);
        }
        self.file.shrink_to_fit().map_err(|e| {
            error!(path = %self.path().display(), error = %e, "failed to shrink predict db");
            DbError::Io(e)
        })
    }

    /// Write a complete database for `data`, replacing the file contents.
    ///
    /// Keys with no candidates, and the empty key, are skipped. Candidate
    /// order within a key is kept as given. On failure the file is closed
    /// without a format tag, so it never validates on `load`.
    pub fn build(&mut self, data: &RawData) -> Result<(), DbError> {
        let _span = debug_span!("build", path = %self.path().display()).entered();
        info!(path = %self.path().display(), keys = data.len(), "building predict db");
        match self.build_layout(data) {
            Ok(layout) => {
                self.layout = Some(layout);
                Ok(())
            }
            Err(e) => {
                error!(path = %self.path().display(), error = %e, "failed to build predict db");
                self.close();
                Err(e)
            }
        }
    }

    fn build_layout(&mut self, data: &RawData) -> Result<Layout, DbError> {
        self.close();

        // Intern every candidate text, keeping each key's run contiguous.
        let mut strings = StringTableBuilder::new();
        let mut entries: Vec<CandidateEntry> = Vec::new();
        let mut runs: Vec<(&str, Range<usize>)> = Vec::with_capacity(data.len());
        let mut checksum = crc32fast::Hasher::new();
        for (key, candidates) in data {
            if candidates.is_empty() {
                continue;
            }
            if key.is_empty() {
                warn!(candidates = candidates.len(), "skipping candidates of the empty key");
                continue;
            }
            checksum.update(key.as_bytes());
            let start = entries.len();
            for candidate in candidates {
                let text_id = strings.add(&candidate.text, candidate.weight)?;
                checksum.update(candidate.text.as_bytes());
                checksum.update(&candidate.weight.to_le_bytes());
                entries.push(CandidateEntry {
                    text_id,
                    weight: candidate.weight as f32,
                });
            }
            runs.push((key.as_str(), start..entries.len()));
        }
        strings.build();
        let string_table_size = strings.binary_size();

        let key_bytes: usize = runs.iter().map(|(k, _)| k.len()).sum();
        let estimated_size = RESERVED_SIZE
            + METADATA_SIZE
            + runs.len() * ARRAY_HEADER_SIZE
            + entries.len() * CANDIDATE_ENTRY_SIZE
            + (key_bytes + runs.len() + 1) * TRIE_BYTES_PER_LABEL
            + string_table_size;
        self.file
            .create(estimated_size)
            .map_err(|source| DbError::Create {
                path: self.path().to_path_buf(),
                source,
            })?;

        let metadata_offset = self.allocate(METADATA_SIZE, "metadata")?;
        debug_assert_eq!(metadata_offset, 0);

        let mut keys: Vec<&[u8]> = Vec::with_capacity(runs.len());
        let mut offsets: Vec<u32> = Vec::with_capacity(runs.len());
        for (key, run) in &runs {
            let run = &entries[run.clone()];
            let size = array_size(run.len());
            let offset = self.allocate(size, "candidate array")?;
            write_array(self.file.slice_mut(offset, size)?, run);
            keys.push(key.as_bytes());
            offsets.push(to_u32(offset)?);
        }

        let trie = KeyTrie::build(&keys, &offsets)?;
        let trie_size = trie.total_size();
        let trie_offset = self.allocate(trie_size, "key trie image")?;
        trie.write_image(self.file.slice_mut(trie_offset, trie_size)?);

        let table_offset = self.allocate(string_table_size, "string table image")?;
        strings.dump(self.file.slice_mut(table_offset, string_table_size)?)?;

        let metadata = Metadata {
            format: FORMAT.to_string(),
            checksum: checksum.finalize(),
            key_trie_offset: to_u32(trie_offset)?,
            key_trie_size: to_u32(trie_size)?,
            string_table_offset: to_u32(table_offset)?,
            string_table_size: to_u32(string_table_size)?,
        };
        let header = self.file.slice_mut(0, METADATA_SIZE)?;
        metadata.write_body(header);
        // The format tag commits the header.
        metadata.write_format(header);

        self.built_trie_size = trie_size;
        info!(
            keys = runs.len(),
            entries = entries.len(),
            strings = strings.len(),
            used = self.file.used(),
            "built predict db"
        );
        Ok(Layout {
            key_trie: trie_offset..trie_offset + trie_size,
            string_table: table_offset..table_offset + string_table_size,
        })
    }

    fn allocate(&mut self, len: usize, what: &'static str) -> Result<usize, DbError> {
        let offset = self
            .file
            .allocate(len)
            .map_err(|source| DbError::Allocate { what, source })?;
        to_u32(offset + len)?;
        Ok(offset)
    }

    /// Header of the open database.
    pub fn metadata(&self) -> Option<Metadata> {
        self.layout.as_ref()?;
        Metadata::read(self.file.bytes())
    }

    /// Exact-match lookup. `None` when the key is absent or nothing is open.
    pub fn lookup(&self, query: &str) -> Option<Candidates<'_>> {
        let offset = self.key_trie()?.exact_match(query.as_bytes())?;
        let candidates = Candidates::read(self.file.bytes(), offset);
        if candidates.is_none() {
            warn!(query, offset, "candidate array lies outside the file");
        }
        candidates
    }

    /// Re-resolve a span obtained from an earlier `lookup` on this database.
    pub fn candidates_at(&self, span: CandidateSpan) -> Option<Candidates<'_>> {
        self.layout.as_ref()?;
        Candidates::read(self.file.bytes(), span.offset).filter(|c| c.span() == span)
    }

    /// Text of a candidate. Empty (and logged) if the id is unknown.
    pub fn entry_text(&self, entry: &CandidateEntry) -> &str {
        match self.string_table().and_then(|t| t.get_text(entry.text_id)) {
            Some(text) => text,
            None => {
                warn!(text_id = entry.text_id, "text id not found in string table");
                ""
            }
        }
    }

    /// Number of keys with candidates.
    pub fn key_count(&self) -> usize {
        self.key_trie().map_or(0, |t| t.len())
    }

    /// Number of distinct candidate texts.
    pub fn text_count(&self) -> usize {
        self.string_table().map_or(0, |t| t.len())
    }

    fn key_trie(&self) -> Option<KeyTrieRef<'_>> {
        let layout = self.layout.as_ref()?;
        KeyTrieRef::from_bytes(self.file.bytes().get(layout.key_trie.clone())?).ok()
    }

    fn string_table(&self) -> Option<StringTable<'_>> {
        let layout = self.layout.as_ref()?;
        StringTable::from_bytes(self.file.bytes().get(layout.string_table.clone())?).ok()
    }
}

fn checked_range(
    bytes: &[u8],
    offset: u32,
    len: usize,
    what: &'static str,
) -> Result<Range<usize>, DbError> {
    let start = offset as usize;
    let end = start.checked_add(len).ok_or(DbError::OutOfBounds(what))?;
    if end > bytes.len() {
        return Err(DbError::OutOfBounds(what));
    }
    Ok(start..end)
}

fn to_u32(value: usize) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::TooLarge)
}
