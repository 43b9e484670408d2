//! On-disk structures. Every integer is little-endian; every reference is a
//! `u32` offset from the start of the file, with 0 meaning "absent".

/// Format tag written by this version.
pub const FORMAT: &str = "Rime::Predict/1.0";
/// Any tag with this prefix is accepted on load.
pub const FORMAT_PREFIX: &str = "Rime::Predict/";
/// Fixed width of the null-padded format field.
pub const FORMAT_MAX_LENGTH: usize = 32;

// format | checksum | key_trie offset | key_trie bytes | string_table offset | string_table bytes
pub const METADATA_SIZE: usize = FORMAT_MAX_LENGTH + 4 * 5;

const CHECKSUM_AT: usize = FORMAT_MAX_LENGTH;
const KEY_TRIE_AT: usize = CHECKSUM_AT + 4;
const KEY_TRIE_SIZE_AT: usize = KEY_TRIE_AT + 4;
const STRING_TABLE_AT: usize = KEY_TRIE_SIZE_AT + 4;
const STRING_TABLE_SIZE_AT: usize = STRING_TABLE_AT + 4;

/// `text_id: u32` + `weight: f32`.
pub const CANDIDATE_ENTRY_SIZE: usize = 8;
/// Candidate arrays start with a `u32` count.
pub(super) const ARRAY_HEADER_SIZE: usize = 4;

/// File header, as read from or written to offset 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub format: String,
    /// CRC-32 of the build input. Written at build time, not verified on load.
    pub checksum: u32,
    pub key_trie_offset: u32,
    /// Length of the key trie image in bytes.
    pub key_trie_size: u32,
    pub string_table_offset: u32,
    /// Length of the string table image in bytes.
    pub string_table_size: u32,
}

impl Metadata {
    pub fn read(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..METADATA_SIZE)?;
        let format_field = &header[..FORMAT_MAX_LENGTH];
        let end = format_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FORMAT_MAX_LENGTH);
        let format = String::from_utf8_lossy(&format_field[..end]).into_owned();
        Some(Self {
            format,
            checksum: read_u32(header, CHECKSUM_AT),
            key_trie_offset: read_u32(header, KEY_TRIE_AT),
            key_trie_size: read_u32(header, KEY_TRIE_SIZE_AT),
            string_table_offset: read_u32(header, STRING_TABLE_AT),
            string_table_size: read_u32(header, STRING_TABLE_SIZE_AT),
        })
    }

    /// Write every field except the format tag.
    pub(super) fn write_body(&self, header: &mut [u8]) {
        write_u32(header, CHECKSUM_AT, self.checksum);
        write_u32(header, KEY_TRIE_AT, self.key_trie_offset);
        write_u32(header, KEY_TRIE_SIZE_AT, self.key_trie_size);
        write_u32(header, STRING_TABLE_AT, self.string_table_offset);
        write_u32(header, STRING_TABLE_SIZE_AT, self.string_table_size);
    }

    /// Write the format tag. Done last: a header without it never validates.
    pub(super) fn write_format(&self, header: &mut [u8]) {
        let field = &mut header[..FORMAT_MAX_LENGTH];
        field.fill(0);
        let tag = self.format.as_bytes();
        let len = tag.len().min(FORMAT_MAX_LENGTH - 1);
        field[..len].copy_from_slice(&tag[..len]);
    }

    pub fn has_valid_format(&self) -> bool {
        self.format.starts_with(FORMAT_PREFIX)
    }
}

/// One stored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEntry {
    pub text_id: u32,
    pub weight: f32,
}

impl CandidateEntry {
    pub(super) fn read(bytes: &[u8]) -> Self {
        Self {
            text_id: read_u32(bytes, 0),
            weight: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub(super) fn write(&self, bytes: &mut [u8]) {
        write_u32(bytes, 0, self.text_id);
        bytes[4..8].copy_from_slice(&self.weight.to_le_bytes());
    }
}

/// Location of a candidate array: file offset plus entry count.
///
/// A span stays meaningful for as long as the database that produced it is
/// open; resolve it again with `PredictDb::candidates_at` on each use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateSpan {
    pub offset: u32,
    pub len: u32,
}

/// Zero-copy view over one candidate array in the mapped file.
#[derive(Debug, Clone, Copy)]
pub struct Candidates<'a> {
    span: CandidateSpan,
    entries: &'a [u8],
}

impl<'a> Candidates<'a> {
    /// Read the array at `offset` from `bytes`, if it fits.
    pub(super) fn read(bytes: &'a [u8], offset: u32) -> Option<Self> {
        let start = offset as usize;
        let header = bytes.get(start..start.checked_add(ARRAY_HEADER_SIZE)?)?;
        let len = read_u32(header, 0);
        let entries_start = start + ARRAY_HEADER_SIZE;
        let entries_end =
            entries_start.checked_add((len as usize).checked_mul(CANDIDATE_ENTRY_SIZE)?)?;
        let entries = bytes.get(entries_start..entries_end)?;
        Some(Self {
            span: CandidateSpan { offset, len },
            entries,
        })
    }

    pub fn span(&self) -> CandidateSpan {
        self.span
    }

    pub fn len(&self) -> usize {
        self.span.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.span.len == 0
    }

    pub fn get(&self, index: usize) -> Option<CandidateEntry> {
        let start = index.checked_mul(CANDIDATE_ENTRY_SIZE)?;
        self.entries
            .get(start..start + CANDIDATE_ENTRY_SIZE)
            .map(CandidateEntry::read)
    }

    /// Entries in stored (build insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = CandidateEntry> + 'a {
        self.entries
            .chunks_exact(CANDIDATE_ENTRY_SIZE)
            .map(CandidateEntry::read)
    }
}

/// Bytes needed for a candidate array of `count` entries.
pub(super) fn array_size(count: usize) -> usize {
    ARRAY_HEADER_SIZE + count * CANDIDATE_ENTRY_SIZE
}

/// Serialize `{count, entries[count]}` into `dst` of exactly `array_size(entries.len())` bytes.
pub(super) fn write_array(dst: &mut [u8], entries: &[CandidateEntry]) {
    write_u32(dst, 0, entries.len() as u32);
    for (entry, chunk) in entries
        .iter()
        .zip(dst[ARRAY_HEADER_SIZE..].chunks_exact_mut(CANDIDATE_ENTRY_SIZE))
    {
        entry.write(chunk);
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
