//! Deduplicated candidate texts addressed by dense `u32` ids.
//!
//! Binary image (little-endian):
//! ```text
//! [count: u32][data_len: u32]
//! [records: (offset: u32, len: u32, weight: f32) x count]
//! [data: u8 x data_len]                       // concatenated UTF-8
//! ```
//! Ids are only meaningful within the image they were built into.

use std::collections::HashMap;

use tracing::warn;

const HEADER_SIZE: usize = 8;
const RECORD_SIZE: usize = 12;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StringTableError {
    #[error("string table is already built; no further additions")]
    Sealed,

    #[error("string table has not been built")]
    NotBuilt,

    #[error("string table exceeds u32 range")]
    TooLarge,

    #[error("dump buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("string table image truncated: {0}")]
    Truncated(&'static str),
}

struct Record {
    offset: u32,
    len: u32,
    weight: f64,
}

/// Write side: interns texts, then dumps a binary image.
#[derive(Default)]
pub struct StringTableBuilder {
    data: Vec<u8>,
    records: Vec<Record>,
    index: HashMap<String, u32>,
    built: bool,
}

impl StringTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning its id. A repeated text keeps its first id
    /// and the larger of the recorded weights.
    pub fn add(&mut self, text: &str, weight: f64) -> Result<u32, StringTableError> {
        if self.built {
            return Err(StringTableError::Sealed);
        }
        if let Some(&id) = self.index.get(text) {
            let record = &mut self.records[id as usize];
            if weight > record.weight {
                record.weight = weight;
            }
            return Ok(id);
        }

        let id = u32::try_from(self.records.len()).map_err(|_| StringTableError::TooLarge)?;
        let offset = u32::try_from(self.data.len()).map_err(|_| StringTableError::TooLarge)?;
        let len = u32::try_from(text.len()).map_err(|_| StringTableError::TooLarge)?;
        offset.checked_add(len).ok_or(StringTableError::TooLarge)?;

        self.data.extend_from_slice(text.as_bytes());
        self.records.push(Record {
            offset,
            len,
            weight,
        });
        self.index.insert(text.to_string(), id);
        Ok(id)
    }

    /// Seal the table. After this only `binary_size` and `dump` are useful.
    pub fn build(&mut self) {
        self.built = true;
        self.index = HashMap::new();
    }

    /// Number of distinct texts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn binary_size(&self) -> usize {
        HEADER_SIZE + self.records.len() * RECORD_SIZE + self.data.len()
    }

    /// Write the image into caller-provided storage of exactly `binary_size()` bytes.
    pub fn dump(&self, dst: &mut [u8]) -> Result<(), StringTableError> {
        if !self.built {
            return Err(StringTableError::NotBuilt);
        }
        let expected = self.binary_size();
        if dst.len() != expected {
            return Err(StringTableError::BufferSize {
                expected,
                actual: dst.len(),
            });
        }

        dst[0..4].copy_from_slice(&(self.records.len() as u32).to_le_bytes());
        dst[4..8].copy_from_slice(&(self.data.len() as u32).to_le_bytes());
        let mut pos = HEADER_SIZE;
        for record in &self.records {
            dst[pos..pos + 4].copy_from_slice(&record.offset.to_le_bytes());
            dst[pos + 4..pos + 8].copy_from_slice(&record.len.to_le_bytes());
            dst[pos + 8..pos + 12].copy_from_slice(&(record.weight as f32).to_le_bytes());
            pos += RECORD_SIZE;
        }
        dst[pos..].copy_from_slice(&self.data);
        Ok(())
    }
}

/// Read side: a zero-copy view over a dumped image.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    records: &'a [u8],
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, StringTableError> {
        if bytes.len() < HEADER_SIZE {
            return Err(StringTableError::Truncated("header"));
        }
        let count = read_u32(bytes, 0) as usize;
        let data_len = read_u32(bytes, 4) as usize;

        let records_end = count
            .checked_mul(RECORD_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or(StringTableError::Truncated("records"))?;
        if bytes.len() < records_end {
            return Err(StringTableError::Truncated("records"));
        }
        let data_end = records_end
            .checked_add(data_len)
            .ok_or(StringTableError::Truncated("data"))?;
        if bytes.len() < data_end {
            return Err(StringTableError::Truncated("data"));
        }

        Ok(Self {
            records: &bytes[HEADER_SIZE..records_end],
            data: &bytes[records_end..data_end],
        })
    }

    pub fn len(&self) -> usize {
        self.records.len() / RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Text for `id`, or `None` if the id is out of range or the record is corrupt.
    pub fn get_text(&self, id: u32) -> Option<&'a str> {
        let record = self.record(id)?;
        let offset = read_u32(record, 0) as usize;
        let len = read_u32(record, 4) as usize;
        let bytes = self.data.get(offset..offset.checked_add(len)?)?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(id, error = %e, "string table entry is not valid UTF-8");
                None
            }
        }
    }

    /// Build-time weight recorded for `id`.
    pub fn weight(&self, id: u32) -> Option<f32> {
        let record = self.record(id)?;
        Some(f32::from_le_bytes([
            record[8], record[9], record[10], record[11],
        ]))
    }

    fn record(&self, id: u32) -> Option<&'a [u8]> {
        let start = (id as usize).checked_mul(RECORD_SIZE)?;
        self.records.get(start..start + RECORD_SIZE)
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
