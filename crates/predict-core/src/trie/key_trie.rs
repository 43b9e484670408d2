use lexime_trie::{DoubleArray, DoubleArrayRef, TrieSearch};

use super::TrieError;

// Image layout, every field little-endian:
//   u32            value count N
//   N × u32        value of each trie value id
//   ...            double array image (4-byte aligned)
const SLOT_SIZE: usize = 4;

/// Value ids are 31 bits wide in the double array.
const MAX_KEYS: usize = 0x7FFF_FFFF;

/// Owned key trie produced by `build`.
#[derive(Debug, Clone)]
pub struct KeyTrie {
    trie: DoubleArray<u8>,
    trie_image: Vec<u8>,
    /// Caller value per trie value id.
    values: Vec<u32>,
}

impl KeyTrie {
    /// Build a trie mapping each key to the value at the same index.
    ///
    /// Keys may come in any order but must be non-empty and distinct.
    pub fn build(keys: &[&[u8]], values: &[u32]) -> Result<Self, TrieError> {
        if keys.len() != values.len() {
            return Err(TrieError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        if keys.len() > MAX_KEYS {
            return Err(TrieError::TooManyKeys(keys.len()));
        }
        if let Some(index) = keys.iter().position(|k| k.is_empty()) {
            return Err(TrieError::EmptyKey(index));
        }

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(keys[b]));
        for pair in order.windows(2) {
            if keys[pair[0]] == keys[pair[1]] {
                return Err(TrieError::DuplicateKey(pair[0].max(pair[1])));
            }
        }

        let sorted: Vec<&[u8]> = order.iter().map(|&i| keys[i]).collect();
        let trie = DoubleArray::<u8>::build(&sorted);
        let trie_image = trie.as_bytes();
        Ok(Self {
            trie,
            trie_image,
            values: order.iter().map(|&i| values[i]).collect(),
        })
    }

    pub fn exact_match(&self, key: &[u8]) -> Option<u32> {
        let id = self.trie.exact_match(key)?;
        self.values.get(id as usize).copied()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of node slots in the double array.
    pub fn array_len(&self) -> usize {
        self.trie.node_slot_count()
    }

    /// Size in bytes of the serialized image.
    pub fn total_size(&self) -> usize {
        SLOT_SIZE * (1 + self.values.len()) + self.trie_image.len()
    }

    /// Write the image into `dst`, which must be exactly `total_size()` bytes.
    pub fn write_image(&self, dst: &mut [u8]) {
        debug_assert_eq!(dst.len(), self.total_size());
        let (table, trie) = dst.split_at_mut(SLOT_SIZE * (1 + self.values.len()));
        let count = self.values.len() as u32;
        let slots = std::iter::once(&count).chain(&self.values);
        for (value, slot) in slots.zip(table.chunks_exact_mut(SLOT_SIZE)) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        trie.copy_from_slice(&self.trie_image);
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.total_size()];
        self.write_image(&mut buf);
        buf
    }
}

/// Zero-copy view over a serialized key trie.
#[derive(Debug, Clone)]
pub struct KeyTrieRef<'a> {
    trie: DoubleArrayRef<'a, u8>,
    values: &'a [u8],
}

impl<'a> KeyTrieRef<'a> {
    /// `bytes` must start on a 4-byte boundary, as regions of a mapped file
    /// allocated at 4-byte offsets do.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, TrieError> {
        let truncated = || TrieError::TruncatedData(bytes.len());
        let count = bytes.get(..SLOT_SIZE).map(read_u32).ok_or_else(truncated)? as usize;
        let table_end = count
            .checked_add(1)
            .and_then(|slots| slots.checked_mul(SLOT_SIZE))
            .filter(|&end| end <= bytes.len())
            .ok_or_else(truncated)?;
        let trie = DoubleArrayRef::<u8>::from_bytes(&bytes[table_end..])?;
        Ok(Self {
            trie,
            values: &bytes[SLOT_SIZE..table_end],
        })
    }

    pub fn exact_match(&self, key: &[u8]) -> Option<u32> {
        let start = (self.trie.exact_match(key)? as usize).checked_mul(SLOT_SIZE)?;
        self.values.get(start..start + SLOT_SIZE).map(read_u32)
    }

    pub fn len(&self) -> usize {
        self.values.len() / SLOT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn array_len(&self) -> usize {
        self.trie.node_slot_count()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
