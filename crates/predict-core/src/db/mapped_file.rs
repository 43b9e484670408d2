use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::{debug, warn};

/// Allocation granularity inside the arena.
const ALIGN: usize = 4;

enum Mapping {
    Closed,
    /// Read-only open of a zero-length file (cannot be mapped).
    Empty,
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

/// A file used as a bump-allocated byte arena.
///
/// Write mode (`create`) hands out offsets with `allocate`, growing the file
/// when needed; `shrink_to_fit` trims it to the bytes actually used. Read
/// mode (`open_read_only`) exposes the whole file as an immutable slice.
/// Callers hold offsets, never addresses, so growth may remap freely.
pub(super) struct MappedFile {
    path: PathBuf,
    file: Option<File>,
    map: Mapping,
    used: usize,
}

impl MappedFile {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            map: Mapping::Closed,
            used: 0,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    pub(super) fn is_open(&self) -> bool {
        !matches!(self.map, Mapping::Closed)
    }

    /// Create (or truncate) the file with `capacity` zeroed bytes, mapped read-write.
    pub(super) fn create(&mut self, capacity: usize) -> io::Result<()> {
        self.close();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.set_len(capacity as u64)?;
        // SAFETY: The file was just created by us and is only accessed
        // through this mapping until it is closed.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        self.file = Some(file);
        self.map = Mapping::ReadWrite(mmap);
        self.used = 0;
        Ok(())
    }

    pub(super) fn open_read_only(&mut self) -> io::Result<()> {
        self.close();
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len() as usize;
        self.map = if len == 0 {
            Mapping::Empty
        } else {
            // SAFETY: The file is opened read-only and the mapping is immutable.
            // The database file must not be modified while it is loaded.
            Mapping::ReadOnly(unsafe { Mmap::map(&file)? })
        };
        self.file = Some(file);
        self.used = len;
        Ok(())
    }

    pub(super) fn close(&mut self) {
        if let Mapping::ReadWrite(ref mmap) = self.map {
            if let Err(e) = mmap.flush() {
                warn!(path = %self.path.display(), error = %e, "flush on close failed");
            }
        }
        self.map = Mapping::Closed;
        self.file = None;
        self.used = 0;
    }

    pub(super) fn bytes(&self) -> &[u8] {
        match &self.map {
            Mapping::Closed | Mapping::Empty => &[],
            Mapping::ReadOnly(m) => m,
            Mapping::ReadWrite(m) => m,
        }
    }

    /// Mutable view of `offset..offset + len`. Write mode only.
    pub(super) fn slice_mut(&mut self, offset: usize, len: usize) -> io::Result<&mut [u8]> {
        let Mapping::ReadWrite(ref mut mmap) = self.map else {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is not open for writing",
            ));
        };
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= mmap.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "slice out of bounds"))?;
        Ok(&mut mmap[offset..end])
    }

    /// Reserve `len` bytes and return their offset.
    pub(super) fn allocate(&mut self, len: usize) -> io::Result<usize> {
        let capacity = match &self.map {
            Mapping::ReadWrite(m) => m.len(),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "file is not open for writing",
                ))
            }
        };
        let offset = self.used.div_ceil(ALIGN) * ALIGN;
        let end = offset
            .checked_add(len)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "allocation overflow"))?;
        if end > capacity {
            self.resize(end.max(capacity * 2))?;
        }
        self.used = end;
        Ok(offset)
    }

    /// Bytes handed out so far.
    pub(super) fn used(&self) -> usize {
        self.used
    }

    /// Truncate the file to the used size.
    pub(super) fn shrink_to_fit(&mut self) -> io::Result<()> {
        self.resize(self.used)?;
        if let Mapping::ReadWrite(ref mmap) = self.map {
            mmap.flush()?;
        }
        Ok(())
    }

    fn resize(&mut self, new_len: usize) -> io::Result<()> {
        let Mapping::ReadWrite(mmap) = std::mem::replace(&mut self.map, Mapping::Closed) else {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is not open for writing",
            ));
        };
        mmap.flush()?;
        drop(mmap);

        let file = self
            .file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file handle missing"))?;
        debug!(path = %self.path.display(), new_len, "resizing mapped file");
        file.set_len(new_len as u64)?;
        // SAFETY: Same file as before; the previous mapping was dropped above.
        self.map = Mapping::ReadWrite(unsafe { MmapMut::map_mut(file)? });
        Ok(())
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        self.close();
    }
}
