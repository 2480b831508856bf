//! File-backed [`ByteSource`]s for the scanner.
//!
//! [`Reader::open`] is the usual entry point: it maps the file when it can
//! and falls back to plain seek-and-read access when it cannot.

mod mmap_reader;
mod reader;

pub use mmap_reader::MmapReader;
pub use reader::DiskReader;

use bmpcarve_core::{ByteSource, CoreError, Result};
use std::path::Path;

pub enum Reader {
    Mmap(MmapReader),
    Disk(DiskReader),
}

impl Reader {
    /// Opens `path`, preferring a memory map.
    ///
    /// A file that cannot be opened at all is reported as
    /// [`CoreError::SourceUnavailable`]; any other mapping problem silently
    /// falls back to [`DiskReader`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match MmapReader::new(path) {
            Ok(r) => Ok(Reader::Mmap(r)),
            Err(e @ CoreError::SourceUnavailable { .. }) => Err(e),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "falling back to buffered reads");
                Ok(Reader::Disk(DiskReader::new(path)?))
            }
        }
    }

    #[inline]
    pub fn is_mmap(&self) -> bool {
        matches!(self, Reader::Mmap(_))
    }
}

impl ByteSource for Reader {
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        match self {
            Reader::Mmap(r) => r.read_chunk(offset, buffer),
            Reader::Disk(r) => r.read_chunk(offset, buffer),
        }
    }

    fn size(&self) -> u64 {
        match self {
            Reader::Mmap(r) => r.size(),
            Reader::Disk(r) => r.size(),
        }
    }
}
