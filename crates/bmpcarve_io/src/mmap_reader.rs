use bmpcarve_core::{ByteSource, CoreError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A memory-mapped, read-only view of a whole file.
pub struct MmapReader {
    mmap: Mmap,
    size: u64,
}

impl MmapReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CoreError::source_unavailable(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| CoreError::source_unavailable(path, e))?
            .len();

        if size == 0 {
            return Err(CoreError::InvalidFormat(
                "Cannot mmap empty file".to_string(),
            ));
        }

        // SAFETY: the mapping is read-only. A concurrent truncation by another
        // process is outside what this tool guards against.
        let mmap = unsafe { Mmap::map(&file) }?;

        if mmap.is_empty() {
            return Err(CoreError::InvalidFormat(
                "mmap returned empty mapping".to_string(),
            ));
        }

        #[cfg(target_os = "linux")]
        {
            use memmap2::Advice;
            let _ = mmap.advise(Advice::Sequential);
            let _ = mmap.advise(Advice::WillNeed);
        }

        tracing::debug!(path = %path.display(), size, "memory mapped");
        Ok(Self { mmap, size })
    }

    /// Up to `len` mapped bytes starting at `offset`; `None` past the end.
    #[inline]
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        if start >= self.mmap.len() {
            return None;
        }
        let end = start.saturating_add(len).min(self.mmap.len());
        Some(&self.mmap[start..end])
    }

    /// The whole mapping.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }
}

impl ByteSource for MmapReader {
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if let Some(slice) = self.slice(offset, buffer.len()) {
            let len = slice.len();
            buffer[..len].copy_from_slice(slice);
            Ok(len)
        } else {
            Ok(0)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
