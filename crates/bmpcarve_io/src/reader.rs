//! Plain buffered reads for sources that cannot be memory-mapped.

use bmpcarve_core::{ByteSource, CoreError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A read-only [`ByteSource`] backed by an open file handle.
///
/// Every `read_chunk` seeks to the requested offset first, so reads may
/// arrive in any order. Used when mapping the file is not possible, for
/// example an empty file or a filesystem that refuses `mmap`.
///
/// ```no_run
/// use bmpcarve_core::ByteSource;
/// use bmpcarve_io::DiskReader;
///
/// let mut reader = DiskReader::new("assets/ui.lib")?;
/// let mut header = [0u8; 54];
/// let n = reader.read_chunk(0, &mut header)?;
/// # Ok::<(), bmpcarve_core::CoreError>(())
/// ```
pub struct DiskReader {
    file: File,
    size: u64,
}

impl DiskReader {
    /// Opens `path` read-only.
    ///
    /// Fails with [`CoreError::SourceUnavailable`] when the file cannot be
    /// opened or its length cannot be determined.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(false)
            .open(path)
            .map_err(|e| CoreError::source_unavailable(path, e))?;

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{fadvise, Advice};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
            let _ = fadvise(&file, 0, None, Advice::NoReuse);
        }

        let size = file
            .seek(SeekFrom::End(0))
            .map_err(|e| CoreError::source_unavailable(path, e))?;
        file.seek(SeekFrom::Start(0))?;

        tracing::debug!(path = %path.display(), size, "opened for buffered reads");
        Ok(Self { file, size })
    }
}

impl ByteSource for DiskReader {
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        self.file.seek(SeekFrom::Start(offset))?;
        let bytes_read = self.file.read(buffer)?;

        Ok(bytes_read)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
