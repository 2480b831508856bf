use crate::bmp::BMP_SIGNATURE;
use crate::traits::{read_full, ByteSource};
use memchr::memmem::Finder;

pub const DEFAULT_WINDOW_SIZE: usize = 64 * 1024;
const MIN_WINDOW_SIZE: usize = 16;

/// Walks a [`ByteSource`] left to right and yields every offset where the
/// `BM` marker starts.
///
/// Offsets are reported only below `size - 2`, the last position the scan
/// loop visits. The source is read through a fixed window; consecutive
/// windows overlap by one byte so a marker split across them is still seen.
/// Call [`seek`](Self::seek) to restart the sequence anywhere.
pub struct MarkerScanner<S> {
    source: S,
    finder: Finder<'static>,
    window: Vec<u8>,
    window_start: u64,
    window_len: usize,
    cursor: u64,
    limit: u64,
    read_faults: Vec<u64>,
}

impl<S: ByteSource> MarkerScanner<S> {
    pub fn new(source: S) -> Self {
        Self::with_window(source, DEFAULT_WINDOW_SIZE)
    }

    pub fn with_window(source: S, window_size: usize) -> Self {
        let limit = source.size().saturating_sub(BMP_SIGNATURE.len() as u64);
        Self {
            source,
            finder: Finder::new(&BMP_SIGNATURE),
            window: vec![0u8; window_size.max(MIN_WINDOW_SIZE)],
            window_start: 0,
            window_len: 0,
            cursor: 0,
            limit,
            read_faults: Vec::new(),
        }
    }

    /// Restarts the sequence at `offset`.
    #[inline]
    pub fn seek(&mut self, offset: u64) {
        self.cursor = offset;
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Window offsets that could not be read and were skipped.
    pub fn read_faults(&self) -> &[u64] {
        &self.read_faults
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Whether the loaded window holds `cursor` plus the byte after it.
    #[inline]
    fn window_covers(&self, offset: u64) -> bool {
        offset >= self.window_start
            && offset + 1 < self.window_start + self.window_len as u64
    }

    fn load_window(&mut self, offset: u64) -> bool {
        match read_full(&mut self.source, offset, &mut self.window) {
            Ok(n) => {
                self.window_start = offset;
                self.window_len = n;
                true
            }
            Err(e) => {
                tracing::warn!(offset, error = %e, "window read failed, skipping");
                self.read_faults.push(offset);
                self.window_len = 0;
                false
            }
        }
    }

    fn next_marker(&mut self) -> Option<u64> {
        loop {
            if self.cursor >= self.limit {
                return None;
            }

            if !self.window_covers(self.cursor) {
                if !self.load_window(self.cursor) {
                    self.cursor = self.cursor.saturating_add(self.window.len() as u64);
                    continue;
                }
                if self.window_len < BMP_SIGNATURE.len() {
                    return None;
                }
            }

            let rel = (self.cursor - self.window_start) as usize;
            let haystack = &self.window[rel..self.window_len];

            match self.finder.find(haystack) {
                Some(hit) => {
                    let offset = self.cursor + hit as u64;
                    if offset >= self.limit {
                        self.cursor = self.limit;
                        return None;
                    }
                    self.cursor = offset + 1;
                    return Some(offset);
                }
                None => {
                    // Keep the final byte: it may be the `B` of a split marker.
                    self.cursor = self.window_start + self.window_len as u64 - 1;
                }
            }
        }
    }
}

impl<S: ByteSource> Iterator for MarkerScanner<S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.next_marker()
    }
}

/// Every marker offset in `data`, without validation.
pub fn marker_offsets(data: &[u8]) -> Vec<u64> {
    MarkerScanner::new(data).collect()
}
