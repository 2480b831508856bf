//! The byte-source seam between the scanner and whatever holds the data.
//!
//! The scanner never assumes the whole blob is in memory: it asks a
//! [`ByteSource`] for bytes at absolute offsets. Files, memory maps and plain
//! in-memory buffers all plug in here.

use crate::error::Result;

/// A finite, randomly addressable sequence of bytes with a known length.
///
/// Implementations are read-only from the scanner's point of view; `&mut self`
/// only exists so file-backed readers can move their cursor.
///
/// # Example
///
/// ```
/// use bmpcarve_core::ByteSource;
///
/// let mut data: &[u8] = b"..BM..";
/// let mut buf = [0u8; 2];
/// assert_eq!(data.read_chunk(2, &mut buf).unwrap(), 2);
/// assert_eq!(&buf, b"BM");
/// assert_eq!(data.size(), 6);
/// ```
pub trait ByteSource {
    /// Reads bytes starting at `offset` into `buffer`.
    ///
    /// Returns the number of bytes read, which may be less than
    /// `buffer.len()`. Zero means there is nothing left at that offset.
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}

/// Reads until `buffer` is full or the source runs dry.
///
/// Returns the number of bytes placed in `buffer`. A short count is not an
/// error; callers decide what an incomplete read means for them.
pub fn read_full<S: ByteSource + ?Sized>(
    source: &mut S,
    offset: u64,
    buffer: &mut [u8],
) -> Result<usize> {
    let mut filled = 0usize;

    while filled < buffer.len() {
        let n = source.read_chunk(offset + filled as u64, &mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(filled)
}

#[inline]
fn read_from_slice(data: &[u8], offset: u64, buffer: &mut [u8]) -> usize {
    if offset >= data.len() as u64 {
        return 0;
    }
    let start = offset as usize;
    let n = buffer.len().min(data.len() - start);
    buffer[..n].copy_from_slice(&data[start..start + n]);
    n
}

impl ByteSource for &[u8] {
    #[inline]
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        let data: &[u8] = self;
        Ok(read_from_slice(data, offset, buffer))
    }

    #[inline]
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSource for Vec<u8> {
    #[inline]
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        Ok(read_from_slice(self.as_slice(), offset, buffer))
    }

    #[inline]
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(offset, buffer)
    }

    #[inline]
    fn size(&self) -> u64 {
        (**self).size()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    #[inline]
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(offset, buffer)
    }

    #[inline]
    fn size(&self) -> u64 {
        (**self).size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `step` bytes per call, like a pipe or a slow device.
    struct Trickle {
        data: Vec<u8>,
        step: usize,
    }

    impl ByteSource for Trickle {
        fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
            let limit = buffer.len().min(self.step);
            Ok(read_from_slice(&self.data, offset, &mut buffer[..limit]))
        }

        fn size(&self) -> u64 {
            self.data.len() as u64
        }
    }

    #[test]
    fn slice_reads_clamp_to_end() {
        let mut data: &[u8] = b"Hello, World!";
        let mut buf = [0u8; 32];

        assert_eq!(data.read_chunk(7, &mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"World!");
        assert_eq!(data.read_chunk(13, &mut buf).unwrap(), 0);
        assert_eq!(data.read_chunk(500, &mut buf).unwrap(), 0);
    }

    #[test]
    fn vec_and_borrowed_sources_agree() {
        let mut owned = b"abcdef".to_vec();
        let mut buf = [0u8; 3];
        assert_eq!(owned.read_chunk(1, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"bcd");

        let borrowed = &mut owned;
        assert_eq!(borrowed.size(), 6);
        assert_eq!(borrowed.read_chunk(4, &mut buf).unwrap(), 2);
    }

    #[test]
    fn read_full_loops_over_short_reads() {
        let mut source = Trickle {
            data: (0u8..100).collect(),
            step: 7,
        };
        let mut buf = [0u8; 40];

        let n = read_full(&mut source, 10, &mut buf).unwrap();
        assert_eq!(n, 40);
        assert_eq!(buf[0], 10);
        assert_eq!(buf[39], 49);
    }

    #[test]
    fn read_full_reports_partial_fill_at_end() {
        let mut source = Trickle {
            data: vec![0xAA; 20],
            step: 3,
        };
        let mut buf = [0u8; 16];
        assert_eq!(read_full(&mut source, 10, &mut buf).unwrap(), 10);
    }
}
