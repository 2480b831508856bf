use crate::bmp::Candidate;
use crate::traits::{read_full, ByteSource};
use crate::types::ExtractedImage;
use crate::validation::DecodeVerifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Extracted(ExtractedImage),
    /// Fewer bytes were available than the header declared.
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },
}

impl Extraction {
    /// Where the scan cursor goes after this outcome.
    #[inline]
    pub fn next_position(&self) -> u64 {
        match self {
            Self::Extracted(image) => image.end(),
            Self::ShortRead { offset, .. } => offset + 1,
        }
    }
}

/// Copies the declared segment of `candidate` out of `source`.
///
/// The segment is read in full or not at all. A successful read is passed
/// through `verifier`; its verdict only sets [`ExtractedImage::verified`].
pub fn extract_segment<S, V>(
    source: &mut S,
    candidate: &Candidate,
    index: usize,
    verifier: &V,
) -> Extraction
where
    S: ByteSource + ?Sized,
    V: DecodeVerifier + ?Sized,
{
    let expected = candidate.size();
    let mut data = vec![0u8; expected as usize];

    let actual = match read_full(source, candidate.offset, &mut data) {
        Ok(n) => n as u64,
        Err(e) => {
            tracing::debug!(offset = candidate.offset, error = %e, "segment read failed");
            0
        }
    };

    if actual < expected {
        return Extraction::ShortRead {
            offset: candidate.offset,
            expected,
            actual,
        };
    }

    let verified = verifier.verify(&data);
    let info = &candidate.info_header;

    Extraction::Extracted(ExtractedImage {
        index,
        offset: candidate.offset,
        size: expected,
        width: info.width.unsigned_abs(),
        height: info.abs_height(),
        bit_depth: info.bit_depth,
        top_down: info.is_top_down(),
        verified,
        data,
    })
}
