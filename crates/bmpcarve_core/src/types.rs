use std::fmt;

/// Canonical artifact name for the `index`-th image of a scan.
#[must_use]
pub fn output_file_name(index: usize) -> String {
    format!("bitmap_{index:04}.bmp")
}

/// One bitmap carved out of the source, with the bytes it occupied.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Zero-based position in the scan's output sequence.
    pub index: usize,
    pub offset: u64,
    /// Declared segment size; always equals `data.len()`.
    pub size: u64,
    pub width: u32,
    /// Magnitude of the stored height.
    pub height: u32,
    pub bit_depth: u16,
    pub top_down: bool,
    /// Whether the decode check accepted the bytes.
    pub verified: bool,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    #[inline]
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        output_file_name(self.index)
    }
}

impl fmt::Debug for ExtractedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedImage")
            .field("index", &self.index)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bit_depth", &self.bit_depth)
            .field("top_down", &self.top_down)
            .field("verified", &self.verified)
            .finish_non_exhaustive()
    }
}

/// Counters describing one finished (or abandoned) scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub images: usize,
    /// Marker hits handed to the header validator.
    pub markers: usize,
    pub rejected: usize,
    pub short_reads: usize,
    pub verified: usize,
    pub read_faults: usize,
    pub source_size: u64,
}

impl ScanSummary {
    #[inline]
    #[must_use]
    pub fn unverified(&self) -> usize {
        self.images - self.verified
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bitmaps ({} verified) from {} markers, {} rejected, {} short reads",
            self.images, self.verified, self.markers, self.rejected, self.short_reads
        )
    }
}
