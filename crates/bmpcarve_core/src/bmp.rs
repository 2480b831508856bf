//! Fixed-layout BMP headers and the plausibility checks applied at every
//! `BM` marker.
//!
//! Only the 40-byte `BITMAPINFOHEADER` variant is recognised. The dimension
//! bounds are heuristics for telling real bitmaps apart from stray `BM` bytes
//! inside unrelated data; they are not format limits.

use std::fmt;

use crate::traits::{read_full, ByteSource};

pub const BMP_SIGNATURE: [u8; 2] = *b"BM";
pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
/// File header plus the info-header size field.
pub const MIN_CANDIDATE_BYTES: usize = FILE_HEADER_SIZE + 4;
pub const HEADERS_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
pub const MAX_DIMENSION: u32 = 4000;

#[inline]
fn u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

#[inline]
fn u32_le(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[inline]
fn i32_le(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// `BITMAPFILEHEADER`: the 14-byte preamble of every bitmap file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileHeader {
    pub signature: [u8; 2],
    /// Declared size of the whole segment, headers included.
    pub size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl FileHeader {
    pub fn from_bytes(data: &[u8; FILE_HEADER_SIZE]) -> Self {
        Self {
            signature: [data[0], data[1]],
            size: u32_le(data, 2),
            reserved1: u16_le(data, 6),
            reserved2: u16_le(data, 8),
            pixel_offset: u32_le(data, 10),
        }
    }

    #[inline]
    pub fn has_signature(&self) -> bool {
        self.signature == BMP_SIGNATURE
    }
}

/// `BITMAPINFOHEADER`: the 40-byte header describing dimensions and pixel
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfoHeader {
    pub header_size: u32,
    pub width: i32,
    /// Negative for top-down row order.
    pub height: i32,
    pub planes: u16,
    pub bit_depth: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl InfoHeader {
    pub fn from_bytes(data: &[u8; INFO_HEADER_SIZE]) -> Self {
        Self {
            header_size: u32_le(data, 0),
            width: i32_le(data, 4),
            height: i32_le(data, 8),
            planes: u16_le(data, 12),
            bit_depth: u16_le(data, 14),
            compression: u32_le(data, 16),
            image_size: u32_le(data, 20),
            x_pixels_per_meter: i32_le(data, 24),
            y_pixels_per_meter: i32_le(data, 28),
            colors_used: u32_le(data, 32),
            colors_important: u32_le(data, 36),
        }
    }

    #[inline]
    pub fn abs_height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    #[inline]
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

/// A marker occurrence whose headers passed every plausibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub offset: u64,
    pub file_header: FileHeader,
    pub info_header: InfoHeader,
}

impl Candidate {
    #[inline]
    pub fn size(&self) -> u64 {
        self.file_header.size as u64
    }

    /// Absolute offset one past the last byte of the declared segment.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not enough bytes after the marker to hold the headers.
    Truncated { available: usize },
    UnsupportedInfoHeader(u32),
    InvalidWidth(i32),
    InvalidHeight(i32),
    SizeExceedsSource { declared: u32, remaining: u64 },
    /// Declared size of zero; the cursor could never move past it.
    EmptySegment,
    ReadFault,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { available } => {
                write!(f, "only {available} bytes left after marker")
            }
            Self::UnsupportedInfoHeader(size) => write!(f, "info header size {size} is not 40"),
            Self::InvalidWidth(w) => write!(f, "width {w} outside (0, {MAX_DIMENSION}]"),
            Self::InvalidHeight(h) => write!(f, "height {h} outside (0, {MAX_DIMENSION}]"),
            Self::SizeExceedsSource {
                declared,
                remaining,
            } => write!(f, "declared size {declared} exceeds {remaining} remaining bytes"),
            Self::EmptySegment => write!(f, "declared size is zero"),
            Self::ReadFault => write!(f, "read fault while loading headers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Accepted(Candidate),
    Rejected(RejectReason),
}

impl Validation {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Accepted(c) => Some(c),
            Self::Rejected(_) => None,
        }
    }
}

#[inline]
fn dimension_in_range(value: u32) -> bool {
    value > 0 && value <= MAX_DIMENSION
}

/// Validates the headers in `data`, which starts at the marker found at
/// `offset` in a source of `source_len` bytes.
///
/// `data` may be longer than the headers; only the first 54 bytes are looked
/// at. The signature itself is assumed to have been matched by the caller.
pub fn validate_headers(data: &[u8], offset: u64, source_len: u64) -> Validation {
    if data.len() < MIN_CANDIDATE_BYTES {
        return Validation::Rejected(RejectReason::Truncated {
            available: data.len(),
        });
    }

    let info_size = u32_le(data, FILE_HEADER_SIZE);
    if info_size as usize != INFO_HEADER_SIZE {
        return Validation::Rejected(RejectReason::UnsupportedInfoHeader(info_size));
    }

    let Some(headers) = data.get(..HEADERS_SIZE) else {
        return Validation::Rejected(RejectReason::Truncated {
            available: data.len(),
        });
    };

    let mut file_bytes = [0u8; FILE_HEADER_SIZE];
    file_bytes.copy_from_slice(&headers[..FILE_HEADER_SIZE]);
    let mut info_bytes = [0u8; INFO_HEADER_SIZE];
    info_bytes.copy_from_slice(&headers[FILE_HEADER_SIZE..]);

    let file_header = FileHeader::from_bytes(&file_bytes);
    let info_header = InfoHeader::from_bytes(&info_bytes);

    if info_header.width <= 0 || !dimension_in_range(info_header.width as u32) {
        return Validation::Rejected(RejectReason::InvalidWidth(info_header.width));
    }

    if !dimension_in_range(info_header.abs_height()) {
        return Validation::Rejected(RejectReason::InvalidHeight(info_header.height));
    }

    let remaining = source_len.saturating_sub(offset);
    if file_header.size as u64 > remaining {
        return Validation::Rejected(RejectReason::SizeExceedsSource {
            declared: file_header.size,
            remaining,
        });
    }

    if file_header.size == 0 {
        return Validation::Rejected(RejectReason::EmptySegment);
    }

    Validation::Accepted(Candidate {
        offset,
        file_header,
        info_header,
    })
}

/// Loads the headers at `offset` from `source` and validates them.
///
/// Read faults reject the candidate instead of failing the scan.
pub fn validate_candidate<S: ByteSource + ?Sized>(source: &mut S, offset: u64) -> Validation {
    let mut buf = [0u8; HEADERS_SIZE];

    match read_full(source, offset, &mut buf) {
        Ok(n) => validate_headers(&buf[..n], offset, source.size()),
        Err(e) => {
            tracing::debug!(offset, error = %e, "header read failed");
            Validation::Rejected(RejectReason::ReadFault)
        }
    }
}

/// Builds a complete 24-bit bitmap: headers, then zeroed, row-padded pixels.
///
/// Used by tests and benches to plant well-formed segments in synthetic blobs.
pub fn synthesize_bitmap(width: i32, height: i32, bit_depth: u16) -> Vec<u8> {
    let row_bytes = ((width.unsigned_abs() as usize * bit_depth as usize).div_ceil(32)) * 4;
    let pixel_bytes = row_bytes * height.unsigned_abs() as usize;
    let total = HEADERS_SIZE + pixel_bytes;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&BMP_SIGNATURE);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(HEADERS_SIZE as u32).to_le_bytes());

    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bit_depth.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(pixel_bytes as u32).to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    out.resize(total, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(width: i32, height: i32, size: u32) -> Vec<u8> {
        let mut data = synthesize_bitmap(2, 2, 24);
        data[2..6].copy_from_slice(&size.to_le_bytes());
        data[18..22].copy_from_slice(&width.to_le_bytes());
        data[22..26].copy_from_slice(&height.to_le_bytes());
        data
    }

    fn check(width: i32, height: i32) -> Validation {
        let data = headers_with(width, height, 70);
        validate_headers(&data, 0, 1_000_000)
    }

    #[test]
    fn file_header_decodes_little_endian_fields() {
        let bytes: [u8; 14] = [
            b'B', b'M', 0x46, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x36, 0x00, 0x00, 0x00,
        ];
        let header = FileHeader::from_bytes(&bytes);
        assert!(header.has_signature());
        assert_eq!(header.size, 70);
        assert_eq!(header.reserved1, 0x0201);
        assert_eq!(header.reserved2, 0x0403);
        assert_eq!(header.pixel_offset, 54);
    }

    #[test]
    fn info_header_decodes_every_field() {
        let data = synthesize_bitmap(3, -5, 24);
        let mut bytes = [0u8; 40];
        bytes.copy_from_slice(&data[14..54]);
        let info = InfoHeader::from_bytes(&bytes);

        assert_eq!(info.header_size, 40);
        assert_eq!(info.width, 3);
        assert_eq!(info.height, -5);
        assert_eq!(info.abs_height(), 5);
        assert!(info.is_top_down());
        assert_eq!(info.planes, 1);
        assert_eq!(info.bit_depth, 24);
        assert_eq!(info.compression, 0);
        assert_eq!(info.image_size, 12 * 5);
        assert_eq!(info.x_pixels_per_meter, 2835);
        assert_eq!(info.colors_used, 0);
    }

    #[test]
    fn synthesized_bitmap_has_padded_rows() {
        let data = synthesize_bitmap(2, 2, 24);
        assert_eq!(data.len(), 54 + 16);
        assert_eq!(u32_le(&data, 2), 70);
    }

    #[test]
    fn accepts_well_formed_headers() {
        let data = synthesize_bitmap(2, 2, 24);
        let validation = validate_headers(&data, 0, data.len() as u64);
        let candidate = validation.candidate().copied().unwrap();
        assert_eq!(candidate.offset, 0);
        assert_eq!(candidate.end(), 70);
        assert_eq!(candidate.info_header.width, 2);
    }

    #[test]
    fn rejects_short_tail() {
        let data = synthesize_bitmap(2, 2, 24);
        assert_eq!(
            validate_headers(&data[..17], 0, 17),
            Validation::Rejected(RejectReason::Truncated { available: 17 })
        );
    }

    #[test]
    fn size_field_alone_is_enough_to_reject_other_variants() {
        let mut data = synthesize_bitmap(2, 2, 24);
        data[14..18].copy_from_slice(&124u32.to_le_bytes());
        assert_eq!(
            validate_headers(&data[..18], 0, 1000),
            Validation::Rejected(RejectReason::UnsupportedInfoHeader(124))
        );
    }

    #[test]
    fn forty_byte_size_but_cut_off_info_header() {
        let data = synthesize_bitmap(2, 2, 24);
        assert_eq!(
            validate_headers(&data[..30], 0, 30),
            Validation::Rejected(RejectReason::Truncated { available: 30 })
        );
    }

    #[test]
    fn width_bounds() {
        assert!(check(4000, 10).is_accepted());
        assert!(check(1, 10).is_accepted());
        assert_eq!(
            check(4001, 10),
            Validation::Rejected(RejectReason::InvalidWidth(4001))
        );
        assert_eq!(check(0, 10), Validation::Rejected(RejectReason::InvalidWidth(0)));
        assert_eq!(
            check(-3, 10),
            Validation::Rejected(RejectReason::InvalidWidth(-3))
        );
    }

    #[test]
    fn height_bounds_use_magnitude() {
        assert!(check(10, 4000).is_accepted());
        assert!(check(10, -4000).is_accepted());
        assert_eq!(
            check(10, 0),
            Validation::Rejected(RejectReason::InvalidHeight(0))
        );
        assert_eq!(
            check(10, 4001),
            Validation::Rejected(RejectReason::InvalidHeight(4001))
        );
        assert_eq!(
            check(10, -4001),
            Validation::Rejected(RejectReason::InvalidHeight(-4001))
        );
        assert_eq!(
            check(10, i32::MIN),
            Validation::Rejected(RejectReason::InvalidHeight(i32::MIN))
        );
    }

    #[test]
    fn declared_size_may_end_exactly_at_source_end() {
        let data = headers_with(2, 2, 100);
        assert!(validate_headers(&data, 0, 100).is_accepted());
        assert!(validate_headers(&data, 10, 110).is_accepted());
        assert_eq!(
            validate_headers(&data, 10, 109),
            Validation::Rejected(RejectReason::SizeExceedsSource {
                declared: 100,
                remaining: 99
            })
        );
    }

    #[test]
    fn only_zero_declared_size_is_rejected() {
        let data = headers_with(2, 2, 0);
        assert_eq!(
            validate_headers(&data, 0, 1000),
            Validation::Rejected(RejectReason::EmptySegment)
        );
        for size in [1u32, 30, 53, 54] {
            let data = headers_with(2, 2, size);
            let candidate = validate_headers(&data, 0, 1000).candidate().copied().unwrap();
            assert_eq!(candidate.size(), size as u64);
        }
    }

    #[test]
    fn validate_candidate_reads_through_source() {
        let mut blob = vec![0u8; 7];
        blob.extend_from_slice(&synthesize_bitmap(4, 4, 24));
        let mut source: &[u8] = &blob;

        let candidate = validate_candidate(&mut source, 7).candidate().copied().unwrap();
        assert_eq!(candidate.offset, 7);
        assert_eq!(candidate.info_header.abs_height(), 4);

        assert_eq!(
            validate_candidate(&mut source, 0),
            Validation::Rejected(RejectReason::UnsupportedInfoHeader(0x3600_0000))
        );
    }

    #[test]
    fn reject_reasons_render() {
        let msg = RejectReason::SizeExceedsSource {
            declared: 900,
            remaining: 12,
        }
        .to_string();
        assert!(msg.contains("900"));
        assert!(msg.contains("12"));
    }
}
