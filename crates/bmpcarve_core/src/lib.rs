//! Locate and carve bitmap images embedded in opaque binary blobs.
//!
//! The scan walks the source byte by byte looking for the `BM` marker,
//! checks the 14-byte file header and 40-byte info header found there
//! against conservative plausibility bounds, and copies each accepted segment
//! out as an [`ExtractedImage`].
//!
//! ```
//! use bmpcarve_core::{bmp::synthesize_bitmap, scan_all, NoopVerifier};
//!
//! let mut blob = vec![0u8; 32];
//! blob.extend_from_slice(&synthesize_bitmap(2, 2, 24));
//!
//! let (images, summary) = scan_all(blob.as_slice(), NoopVerifier);
//! assert_eq!(images.len(), 1);
//! assert_eq!(images[0].offset, 32);
//! assert_eq!(summary.images, 1);
//! ```

pub mod bmp;
pub mod carving;
mod error;
pub mod extraction;
pub mod scanners;
mod traits;
mod types;
pub mod validation;

pub use bmp::{Candidate, FileHeader, InfoHeader, RejectReason, Validation};
pub use carving::{scan_all, BitmapCarver, CarverConfig};
pub use error::{CoreError, Result};
pub use extraction::Extraction;
pub use scanners::MarkerScanner;
pub use traits::{read_full, ByteSource};
pub use types::{output_file_name, ExtractedImage, ScanSummary};
pub use validation::{DecodeVerifier, FnVerifier, ImageVerifier, NoopVerifier};
