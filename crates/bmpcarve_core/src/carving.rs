//! The scan loop tying marker search, header validation and extraction
//! together.
//!
//! [`BitmapCarver`] is a lazy iterator: each call to `next` advances the
//! cursor until one image has been extracted or the source is exhausted. The
//! cursor moves one byte past every rejected marker and jumps over every
//! emitted segment, so emitted segments never overlap and always come out in
//! ascending offset order. Dropping the carver mid-scan is always safe.

use crate::bmp::{validate_candidate, Validation};
use crate::extraction::{extract_segment, Extraction};
use crate::scanners::{MarkerScanner, DEFAULT_WINDOW_SIZE};
use crate::traits::ByteSource;
use crate::types::{ExtractedImage, ScanSummary};
use crate::validation::DecodeVerifier;

#[derive(Debug, Clone)]
pub struct CarverConfig {
    /// Bytes read per marker-search window.
    pub window_size: usize,
}

impl Default for CarverConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

pub struct BitmapCarver<S, V> {
    scanner: MarkerScanner<S>,
    verifier: V,
    summary: ScanSummary,
    finished: bool,
}

impl<S: ByteSource, V: DecodeVerifier> BitmapCarver<S, V> {
    pub fn new(source: S, verifier: V) -> Self {
        Self::with_config(source, verifier, CarverConfig::default())
    }

    pub fn with_config(source: S, verifier: V, config: CarverConfig) -> Self {
        let source_size = source.size();
        Self {
            scanner: MarkerScanner::with_window(source, config.window_size),
            verifier,
            summary: ScanSummary {
                source_size,
                ..Default::default()
            },
            finished: false,
        }
    }

    /// Counters so far; final once the iterator has returned `None`.
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            read_faults: self.scanner.read_faults().len(),
            ..self.summary
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.scanner.position()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn next_image(&mut self) -> Option<ExtractedImage> {
        while let Some(offset) = self.scanner.next() {
            self.summary.markers += 1;

            let candidate = match validate_candidate(self.scanner.source_mut(), offset) {
                Validation::Accepted(candidate) => candidate,
                Validation::Rejected(reason) => {
                    tracing::debug!(offset, %reason, "candidate rejected");
                    self.summary.rejected += 1;
                    self.scanner.seek(offset + 1);
                    continue;
                }
            };

            let outcome = extract_segment(
                self.scanner.source_mut(),
                &candidate,
                self.summary.images,
                &self.verifier,
            );
            self.scanner.seek(outcome.next_position());

            match outcome {
                Extraction::Extracted(image) => {
                    tracing::info!(
                        index = image.index,
                        offset = image.offset,
                        size = image.size,
                        width = image.width,
                        height = image.height,
                        bit_depth = image.bit_depth,
                        verified = image.verified,
                        "bitmap extracted"
                    );
                    self.summary.images += 1;
                    if image.verified {
                        self.summary.verified += 1;
                    }
                    return Some(image);
                }
                Extraction::ShortRead {
                    offset,
                    expected,
                    actual,
                } => {
                    tracing::debug!(offset, expected, actual, "short read, segment abandoned");
                    self.summary.short_reads += 1;
                }
            }
        }

        if !self.finished {
            self.finished = true;
            let summary = self.summary();
            tracing::info!(
                images = summary.images,
                markers = summary.markers,
                rejected = summary.rejected,
                short_reads = summary.short_reads,
                "scan complete"
            );
        }
        None
    }
}

impl<S: ByteSource, V: DecodeVerifier> Iterator for BitmapCarver<S, V> {
    type Item = ExtractedImage;

    fn next(&mut self) -> Option<ExtractedImage> {
        if self.finished {
            return None;
        }
        self.next_image()
    }
}

/// Runs a whole scan and collects every image.
pub fn scan_all<S: ByteSource, V: DecodeVerifier>(
    source: S,
    verifier: V,
) -> (Vec<ExtractedImage>, ScanSummary) {
    let mut carver = BitmapCarver::new(source, verifier);
    let images: Vec<ExtractedImage> = carver.by_ref().collect();
    (images, carver.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmp::synthesize_bitmap;
    use crate::validation::{ImageVerifier, NoopVerifier};

    #[test]
    fn short_sources_yield_nothing() {
        for len in 0..18 {
            let data: Vec<u8> = b"BM".iter().copied().cycle().take(len).collect();
            let (images, summary) = scan_all(data.as_slice(), NoopVerifier);
            assert!(images.is_empty());
            assert_eq!(summary.images, 0);
        }
    }

    #[test]
    fn single_segment_at_zero() {
        let data = synthesize_bitmap(2, 2, 24);
        let (images, summary) = scan_all(data.as_slice(), ImageVerifier);

        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!(image.offset, 0);
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.bit_depth, 24);
        assert!(image.verified);
        assert_eq!(summary.images, 1);
        assert_eq!(summary.verified, 1);
    }

    #[test]
    fn cursor_skips_markers_inside_emitted_segment() {
        let mut bitmap = synthesize_bitmap(4, 4, 24);
        let tail = bitmap.len() - 10;
        bitmap[tail..tail + 2].copy_from_slice(b"BM");

        let (images, summary) = scan_all(bitmap.as_slice(), NoopVerifier);
        assert_eq!(images.len(), 1);
        assert_eq!(summary.markers, 1);
    }

    #[test]
    fn stray_markers_are_counted_and_rejected() {
        let mut data = vec![0u8; 200];
        for at in [10usize, 50, 51, 120] {
            data[at] = b'B';
            data[at + 1] = b'M';
        }

        let mut carver = BitmapCarver::new(data.as_slice(), NoopVerifier);
        assert!(carver.next().is_none());
        assert!(carver.is_finished());
        let summary = carver.summary();
        assert_eq!(summary.markers, 3);
        assert_eq!(summary.rejected, 3);
        assert!(carver.next().is_none());
    }

    #[test]
    fn abandoning_iteration_is_safe() {
        let mut blob = Vec::new();
        for _ in 0..3 {
            blob.extend_from_slice(&synthesize_bitmap(2, 2, 24));
        }
        let mut carver = BitmapCarver::new(blob.as_slice(), NoopVerifier);
        let first = carver.next().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(carver.position(), first.end());
        drop(carver);
    }
}
