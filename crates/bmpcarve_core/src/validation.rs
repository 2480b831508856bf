//! Optional decode check for carved segments.
//!
//! Passing the headers says nothing about the pixel data. A
//! [`DecodeVerifier`] gets the chance to run a real decoder over the bytes;
//! its answer is recorded on the image and never stops extraction.

use image::{GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

pub trait DecodeVerifier {
    fn verify(&self, bytes: &[u8]) -> bool;
}

/// Skips decoding; every image is reported unverified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVerifier;

impl DecodeVerifier for NoopVerifier {
    #[inline]
    fn verify(&self, _bytes: &[u8]) -> bool {
        false
    }
}

/// Decodes the segment with the `image` crate's BMP decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageVerifier;

impl ImageVerifier {
    /// Dimensions reported by the decoder, if it could read the image.
    pub fn decoded_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
        let mut reader = ImageReader::new(Cursor::new(bytes));
        reader.set_format(ImageFormat::Bmp);
        reader.decode().ok().map(|img| img.dimensions())
    }
}

impl DecodeVerifier for ImageVerifier {
    fn verify(&self, bytes: &[u8]) -> bool {
        match Self::decoded_dimensions(bytes) {
            Some((width, height)) => {
                tracing::debug!(width, height, "decoded as bitmap");
                true
            }
            None => {
                tracing::warn!(len = bytes.len(), "extracted segment does not decode");
                false
            }
        }
    }
}

/// Adapts a plain function or closure into a verifier.
#[derive(Debug, Clone, Copy)]
pub struct FnVerifier<F>(pub F);

impl<F> DecodeVerifier for FnVerifier<F>
where
    F: Fn(&[u8]) -> bool,
{
    #[inline]
    fn verify(&self, bytes: &[u8]) -> bool {
        (self.0)(bytes)
    }
}

impl<V: DecodeVerifier + ?Sized> DecodeVerifier for &V {
    #[inline]
    fn verify(&self, bytes: &[u8]) -> bool {
        (**self).verify(bytes)
    }
}

impl<V: DecodeVerifier + ?Sized> DecodeVerifier for Box<V> {
    #[inline]
    fn verify(&self, bytes: &[u8]) -> bool {
        (**self).verify(bytes)
    }
}
