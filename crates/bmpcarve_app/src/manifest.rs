use anyhow::{Context, Result};
use bmpcarve_core::{ExtractedImage, ScanSummary};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub file_name: String,
    pub source_offset: String,
    pub source_offset_decimal: u64,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u16,
    pub top_down: bool,
    pub verified: bool,
    pub sha256_hash: String,
}

impl ManifestEntry {
    pub fn from_image(image: &ExtractedImage) -> Self {
        Self {
            file_name: image.file_name(),
            source_offset: format!("0x{:016X}", image.offset),
            source_offset_decimal: image.offset,
            size: image.size,
            width: image.width,
            height: image.height,
            bit_depth: image.bit_depth,
            top_down: image.top_down,
            verified: image.verified,
            sha256_hash: compute_sha256(&image.data),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub source: String,
    pub source_size: u64,
    pub markers: usize,
    pub rejected: usize,
    pub short_reads: usize,
    pub interrupted: bool,
    pub images: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(
        source: &Path,
        summary: &ScanSummary,
        interrupted: bool,
        images: Vec<ManifestEntry>,
    ) -> Self {
        Self {
            source: source.display().to_string(),
            source_size: summary.source_size,
            markers: summary.markers,
            rejected: summary.rejected,
            short_reads: summary.short_reads,
            interrupted,
            images,
        }
    }

    pub fn write(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }
}

pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmpcarve_core::bmp::synthesize_bitmap;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            compute_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn entry_mirrors_image() {
        let data = synthesize_bitmap(3, -2, 24);
        let image = ExtractedImage {
            index: 5,
            offset: 0x1F40,
            size: data.len() as u64,
            width: 3,
            height: 2,
            bit_depth: 24,
            top_down: true,
            verified: true,
            data,
        };

        let entry = ManifestEntry::from_image(&image);
        assert_eq!(entry.file_name, "bitmap_0005.bmp");
        assert_eq!(entry.source_offset, "0x0000000000001F40");
        assert_eq!(entry.source_offset_decimal, 8000);
        assert_eq!(entry.sha256_hash, compute_sha256(&image.data));
        assert_eq!(entry.sha256_hash.len(), 64);
    }

    #[test]
    fn manifest_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let summary = ScanSummary {
            markers: 4,
            rejected: 3,
            source_size: 1024,
            ..Default::default()
        };
        let manifest = Manifest::new(Path::new("ui.lib"), &summary, false, Vec::new());
        manifest.write(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE_NAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["source"], "ui.lib");
        assert_eq!(value["markers"], 4);
        assert_eq!(value["images"].as_array().unwrap().len(), 0);
    }
}
