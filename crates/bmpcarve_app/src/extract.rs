//! Carving one source file into a folder of bitmaps.

use anyhow::{Context, Result};
use bmpcarve_core::{
    BitmapCarver, ByteSource, DecodeVerifier, ExtractedImage, ImageVerifier, NoopVerifier,
    ScanSummary,
};
use bmpcarve_io::Reader;
use console::style;
use humansize::{format_size, BINARY};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::manifest::{Manifest, ManifestEntry};

/// What happened to one source file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub summary: ScanSummary,
    pub written: usize,
    pub write_failures: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

fn verifier_for(config: &AppConfig) -> Box<dyn DecodeVerifier> {
    if config.verify {
        Box::new(ImageVerifier)
    } else {
        Box::new(NoopVerifier)
    }
}

/// Scans `source` and writes every carved bitmap under the configured output
/// folder.
///
/// Only a source that cannot be opened, or an output folder that cannot be
/// created, is an error. Individual images that fail to save are counted and
/// skipped. Clearing `running` stops the scan before the next image.
pub fn process_file(
    source: &Path,
    config: &AppConfig,
    running: &AtomicBool,
) -> Result<FileReport> {
    let start = Instant::now();
    let reader = Reader::open(source)
        .with_context(|| format!("Failed to open source: {}", source.display()))?;

    let output_dir = config.output_dir_for(source);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output folder: {}", output_dir.display()))?;

    if !config.quiet {
        println!("Extracting to: {}", style(output_dir.display()).cyan());
        println!("File size: {}", format_size(reader.size(), BINARY));
    }
    tracing::debug!(source = %source.display(), mmap = reader.is_mmap(), "source opened");

    let mut carver = BitmapCarver::new(reader, verifier_for(config));
    let mut entries = Vec::new();
    let mut written = 0usize;
    let mut write_failures = 0usize;
    let mut interrupted = false;

    loop {
        if !running.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        let Some(image) = carver.next() else {
            break;
        };

        if !config.quiet {
            print_image(&image);
        }

        let path = output_dir.join(image.file_name());
        match fs::write(&path, &image.data) {
            Ok(()) => {
                written += 1;
                if !config.quiet {
                    println!("  Saved as: {}", path.display());
                }
                if config.manifest {
                    entries.push(ManifestEntry::from_image(&image));
                }
            }
            Err(e) => {
                write_failures += 1;
                tracing::warn!(path = %path.display(), error = %e, "failed to save bitmap");
                if !config.quiet {
                    println!("  {} {}", style("Error saving bitmap:").red(), e);
                }
            }
        }
    }

    let summary = carver.summary();
    if config.manifest {
        Manifest::new(source, &summary, interrupted, entries).write(&output_dir)?;
    }

    Ok(FileReport {
        source: source.to_path_buf(),
        output_dir,
        summary,
        written,
        write_failures,
        interrupted,
        elapsed: start.elapsed(),
    })
}

fn print_image(image: &ExtractedImage) {
    println!(
        "Found bitmap at offset: {} (0x{:X})",
        style(image.offset).bold(),
        image.offset
    );
    println!("  Size: {} bytes", image.size);
    println!("  Dimensions: {}x{}", image.width, image.height);
    println!("  Bit Depth: {}", image.bit_depth);
    if image.verified {
        println!(
            "  {}",
            style(format!("Verified as valid bitmap: {}x{}", image.width, image.height)).green()
        );
    } else {
        println!(
            "  {}",
            style("Warning: extracted file was not verified as a bitmap").yellow()
        );
    }
}

pub fn print_report(report: &FileReport) {
    let status = if report.interrupted {
        style("Extraction interrupted.").yellow()
    } else {
        style("Extraction complete.").green()
    };
    println!(
        "{} Found {} bitmaps in {}.",
        status,
        report.written,
        report.source.display()
    );
    println!("  Output: {}", report.output_dir.display());
    println!("  {} in {:.2?}", report.summary, report.elapsed);
    if report.write_failures > 0 {
        println!(
            "  {}",
            style(format!("{} bitmaps could not be saved", report.write_failures)).red()
        );
    }
    if report.summary.read_faults > 0 {
        println!(
            "  {}",
            style(format!("{} unreadable regions skipped", report.summary.read_faults)).yellow()
        );
    }
}
