//! Folder mode: every matching file in a directory, one after another or
//! spread across a rayon pool.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{has_extension, AppConfig};
use crate::extract::{print_report, process_file, FileReport};

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<FileReport>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total_images(&self) -> usize {
        self.processed.iter().map(|r| r.written).sum()
    }

    pub fn interrupted(&self) -> bool {
        self.processed.iter().any(|r| r.interrupted)
    }
}

/// Regular files directly inside `dir` whose extension matches, sorted by
/// path.
pub fn find_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Folder not found: {}", dir.display()))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_extension(&path, extension) {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

pub fn run_batch(
    dir: &Path,
    extension: &str,
    config: &AppConfig,
    running: &AtomicBool,
) -> Result<BatchReport> {
    let sources = find_sources(dir, extension)?;
    if sources.is_empty() {
        println!(
            "{}",
            style(format!("No .{extension} files found in the specified folder.")).yellow()
        );
        return Ok(BatchReport::default());
    }

    println!("Found {} .{} files. Processing...\n", sources.len(), extension);

    let report = if config.parallel {
        run_parallel(&sources, config, running)
    } else {
        run_sequential(&sources, config, running)
    };

    println!(
        "\nFinished processing {} files: {} bitmaps, {} failed.",
        report.processed.len(),
        report.total_images(),
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        println!("  {} {}: {}", style("failed").red(), path.display(), reason);
    }
    Ok(report)
}

fn run_sequential(sources: &[PathBuf], config: &AppConfig, running: &AtomicBool) -> BatchReport {
    let mut report = BatchReport::default();

    for (i, source) in sources.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        println!(
            "Processing file {} of {}: {}",
            i + 1,
            sources.len(),
            style(display_name(source)).bold()
        );
        match process_file(source, config, running) {
            Ok(file_report) => {
                print_report(&file_report);
                report.processed.push(file_report);
            }
            Err(e) => {
                println!("{} {:#}", style("Error:").red(), e);
                report.failed.push((source.clone(), format!("{e:#}")));
            }
        }
        println!();
    }
    report
}

fn run_parallel(sources: &[PathBuf], config: &AppConfig, running: &AtomicBool) -> BatchReport {
    let config = AppConfig {
        quiet: true,
        ..config.clone()
    };

    let pb = ProgressBar::new(sources.len() as u64);
    if let Ok(progress_style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
    {
        pb.set_style(progress_style.progress_chars("##-"));
    }

    let outcomes: Vec<(PathBuf, Result<FileReport>)> = sources
        .par_iter()
        .filter(|_| running.load(Ordering::SeqCst))
        .map(|source| {
            let outcome = process_file(source, &config, running);
            match &outcome {
                Ok(r) => pb.println(format!("{}: {} bitmaps", display_name(source), r.written)),
                Err(e) => pb.println(format!(
                    "{}: {} {:#}",
                    display_name(source),
                    style("error").red(),
                    e
                )),
            }
            pb.inc(1);
            (source.clone(), outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut report = BatchReport::default();
    for (source, outcome) in outcomes {
        match outcome {
            Ok(file_report) => report.processed.push(file_report),
            Err(e) => report.failed.push((source, format!("{e:#}"))),
        }
    }
    report
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
