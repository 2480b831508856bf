//! bmpcarve - pull embedded bitmaps out of game archive files.

mod batch;
mod config;
mod extract;
mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, DEFAULT_EXTENSION};

#[derive(Parser, Debug)]
#[command(name = "bmpcarve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract embedded BMP images from archive files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Parent folder for the `<name>_extracted` output folders
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Skip decoding extracted images
    #[arg(long, global = true)]
    no_verify: bool,

    /// Write manifest.json with offsets and SHA-256 hashes
    #[arg(long, global = true)]
    manifest: bool,

    /// Process folder files in parallel
    #[arg(long, global = true)]
    parallel: bool,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single file
    File { path: PathBuf },

    /// Process every matching file in a folder
    Dir {
        dir: PathBuf,

        #[arg(long, default_value = DEFAULT_EXTENSION)]
        ext: String,
    },
}

impl Cli {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            output_root: self.output.clone(),
            verify: !self.no_verify,
            manifest: self.manifest,
            parallel: self.parallel,
            quiet: false,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let config = cli.app_config();
    match cli.command {
        Some(Command::File { path }) => run_single(path, &config, &running),
        Some(Command::Dir { dir, ext }) => run_folder(dir, &ext, &config, &running),
        None => run_interactive_menu(&config, &running),
    }
}

fn run_single(path: PathBuf, config: &AppConfig, running: &AtomicBool) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let report = extract::process_file(&path, config, running)?;
    extract::print_report(&report);
    Ok(())
}

fn run_folder(
    dir: PathBuf,
    extension: &str,
    config: &AppConfig,
    running: &AtomicBool,
) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Folder not found: {}", dir.display());
    }

    let report = batch::run_batch(&dir, extension, config, running)?;
    if report.interrupted() || !running.load(Ordering::SeqCst) {
        println!("{}", style("Stopped by user; files already written were kept.").yellow());
    }
    Ok(())
}

fn run_interactive_menu(config: &AppConfig, running: &AtomicBool) -> Result<()> {
    println!("{}", style("bmpcarve - embedded bitmap extractor").cyan().bold());
    println!("{}", "-".repeat(36));

    let theme = ColorfulTheme::default();
    let options = [
        format!("Process a single .{DEFAULT_EXTENSION} file"),
        format!("Process all .{DEFAULT_EXTENSION} files in a folder"),
    ];

    let selection = Select::with_theme(&theme)
        .with_prompt("Select an option")
        .items(&options)
        .default(0)
        .interact()
        .context("Failed to show interactive selection")?;

    match selection {
        0 => {
            let path: String = Input::with_theme(&theme)
                .with_prompt(format!("Path to the .{DEFAULT_EXTENSION} file"))
                .interact_text()
                .context("Failed to read file path")?;
            run_single(PathBuf::from(path.trim()), config, running)
        }
        _ => {
            let dir: String = Input::with_theme(&theme)
                .with_prompt(format!("Folder containing .{DEFAULT_EXTENSION} files"))
                .interact_text()
                .context("Failed to read folder path")?;
            run_folder(PathBuf::from(dir.trim()), DEFAULT_EXTENSION, config, running)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_command_with_global_flags() {
        let cli = Cli::try_parse_from([
            "bmpcarve",
            "file",
            "ui.lib",
            "--no-verify",
            "--manifest",
            "-o",
            "out",
        ])
        .unwrap();

        let config = cli.app_config();
        assert!(!config.verify);
        assert!(config.manifest);
        assert_eq!(config.output_root, Some(PathBuf::from("out")));
        match cli.command {
            Some(Command::File { path }) => assert_eq!(path, PathBuf::from("ui.lib")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dir_command_defaults_to_lib() {
        let cli = Cli::try_parse_from(["bmpcarve", "--parallel", "dir", "assets"]).unwrap();
        assert!(cli.app_config().parallel);
        match cli.command {
            Some(Command::Dir { dir, ext }) => {
                assert_eq!(dir, PathBuf::from("assets"));
                assert_eq!(ext, "lib");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_command_means_menu() {
        let cli = Cli::try_parse_from(["bmpcarve", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
        assert!(cli.app_config().verify);
    }

    #[test]
    fn verify_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
