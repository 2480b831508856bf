use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "lib";
const OUTPUT_SUFFIX: &str = "_extracted";

/// Settings shared by every source processed in one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Parent for the per-source output folders; defaults to each source's
    /// own folder.
    pub output_root: Option<PathBuf>,
    pub verify: bool,
    pub manifest: bool,
    pub parallel: bool,
    /// Quiets per-image lines; parallel batches set this.
    pub quiet: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            verify: true,
            manifest: false,
            parallel: false,
            quiet: false,
        }
    }
}

impl AppConfig {
    /// `<root>/<stem>_extracted`, where root is the configured output root or
    /// the folder holding `source`.
    pub fn output_dir_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string());

        let root = match &self.output_root {
            Some(root) => root.clone(),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        root.join(format!("{stem}{OUTPUT_SUFFIX}"))
    }
}

/// Case-insensitive extension check; a leading dot in `extension` is ignored.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}
