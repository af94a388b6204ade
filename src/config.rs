//! Build configuration.
//!
//! Everything a run needs is collected into one [`BuildConfig`] value that
//! is passed explicitly to each stage. Nothing reads global state.
//!
//! ## Sources
//!
//! Lowest to highest precedence:
//!
//! 1. Stock defaults (no destination directory, no assets, `template.html`).
//! 2. An optional TOML file passed with `--config`.
//! 3. Command-line flags.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # destdir = "site"        # Flatten all pages into this directory
//! # assetdir = "assets"     # Mirror this tree under destdir
//! tmplfile = "template.html"
//! quiet = false
//!
//! [processing]
//! # max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Every key is optional: anything the file leaves out takes its default
//! value, so it only needs the values it changes. Unknown keys are rejected
//! to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default template file, relative to the working directory.
pub const DEFAULT_TEMPLATE: &str = "template.html";

/// Contents of a `--config` TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Flatten all generated pages into this directory.
    pub destdir: Option<PathBuf>,
    /// Mirror every non-hidden file under this directory into `destdir`.
    pub assetdir: Option<PathBuf>,
    /// Page template.
    pub tmplfile: PathBuf,
    /// Suppress informational logging.
    pub quiet: bool,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            destdir: None,
            assetdir: None,
            tmplfile: PathBuf::from(DEFAULT_TEMPLATE),
            quiet: false,
            processing: ProcessingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tmplfile.as_os_str().is_empty() {
            return Err(ConfigError::Validation("tmplfile must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Documents to start discovery from.
    pub roots: Vec<PathBuf>,
    /// When set, pages are flattened into this directory (basename only)
    /// and assets are mirrored under it.
    pub dest_dir: Option<PathBuf>,
    pub asset_dir: Option<PathBuf>,
    pub template: PathBuf,
    /// Suppress informational logging. Has no effect on outputs.
    pub quiet: bool,
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    /// Stock settings for the given roots.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::from_file(roots, FileConfig::default())
    }

    pub fn from_file(roots: Vec<PathBuf>, file: FileConfig) -> Self {
        Self {
            roots,
            dest_dir: file.destdir,
            asset_dir: file.assetdir,
            template: file.tmplfile,
            quiet: file.quiet,
            processing: file.processing,
        }
    }

    /// Root of the asset mirror: the destination directory, or the working
    /// directory when pages are written next to their sources.
    pub fn asset_dest_root(&self) -> &Path {
        self.dest_dir.as_deref().unwrap_or(Path::new("."))
    }
}

// =============================================================================
// Config loading
// =============================================================================

/// Load and validate a config file.
///
/// Unlike discovery of optional files, the path here was asked for
/// explicitly, so a missing file is an error.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: FileConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = FileConfig::default();
        assert_eq!(config.destdir, None);
        assert_eq!(config.assetdir, None);
        assert_eq!(config.tmplfile, PathBuf::from("template.html"));
        assert!(!config.quiet);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn build_config_from_file() {
        let file = FileConfig {
            destdir: Some("site".into()),
            quiet: true,
            ..FileConfig::default()
        };
        let config = BuildConfig::from_file(vec!["README.md".into()], file);
        assert_eq!(config.roots, vec![PathBuf::from("README.md")]);
        assert_eq!(config.dest_dir, Some(PathBuf::from("site")));
        assert!(config.quiet);
        assert_eq!(config.asset_dest_root(), Path::new("site"));
    }

    #[test]
    fn asset_root_defaults_to_working_dir() {
        let config = BuildConfig::new(vec![]);
        assert_eq!(config.asset_dest_root(), Path::new("."));
    }

    // =========================================================================
    // load_file_config tests
    // =========================================================================

    #[test]
    fn load_partial_config_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "destdir = \"public\"\n").unwrap();

        let config = load_file_config(&path).unwrap();
        assert_eq!(config.destdir, Some(PathBuf::from("public")));
        // Unspecified values should be defaults
        assert_eq!(config.tmplfile, PathBuf::from("template.html"));
        assert!(!config.quiet);
    }

    #[test]
    fn load_empty_file_is_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_file_config(&path).unwrap(), FileConfig::default());
    }

    #[test]
    fn load_partial_nested_table_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "quiet = true\n\n[processing]\n").unwrap();

        let config = load_file_config(&path).unwrap();
        assert!(config.quiet);
        assert_eq!(config.tmplfile, PathBuf::from(DEFAULT_TEMPLATE));
        assert_eq!(config.processing, ProcessingConfig::default());
    }

    #[test]
    fn load_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(
            &path,
            r#"
destdir = "public"
assetdir = "static"
tmplfile = "layout.html"
quiet = true

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_file_config(&path).unwrap();
        assert_eq!(config.assetdir, Some(PathBuf::from("static")));
        assert_eq!(config.tmplfile, PathBuf::from("layout.html"));
        assert!(config.quiet);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_file_config(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        assert!(matches!(load_file_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "dest_dir = \"typo\"\n").unwrap();

        let err = load_file_config(&path).unwrap_err().to_string();
        assert!(err.contains("unknown field"), "{err}");
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let toml_str = r#"
[processing]
max_procs = 2
"#;
        let result: Result<FileConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn zero_processes_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mdpub.toml");
        fs::write(&path, "[processing]\nmax_processes = 0\n").unwrap();

        assert!(matches!(
            load_file_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
