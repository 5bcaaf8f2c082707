//! Configuration management for md2md.
//!
//! Parses `md2md.toml` with serde and discovers it in the current directory
//! or its parents. Command-line values are applied on top via [`CliSettings`].
//!
//! ```toml
//! [filter]
//! nonotes = true
//! noanswers = true
//!
//! [images]
//! options = "copy,gather_images"
//! imagedir = "figures"
//! destdir = "${SLIDES_OUT:-build}"
//!
//! [output]
//! suffix = "-student"
//! overwrite = false
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `images.imagedir` and `images.destdir` support a leading `~`, `${VAR}`
//! and `${VAR:-default}`. A relative `destdir` from a config file resolves
//! against the directory containing that file.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "md2md.toml";

/// Default suffix appended to output file stems.
pub const DEFAULT_SUFFIX: &str = "-filtered";

/// Default image subdirectory.
pub const DEFAULT_IMAGEDIR: &str = "images";

/// CLI settings that override configuration file values.
///
/// Filter flags can only switch options on; everything else replaces the
/// file value when set.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Filter flags given on the command line.
    pub filter: FilterConfig,
    /// Image token list.
    pub images: Option<String>,
    /// Image subdirectory.
    pub imagedir: Option<String>,
    /// Destination directory.
    pub destdir: Option<PathBuf>,
    /// Output filename suffix.
    pub suffix: Option<String>,
    /// Allow overwriting existing files.
    pub overwrite: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content filter switches.
    pub filter: FilterConfig,
    /// Image handling.
    pub images: ImagesConfig,
    /// Output file naming.
    pub output: OutputConfig,

    /// Resolved destination directory (set after loading).
    #[serde(skip)]
    pub destdir_resolved: Option<PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Content filter switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FilterConfig {
    /// Unwrap `` `$...$` `` inline math.
    pub backtick_off: bool,
    /// Wrap `$$...$$` block math in backticks.
    pub backtick_on: bool,
    /// Convert indented code to fenced code.
    pub fence: bool,
    /// Keep `Annotation:` lines.
    pub keep_annotation: bool,
    /// Drop `Answer:` lines.
    pub noanswers: bool,
    /// Drop fenced code.
    pub nocode: bool,
    /// Drop `Concepts:` lines.
    pub noconcepts: bool,
    /// Keep only code.
    pub nomarkup: bool,
    /// Drop notes sections.
    pub nonotes: bool,
    /// Drop horizontal rules.
    pub norule: bool,
    /// Convert fenced code to indented code.
    pub unfence: bool,
}

impl FilterConfig {
    /// Switch on every option set in `other`.
    fn enable_from(&mut self, other: &Self) {
        self.backtick_off |= other.backtick_off;
        self.backtick_on |= other.backtick_on;
        self.fence |= other.fence;
        self.keep_annotation |= other.keep_annotation;
        self.noanswers |= other.noanswers;
        self.nocode |= other.nocode;
        self.noconcepts |= other.noconcepts;
        self.nomarkup |= other.nomarkup;
        self.nonotes |= other.nonotes;
        self.norule |= other.norule;
        self.unfence |= other.unfence;
    }
}

/// Image handling configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Comma-separated image tokens (`check|copy|import|export`, `embed`, `web`, `gather_images`).
    pub options: String,
    /// Subdirectory used in rewritten image links.
    pub imagedir: String,
    /// Directory that written files are placed under (empty for none).
    pub destdir: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            options: String::new(),
            imagedir: DEFAULT_IMAGEDIR.to_owned(),
            destdir: String::new(),
        }
    }
}

/// Output naming configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Suffix appended to the input stem.
    pub suffix: String,
    /// Allow overwriting existing files.
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_owned(),
            overwrite: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. `images.destdir`).
        field: String,
        /// Error message (e.g. `${SLIDES_OUT} not set`).
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `md2md.toml` in the current directory and parents,
    /// falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        self.filter.enable_from(&settings.filter);
        if let Some(images) = &settings.images {
            self.images.options.clone_from(images);
        }
        if let Some(imagedir) = &settings.imagedir {
            self.images.imagedir.clone_from(imagedir);
        }
        if let Some(destdir) = &settings.destdir {
            self.destdir_resolved = Some(destdir.clone());
        }
        if let Some(suffix) = &settings.suffix {
            self.output.suffix.clone_from(suffix);
        }
        if let Some(overwrite) = settings.overwrite {
            self.output.overwrite = overwrite;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_paths()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let suffix = &self.output.suffix;
        if suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix cannot be empty".to_owned(),
            ));
        }
        if suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "output.suffix cannot contain a path separator: {suffix}"
            )));
        }
        Ok(())
    }

    /// Expand `~` and environment variable references in path settings.
    fn expand_paths(&mut self) -> Result<(), ConfigError> {
        self.images.imagedir = expand::expand_path(&self.images.imagedir, "images.imagedir")?;
        self.images.destdir = expand::expand_path(&self.images.destdir, "images.destdir")?;
        Ok(())
    }

    /// Resolve a relative `destdir` against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.destdir_resolved =
            (!self.images.destdir.is_empty()).then(|| config_dir.join(&self.images.destdir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filter, FilterConfig::default());
        assert_eq!(config.images.options, "");
        assert_eq!(config.images.imagedir, "images");
        assert_eq!(config.output.suffix, "-filtered");
        assert!(!config.output.overwrite);
        assert!(config.destdir_resolved.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.images.imagedir, "images");
        assert_eq!(config.output.suffix, "-filtered");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[filter]
nonotes = true
noanswers = true
unfence = true

[images]
options = "copy,gather_images"
imagedir = "figs"
destdir = "build"

[output]
suffix = "-student"
overwrite = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.filter.nonotes);
        assert!(config.filter.noanswers);
        assert!(config.filter.unfence);
        assert!(!config.filter.nocode);
        assert_eq!(config.images.options, "copy,gather_images");
        assert_eq!(config.images.imagedir, "figs");
        assert_eq!(config.images.destdir, "build");
        assert_eq!(config.output.suffix, "-student");
        assert!(config.output.overwrite);
    }

    #[test]
    fn test_resolve_destdir_relative_to_config() {
        let mut config: Config = toml::from_str("[images]\ndestdir = \"out\"\n").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.destdir_resolved, Some(PathBuf::from("/project/out")));
    }

    #[test]
    fn test_empty_destdir_stays_unset() {
        let mut config = Config::default();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.destdir_resolved, None);
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("md2md.toml");
        std::fs::write(&path, "[images]\noptions = \"import\"\ndestdir = \"assets\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.images.options, "import");
        assert_eq!(config.destdir_resolved, Some(tmp.path().join("assets")));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/md2md.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("md2md.toml");
        std::fs::write(&path, "[filter]\nnonotes = \"yes\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.filter.nocode = true;
        let settings = CliSettings {
            filter: FilterConfig {
                nonotes: true,
                ..FilterConfig::default()
            },
            images: Some("export".to_owned()),
            destdir: Some(PathBuf::from("/tmp/out")),
            overwrite: Some(true),
            ..CliSettings::default()
        };

        config.apply_cli_settings(&settings);

        assert!(config.filter.nocode);
        assert!(config.filter.nonotes);
        assert_eq!(config.images.options, "export");
        assert_eq!(config.images.imagedir, "images");
        assert_eq!(config.destdir_resolved, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.output.suffix, "-filtered");
        assert!(config.output.overwrite);
    }

    #[test]
    fn test_validate_suffix() {
        let mut config = Config::default();
        config.output.suffix = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.output.suffix = "/x".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("path separator"));
    }
}
