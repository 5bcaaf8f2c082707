//! Filter options.
//!
//! [`FilterOptions`] is the immutable snapshot handed to a [`Filter`](crate::Filter).
//! Image handling is configured through [`ImageOptions`], parsed from a
//! comma-separated token list such as `"import,embed,web"`. At most one of the
//! mode tokens (`check`, `copy`, `import`, `export`) may appear; the modifiers
//! `embed`, `web` and `gather_images` combine freely with any mode.

use std::fmt;
use std::path::PathBuf;

use crate::error::OptionsError;

/// Default subdirectory for copied and exported images.
pub const DEFAULT_IMAGEDIR: &str = "images";

/// Mutually exclusive image processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Verify that images exist (HEAD request or file check), never rewrite.
    Check,
    /// Copy images to a new location and rewrite links to the copy.
    Copy,
    /// Embed images as data URLs in reference definitions.
    Import,
    /// Write data-URL definitions out to image files.
    Export,
}

impl ImageMode {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "check" => Some(Self::Check),
            "copy" => Some(Self::Copy),
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            _ => None,
        }
    }

    /// Token used for this mode on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Copy => "copy",
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image processing mode plus modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Selected mode, if any.
    pub mode: Option<ImageMode>,
    /// Rewrite image references to inline `<img>` tags.
    pub embed: bool,
    /// Allow HTTP(S) images to be fetched.
    pub web: bool,
    /// Flatten copied images into the image directory.
    pub gather_images: bool,
}

impl ImageOptions {
    /// Parse a comma-separated token list.
    ///
    /// Empty tokens are ignored, so `""` yields inactive options.
    ///
    /// # Examples
    ///
    /// ```
    /// use md2md_filter::{ImageMode, ImageOptions};
    ///
    /// let options = ImageOptions::parse("import,embed").unwrap();
    /// assert_eq!(options.mode, Some(ImageMode::Import));
    /// assert!(options.embed);
    /// assert!(ImageOptions::parse("check,copy").is_err());
    /// ```
    pub fn parse(tokens: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        for token in tokens.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "embed" => options.embed = true,
                "web" => options.web = true,
                "gather_images" => options.gather_images = true,
                _ => {
                    let mode = ImageMode::from_token(token)
                        .ok_or_else(|| OptionsError::UnknownImageToken(token.to_owned()))?;
                    match options.mode {
                        Some(existing) if existing != mode => {
                            return Err(OptionsError::MultipleModes {
                                first: existing,
                                second: mode,
                            });
                        }
                        _ => options.mode = Some(mode),
                    }
                }
            }
        }

        Ok(options)
    }

    /// Whether any image token was given.
    ///
    /// The reference pre-scan only runs when this is true.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode.is_some() || self.embed || self.web || self.gather_images
    }

    /// Whether the given mode is selected.
    #[must_use]
    pub fn is(&self, mode: ImageMode) -> bool {
        self.mode == Some(mode)
    }
}

/// Options controlling a filter run.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct FilterOptions {
    /// Unwrap inline math written as `` `$...$` `` into bare `$...$`.
    pub backtick_off: bool,
    /// Wrap `$$...$$` block math in backticks.
    pub backtick_on: bool,
    /// Destination directory prefix for written files.
    pub destdir: Option<PathBuf>,
    /// Convert indented code blocks to fenced blocks.
    pub fence: bool,
    /// Image subdirectory used in rewritten links (empty for none).
    pub imagedir: String,
    /// Image processing mode and modifiers.
    pub images: ImageOptions,
    /// Keep `Annotation:` lines.
    pub keep_annotation: bool,
    /// Drop `Answer:`/`Ans:` lines.
    pub noanswers: bool,
    /// Drop fenced code blocks.
    pub nocode: bool,
    /// Drop `Concepts:` lines.
    pub noconcepts: bool,
    /// Drop everything except code blocks.
    pub nomarkup: bool,
    /// Drop `Notes:` and everything after it up to the next rule.
    pub nonotes: bool,
    /// Drop horizontal rules.
    pub norule: bool,
    /// Allow overwriting existing files with different content.
    pub overwrite: bool,
    /// Convert fenced code blocks to indented blocks.
    pub unfence: bool,
    /// Validate file writes without touching disk.
    pub dry_run: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            backtick_off: false,
            backtick_on: false,
            destdir: None,
            fence: false,
            imagedir: DEFAULT_IMAGEDIR.to_owned(),
            images: ImageOptions::default(),
            keep_annotation: false,
            noanswers: false,
            nocode: false,
            noconcepts: false,
            nomarkup: false,
            nonotes: false,
            norule: false,
            overwrite: false,
            unfence: false,
            dry_run: false,
        }
    }
}

impl FilterOptions {
    /// Set image options.
    #[must_use]
    pub fn with_images(mut self, images: ImageOptions) -> Self {
        self.images = images;
        self
    }

    /// Set the destination directory for written files.
    #[must_use]
    pub fn with_destdir(mut self, destdir: impl Into<PathBuf>) -> Self {
        self.destdir = Some(destdir.into());
        self
    }

    /// Set the image subdirectory.
    #[must_use]
    pub fn with_imagedir(mut self, imagedir: impl Into<String>) -> Self {
        self.imagedir = imagedir.into();
        self
    }

    /// Allow overwriting existing files.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate writes without touching disk.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Prefix `path` with the image directory, if one is set.
    pub(crate) fn in_imagedir(&self, path: &str) -> String {
        if self.imagedir.is_empty() {
            path.to_owned()
        } else {
            format!("{}/{path}", self.imagedir)
        }
    }

    /// Prefix `path` with the destination directory, if one is set.
    pub(crate) fn in_destdir(&self, path: &str) -> PathBuf {
        match &self.destdir {
            Some(destdir) if !destdir.as_os_str().is_empty() => destdir.join(path),
            _ => PathBuf::from(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_inactive() {
        let options = ImageOptions::parse("").unwrap();
        assert_eq!(options, ImageOptions::default());
        assert!(!options.is_active());
    }

    #[test]
    fn test_parse_mode_and_modifiers() {
        let options = ImageOptions::parse("copy, gather_images,web").unwrap();
        assert_eq!(options.mode, Some(ImageMode::Copy));
        assert!(options.gather_images);
        assert!(options.web);
        assert!(!options.embed);
        assert!(options.is(ImageMode::Copy));
        assert!(!options.is(ImageMode::Import));
    }

    #[test]
    fn test_parse_embed_only_is_active() {
        let options = ImageOptions::parse("embed").unwrap();
        assert_eq!(options.mode, None);
        assert!(options.is_active());
    }

    #[test]
    fn test_parse_repeated_mode_is_allowed() {
        let options = ImageOptions::parse("export,export").unwrap();
        assert_eq!(options.mode, Some(ImageMode::Export));
    }

    #[test]
    fn test_parse_multiple_modes_rejected() {
        let err = ImageOptions::parse("import,export").unwrap_err();
        assert!(matches!(
            err,
            OptionsError::MultipleModes {
                first: ImageMode::Import,
                second: ImageMode::Export
            }
        ));
        assert!(err.to_string().contains("check|copy|import|export"));
    }

    #[test]
    fn test_parse_unknown_token_rejected() {
        let err = ImageOptions::parse("copy,inline").unwrap_err();
        assert!(matches!(err, OptionsError::UnknownImageToken(ref t) if t == "inline"));
    }

    #[test]
    fn test_default_imagedir() {
        let options = FilterOptions::default();
        assert_eq!(options.imagedir, "images");
        assert_eq!(options.in_imagedir("a.png"), "images/a.png");
        assert_eq!(options.in_destdir("images/a.png"), PathBuf::from("images/a.png"));
    }

    #[test]
    fn test_empty_imagedir_and_destdir() {
        let options = FilterOptions::default()
            .with_imagedir("")
            .with_destdir("/out");
        assert_eq!(options.in_imagedir("a.png"), "a.png");
        assert_eq!(options.in_destdir("a.png"), PathBuf::from("/out/a.png"));
    }
}
