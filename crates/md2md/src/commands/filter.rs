//! `md2md <FILES>...` implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use md2md_config::{CliSettings, Config, FilterConfig};
use md2md_filter::{Filter, FilterOptions, ImageOptions};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for filtering Markdown files.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct FilterArgs {
    /// Markdown files to filter (must end in `.md`).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Remove backticks bracketing inline math.
    #[arg(long, alias = "backtick_off")]
    backtick_off: bool,

    /// Wrap block math with backticks.
    #[arg(long, alias = "backtick_on")]
    backtick_on: bool,

    /// Convert indented code blocks to fenced blocks.
    #[arg(long)]
    fence: bool,

    /// Keep annotation lines.
    #[arg(long, alias = "keep_annotation")]
    keep_annotation: bool,

    /// Remove all answers.
    #[arg(long)]
    noanswers: bool,

    /// Remove all fenced code.
    #[arg(long)]
    nocode: bool,

    /// Remove concepts lists.
    #[arg(long)]
    noconcepts: bool,

    /// Retain code blocks only.
    #[arg(long)]
    nomarkup: bool,

    /// Remove notes.
    #[arg(long)]
    nonotes: bool,

    /// Suppress horizontal rules separating slides.
    #[arg(long)]
    norule: bool,

    /// Convert fenced code blocks to indented blocks.
    #[arg(long)]
    unfence: bool,

    /// Image processing: (check|copy|import|export)[,embed,web,gather_images].
    #[arg(long)]
    images: Option<String>,

    /// Image subdirectory (default: "images").
    #[arg(long)]
    imagedir: Option<String>,

    /// Destination directory for created image files.
    #[arg(long)]
    destdir: Option<PathBuf>,

    /// Suffix for output filenames (default: "-filtered").
    #[arg(long)]
    suffix: Option<String>,

    /// Overwrite existing files.
    #[arg(long)]
    overwrite: bool,

    /// Process everything but write no files.
    #[arg(long)]
    dry_run: bool,

    /// Path to configuration file (default: auto-discover md2md.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

/// One input file and where its output goes.
#[derive(Debug, PartialEq, Eq)]
struct Job {
    input: PathBuf,
    output: PathBuf,
}

impl FilterArgs {
    pub(crate) fn verbose(&self) -> bool {
        self.verbose
    }

    /// Filter every input file.
    ///
    /// All output names are checked before any file is processed.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let options = filter_options(&config)?.with_dry_run(self.dry_run);

        let cwd = std::env::current_dir()?;
        let jobs = plan_jobs(&self.files, &cwd, &config.output.suffix, options.overwrite)?;

        let mut filter = Filter::new(options);
        for job in &jobs {
            tracing::debug!("filtering {}", job.input.display());
            let text = fs::read_to_string(&job.input)?;
            let result = filter.run(&text, Some(&job.input))?;

            for diagnostic in &result.diagnostics {
                output.diagnostic(diagnostic);
            }

            let name = display_name(&job.output);
            if self.dry_run {
                output.info(&format!("Would create {name}"));
            } else {
                fs::write(&job.output, result.text)?;
                output.success(&format!("Created {name}"));
            }
        }

        if self.dry_run {
            output.highlight("\n[DRY RUN] No files written.");
        }
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            filter: FilterConfig {
                backtick_off: self.backtick_off,
                backtick_on: self.backtick_on,
                fence: self.fence,
                keep_annotation: self.keep_annotation,
                noanswers: self.noanswers,
                nocode: self.nocode,
                noconcepts: self.noconcepts,
                nomarkup: self.nomarkup,
                nonotes: self.nonotes,
                norule: self.norule,
                unfence: self.unfence,
            },
            images: self.images.clone(),
            imagedir: self.imagedir.clone(),
            destdir: self.destdir.clone(),
            suffix: self.suffix.clone(),
            overwrite: self.overwrite.then_some(true),
        }
    }
}

/// Build filter options from the merged configuration.
fn filter_options(config: &Config) -> Result<FilterOptions, CliError> {
    let flags = &config.filter;
    let mut options = FilterOptions {
        backtick_off: flags.backtick_off,
        backtick_on: flags.backtick_on,
        fence: flags.fence,
        keep_annotation: flags.keep_annotation,
        noanswers: flags.noanswers,
        nocode: flags.nocode,
        noconcepts: flags.noconcepts,
        nomarkup: flags.nomarkup,
        nonotes: flags.nonotes,
        norule: flags.norule,
        unfence: flags.unfence,
        ..FilterOptions::default()
    }
    .with_images(ImageOptions::parse(&config.images.options)?)
    .with_imagedir(config.images.imagedir.clone())
    .with_overwrite(config.output.overwrite);

    if let Some(destdir) = &config.destdir_resolved {
        options = options.with_destdir(destdir.clone());
    }
    Ok(options)
}

/// Map inputs to `<stem><suffix>.md` in `out_dir`.
///
/// Fails if an input lacks the `.md` extension, or if an output already
/// exists and overwriting is not allowed.
fn plan_jobs(
    files: &[PathBuf],
    out_dir: &Path,
    suffix: &str,
    overwrite: bool,
) -> Result<Vec<Job>, CliError> {
    files
        .iter()
        .map(|input| {
            if input.extension().and_then(|ext| ext.to_str()) != Some("md") {
                return Err(CliError::Validation(format!(
                    "Invalid file extension for {}",
                    input.display()
                )));
            }
            let stem = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = out_dir.join(format!("{stem}{suffix}.md"));

            if output.exists() && !overwrite {
                return Err(CliError::Validation(format!(
                    "File {} already exists. Delete it or specify --overwrite",
                    display_name(&output)
                )));
            }
            Ok(Job {
                input: input.clone(),
                output,
            })
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
