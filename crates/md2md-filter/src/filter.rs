//! Filter entry point.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostic;
use crate::error::FilterError;
use crate::fetch::{HttpClient, LinkFetcher};
use crate::label::LabelGenerator;
use crate::options::FilterOptions;
use crate::scan::Scanner;
use crate::session::Session;
use crate::writer::FileWriter;

/// Result of a successful filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    /// Filtered Markdown.
    pub text: String,
    /// Diagnostics in the order they were produced.
    pub diagnostics: Vec<Diagnostic>,
}

/// Slide Markdown filter.
///
/// One `Filter` can process any number of documents; reference state is
/// scoped to a single [`run`](Self::run).
///
/// # Example
///
/// ```
/// use md2md_filter::{Filter, FilterOptions};
///
/// let options = FilterOptions {
///     noanswers: true,
///     ..FilterOptions::default()
/// };
/// let mut filter = Filter::new(options);
/// let output = filter.run("Question?\nAnswer: 42\n", None).unwrap();
/// assert_eq!(output.text, "Question?\n");
/// ```
pub struct Filter {
    options: FilterOptions,
    fetcher: LinkFetcher,
    writer: FileWriter,
    labels: LabelGenerator,
}

impl Filter {
    /// Create a filter with the default HTTP client and random labels.
    #[must_use]
    pub fn new(options: FilterOptions) -> Self {
        let writer = FileWriter::new(options.overwrite).dry_run(options.dry_run);
        Self {
            options,
            fetcher: LinkFetcher::default(),
            writer,
            labels: LabelGenerator::default(),
        }
    }

    /// Use a different HTTP transport for web images.
    #[must_use]
    pub fn with_http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.fetcher = LinkFetcher::new(client);
        self
    }

    /// Use a specific label generator (e.g. a seeded one).
    #[must_use]
    pub fn with_labels(mut self, labels: LabelGenerator) -> Self {
        self.labels = labels;
        self
    }

    /// Options this filter was created with.
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Filter one document.
    ///
    /// `source` is the path of the document, used to resolve relative image
    /// links; without it links resolve against the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::WriteConflict`] if an asset would overwrite a
    /// different existing file. No output is produced in that case. All other
    /// problems are reported as diagnostics.
    pub fn run(&mut self, text: &str, source: Option<&Path>) -> Result<FilterOutput, FilterError> {
        let text = normalize_newlines(text);
        let base_dir = source
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut session = Session::new(
            &self.options,
            &self.fetcher,
            &self.writer,
            &mut self.labels,
            base_dir,
        );

        if self.options.images.is_active() {
            session.prescan(&text)?;
        }
        let mut output = Scanner::new(&mut session).run(&text)?;
        session.finish(&mut output);

        Ok(FilterOutput {
            text: output,
            diagnostics: session.into_diagnostics().into_vec(),
        })
    }
}

/// Convert CRLF and lone CR line endings to LF.
fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}
