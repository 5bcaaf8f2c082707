//! Markdown-to-Markdown filter for slide documents.
//!
//! The filter reads slide-oriented Markdown and writes Markdown with selected
//! content removed or transformed:
//! - Directive lines (`Annotation:`, `Answer:`, `Concepts:`, `Notes:`) are dropped on request
//! - Code blocks can be removed, fenced or unfenced
//! - Math can be wrapped in or unwrapped from backticks
//! - Images can be checked, copied, imported as data URLs, exported to files,
//!   or embedded as `<img>` tags
//!
//! # Architecture
//!
//! - [`options`](FilterOptions): options and image token parsing
//! - `block`: fenced/indented code, math, LaTeX environments, rules
//! - `line`: line classification and reference definitions
//! - `inline`: single-pass tokenizer and link rewriting
//! - `session`: per-document references, diagnostics and image operations
//! - [`fetch`](LinkFetcher): data URL, file and HTTP retrieval
//! - [`writer`](FileWriter): overwrite-guarded file creation
//!
//! # Example
//!
//! ```
//! use md2md_filter::{Filter, FilterOptions, ImageOptions};
//!
//! let options = FilterOptions::default().with_images(ImageOptions::parse("embed")?);
//! let mut filter = Filter::new(options);
//!
//! let output = filter.run("![Logo][logo]\n\n[logo]: logo.png\n", None)?;
//! assert_eq!(output.text, "<img src=\"logo.png\" alt=\"Logo\">\n\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod block;
mod diagnostics;
mod error;
mod fetch;
mod filter;
mod html;
mod inline;
mod label;
mod line;
mod link;
mod options;
mod registry;
mod scan;
mod session;
mod writer;

pub use diagnostics::{Diagnostic, Severity};
pub use error::{FetchError, FilterError, OptionsError, WriteError};
pub use fetch::{
    DEFAULT_TIMEOUT, HttpClient, HttpResponse, LinkContent, LinkData, LinkFetcher, Retrieval,
    UreqClient, data_url,
};
pub use filter::{Filter, FilterOutput};
pub use html::{img_tag, tag_attribute};
pub use label::LabelGenerator;
pub use line::RefDefinition;
pub use link::{LinkScheme, make_id_from_text, quote_pad_title, ref_key};
pub use options::{DEFAULT_IMAGEDIR, FilterOptions, ImageMode, ImageOptions};
pub use registry::{RefRegistry, RefTarget};
pub use writer::{FileWriter, WriteOutcome};
