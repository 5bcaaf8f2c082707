//! Link data retrieval.
//!
//! [`LinkFetcher`] classifies a link by [`LinkScheme`] and retrieves its
//! content from a data URL, over HTTP, or from the filesystem. Content is
//! returned either as raw bytes or re-encoded as a base64 data URL.
//!
//! HTTP goes through the [`HttpClient`] trait; [`UreqClient`] is the
//! production implementation.

use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use ureq::Agent;

use crate::error::FetchError;
use crate::link::{LinkScheme, basename};

/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static DATA_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:([^;]+/[^;]+);base64,(.*)$").expect("invalid data URL regex")
});

/// What to retrieve for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    /// Existence check only (HEAD request or file check); content stays empty.
    CheckOnly,
    /// Raw bytes.
    Raw,
    /// Base64 `data:` URL string.
    DataUrl,
}

/// Retrieved content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkContent {
    /// Nothing retrieved.
    Empty,
    /// Raw bytes.
    Raw(Vec<u8>),
    /// Data URL string.
    DataUrl(String),
}

impl LinkContent {
    /// Whether no data was retrieved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Raw(bytes) => bytes.is_empty(),
            Self::DataUrl(url) => url.is_empty(),
        }
    }

    /// Content as bytes (data URLs as their text).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Raw(bytes) => bytes,
            Self::DataUrl(url) => url.as_bytes(),
        }
    }
}

/// Result of retrieving a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    /// Basename of the link target (empty for data URLs).
    pub filename: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Retrieved content.
    pub content: LinkContent,
}

impl LinkData {
    fn empty(filename: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            content: LinkContent::Empty,
        }
    }
}

/// Response from an [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// Response body (empty for HEAD).
    pub body: Vec<u8>,
}

/// Blocking HTTP transport used for web images.
pub trait HttpClient: Send + Sync {
    /// Fetch the body of `url`.
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;

    /// Check `url` without retrieving the body.
    fn head(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// [`HttpClient`] backed by a pooled `ureq` agent.
pub struct UreqClient {
    agent: Agent,
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl UreqClient {
    /// Create a client with the given global timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.agent.get(url).call()?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::HttpStatus(status));
        }
        let content_type = header_content_type(response.headers());
        let body = response.into_body().read_to_vec()?;
        Ok(HttpResponse { content_type, body })
    }

    fn head(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.agent.head(url).call()?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::HttpStatus(status));
        }
        Ok(HttpResponse {
            content_type: header_content_type(response.headers()),
            body: Vec::new(),
        })
    }
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        (**self).get(url)
    }

    fn head(&self, url: &str) -> Result<HttpResponse, FetchError> {
        (**self).head(url)
    }
}

fn header_content_type(headers: &ureq::http::HeaderMap) -> Option<String> {
    headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Retrieves link content by scheme.
pub struct LinkFetcher {
    http: Box<dyn HttpClient>,
}

impl Default for LinkFetcher {
    fn default() -> Self {
        Self::new(UreqClient::default())
    }
}

impl LinkFetcher {
    /// Create a fetcher using the given HTTP transport.
    #[must_use]
    pub fn new(http: impl HttpClient + 'static) -> Self {
        Self {
            http: Box::new(http),
        }
    }

    /// Retrieve `link`.
    ///
    /// Relative paths resolve against `base_dir` (the directory of the
    /// document being filtered). Links with other schemes succeed with empty
    /// content.
    pub fn fetch(
        &self,
        link: &str,
        base_dir: &Path,
        retrieval: Retrieval,
    ) -> Result<LinkData, FetchError> {
        match LinkScheme::of(link) {
            LinkScheme::Data => fetch_data_url(link, retrieval),
            LinkScheme::Http => self.fetch_http(link, retrieval),
            LinkScheme::RelativePath => fetch_file(&base_dir.join(link), retrieval),
            LinkScheme::AbsolutePath => fetch_file(Path::new(link), retrieval),
            LinkScheme::Other(_) => Ok(LinkData::empty("", None)),
        }
    }

    fn fetch_http(&self, url: &str, retrieval: Retrieval) -> Result<LinkData, FetchError> {
        let filename = basename(&url_path(url)).to_owned();

        if retrieval == Retrieval::CheckOnly {
            let response = self.http.head(url)?;
            return Ok(LinkData::empty(filename, response.content_type));
        }

        let response = self.http.get(url)?;
        let content = match retrieval {
            Retrieval::DataUrl => {
                let content_type = response
                    .content_type
                    .as_deref()
                    .ok_or_else(|| FetchError::UnknownContentType(filename.clone()))?;
                LinkContent::DataUrl(data_url(content_type, &response.body))
            }
            _ => LinkContent::Raw(response.body),
        };

        Ok(LinkData {
            filename,
            content_type: response.content_type,
            content,
        })
    }
}

/// Build a base64 data URL.
///
/// # Examples
///
/// ```
/// assert_eq!(md2md_filter::data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
/// ```
#[must_use]
pub fn data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64_STANDARD.encode(data))
}

fn fetch_data_url(link: &str, retrieval: Retrieval) -> Result<LinkData, FetchError> {
    let caps = DATA_URL_PATTERN
        .captures(link)
        .ok_or(FetchError::InvalidDataUrl)?;
    let content_type = caps[1].to_owned();

    let content = match retrieval {
        Retrieval::CheckOnly => LinkContent::Empty,
        Retrieval::DataUrl => LinkContent::DataUrl(link.to_owned()),
        Retrieval::Raw => LinkContent::Raw(BASE64_STANDARD.decode(&caps[2])?),
    };

    Ok(LinkData {
        filename: String::new(),
        content_type: Some(content_type),
        content,
    })
}

fn fetch_file(path: &Path, retrieval: Retrieval) -> Result<LinkData, FetchError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !path.exists() {
        return Err(FetchError::Missing(path.to_path_buf()));
    }

    let content_type = content_type_for(path).map(str::to_owned);
    if retrieval == Retrieval::CheckOnly {
        return Ok(LinkData::empty(filename, content_type));
    }

    let bytes = fs::read(path)?;
    let content = if retrieval == Retrieval::DataUrl {
        let ct = content_type
            .as_deref()
            .ok_or_else(|| FetchError::UnknownContentType(filename.clone()))?;
        LinkContent::DataUrl(data_url(ct, &bytes))
    } else {
        LinkContent::Raw(bytes)
    };

    Ok(LinkData {
        filename,
        content_type,
        content,
    })
}

/// Image MIME type from a file extension.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "gif" => Some("image/gif"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Path component of a URL, without query or fragment.
fn url_path(url: &str) -> String {
    url.parse::<ureq::http::Uri>()
        .map(|uri| uri.path().to_owned())
        .unwrap_or_default()
}
