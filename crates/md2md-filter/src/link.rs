//! Link classification and reference-label helpers.

/// Scheme of a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScheme<'a> {
    /// `data:` URL.
    Data,
    /// `http:` or `https:` URL.
    Http,
    /// Any other short scheme (`ftp:`, `mailto:`...).
    Other(&'a str),
    /// Filesystem path starting with `/`.
    AbsolutePath,
    /// Path relative to the document being filtered.
    RelativePath,
}

impl<'a> LinkScheme<'a> {
    /// Classify a link.
    ///
    /// A scheme is 3 to 5 characters from `[-a-z]` followed by `:` and a
    /// whitespace-free remainder.
    ///
    /// # Examples
    ///
    /// ```
    /// use md2md_filter::LinkScheme;
    ///
    /// assert_eq!(LinkScheme::of("https://example.com/a.png"), LinkScheme::Http);
    /// assert_eq!(LinkScheme::of("data:image/png;base64,AA=="), LinkScheme::Data);
    /// assert_eq!(LinkScheme::of("/tmp/a.png"), LinkScheme::AbsolutePath);
    /// assert_eq!(LinkScheme::of("img/a.png"), LinkScheme::RelativePath);
    /// ```
    #[must_use]
    pub fn of(link: &'a str) -> Self {
        if let Some((scheme, rest)) = link.split_once(':')
            && (3..=5).contains(&scheme.len())
            && scheme.bytes().all(|b| b == b'-' || b.is_ascii_lowercase())
            && !rest.chars().any(char::is_whitespace)
        {
            return match scheme {
                "data" => Self::Data,
                "http" | "https" => Self::Http,
                other => Self::Other(other),
            };
        }

        if link.starts_with('/') {
            Self::AbsolutePath
        } else {
            Self::RelativePath
        }
    }
}

/// Normalize a reference label into a lookup key.
///
/// Runs of whitespace collapse to a single space and the result is lower-cased.
#[must_use]
pub fn ref_key(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Make a safe identifier from free text.
///
/// Characters outside `[-A-Za-z0-9_.]` are replaced (runs collapse to one `-`),
/// then leading and trailing `-` and `.` are stripped.
#[must_use]
pub fn make_id_from_text(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut replaced = false;
    for ch in text.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            id.push(ch);
            replaced = false;
        } else if !replaced {
            id.push('-');
            replaced = true;
        }
    }
    id.trim_matches('-').trim_matches('.').to_owned()
}

/// Quote a title and pad it on the left with a space.
///
/// Prefers single quotes, then double quotes, then (if `parentheses`)
/// parentheses. Returns an empty string when the title is empty or cannot be
/// quoted.
#[must_use]
pub fn quote_pad_title(title: &str, parentheses: bool) -> String {
    if title.is_empty() {
        String::new()
    } else if !title.contains('\'') {
        format!(" '{title}'")
    } else if !title.contains('"') {
        format!(" \"{title}\"")
    } else if parentheses && !title.contains('(') && !title.contains(')') {
        format!(" ({title})")
    } else {
        String::new()
    }
}

/// Last path segment of a link, ignoring any trailing slash.
pub(crate) fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// File extension for a MIME content type (`image/svg+xml` -> `svg`).
pub(crate) fn extension_for(content_type: &str) -> &str {
    let subtype = content_type.split_once('/').map_or("", |(_, sub)| sub);
    let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
    subtype.split('+').next().unwrap_or(subtype)
}
