//! `<img>` tag construction and attribute extraction.

use std::sync::LazyLock;

use regex::Regex;

/// `name=value` pairs inside a tag or title, value bare or quoted.
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([A-Za-z][\w-]*)=([^'"\s>]+|'[^'\n]*'|"[^"\n]*")"#)
        .expect("invalid attribute regex")
});

/// Attributes lifted from an image title into the tag itself.
const TITLE_ATTRIBUTES: [&str; 3] = ["align", "height", "width"];

/// Extract the value of attribute `name` from tag text, without quotes.
///
/// The attribute must be preceded by whitespace, so callers pass a title as
/// `" " + title`.
///
/// # Examples
///
/// ```
/// use md2md_filter::tag_attribute;
///
/// let tag = r#"<img src="a.png" alt='A picture' width=40>"#;
/// assert_eq!(tag_attribute("src", tag).as_deref(), Some("a.png"));
/// assert_eq!(tag_attribute("alt", tag).as_deref(), Some("A picture"));
/// assert_eq!(tag_attribute("width", tag).as_deref(), Some("40"));
/// assert_eq!(tag_attribute("title", tag), None);
/// ```
#[must_use]
pub fn tag_attribute(name: &str, text: &str) -> Option<String> {
    ATTRIBUTE_PATTERN
        .captures_iter(text)
        .find(|caps| &caps[1] == name)
        .map(|caps| caps[2].trim_matches('"').trim_matches('\'').to_owned())
}

/// Build an `<img>` tag.
///
/// `align`, `height` and `width` settings written inside the title (for
/// example `"Diagram width=200"`) are repeated as tag attributes.
#[must_use]
pub fn img_tag(src: &str, alt: &str, title: &str) -> String {
    let mut tag = format!(
        "<img src=\"{src}\" alt=\"{}\"",
        html_escape::encode_double_quoted_attribute(alt)
    );

    if !title.is_empty() {
        let padded = format!(" {title}");
        for name in TITLE_ATTRIBUTES {
            if let Some(value) = tag_attribute(name, &padded).filter(|v| !v.is_empty()) {
                tag.push_str(&format!(
                    " {name}=\"{}\"",
                    html_escape::encode_double_quoted_attribute(&value)
                ));
            }
        }
        tag.push_str(&format!(
            " title=\"{}\"",
            html_escape::encode_quoted_attribute(title)
        ));
    }

    tag.push('>');
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_img_tag_without_title() {
        assert_eq!(img_tag("a.png", "A", ""), r#"<img src="a.png" alt="A">"#);
    }

    #[test]
    fn test_img_tag_with_title() {
        assert_eq!(
            img_tag("a.png", "A", "My <pic>"),
            r#"<img src="a.png" alt="A" title="My &lt;pic&gt;">"#
        );
    }

    #[test]
    fn test_img_tag_lifts_size_attributes() {
        let tag = img_tag("a.png", "A", "Chart width=200 align=left file=a.png");
        assert_eq!(
            tag,
            r#"<img src="a.png" alt="A" align="left" width="200" title="Chart width=200 align=left file=a.png">"#
        );
    }

    #[test]
    fn test_tag_attribute_requires_leading_space() {
        assert_eq!(tag_attribute("file", "file=a.png"), None);
        assert_eq!(tag_attribute("file", " file=a.png").as_deref(), Some("a.png"));
    }

    #[test]
    fn test_tag_attribute_first_match_wins() {
        let text = " width=10 width=20";
        assert_eq!(tag_attribute("width", text).as_deref(), Some("10"));
    }
}
