//! Single-pass tokenizer for links, reference links and `<img>` tags.
//!
//! Tokens never overlap: once a link is recognized its whole span is
//! consumed, so an image nested in the text of an ordinary link is left as
//! part of that link.

use std::sync::LazyLock;

use regex::Regex;

static IMG_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<img(?:\s+\w+(?:=[^'"\s>]+|='[^'\n]*'|="[^"\n]*")?)*\s*>"#)
        .expect("invalid img tag regex")
});

/// Inline link or image: `[text](target "title")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InlineLink<'a> {
    pub(crate) raw: &'a str,
    pub(crate) image: bool,
    pub(crate) text: &'a str,
    pub(crate) target: &'a str,
    pub(crate) title: &'a str,
}

/// Reference link or image: `[text][label]`, `![alt][]` or `![alt]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RefLink<'a> {
    pub(crate) raw: &'a str,
    pub(crate) image: bool,
    pub(crate) text: &'a str,
    /// Explicit label, `None` for the shortcut form.
    pub(crate) label: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Link(InlineLink<'a>),
    Reference(RefLink<'a>),
    ImgTag(&'a str),
}

/// Split `input` into text and link tokens.
pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let found = match bytes[pos] {
            b'!' if bytes.get(pos + 1) == Some(&b'[') => parse_link(input, pos, true),
            b'[' => parse_link(input, pos, false),
            b'<' => IMG_TAG_PATTERN
                .find(&input[pos..])
                .map(|m| (Token::ImgTag(&input[pos..pos + m.end()]), pos + m.end())),
            _ => None,
        };

        match found {
            Some((token, end)) => {
                if text_start < pos {
                    tokens.push(Token::Text(&input[text_start..pos]));
                }
                tokens.push(token);
                pos = end;
                text_start = end;
            }
            None => pos += 1,
        }
    }

    if text_start < input.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }
    tokens
}

/// Parse a link starting at `start` (at `!` for images, `[` otherwise).
fn parse_link(input: &str, start: usize, image: bool) -> Option<(Token<'_>, usize)> {
    let open = if image { start + 1 } else { start };
    let close = find_closing_bracket(input, open)?;
    let text = &input[open + 1..close];
    let after = close + 1;

    if input[after..].starts_with('(') {
        let (target, title, end) = parse_destination(input, after + 1)?;
        let link = InlineLink {
            raw: &input[start..end],
            image,
            text,
            target,
            title,
        };
        return Some((Token::Link(link), end));
    }

    let label_open = after + leading_whitespace(&input[after..]);
    if input[label_open..].starts_with('[') {
        let label_len = input[label_open + 1..].find(|c| c == ']' || c == '[' || c == '^');
        if let Some(len) = label_len
            && input[label_open + 1 + len..].starts_with(']')
        {
            let end = label_open + 1 + len + 1;
            let reference = RefLink {
                raw: &input[start..end],
                image,
                text,
                label: Some(&input[label_open + 1..label_open + 1 + len]),
            };
            return Some((Token::Reference(reference), end));
        }
    }

    image.then(|| {
        let reference = RefLink {
            raw: &input[start..after],
            image,
            text,
            label: None,
        };
        (Token::Reference(reference), after)
    })
}

/// Index of the `]` matching the `[` at `open`, honoring nesting and escapes.
fn find_closing_bracket(input: &str, open: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = open;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Parse `target "title")` starting just after `(`.
///
/// The target is the shortest run that is followed either by a quoted title
/// and `)` or by `)`. Returns the target, title and end offset.
fn parse_destination(input: &str, start: usize) -> Option<(&str, &str, usize)> {
    let dest_start = start + leading_whitespace(&input[start..]);
    let mut scan = TitleScan::new(input);

    if input[dest_start..].starts_with('<') {
        let inner = dest_start + 1;
        let close = inner + input[inner..].find(['>', '\n'])?;
        if !input[close..].starts_with('>') {
            return None;
        }
        let (title, end) = scan.title_and_close(close + 1)?;
        return Some((&input[inner..close], title, end));
    }

    // A bare target always closes at the first `)`, so it never extends past it.
    let paren = dest_start + input[dest_start..].find(')')?;
    input[dest_start..paren]
        .char_indices()
        .map(|(offset, _)| dest_start + offset)
        .chain(std::iter::once(paren))
        .find_map(|pos| {
            scan.title_and_close(pos)
                .map(|(title, end)| (&input[dest_start..pos], title, end))
        })
}

/// Title and `)` matching over increasing positions of one destination.
///
/// Positions passed to [`title_and_close`](Self::title_and_close) must not
/// decrease; whitespace runs and closing-quote searches are then each
/// scanned once.
struct TitleScan<'a> {
    input: &'a str,
    /// Last whitespace run seen, as `(start, end)`.
    run: Option<(usize, usize)>,
    /// Earliest title-closing quote at or after the last search origin.
    closing_quote: Option<usize>,
    /// No title-closing quote exists after the last search origin.
    exhausted: bool,
}

impl<'a> TitleScan<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            run: None,
            closing_quote: None,
            exhausted: false,
        }
    }

    /// Match an optional whitespace-led quoted title followed by `)` at `pos`.
    fn title_and_close(&mut self, pos: usize) -> Option<(&'a str, usize)> {
        let input = self.input;
        let solid = self.skip_whitespace(pos);

        if solid > pos
            && input[solid..].starts_with(['\'', '"'])
            && let Some(quote) = self.closing_quote_from(solid + 1)
            && let Some(end) = close_paren(input, quote + 1)
        {
            return Some((&input[solid + 1..quote], end));
        }

        input[solid..].starts_with(')').then_some(("", solid + 1))
    }

    /// End of the whitespace run starting at `pos`.
    fn skip_whitespace(&mut self, pos: usize) -> usize {
        if let Some((start, end)) = self.run
            && (start..=end).contains(&pos)
        {
            return end;
        }
        let end = pos + leading_whitespace(&self.input[pos..]);
        self.run = Some((pos, end));
        end
    }

    /// First quote at or after `from` that is followed by optional
    /// whitespace and `)`.
    fn closing_quote_from(&mut self, from: usize) -> Option<usize> {
        if let Some(quote) = self.closing_quote
            && quote >= from
        {
            return Some(quote);
        }
        if self.exhausted {
            return None;
        }

        let mut at = from;
        while let Some(offset) = self.input[at..].find(['\'', '"']) {
            let quote = at + offset;
            if close_paren(self.input, quote + 1).is_some() {
                self.closing_quote = Some(quote);
                return Some(quote);
            }
            at = quote + 1;
        }
        self.exhausted = true;
        None
    }
}

/// End offset of optional whitespace followed by `)` at `pos`.
fn close_paren(input: &str, pos: usize) -> Option<usize> {
    let rest = &input[pos..];
    let ws = leading_whitespace(rest);
    rest[ws..].starts_with(')').then_some(pos + ws + 1)
}
