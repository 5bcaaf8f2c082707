//! Block rules matched at the start of the unconsumed input.
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. fenced code (` ``` ` or `~~~`, optional language tag)
//! 2. indented code (only when converting to fences)
//! 3. block math (`$$...$$`)
//! 4. LaTeX environment (`\begin{name}...\end{name}`)
//! 5. horizontal rule (`---`)

/// A matched block construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Block<'a> {
    /// Fenced code block; `body` excludes the fences and trailing whitespace.
    Fenced { body: &'a str },
    /// Run of lines indented by four spaces.
    Indented,
    /// `$$...$$` math.
    Math,
    /// LaTeX environment with matching `\begin` and `\end` names.
    LatexEnvironment,
    /// Horizontal rule; `marker` is the run of dashes.
    Rule { marker: &'a str },
}

/// A block match and the text it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockMatch<'a> {
    pub(crate) block: Block<'a>,
    /// Full matched text, including trailing blank lines where the rule consumes them.
    pub(crate) text: &'a str,
}

/// Match a block rule at the start of `input`.
pub(crate) fn match_block(input: &str, indented_code: bool) -> Option<BlockMatch<'_>> {
    match_fenced(input)
        .or_else(|| {
            if indented_code {
                match_indented(input)
            } else {
                None
            }
        })
        .or_else(|| match_math(input))
        .or_else(|| match_latex_environment(input))
        .or_else(|| match_rule(input))
}

/// Length of the run of `\n` at the start of `s`.
fn newline_run(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b'\n').count()
}

fn match_fenced(input: &str) -> Option<BlockMatch<'_>> {
    let indent = input.bytes().take_while(|&b| b == b' ').count();
    let rest = &input[indent..];
    let fence_char = *rest.as_bytes().first()?;
    if fence_char != b'`' && fence_char != b'~' {
        return None;
    }
    let run = rest.bytes().take_while(|&b| b == fence_char).count();
    if run < 3 {
        return None;
    }
    let fence = &rest[..run];

    let opening_end = rest.find('\n')?;
    let info = rest[run..opening_end].trim_matches(' ');
    if info.contains(char::is_whitespace) {
        return None;
    }

    let body_start = indent + opening_end + 1;
    let mut at = body_start;
    while let Some(offset) = input[at..].find(fence) {
        let close = at + offset;
        if close > body_start
            && let Some(end) = closing_fence_end(input, close + fence.len())
        {
            return Some(BlockMatch {
                block: Block::Fenced {
                    body: input[body_start..close].trim_end(),
                },
                text: &input[..end],
            });
        }
        at = close + 1;
    }
    None
}

/// End of the block if only spaces follow the closing fence on its line.
///
/// The closing fence may follow code on the same line (`x = 1 ```).
fn closing_fence_end(input: &str, after_fence: usize) -> Option<usize> {
    let spaces = input[after_fence..].bytes().take_while(|&b| b == b' ').count();
    let line_end = after_fence + spaces;
    if line_end < input.len() && !input[line_end..].starts_with('\n') {
        return None;
    }
    Some(line_end + newline_run(&input[line_end..]))
}

fn match_indented(input: &str) -> Option<BlockMatch<'_>> {
    let mut end = 0;
    loop {
        let rest = &input[end..];
        let Some(content) = rest.strip_prefix("    ") else {
            break;
        };
        let line_len = content.find('\n').unwrap_or(content.len());
        if line_len == 0 {
            break;
        }
        end += 4 + line_len;
        end += newline_run(&input[end..]);
    }

    (end > 0).then(|| BlockMatch {
        block: Block::Indented,
        text: &input[..end],
    })
}

fn match_math(input: &str) -> Option<BlockMatch<'_>> {
    let inner = input.strip_prefix("$$")?;
    let close = inner.find("$$")?;
    Some(BlockMatch {
        block: Block::Math,
        text: &input[..2 + close + 2],
    })
}

fn match_latex_environment(input: &str) -> Option<BlockMatch<'_>> {
    const BEGIN: &str = "\\begin{";

    let rest = input.strip_prefix(BEGIN)?;
    let letters = rest.bytes().take_while(u8::is_ascii_lowercase).count();
    let name_len = if rest[letters..].starts_with('*') {
        letters + 1
    } else {
        letters
    };
    let name = &rest[..name_len];
    let body = rest[name_len..].strip_prefix('}')?;

    let end_marker = format!("\\end{{{name}}}");
    let close = body.find(&end_marker)?;
    let end = BEGIN.len() + name_len + 1 + close + end_marker.len();

    Some(BlockMatch {
        block: Block::LatexEnvironment,
        text: &input[..end],
    })
}

fn match_rule(input: &str) -> Option<BlockMatch<'_>> {
    let dashes = input.bytes().take_while(|&b| b == b'-').count();
    if dashes < 3 {
        return None;
    }
    let spaces = input[dashes..].bytes().take_while(|&b| b == b' ').count();
    let after = dashes + spaces;
    if after < input.len() && !input[after..].starts_with('\n') {
        return None;
    }
    let end = after + newline_run(&input[after..]);

    Some(BlockMatch {
        block: Block::Rule {
            marker: &input[..dashes],
        },
        text: &input[..end],
    })
}

/// Indent every non-empty line of `code` by four spaces.
pub(crate) fn indent_code(code: &str) -> String {
    let mut out = String::with_capacity(code.len() + 16);
    for (i, line) in code.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.is_empty() {
            out.push_str("    ");
        }
        out.push_str(line);
    }
    out
}

/// Wrap an indented code block in a backtick fence.
pub(crate) fn fence_indented(text: &str) -> String {
    let mut out = String::from("```\n");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.strip_prefix("    ").unwrap_or(line));
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n\n");
    out
}
