//! Line classification.
//!
//! Lines not consumed by a block rule are classified in order:
//!
//! 1. while skipping notes, every line is dropped
//! 2. `Annotation:` lines unless kept
//! 3. `Answer:`/`Ans:` lines when answers are suppressed
//! 4. `Concepts:` lines when concepts are suppressed
//! 5. `Notes:` lines when notes are suppressed (also starts skipping)
//! 6. reference definitions
//! 7. ordinary content

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::link::ref_key;
use crate::options::FilterOptions;

static REF_DEFINITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^ {0,3}\[([^\]]+)\]: +(\S+)( *\(.*\)| *'.*'| *".*")? *$"#)
        .expect("invalid reference definition regex")
});

static BACKTICK_MATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^`])`\$(.+?)\$`").expect("invalid inline math regex"));

/// A `[label]: target "title"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDefinition {
    /// Normalized label.
    pub key: String,
    /// Link destination.
    pub link: String,
    /// Title without its delimiters, empty when absent.
    pub title: String,
}

impl RefDefinition {
    /// Parse a reference definition line.
    ///
    /// # Examples
    ///
    /// ```
    /// use md2md_filter::RefDefinition;
    ///
    /// let def = RefDefinition::parse("[My Fig]: img/fig.png 'A figure'").unwrap();
    /// assert_eq!(def.key, "my fig");
    /// assert_eq!(def.link, "img/fig.png");
    /// assert_eq!(def.title, "A figure");
    /// assert!(RefDefinition::parse("Some [text]: here").is_none());
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let caps = REF_DEFINITION_PATTERN.captures(line)?;
        let title = caps.get(3).map_or("", |m| {
            let quoted = m.as_str().trim_start();
            &quoted[1..quoted.len() - 1]
        });
        Some(Self {
            key: ref_key(&caps[1]),
            link: caps[2].to_owned(),
            title: title.to_owned(),
        })
    }
}

/// What to do with a line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineAction<'a> {
    /// Omit the line.
    Drop,
    /// A reference definition.
    Definition(RefDefinition),
    /// Ordinary content, possibly rewritten.
    Content(Cow<'a, str>),
}

/// Stateful classifier for lines outside block constructs.
#[derive(Debug, Default)]
pub(crate) struct LineClassifier {
    skipping_notes: bool,
}

impl LineClassifier {
    /// Stop skipping notes (called when a horizontal rule is matched).
    pub(crate) fn reset_notes(&mut self) {
        self.skipping_notes = false;
    }

    pub(crate) fn is_skipping_notes(&self) -> bool {
        self.skipping_notes
    }

    pub(crate) fn classify<'a>(
        &mut self,
        line: &'a str,
        options: &FilterOptions,
    ) -> LineAction<'a> {
        if self.skipping_notes {
            return LineAction::Drop;
        }

        if line.starts_with("Annotation:") && !options.keep_annotation {
            return LineAction::Drop;
        }
        if (line.starts_with("Answer:") || line.starts_with("Ans:")) && options.noanswers {
            return LineAction::Drop;
        }
        if line.starts_with("Concepts:") && options.noconcepts {
            return LineAction::Drop;
        }
        if line.starts_with("Notes:") && options.nonotes {
            self.skipping_notes = true;
            return LineAction::Drop;
        }

        if let Some(def) = RefDefinition::parse(line) {
            return LineAction::Definition(def);
        }

        if options.backtick_off {
            LineAction::Content(unwrap_inline_math(line))
        } else {
            LineAction::Content(Cow::Borrowed(line))
        }
    }
}

/// Rewrite `` `$x$` `` as `$x$`, leaving double-backtick spans alone.
fn unwrap_inline_math(line: &str) -> Cow<'_, str> {
    BACKTICK_MATH_PATTERN.replace_all(line, "${1}$$${2}$$")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FilterOptions {
        FilterOptions::default()
    }

    #[test]
    fn test_annotation_dropped_unless_kept() {
        let mut classifier = LineClassifier::default();
        assert_eq!(
            classifier.classify("Annotation: hidden", &options()),
            LineAction::Drop
        );

        let keep = FilterOptions {
            keep_annotation: true,
            ..options()
        };
        assert_eq!(
            classifier.classify("Annotation: shown", &keep),
            LineAction::Content(Cow::Borrowed("Annotation: shown"))
        );
    }

    #[test]
    fn test_answers_and_concepts() {
        let mut classifier = LineClassifier::default();
        let suppress = FilterOptions {
            noanswers: true,
            noconcepts: true,
            ..options()
        };
        assert_eq!(classifier.classify("Answer: 42", &suppress), LineAction::Drop);
        assert_eq!(classifier.classify("Ans: 42", &suppress), LineAction::Drop);
        assert_eq!(classifier.classify("Concepts: a, b", &suppress), LineAction::Drop);
        assert!(matches!(
            classifier.classify("Answer: 42", &options()),
            LineAction::Content(_)
        ));
    }

    #[test]
    fn test_directive_must_start_line() {
        let mut classifier = LineClassifier::default();
        assert!(matches!(
            classifier.classify(" Annotation: indented", &options()),
            LineAction::Content(_)
        ));
    }

    #[test]
    fn test_notes_skip_until_reset() {
        let mut classifier = LineClassifier::default();
        let nonotes = FilterOptions {
            nonotes: true,
            ..options()
        };
        assert_eq!(classifier.classify("Notes: intro", &nonotes), LineAction::Drop);
        assert_eq!(classifier.classify("secret", &nonotes), LineAction::Drop);
        assert_eq!(classifier.classify("[a]: b.png", &nonotes), LineAction::Drop);

        classifier.reset_notes();
        assert_eq!(
            classifier.classify("after", &nonotes),
            LineAction::Content(Cow::Borrowed("after"))
        );
    }

    #[test]
    fn test_notes_kept_without_nonotes() {
        let mut classifier = LineClassifier::default();
        assert!(matches!(
            classifier.classify("Notes: visible", &options()),
            LineAction::Content(_)
        ));
        assert!(matches!(
            classifier.classify("still visible", &options()),
            LineAction::Content(_)
        ));
    }

    #[test]
    fn test_ref_definition_titles() {
        let def = RefDefinition::parse(r#"   [Logo]: https://x.org/l.png  "The logo"  "#).unwrap();
        assert_eq!(def.key, "logo");
        assert_eq!(def.link, "https://x.org/l.png");
        assert_eq!(def.title, "The logo");

        let def = RefDefinition::parse("[a]: a.png (paren title)").unwrap();
        assert_eq!(def.title, "paren title");

        let def = RefDefinition::parse("[a]: a.png").unwrap();
        assert_eq!(def.title, "");
    }

    #[test]
    fn test_ref_definition_rejects_deep_indent_and_trailing_text() {
        assert!(RefDefinition::parse("    [a]: a.png").is_none());
        assert!(RefDefinition::parse("[a]: a.png trailing words").is_none());
        assert!(RefDefinition::parse("[a]:a.png").is_none());
    }

    #[test]
    fn test_backtick_off_unwraps_inline_math() {
        let mut classifier = LineClassifier::default();
        let opts = FilterOptions {
            backtick_off: true,
            ..options()
        };
        assert_eq!(
            classifier.classify("Euler: `$e^{i\\pi}$` and `code`", &opts),
            LineAction::Content(Cow::Owned("Euler: $e^{i\\pi}$ and `code`".to_owned()))
        );
        assert_eq!(
            classifier.classify("``$keep$``", &opts),
            LineAction::Content(Cow::Borrowed("``$keep$``"))
        );
    }
}
