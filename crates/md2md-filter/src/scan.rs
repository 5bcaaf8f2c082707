//! Main document pass.
//!
//! At each position, block rules are tried first; otherwise one line is
//! consumed and classified. Ordinary lines accumulate in a buffer that is
//! resolved for inline links and flushed to the output before any block or
//! reference definition is emitted, so output order follows input order.

use crate::block::{Block, BlockMatch, fence_indented, indent_code, match_block};
use crate::error::FilterError;
use crate::inline;
use crate::line::{LineAction, LineClassifier, RefDefinition};
use crate::link::quote_pad_title;
use crate::session::Session;

pub(crate) struct Scanner<'s, 'a> {
    session: &'s mut Session<'a>,
    classifier: LineClassifier,
    buffered: String,
    output: String,
}

impl<'s, 'a> Scanner<'s, 'a> {
    pub(crate) fn new(session: &'s mut Session<'a>) -> Self {
        Self {
            session,
            classifier: LineClassifier::default(),
            buffered: String::new(),
            output: String::new(),
        }
    }

    pub(crate) fn run(mut self, text: &str) -> Result<String, FilterError> {
        let indented_code = self.session.options.fence;
        let mut rest = text;

        while !rest.is_empty() {
            if let Some(block) = match_block(rest, indented_code) {
                self.flush()?;
                self.emit_block(&block);
                rest = &rest[block.text.len()..];
                continue;
            }

            let (line, newline, remainder) = match rest.split_once('\n') {
                Some((line, remainder)) => (line, true, remainder),
                None => (rest, false, ""),
            };
            self.process_line(line, newline)?;
            rest = remainder;
        }

        self.flush()?;
        Ok(self.output)
    }

    fn process_line(&mut self, line: &str, newline: bool) -> Result<(), FilterError> {
        let options = self.session.options;
        match self.classifier.classify(line, options) {
            LineAction::Drop => {}
            LineAction::Definition(def) => {
                self.flush()?;
                self.emit_definition(line, &def, newline);
            }
            LineAction::Content(content) => {
                self.buffered.push_str(&content);
                if newline {
                    self.buffered.push('\n');
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FilterError> {
        if self.buffered.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.buffered);
        let resolved = inline::resolve(self.session, &chunk)?;
        if !self.session.options.nomarkup {
            self.output.push_str(&resolved);
        }
        Ok(())
    }

    fn emit_definition(&mut self, line: &str, def: &RefDefinition, newline: bool) {
        let options = self.session.options;
        if options.nomarkup {
            return;
        }
        if options.images.embed && self.session.refs.is_image_used(&def.key) {
            tracing::debug!("dropping definition [{}] for embedded image", def.key);
            return;
        }

        if let Some(target) = self.session.refs.rewritten(&def.key) {
            self.output.push('[');
            self.output.push_str(&def.key);
            self.output.push_str("]: ");
            self.output.push_str(&target.link);
            self.output.push_str(&quote_pad_title(&target.title, true));
            self.output.push('\n');
        } else {
            self.output.push_str(line);
            if newline {
                self.output.push('\n');
            }
        }
    }

    fn emit_block(&mut self, block: &BlockMatch<'_>) {
        let options = self.session.options;

        if let Block::Rule { marker } = block.block {
            self.classifier.reset_notes();
            if !options.norule && !options.nomarkup {
                self.output.push_str(marker);
                self.output.push_str("\n\n");
            }
            return;
        }
        if self.classifier.is_skipping_notes() {
            return;
        }

        match block.block {
            Block::Fenced { body } => {
                if options.nocode {
                    return;
                }
                if options.unfence {
                    self.output.push_str(&indent_code(body));
                    self.output.push_str("\n\n");
                } else {
                    self.output.push_str(block.text);
                }
            }
            Block::Indented => self.output.push_str(&fence_indented(block.text)),
            Block::Math => {
                if options.nomarkup {
                    return;
                }
                if options.backtick_on {
                    self.output.push('`');
                    self.output.push_str(block.text);
                    self.output.push('`');
                } else {
                    self.output.push_str(block.text);
                }
            }
            Block::LatexEnvironment => {
                if !options.nomarkup {
                    self.output.push_str(block.text);
                }
            }
            Block::Rule { .. } => {}
        }
    }
}
