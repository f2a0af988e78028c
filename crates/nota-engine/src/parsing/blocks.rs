//! # Block recognition
//!
//! Groups lines into [`MatchedBlock`]s using the grammar's block entries.
//!
//! - Start prefixes are tried in declared order; the first match wins.
//! - A block with an end prefix stays open, taking every line verbatim,
//!   until the end prefix matches or input runs out.
//! - Lines matching no entry form text blocks.
//!
//! Nothing is dropped: an unterminated block is closed at end of input.

use super::{
    grammar::{Grammar, PrefixMatch},
    lines::LineRef,
    span::TextRange,
};

/// A run of lines recognised as one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedBlock {
    /// Index of the grammar entry, `None` for plain text.
    pub def: Option<usize>,
    /// Content lines without terminators. The first line of a prefixed block
    /// has its prefix consumed or rewritten.
    pub lines: Vec<String>,
    pub range: TextRange,
    pub start: Option<PrefixMatch>,
    pub end: Option<PrefixMatch>,
}

impl MatchedBlock {
    fn text(line: &LineRef) -> Self {
        Self {
            def: None,
            lines: vec![line.text.clone()],
            range: line.range,
            start: None,
            end: None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.def.is_none()
    }
}

#[derive(Debug)]
enum State {
    NoBlock,
    InOpenBlock(MatchedBlock),
    InTextBlock(MatchedBlock),
}

pub struct BlockParser<'g> {
    grammar: &'g Grammar,
    state: State,
}

impl<'g> BlockParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            state: State::NoBlock,
        }
    }

    /// Feeds one line, returning the blocks it completed.
    pub fn push(&mut self, line: &LineRef) -> Vec<MatchedBlock> {
        let mut out = vec![];

        if let State::InOpenBlock(open) = &mut self.state {
            let end = open
                .def
                .and_then(|i| self.grammar.block(i))
                .and_then(|def| def.end.as_ref())
                .and_then(|end| end.matches(&line.text));
            open.range.end = line.range.end;
            match end {
                Some(m) => {
                    let before = &line.text[..m.range.start];
                    if !before.is_empty() {
                        open.lines.push(before.to_string());
                    }
                    open.end = Some(m);
                    if let State::InOpenBlock(done) =
                        std::mem::replace(&mut self.state, State::NoBlock)
                    {
                        out.push(done);
                    }
                }
                None => open.lines.push(line.text.clone()),
            }
            return out;
        }

        if let Some(block) = self.try_open(line) {
            self.flush_text(&mut out);
            let has_end = block
                .def
                .and_then(|i| self.grammar.block(i))
                .is_some_and(|def| def.end.is_some());
            if has_end {
                self.state = State::InOpenBlock(block);
            } else {
                out.push(block);
            }
            return out;
        }

        match &mut self.state {
            State::InTextBlock(text) => {
                text.lines.push(line.text.clone());
                text.range.end = line.range.end;
            }
            _ => self.state = State::InTextBlock(MatchedBlock::text(line)),
        }
        out
    }

    /// Closes whatever is still open at end of input.
    pub fn finish(self) -> Option<MatchedBlock> {
        match self.state {
            State::NoBlock => None,
            State::InOpenBlock(open) => {
                log::debug!(
                    "closing unterminated block at {}..{}",
                    open.range.start,
                    open.range.end
                );
                Some(open)
            }
            State::InTextBlock(text) => Some(text),
        }
    }

    fn try_open(&self, line: &LineRef) -> Option<MatchedBlock> {
        self.grammar
            .blocks()
            .iter()
            .enumerate()
            .find_map(|(i, def)| {
                let m = def.start.matches(&line.text)?;
                let rest = &line.text[m.range.end..];
                let first = match &m.replacement {
                    Some(r) => format!("{r}{rest}"),
                    None => rest.to_string(),
                };
                Some(MatchedBlock {
                    def: Some(i),
                    lines: vec![first],
                    range: line.range,
                    start: Some(m),
                    end: None,
                })
            })
    }

    fn flush_text(&mut self, out: &mut Vec<MatchedBlock>) {
        if let State::InTextBlock(text) = std::mem::replace(&mut self.state, State::NoBlock) {
            out.push(text);
        }
    }
}

/// Splits `text` into lines and groups them into blocks.
pub fn parse_blocks(
    grammar: &Grammar,
    lines: impl IntoIterator<Item = LineRef>,
) -> Vec<MatchedBlock> {
    let mut parser = BlockParser::new(grammar);
    let mut out = vec![];
    for line in lines {
        out.extend(parser.push(&line));
    }
    out.extend(parser.finish());
    out
}
