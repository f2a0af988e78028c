//! Reference extraction for indexing.
//!
//! Pulls tags, page references, links, dates and times out of raw text
//! without building a tree.

use super::{
    grammar::GrammarError,
    scanner::{Delimiter, Pattern, Scanner},
    span::TextRange,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Tag,
    Entity,
    Link,
    Term,
    Date,
    Time,
    Url,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub value: String,
    pub range: TextRange,
}

const KINDS: [(ReferenceKind, &str); 8] = [
    (ReferenceKind::Entity, r"#\{(?P<value>[^}]+)\}"),
    (ReferenceKind::Tag, r"#(?P<value>[\w\-]+)"),
    (ReferenceKind::Link, r"\[[^\]]*\]\((?P<value>[^)]*)\)"),
    (ReferenceKind::Term, r"\b_(?P<value>[^_]+)_\b"),
    (ReferenceKind::Email, r"<(?P<value>[\w.+\-]+@[\w\-]+(?:\.[\w\-]+)+)>"),
    (
        ReferenceKind::Url,
        r"(?P<value>[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s>)\]]+)",
    ),
    (ReferenceKind::Date, r"(?P<value>\d{4}-[01]\d-[0-3]\d)"),
    (ReferenceKind::Time, r"(?P<value>[012]\d:[0-5]\d(?::[0-5]\d)?)"),
];

pub struct ReferenceExtractor {
    patterns: Vec<(ReferenceKind, [Pattern; 1])>,
    lookahead: usize,
}

impl ReferenceExtractor {
    pub fn new(lookahead: usize) -> Result<Self, GrammarError> {
        if lookahead == 0 {
            return Err(GrammarError::ZeroLookahead);
        }
        let patterns = KINDS
            .iter()
            .map(|&(kind, re)| -> Result<_, GrammarError> {
                Ok((
                    kind,
                    [Pattern::new(format!("{kind:?}"), re)?.with_kind(Delimiter::Closed)],
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            lookahead,
        })
    }

    /// Every reference found in `text`, by start offset.
    ///
    /// Each kind is scanned on its own so that one kind never hides another.
    /// A URL inside a link target is reported twice, once per kind.
    pub fn extract(&self, text: &str) -> Result<Vec<Reference>, GrammarError> {
        let mut out = vec![];
        for (kind, pattern) in &self.patterns {
            for m in Scanner::new(pattern, text, self.lookahead)? {
                if let Some(value) = m.captures.get("value") {
                    out.push(Reference {
                        kind: *kind,
                        value: value.clone(),
                        range: m.range,
                    });
                }
            }
        }
        // Stable, so equal starts keep kind order
        out.sort_by_key(|r| r.range.start);
        Ok(out)
    }
}

/// Extracts references with a one-off [`ReferenceExtractor`].
pub fn references(text: &str, lookahead: usize) -> Result<Vec<Reference>, GrammarError> {
    ReferenceExtractor::new(lookahead)?.extract(text)
}
