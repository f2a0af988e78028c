//! Grammar declarations.
//!
//! A [`Grammar`] is two ordered lists: block entries recognised by their
//! line prefix, and inline entries recognised by start/end delimiters.
//! Declaration order is priority order in both lists.

use std::collections::BTreeMap;

use regex::{Captures, Regex};

use super::{scanner::named_captures, span::TextRange};

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("invalid pattern `{name}`: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern `{0}` can match the empty string")]
    EmptyMatch(String),
    #[error("at least one pattern is required")]
    NoPatterns,
    #[error("lookahead must be greater than zero")]
    ZeroLookahead,
    #[error("sequential block `{0}` must be named `<list>-item`")]
    SequentialName(String),
}

fn compile(name: &str, pattern: &str) -> Result<Regex, GrammarError> {
    Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

/// Rewrites the consumed prefix text of a line.
pub type Extract = fn(&Captures<'_>) -> String;

/// Replaces the whole match by as many spaces, keeping columns aligned.
pub fn as_spaces(caps: &Captures<'_>) -> String {
    let consumed = caps.get(0).map_or("", |m| m.as_str());
    let kept = caps.name("indent").map_or("", |m| m.as_str());
    let marker = consumed.len() - kept.len();
    format!("{kept}{}", " ".repeat(marker))
}

/// Matcher anchored at the start of a line.
#[derive(Debug, Clone)]
pub struct Prefix {
    regex: Option<Regex>,
    indented: bool,
    extract: Option<Extract>,
}

/// A successful [`Prefix`] match against one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Range of the consumed prefix, relative to the line.
    pub range: TextRange,
    pub captures: BTreeMap<String, String>,
    /// Text standing in for the consumed prefix, if the prefix rewrites it.
    pub replacement: Option<String>,
}

impl PrefixMatch {
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }
}

impl Prefix {
    /// Matches `pattern` at the very start of the line.
    pub fn new(pattern: &str) -> Result<Self, GrammarError> {
        Ok(Self {
            regex: Some(compile(pattern, &format!("^(?:{pattern})"))?),
            indented: false,
            extract: None,
        })
    }

    /// Matches `pattern` after optional indentation, captured as `indent`.
    pub fn indented(pattern: &str) -> Result<Self, GrammarError> {
        Ok(Self {
            regex: Some(compile(
                pattern,
                &format!("^(?P<indent>[ \\t]*)(?P<indented>{pattern})"),
            )?),
            indented: true,
            extract: None,
        })
    }

    /// Matches lines holding nothing but spaces and tabs.
    pub fn blank() -> Self {
        Self {
            regex: None,
            indented: false,
            extract: None,
        }
    }

    #[must_use]
    pub fn with_extract(mut self, extract: Extract) -> Self {
        self.extract = Some(extract);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_indented(&self) -> bool {
        self.indented
    }

    pub fn matches(&self, line: &str) -> Option<PrefixMatch> {
        let Some(regex) = &self.regex else {
            return is_blank(line).then(|| PrefixMatch {
                range: TextRange::new(0, line.len()),
                captures: BTreeMap::new(),
                replacement: None,
            });
        };
        let caps = regex.captures(line)?;
        let whole = caps.get(0)?;
        Some(PrefixMatch {
            range: TextRange::new(whole.start(), whole.end()),
            captures: named_captures(regex, &caps),
            replacement: self.extract.map(|f| f(&caps)),
        })
    }
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c == ' ' || c == '\t')
}

/// A block entry.
#[derive(Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    pub start: Prefix,
    /// Present for explicitly delimited blocks, which run until it matches.
    pub end: Option<Prefix>,
    /// Consecutive entries are grouped under a wrapper node.
    pub sequential: bool,
    /// Deeper-indented blocks become children of this one.
    pub nested: bool,
    /// Single line: following text never flows into it.
    pub line: bool,
    /// Content is kept as one text node, without inline matching.
    pub verbatim: bool,
}

impl BlockDef {
    pub fn new(name: impl Into<String>, start: Prefix) -> Self {
        Self {
            name: name.into(),
            start,
            end: None,
            sequential: false,
            nested: false,
            line: false,
            verbatim: false,
        }
    }

    #[must_use]
    pub fn until(mut self, end: Prefix) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    #[must_use]
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    #[must_use]
    pub fn line(mut self) -> Self {
        self.line = true;
        self
    }

    #[must_use]
    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.start.is_blank()
    }

    /// Name of the wrapper grouping a sequential entry, `ordered-list` for
    /// `ordered-list-item`.
    pub fn wrapper_name(&self) -> Option<&str> {
        if !self.sequential {
            return None;
        }
        self.name.strip_suffix("-item")
    }

    /// Name given to each item under the wrapper, `list-item` for
    /// `ordered-list-item`.
    pub fn item_name(&self) -> String {
        match self.wrapper_name() {
            Some(wrapper) => {
                let last = wrapper.rsplit('-').next().unwrap_or(wrapper);
                format!("{last}-item")
            }
            None => self.name.clone(),
        }
    }
}

/// An inline entry.
#[derive(Debug, Clone)]
pub struct InlineDef {
    pub name: String,
    pub start: Regex,
    /// `None` for standalone microformats, which have no interior.
    pub end: Option<Regex>,
    /// Interior is kept as text instead of being matched again.
    pub raw: bool,
}

impl InlineDef {
    /// Same delimiter on both sides, like `*emphasis*`.
    pub fn symmetric(name: impl Into<String>, delimiter: &str) -> Result<Self, GrammarError> {
        Self::delimited(name, delimiter, delimiter)
    }

    pub fn delimited(
        name: impl Into<String>,
        start: &str,
        end: &str,
    ) -> Result<Self, GrammarError> {
        let name = name.into();
        Ok(Self {
            start: compile(&name, start)?,
            end: Some(compile(&name, end)?),
            name,
            raw: false,
        })
    }

    /// A single pattern with no interior, like `#tag` or a date.
    pub fn standalone(name: impl Into<String>, pattern: &str) -> Result<Self, GrammarError> {
        let name = name.into();
        Ok(Self {
            start: compile(&name, pattern)?,
            end: None,
            name,
            raw: false,
        })
    }

    #[must_use]
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// Whether `regex` has a match consuming no input, zero-width assertions
/// like `\b` included.
fn can_match_empty(regex: &Regex) -> bool {
    regex.is_match("")
        || regex_syntax::parse(regex.as_str())
            .is_ok_and(|hir| hir.properties().minimum_len() == Some(0))
}

/// Ordered block and inline entries.
#[derive(Debug, Clone)]
pub struct Grammar {
    blocks: Vec<BlockDef>,
    inlines: Vec<InlineDef>,
}

impl Grammar {
    pub fn new(blocks: Vec<BlockDef>, inlines: Vec<InlineDef>) -> Result<Self, GrammarError> {
        for b in &blocks {
            if b.sequential && b.wrapper_name().is_none_or(str::is_empty) {
                return Err(GrammarError::SequentialName(b.name.clone()));
            }
        }
        for i in &inlines {
            let empty = can_match_empty(&i.start) || i.end.as_ref().is_some_and(can_match_empty);
            if empty {
                return Err(GrammarError::EmptyMatch(i.name.clone()));
            }
        }
        Ok(Self { blocks, inlines })
    }

    pub fn blocks(&self) -> &[BlockDef] {
        &self.blocks
    }

    pub fn inlines(&self) -> &[InlineDef] {
        &self.inlines
    }

    pub fn block(&self, index: usize) -> Option<&BlockDef> {
        self.blocks.get(index)
    }

    /// The Nota note format.
    pub fn nota() -> Result<Self, GrammarError> {
        let fence = r"```(?P<lang>.*)$";
        let blocks = vec![
            BlockDef::new("empty", Prefix::blank()),
            BlockDef::new("code", Prefix::indented(fence)?)
                .until(Prefix::indented(r"```[ \t]*$")?)
                .verbatim(),
            BlockDef::new("title", Prefix::new(r"==+[ ]*")?).line(),
            BlockDef::new("comment", Prefix::new(r"//[ ]*")?).line(),
            BlockDef::new("heading", Prefix::new(r"(?P<depth>#+)[ ]+")?).line(),
            BlockDef::new("meta", Prefix::new(r"--[ ]*")?).line(),
            BlockDef::new(
                "todo-list-item",
                Prefix::indented(r"(?:[-*][ ]+)?\[(?P<state>[ xX])\][ ]*")?
                    .with_extract(as_spaces),
            )
            .sequential()
            .nested(),
            BlockDef::new(
                "ordered-list-item",
                Prefix::indented(r"(?P<number>[0-9]+|[a-zA-Z])[\)\.][ ]+")?
                    .with_extract(as_spaces),
            )
            .sequential()
            .nested(),
            BlockDef::new(
                "unordered-list-item",
                Prefix::indented(r"(?P<bullet>[-*+])[ ]+")?.with_extract(as_spaces),
            )
            .sequential()
            .nested(),
            BlockDef::new(
                "definition-list-item",
                Prefix::new(r"(?P<term>(?:[^:]|:[^:])+)::[ ]*$")?,
            )
            .sequential(),
        ];

        let inlines = vec![
            InlineDef::symmetric("code", "`")?.raw(),
            InlineDef::symmetric("strong", r"\*\*")?,
            InlineDef::symmetric("emphasis", r"\*")?,
            InlineDef::symmetric("term", "_")?,
            InlineDef::delimited("quote", "<<", ">>")?,
            InlineDef::delimited("link", r"\[", r"\]\((?P<target>[^)]*)\)")?,
            InlineDef::delimited("anchor", r"\[", r"\]")?,
            InlineDef::standalone("ref", r"#\{(?P<name>[^}]+)\}")?,
            InlineDef::standalone("tag", r"#(?P<name>[\w\-]+)")?,
            InlineDef::standalone(
                "email",
                r"<(?P<address>[\w.+\-]+@[\w\-]+(?:\.[\w\-]+)+)>",
            )?,
            InlineDef::standalone("url", r"<(?P<url>[a-zA-Z][a-zA-Z0-9+.\-]*://[^>\s]+)>")?,
            InlineDef::standalone("date", r"(?P<date>\d{4}-[01]\d-[0-3]\d)")?,
            InlineDef::standalone("time", r"(?P<time>[012]\d:[0-5]\d(?::[0-5]\d)?)")?,
        ];

        Self::new(blocks, inlines)
    }
}
