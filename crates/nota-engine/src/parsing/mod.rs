//! # Parsing
//!
//! Text goes through four stages:
//!
//! - **`lines`**: splits the text on terminators with the [`scanner`].
//! - **`blocks`**: groups lines into blocks by their line prefix.
//! - **`inline`**: resolves delimited spans inside each block's text.
//! - **`builder`**: nests blocks by indentation into a [`Tree`].
//!
//! ## Key Invariants
//!
//! - Declaration order of grammar entries is priority order.
//! - Verbatim blocks (fenced code) are raw zones: no inline matching inside.
//! - Every source line ends up in exactly one block.

pub mod blocks;
pub mod builder;
pub mod grammar;
pub mod inline;
pub mod lines;
pub mod references;
pub mod scanner;
pub mod span;

use crate::tree::{Tree, TreeError};

use blocks::BlockParser;
use builder::TreeBuilder;
pub use grammar::{Grammar, GrammarError};
use lines::lines_with_ranges;
pub use span::TextRange;

/// Lookahead window used when none is configured.
pub const DEFAULT_LOOKAHEAD: usize = 80 * 20;
/// Tab stop used when none is configured.
pub const DEFAULT_TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Scanner window size in bytes.
    pub lookahead: usize,
    /// Columns per tab stop when measuring indentation.
    pub tab_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A grammar together with the options it runs with.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Grammar,
    options: ParseOptions,
}

impl Parser {
    pub fn new(grammar: Grammar, options: ParseOptions) -> Result<Self, GrammarError> {
        if options.lookahead == 0 {
            return Err(GrammarError::ZeroLookahead);
        }
        Ok(Self { grammar, options })
    }

    /// The Nota grammar with default options.
    pub fn nota() -> Result<Self, GrammarError> {
        Self::new(Grammar::nota()?, ParseOptions::default())
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let mut blocks = BlockParser::new(&self.grammar);
        let mut builder = TreeBuilder::new(&self.grammar, self.options.tab_width);

        let lines = lines_with_ranges(text, self.options.lookahead)?;
        log::debug!("parsing {} lines", lines.len());
        for line in &lines {
            for block in blocks.push(line) {
                builder.push(block)?;
            }
        }
        if let Some(block) = blocks.finish() {
            builder.push(block)?;
        }
        Ok(builder.finish()?)
    }
}

/// Parses `text` with the Nota grammar and default options.
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    Parser::nota()?.parse(text)
}
