//! Parser and tree rewriting engine for Nota notes.
//!
//! Text is parsed into a [`Tree`] by [`parse`]; [`query`] selects nodes
//! along axes and [`transform`] rewrites the tree with declarative rules.

pub mod io;
pub mod parsing;
pub mod query;
pub mod snapshot;
pub mod transform;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use io::{FsStore, NoteStore, StoreError};
pub use parsing::{Grammar, GrammarError, ParseError, ParseOptions, Parser, parse};
pub use query::{Axis, Query, QueryError};
pub use transform::{MatchContext, RuleSet, Selection, SelectionId, Transform, TransformError};
pub use tree::{NodeId, Tree, TreeError, Value};
