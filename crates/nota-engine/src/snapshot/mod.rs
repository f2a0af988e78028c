//! # Snapshot Testing Support
//!
//! Utilities for testing the parser and transforms via snapshot assertions
//! and invariant checks.
//!
//! ## Modules
//!
//! - **`normalize`**: Converts a tree to a stable, serializable `Snap` and
//!   to an indented text outline for `insta` snapshots
//! - **`invariants`**: Runtime checks for tree correctness (acyclic, one
//!   parent per node, each child listed exactly once)

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::{Snap, normalize, outline};
