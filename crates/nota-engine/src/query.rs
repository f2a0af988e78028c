//! # Axis queries
//!
//! A [`Query`] walks one axis from a start node and keeps the nodes whose
//! name matches a glob. Matches are numbered into groups of adjacent nodes:
//! a new group starts whenever the axis-specific adjacency to the previous
//! match breaks.

use std::fmt;

use glob::Pattern;

use crate::tree::{Ancestors, Descendants, NextSiblings, NodeId, PreviousSiblings, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Pre-order, start node excluded.
    Descendants,
    /// Nearest first.
    Ancestors,
    /// Document order.
    NextSiblings,
    /// Nearest first.
    PreviousSiblings,
    /// Direct children in order.
    Children,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid name pattern `{pattern}`: {source}")]
pub struct QueryError {
    pattern: String,
    #[source]
    source: glob::PatternError,
}

#[derive(Clone)]
pub struct Query {
    pattern: Pattern,
    axis: Axis,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}::{}", self.axis, self.pattern.as_str())
    }
}

impl Query {
    pub fn new(pattern: &str, axis: Axis) -> Result<Self, QueryError> {
        let pattern = Pattern::new(pattern).map_err(|source| QueryError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern, axis })
    }

    pub fn descendants(pattern: &str) -> Result<Self, QueryError> {
        Self::new(pattern, Axis::Descendants)
    }

    pub fn children(pattern: &str) -> Result<Self, QueryError> {
        Self::new(pattern, Axis::Children)
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }

    /// Streams `(group, node)` pairs along the axis from `node`.
    pub fn match_iter<'t>(&'t self, tree: &'t Tree, node: NodeId) -> MatchIter<'t> {
        let walk = match self.axis {
            Axis::Descendants => Walk::Descendants(tree.descendants(node)),
            Axis::Ancestors => Walk::Ancestors(tree.ancestors(node)),
            Axis::NextSiblings => Walk::NextSiblings(tree.next_siblings(node)),
            Axis::PreviousSiblings => Walk::PreviousSiblings(tree.previous_siblings(node)),
            Axis::Children => Walk::Children(tree.children(node).iter()),
        };
        MatchIter {
            query: self,
            tree,
            walk,
            previous: None,
            group: 0,
        }
    }

    /// Collects matches into groups of adjacent nodes, in encounter order.
    pub fn match_groups(&self, tree: &Tree, node: NodeId) -> Vec<Vec<NodeId>> {
        let mut groups: Vec<Vec<NodeId>> = vec![];
        let mut current = None;
        for (group, id) in self.match_iter(tree, node) {
            match groups.last_mut() {
                Some(last) if current == Some(group) => last.push(id),
                _ => {
                    groups.push(vec![id]);
                    current = Some(group);
                }
            }
        }
        groups
    }
}

enum Walk<'t> {
    Descendants(Descendants<'t>),
    Ancestors(Ancestors<'t>),
    NextSiblings(NextSiblings<'t>),
    PreviousSiblings(PreviousSiblings<'t>),
    Children(std::slice::Iter<'t, NodeId>),
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Walk::Descendants(it) => it.next(),
            Walk::Ancestors(it) => it.next(),
            Walk::NextSiblings(it) => it.next(),
            Walk::PreviousSiblings(it) => it.next(),
            Walk::Children(it) => it.next().copied(),
        }
    }
}

pub struct MatchIter<'t> {
    query: &'t Query,
    tree: &'t Tree,
    walk: Walk<'t>,
    previous: Option<NodeId>,
    group: usize,
}

impl MatchIter<'_> {
    /// Whether `id` continues the run started by the previous match.
    fn adjacent(&self, previous: NodeId, id: NodeId) -> bool {
        let expected = match self.query.axis {
            Axis::Descendants | Axis::Children | Axis::NextSiblings => {
                self.tree.next_sibling(previous)
            }
            Axis::PreviousSiblings => self.tree.previous_sibling(previous),
            Axis::Ancestors => self.tree.parent(previous),
        };
        expected == Some(id)
    }
}

impl Iterator for MatchIter<'_> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.walk.next()?;
            if !self.query.matches_name(self.tree.name(id)) {
                continue;
            }
            if let Some(previous) = self.previous
                && !self.adjacent(previous, id)
            {
                self.group += 1;
            }
            self.previous = Some(id);
            return Some((self.group, id));
        }
    }
}
