use super::{NodeId, Tree};

/// Pre-order walk below a node.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    pub(super) fn new(tree: &'a Tree, start: NodeId) -> Self {
        Self {
            tree,
            stack: tree.children(start).iter().rev().copied().collect(),
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Reverse so children come out left to right
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    current: Option<NodeId>,
}

impl<'a> Ancestors<'a> {
    pub(super) fn new(tree: &'a Tree, start: NodeId) -> Self {
        Self {
            tree,
            current: tree.parent(start),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

pub struct NextSiblings<'a> {
    siblings: std::slice::Iter<'a, NodeId>,
}

impl<'a> NextSiblings<'a> {
    pub(super) fn new(tree: &'a Tree, start: NodeId) -> Self {
        let siblings: &[NodeId] = match (tree.parent(start), tree.index_in_parent(start)) {
            (Some(parent), Some(i)) => &tree.children(parent)[i + 1..],
            _ => &[],
        };
        Self {
            siblings: siblings.iter(),
        }
    }
}

impl Iterator for NextSiblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.siblings.next().copied()
    }
}

pub struct PreviousSiblings<'a> {
    siblings: std::iter::Rev<std::slice::Iter<'a, NodeId>>,
}

impl<'a> PreviousSiblings<'a> {
    pub(super) fn new(tree: &'a Tree, start: NodeId) -> Self {
        let siblings: &[NodeId] = match (tree.parent(start), tree.index_in_parent(start)) {
            (Some(parent), Some(i)) => &tree.children(parent)[..i],
            _ => &[],
        };
        Self {
            siblings: siblings.iter().rev(),
        }
    }
}

impl Iterator for PreviousSiblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.siblings.next().copied()
    }
}
