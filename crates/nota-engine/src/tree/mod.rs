//! # Document tree
//!
//! An arena of named nodes with attributes, ordered children and a single
//! parent link. Parsing produces a [`Tree`]; queries read it and transforms
//! rewrite it through the checked mutation API below.
//!
//! ## Invariants
//!
//! - The tree is acyclic.
//! - A node appears in exactly one parent's child list, exactly once.
//! - Re-parenting requires detaching first.
//!
//! Detached nodes stay in the arena, unreachable from the root, so a
//! [`NodeId`] is never invalidated by a mutation.

mod iter;
mod value;

use std::collections::BTreeMap;

pub use iter::{Ancestors, Descendants, NextSiblings, PreviousSiblings};
pub use value::Value;

/// Name given to text leaves.
pub const TEXT: &str = "#text";
/// Attribute holding a text leaf's content.
pub const TEXT_VALUE: &str = "value";

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("node {0:?} has no parent")]
    NotAttached(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    WrongParent { parent: NodeId, child: NodeId },
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the root node cannot be attached")]
    RootMove,
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    attributes: BTreeMap<String, Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-backed document tree.
///
/// Read accessors index the arena directly and panic on a [`NodeId`] that
/// came from another tree. Mutations validate their arguments and return
/// [`TreeError`] instead.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Tree {
    /// Creates a tree holding a single root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData::new(root_name)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached element node.
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(name));
        id
    }

    /// Allocates a detached text leaf.
    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        let id = self.create(TEXT);
        self.nodes[id.0]
            .attributes
            .insert(TEXT_VALUE.to_string(), Value::Str(value.into()));
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    // -- reading --

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.nodes[id.0].attributes.get(key)
    }

    pub fn attributes(&self, id: NodeId) -> &BTreeMap<String, Value> {
        &self.nodes[id.0].attributes
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.nodes[id.0].name == TEXT
    }

    /// Content of a text leaf, `None` for element nodes.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        if !self.is_text(id) {
            return None;
        }
        self.attribute(id, TEXT_VALUE).and_then(Value::as_str)
    }

    /// Concatenated content of every text leaf below `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.text(d) {
                out.push_str(t);
            }
        }
        out
    }

    /// Position of `id` within its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let i = self.index_in_parent(id)?;
        self.children(parent).get(i + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let i = self.index_in_parent(id)?;
        i.checked_sub(1).map(|j| self.children(parent)[j])
    }

    /// True if `id` can be reached from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Pre-order traversal of everything below `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors::new(self, id)
    }

    /// Siblings after `id`, in document order.
    pub fn next_siblings(&self, id: NodeId) -> NextSiblings<'_> {
        NextSiblings::new(self, id)
    }

    /// Siblings before `id`, nearest first.
    pub fn previous_siblings(&self, id: NodeId) -> PreviousSiblings<'_> {
        PreviousSiblings::new(self, id)
    }

    // -- mutation --

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), TreeError> {
        self.check(id)?;
        self.nodes[id.0].attributes.insert(key.into(), value.into());
        Ok(())
    }

    /// Appends a detached `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let at = self
            .nodes
            .get(parent.0)
            .map(|p| p.children.len())
            .ok_or(TreeError::UnknownNode(parent))?;
        self.insert(parent, at, child)
    }

    /// Inserts a detached `child` at position `index` among `parent`'s children.
    /// An index past the end appends.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(TreeError::RootMove);
        }
        if self.nodes[child.0].parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Unlinks `id` from its parent. The subtree below `id` is kept intact.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        let parent = self.nodes[id.0].parent.ok_or(TreeError::NotAttached(id))?;
        self.remove_child(parent, id)
    }

    /// Unlinks `child` from `parent`, failing if it is not one of its children.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check(parent)?;
        self.check(child)?;
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::WrongParent { parent, child })?;
        self.nodes[parent.0].children.remove(pos);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    /// Puts `replacements` where `old` stood, in order, and detaches `old`.
    ///
    /// Every replacement must be detached; nothing is changed if any check
    /// fails.
    pub fn replace(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<(), TreeError> {
        self.check(old)?;
        let parent = self.nodes[old.0].parent.ok_or(TreeError::NotAttached(old))?;
        for (i, &r) in replacements.iter().enumerate() {
            if r == old || replacements[..i].contains(&r) {
                return Err(TreeError::AlreadyAttached(r));
            }
            self.check_attachable(parent, r)?;
        }
        let pos = self
            .index_in_parent(old)
            .ok_or(TreeError::WrongParent { parent, child: old })?;
        self.nodes[parent.0]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        self.nodes[old.0].parent = None;
        for &r in replacements {
            self.nodes[r.0].parent = Some(parent);
        }
        Ok(())
    }

    /// Deep-copies the subtree rooted at `id`. The copy is detached.
    pub fn copy_subtree(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        self.check(id)?;
        let data = &self.nodes[id.0];
        let copy = NodeId(self.nodes.len());
        let mut node = NodeData::new(data.name.clone());
        node.attributes = data.attributes.clone();
        let children = data.children.clone();
        self.nodes.push(node);
        for child in children {
            let c = self.copy_subtree(child)?;
            self.nodes[c.0].parent = Some(copy);
            self.nodes[copy.0].children.push(c);
        }
        Ok(copy)
    }
}
