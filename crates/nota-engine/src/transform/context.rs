use std::collections::HashMap;

use crate::tree::NodeId;

use super::SelectionId;

/// Scoped bindings from selections to the nodes they matched.
///
/// Lookups fall back to the enclosing context, so a nested selection sees
/// what its ancestors matched.
#[derive(Debug, Default)]
pub struct MatchContext<'p> {
    parent: Option<&'p MatchContext<'p>>,
    bindings: HashMap<SelectionId, Vec<NodeId>>,
}

impl<'p> MatchContext<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scope nested in this one.
    pub fn derive(&self) -> MatchContext<'_> {
        MatchContext {
            parent: Some(self),
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, id: SelectionId, nodes: Vec<NodeId>) {
        self.bindings.insert(id, nodes);
    }

    /// Nodes bound to `id` in the nearest scope that has it.
    pub fn get(&self, id: SelectionId) -> Option<&[NodeId]> {
        match self.bindings.get(&id) {
            Some(nodes) => Some(nodes),
            None => self.parent.and_then(|p| p.get(id)),
        }
    }
}
