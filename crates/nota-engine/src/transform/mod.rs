//! # Tree transforms
//!
//! A [`Selection`] pairs a [`Query`] with transforms and nested selections.
//! Applying it binds each group of matches to the selection's id in a
//! [`MatchContext`], runs the transforms against that context, then runs
//! every child selection from each matched node with the node bound alone.
//!
//! Transforms may only name their own selection or an enclosing one;
//! [`RuleSet::new`] checks this once so application never meets an unbound
//! id from a valid rule set.

mod context;
pub mod rules;

use std::fmt;

use uuid::Uuid;

use crate::{
    query::{Query, QueryError},
    tree::{NodeId, Tree, TreeError},
};

pub use context::MatchContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(Uuid);

impl SelectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SelectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("selection {0} is not bound in this scope")]
    UnboundSelection(SelectionId),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Callback run by [`Transform::Effect`].
pub type EffectFn = Box<dyn Fn(&Tree, &[NodeId]) + Send + Sync>;

pub enum Transform {
    /// Puts copies of the `replacement` nodes where each `original` node stood.
    Replace {
        original: SelectionId,
        replacement: SelectionId,
    },
    /// Detaches every bound node.
    Remove(SelectionId),
    /// Observes the bound nodes without changing the tree.
    Effect(SelectionId, EffectFn),
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Replace {
                original,
                replacement,
            } => f
                .debug_struct("Replace")
                .field("original", original)
                .field("replacement", replacement)
                .finish(),
            Transform::Remove(id) => f.debug_tuple("Remove").field(id).finish(),
            Transform::Effect(id, _) => f.debug_tuple("Effect").field(id).finish(),
        }
    }
}

impl Transform {
    fn references(&self) -> Vec<SelectionId> {
        match self {
            Transform::Replace {
                original,
                replacement,
            } => vec![*original, *replacement],
            Transform::Remove(id) | Transform::Effect(id, _) => vec![*id],
        }
    }

    fn apply(&self, tree: &mut Tree, ctx: &MatchContext<'_>) -> Result<(), TransformError> {
        let bound = |id: SelectionId| ctx.get(id).ok_or(TransformError::UnboundSelection(id));
        match self {
            Transform::Replace {
                original,
                replacement,
            } => {
                let replacements = bound(*replacement)?;
                for &node in bound(*original)? {
                    if tree.parent(node).is_none() {
                        log::debug!("skipping replace of detached {}", tree.name(node));
                        continue;
                    }
                    // Copy first: the replacements may sit inside `node`
                    let copies = replacements
                        .iter()
                        .map(|&r| tree.copy_subtree(r))
                        .collect::<Result<Vec<_>, _>>()?;
                    tree.replace(node, &copies)?;
                }
            }
            Transform::Remove(id) => {
                for &node in bound(*id)? {
                    if tree.parent(node).is_some() {
                        tree.detach(node)?;
                    }
                }
            }
            Transform::Effect(id, f) => f(tree, bound(*id)?),
        }
        Ok(())
    }
}

/// A query with the transforms and nested selections run on its matches.
#[derive(Debug)]
pub struct Selection {
    id: SelectionId,
    query: Query,
    children: Vec<Selection>,
    transforms: Vec<Transform>,
}

impl Selection {
    pub fn new(query: Query) -> Self {
        Self {
            id: SelectionId::new(),
            query,
            children: vec![],
            transforms: vec![],
        }
    }

    pub fn id(&self) -> SelectionId {
        self.id
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn children(&self) -> &[Selection] {
        &self.children
    }

    #[must_use]
    pub fn with_child(mut self, child: Selection) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    #[must_use]
    pub fn replace(self, original: SelectionId, replacement: SelectionId) -> Self {
        self.with_transform(Transform::Replace {
            original,
            replacement,
        })
    }

    #[must_use]
    pub fn remove(self, target: SelectionId) -> Self {
        self.with_transform(Transform::Remove(target))
    }

    /// Removes this selection's own matches.
    #[must_use]
    pub fn remove_matches(self) -> Self {
        let id = self.id;
        self.remove(id)
    }

    #[must_use]
    pub fn effect(
        self,
        target: SelectionId,
        f: impl Fn(&Tree, &[NodeId]) + Send + Sync + 'static,
    ) -> Self {
        self.with_transform(Transform::Effect(target, Box::new(f)))
    }

    /// Runs this selection from `node` inside the scope `parent`.
    pub fn apply(
        &self,
        tree: &mut Tree,
        node: NodeId,
        parent: &MatchContext<'_>,
    ) -> Result<(), TransformError> {
        let groups = self.query.match_groups(tree, node);
        log::trace!("{:?} matched {} groups", self.query, groups.len());

        for group in groups {
            let mut ctx = parent.derive();
            ctx.bind(self.id, group.clone());
            for t in &self.transforms {
                t.apply(tree, &ctx)?;
            }
            for child in &self.children {
                for &n in &group {
                    let mut sub = ctx.derive();
                    sub.bind(self.id, vec![n]);
                    child.apply(tree, n, &sub)?;
                }
            }
        }
        Ok(())
    }

    fn validate(&self, scope: &mut Vec<SelectionId>) -> Result<(), TransformError> {
        scope.push(self.id);
        for t in &self.transforms {
            if let Some(id) = t.references().into_iter().find(|id| !scope.contains(id)) {
                return Err(TransformError::UnboundSelection(id));
            }
        }
        for child in &self.children {
            child.validate(scope)?;
        }
        scope.pop();
        Ok(())
    }
}

/// Validated selections, applied in order from the document root.
#[derive(Debug)]
pub struct RuleSet {
    selections: Vec<Selection>,
}

impl RuleSet {
    pub fn new(selections: Vec<Selection>) -> Result<Self, TransformError> {
        for s in &selections {
            s.validate(&mut vec![])?;
        }
        Ok(Self { selections })
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn apply(&self, tree: &mut Tree) -> Result<(), TransformError> {
        let root = tree.root();
        let ctx = MatchContext::new();
        for s in &self.selections {
            s.apply(tree, root, &ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsing::parse, snapshot::outline};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_remove_detaches_matches() {
        let mut tree = parse("// note to self\nkeep me\n\n// another\n").unwrap();
        let rules = RuleSet::new(vec![
            Selection::new(Query::descendants("comment").unwrap()).remove_matches(),
        ])
        .unwrap();

        rules.apply(&mut tree).unwrap();

        assert_eq!(outline(&tree), "document\n  paragraph\n    \"keep me\"\n");
    }

    #[test]
    fn test_replace_swaps_in_copies_of_nested_matches() {
        // Given a heading holding an emphasis
        let mut tree = parse("# A *loud* title\n").unwrap();
        let heading = Selection::new(Query::descendants("heading").unwrap());
        let emphasis = Selection::new(Query::children("emphasis").unwrap());
        let emphasis = {
            let (h, e) = (heading.id(), emphasis.id());
            emphasis.replace(h, e)
        };
        let rules = RuleSet::new(vec![heading.with_child(emphasis)]).unwrap();

        // When the heading is replaced by its emphasis
        rules.apply(&mut tree).unwrap();

        // Then the copy stands at the document level
        assert_eq!(outline(&tree), "document\n  emphasis\n    \"loud\"\n");
    }

    #[test]
    fn test_effect_sees_whole_groups() {
        let mut tree = parse("- a\n- b\n\ntext\n\n- c\n").unwrap();
        let seen = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&seen);
        let items = Selection::new(Query::descendants("list-item").unwrap());
        let id = items.id();
        let items = items.effect(id, move |tree, nodes| {
            let texts: Vec<String> = nodes.iter().map(|&n| tree.text_content(n)).collect();
            sink.lock().unwrap().push(texts);
        });

        RuleSet::new(vec![items]).unwrap().apply(&mut tree).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_children_bind_single_nodes() {
        let mut tree = parse("- a\n- b\n").unwrap();
        let seen = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&seen);
        let items = Selection::new(Query::descendants("list-item").unwrap());
        let items_id = items.id();
        let text = Selection::new(Query::children("#text").unwrap()).effect(
            items_id,
            move |_, nodes| sink.lock().unwrap().push(nodes.len()),
        );

        RuleSet::new(vec![items.with_child(text)])
            .unwrap()
            .apply(&mut tree)
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_unbound_selection_is_rejected() {
        let stranger = Selection::new(Query::descendants("x").unwrap());
        let rule = Selection::new(Query::descendants("y").unwrap()).remove(stranger.id());

        let err = RuleSet::new(vec![rule]).unwrap_err();

        assert!(matches!(err, TransformError::UnboundSelection(id) if id == stranger.id()));
    }

    #[test]
    fn test_sibling_selection_is_not_in_scope() {
        let first = Selection::new(Query::descendants("a").unwrap());
        let second = Selection::new(Query::descendants("b").unwrap()).remove(first.id());
        let parent = Selection::new(Query::descendants("*").unwrap())
            .with_child(first)
            .with_child(second);

        assert!(RuleSet::new(vec![parent]).is_err());
    }
}
