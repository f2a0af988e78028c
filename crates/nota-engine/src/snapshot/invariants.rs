use std::collections::HashSet;

use crate::tree::{NodeId, Tree};

/// Validates the structural invariants of the part of `tree` reachable
/// from the root.
///
/// Asserts that:
/// - No node is reached twice (acyclic, listed exactly once)
/// - Every child's parent link points back at the node listing it
/// - The root has no parent
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(tree: &Tree) {
    let root = tree.root();
    assert!(
        tree.parent(root).is_none(),
        "root {root:?} has parent {:?}",
        tree.parent(root)
    );

    let mut seen: HashSet<NodeId> = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        for &child in tree.children(node) {
            assert!(
                seen.insert(child),
                "node {child:?} ({}) reached twice, last under {node:?}",
                tree.name(child)
            );
            assert_eq!(
                tree.parent(child),
                Some(node),
                "node {child:?} is listed under {node:?} but points at another parent"
            );
            stack.push(child);
        }
    }
}
