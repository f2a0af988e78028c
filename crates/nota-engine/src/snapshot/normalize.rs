use std::collections::BTreeMap;

use serde::Serialize;

use crate::tree::{NodeId, Tree, Value};

/// Attributes left out of outlines: they shift with every edit.
const OFFSET_ATTRIBUTES: [&str; 2] = ["start", "end"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snap {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Snap>,
}

/// Converts the subtree under `node` into owned, comparable form.
pub fn normalize(tree: &Tree, node: NodeId) -> Snap {
    Snap {
        name: tree.name(node).to_string(),
        attributes: tree.attributes(node).clone(),
        children: tree
            .children(node)
            .iter()
            .map(|&c| normalize(tree, c))
            .collect(),
    }
}

/// Indented one-node-per-line dump of the tree.
///
/// Text leaves print as quoted strings; other nodes print their name and
/// their attributes except offsets.
pub fn outline(tree: &Tree) -> String {
    let mut out = String::new();
    write_node(tree, tree.root(), 0, &mut out);
    out
}

fn write_node(tree: &Tree, node: NodeId, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match tree.text(node) {
        Some(text) => {
            out.push_str(&format!("{pad}{text:?}\n"));
        }
        None => {
            out.push_str(&pad);
            out.push_str(tree.name(node));
            for (k, v) in tree.attributes(node) {
                if !OFFSET_ATTRIBUTES.contains(&k.as_str()) {
                    out.push_str(&format!(" {k}={:?}", v.to_string()));
                }
            }
            out.push('\n');
        }
    }
    for &child in tree.children(node) {
        write_node(tree, child, depth + 1, out);
    }
}
