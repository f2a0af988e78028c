use crate::tree::{NodeId, Tree, TreeError};

use super::{
    blocks::MatchedBlock,
    grammar::{BlockDef, Grammar, is_blank},
    inline::{Inline, match_inlines},
};

/// Name of the root node.
pub const DOCUMENT: &str = "document";
/// Name of the node holding plain text blocks.
pub const PARAGRAPH: &str = "paragraph";

/// Captures that describe layout rather than content.
const LAYOUT_CAPTURES: [&str; 2] = ["indent", "indented"];

#[derive(Debug, Clone, Copy)]
struct Frame {
    indent: isize,
    node: NodeId,
    wrapper: bool,
}

/// The node plain text currently flows into.
#[derive(Debug)]
struct Running {
    node: NodeId,
    lines: Vec<String>,
}

/// Turns matched blocks into a [`Tree`], nesting them by indentation.
pub struct TreeBuilder<'g> {
    grammar: &'g Grammar,
    tab_width: usize,
    tree: Tree,
    stack: Vec<Frame>,
    running: Option<Running>,
}

impl<'g> TreeBuilder<'g> {
    pub fn new(grammar: &'g Grammar, tab_width: usize) -> Self {
        let tree = Tree::new(DOCUMENT);
        let root = Frame {
            indent: -1,
            node: tree.root(),
            wrapper: false,
        };
        Self {
            grammar,
            tab_width: tab_width.max(1),
            tree,
            stack: vec![root],
            running: None,
        }
    }

    pub fn push(&mut self, block: MatchedBlock) -> Result<(), TreeError> {
        let grammar = self.grammar;
        let def = block.def.and_then(|i| grammar.block(i));

        if def.is_some_and(BlockDef::is_blank) {
            return self.flush();
        }
        if def.is_none()
            && let Some(running) = &mut self.running
        {
            running.lines.extend(block.lines);
            let node = running.node;
            self.tree.set_attribute(node, "end", block.range.end)?;
            return Ok(());
        }
        self.flush()?;

        let nested = def.is_some_and(|d| d.nested);
        let indent = self.indentation(&block) + isize::from(nested);
        let wrapper_name = def.and_then(BlockDef::wrapper_name);
        self.pop_to(indent, wrapper_name);

        let mut parent = self.top().node;
        if let Some(name) = wrapper_name {
            parent = self.wrapper(name, indent, parent)?;
        }

        let name = match def {
            Some(d) => d.item_name(),
            None => PARAGRAPH.to_string(),
        };
        let node = self.tree.create(name);
        self.tree.set_attribute(node, "start", block.range.start)?;
        self.tree.set_attribute(node, "end", block.range.end)?;
        if let Some(start) = &block.start {
            for (k, v) in &start.captures {
                if !v.is_empty() && !LAYOUT_CAPTURES.contains(&k.as_str()) {
                    self.tree.set_attribute(node, k.clone(), v.clone())?;
                }
            }
        }
        self.tree.append(parent, node)?;
        log::trace!(
            "{} at indent {indent} under {}",
            self.tree.name(node),
            self.tree.name(parent)
        );

        if nested {
            self.stack.push(Frame {
                indent,
                node,
                wrapper: false,
            });
        }

        match def {
            Some(d) if d.line || d.verbatim => self.fill(node, &block.lines, d.verbatim),
            _ => {
                self.running = Some(Running {
                    node,
                    lines: block.lines,
                });
                Ok(())
            }
        }
    }

    pub fn finish(mut self) -> Result<Tree, TreeError> {
        self.flush()?;
        Ok(self.tree)
    }

    fn top(&self) -> Frame {
        // The root frame is never popped
        self.stack[self.stack.len() - 1]
    }

    fn pop_to(&mut self, indent: isize, wrapper_name: Option<&str>) {
        while self.stack.len() > 1 {
            let top = self.top();
            let foreign_wrapper =
                top.wrapper && Some(self.tree.name(top.node)) != wrapper_name;
            if top.indent < indent && !foreign_wrapper {
                break;
            }
            self.stack.pop();
        }
    }

    /// Reuses the wrapper on top of the stack or opens a new one.
    fn wrapper(&mut self, name: &str, indent: isize, parent: NodeId) -> Result<NodeId, TreeError> {
        let top = self.top();
        if top.wrapper && self.tree.name(top.node) == name {
            return Ok(top.node);
        }
        let wrapper = self.tree.create(name);
        self.tree.append(parent, wrapper)?;
        self.stack.push(Frame {
            indent: indent - 1,
            node: wrapper,
            wrapper: true,
        });
        Ok(wrapper)
    }

    fn indentation(&self, block: &MatchedBlock) -> isize {
        let indented = block
            .start
            .as_ref()
            .and_then(|s| s.capture("indent").map(|i| (s.capture("indented").is_some(), i)));
        let width = match indented {
            Some((true, indent)) => columns(indent, self.tab_width),
            _ => {
                let head: Vec<usize> = block
                    .lines
                    .iter()
                    .filter(|l| !is_blank(l))
                    .take(4)
                    .map(|l| columns(l, self.tab_width))
                    .collect();
                if head.is_empty() {
                    0
                } else {
                    head.iter().sum::<usize>().div_ceil(head.len())
                }
            }
        };
        isize::try_from(width).unwrap_or(isize::MAX)
    }

    fn flush(&mut self) -> Result<(), TreeError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        self.fill(running.node, &running.lines, false)
    }

    fn fill(&mut self, node: NodeId, lines: &[String], verbatim: bool) -> Result<(), TreeError> {
        let text = block_text(lines, self.tab_width);
        if text.is_empty() {
            return Ok(());
        }
        if verbatim {
            let leaf = self.tree.create_text(text);
            return self.tree.append(node, leaf);
        }
        for inline in match_inlines(&text, self.grammar.inlines()) {
            let child = self.inline_node(inline)?;
            self.tree.append(node, child)?;
        }
        Ok(())
    }

    fn inline_node(&mut self, inline: Inline) -> Result<NodeId, TreeError> {
        match inline {
            Inline::Text(s) => Ok(self.tree.create_text(s)),
            Inline::Span(span) => {
                let node = self.tree.create(span.name);
                for (k, v) in span.attributes {
                    self.tree.set_attribute(node, k, v)?;
                }
                for c in span.children {
                    let child = self.inline_node(c)?;
                    self.tree.append(node, child)?;
                }
                Ok(node)
            }
        }
    }
}

/// Width of the leading whitespace of `line`, expanding tabs.
pub fn columns(line: &str, tab_width: usize) -> usize {
    let mut count = 0;
    for c in line.chars() {
        match c {
            '\t' => count += tab_width - (count % tab_width),
            ' ' => count += 1,
            _ => break,
        }
    }
    count
}

/// Removes `width` columns of leading whitespace, splitting tabs if needed.
fn strip_columns(line: &str, width: usize, tab_width: usize) -> String {
    let mut count = 0;
    for (i, c) in line.char_indices() {
        if count >= width {
            return format!("{}{}", " ".repeat(count - width), &line[i..]);
        }
        match c {
            '\t' => count += tab_width - (count % tab_width),
            ' ' => count += 1,
            _ => return line[i..].to_string(),
        }
    }
    " ".repeat(count.saturating_sub(width))
}

/// Dedents `lines` by their common indentation, drops leading and trailing
/// blank lines and joins the rest.
pub fn block_text(lines: &[String], tab_width: usize) -> String {
    let first = lines.iter().position(|l| !is_blank(l));
    let last = lines.iter().rposition(|l| !is_blank(l));
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let body = &lines[first..=last];
    let common = body
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| columns(l, tab_width))
        .min()
        .unwrap_or(0);
    body.iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                strip_columns(l, common, tab_width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
