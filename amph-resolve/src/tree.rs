// amph-resolve/src/tree.rs
//! Textual dump of a collected dependency graph.

use std::io::Write;

use amph_common::Result;

use crate::graph::DependencyNode;

/// Writes one line per graph node to the wrapped sink, indented by depth.
/// Conflict losers stay in the tree, annotated with the winning version.
pub struct TreePrinter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> TreePrinter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    pub fn print(&mut self, root: &DependencyNode) -> Result<()> {
        self.print_node(root, 0)
    }

    fn print_node(&mut self, node: &DependencyNode, depth: usize) -> Result<()> {
        let child_depth = match &node.dependency {
            Some(dependency) => {
                write!(self.out, "{:indent$}{}", "", dependency.artifact, indent = depth * 2)?;
                write!(self.out, " [{}]", dependency.scope)?;
                if dependency.optional {
                    write!(self.out, " (optional)")?;
                }
                if node.is_conflict_loser() {
                    let winner = node
                        .winner
                        .as_ref()
                        .and_then(|w| w.version.as_deref())
                        .unwrap_or("?");
                    write!(self.out, " (omitted for conflict with {winner})")?;
                }
                writeln!(self.out)?;
                depth + 1
            }
            // synthetic roots produce no line of their own
            None => depth,
        };

        for child in &node.children {
            self.print_node(child, child_depth)?;
        }
        Ok(())
    }
}
