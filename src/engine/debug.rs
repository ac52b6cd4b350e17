//! Developer tools for inspecting solution trees
//!
//! # Features
//! - Indented text rendering of a tree ([`TreePrinter`])
//! - GraphViz DOT export that draws shared nodes once ([`TreePrinter::to_dot`])

use super::arena::{Solution, SolutionArena, SolutionId, WordFormId};
use hashbrown::HashSet;
use std::fmt::Write;

/// Solution tree pretty printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Render the tree under `root`
    pub fn print(&self, arena: &SolutionArena, root: WordFormId) -> String {
        let mut output = String::new();
        self.print_form(arena, root, 0, &mut output);
        output
    }

    fn print_form(&self, arena: &SolutionArena, id: WordFormId, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if self.max_depth.is_some_and(|max| depth > max) {
            let _ = writeln!(output, "{}...", indent);
            return;
        }

        let form = arena.word_form(id);
        let _ = writeln!(output, "{}{:?} ({} solutions)", indent, form.entry, form.solutions.len());
        for &s in &form.solutions {
            let solution = arena.solution(s);
            let _ = writeln!(output, "{}{}- {}", indent, self.indent, describe(s, &solution));
            if let Some(left) = solution.left {
                self.print_form(arena, left, depth + 2, output);
            }
            if let Some(right) = solution.right {
                self.print_form(arena, right, depth + 2, output);
            }
        }
    }

    /// Generate a GraphViz DOT diagram of the tree under `root`
    pub fn to_dot(&self, arena: &SolutionArena, root: WordFormId) -> String {
        let mut output = String::new();
        output.push_str("digraph Solutions {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n");

        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let form = arena.word_form(id);
            let _ = writeln!(output, "  w{} [label={:?}, shape=ellipse]", id.index(), form.entry);
            for &s in &form.solutions {
                let solution = arena.solution(s);
                let _ = writeln!(
                    output,
                    "  s{} [label={:?}]",
                    s.index(),
                    describe(s, &solution)
                );
                let _ = writeln!(output, "  w{} -> s{}", id.index(), s.index());
                for (side, part) in [("L", solution.left), ("R", solution.right)] {
                    if let Some(part) = part {
                        let _ = writeln!(
                            output,
                            "  s{} -> w{} [label=\"{}\"]",
                            s.index(),
                            part.index(),
                            side
                        );
                        stack.push(part);
                    }
                }
            }
        }

        let _ = writeln!(output, "  w{} [style=filled, fillcolor=lightblue]", root.index());
        output.push_str("}\n");
        output
    }
}

fn describe(id: SolutionId, solution: &Solution) -> String {
    let mut label = format!("#{} {}", id.index(), solution.content.error.code());
    if solution.content.is_dictionary() {
        let _ = write!(label, " dict={}", solution.content.id);
    }
    let _ = write!(
        label,
        " base={:?} params={}",
        solution.content.base, solution.content.parameters
    );
    if !solution.rules.is_empty() {
        let _ = write!(label, " rules={:?}", solution.rule_ids());
    }
    if let Some(rating) = solution.rating {
        let _ = write!(label, " rating={:.3}", rating);
    }
    label
}
