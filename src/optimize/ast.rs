//! Python parse/unparse round-trip
//!
//! The syntax tree keeps the code and drops its trivia: comments, trailing
//! whitespace and runs of blank lines. Regenerating the source from the
//! tree normalises those while leaving every token as written.

use std::ops::Range;

use tree_sitter::{Node, Parser};

use super::Language;
use crate::error::{Result, StudioError};

/// Return `code` regenerated from its syntax tree
///
/// Only Python is parsed; any other language is returned unchanged.
pub fn analyze_ast(code: &str, language: &str) -> Result<String> {
    match language.parse::<Language>() {
        Ok(Language::Python) => python_round_trip(code),
        _ => Ok(code.to_string()),
    }
}

fn parse_error(message: String) -> StudioError {
    StudioError::Parse {
        language: Language::Python.to_string(),
        message,
    }
}

fn python_round_trip(code: &str) -> Result<String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| parse_error(format!("failed to load grammar: {}", e)))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| parse_error("parser returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let message = match first_error(root) {
            Some(node) => {
                let pos = node.start_position();
                format!("invalid syntax at line {}, column {}", pos.row + 1, pos.column + 1)
            }
            None => "invalid syntax".to_string(),
        };
        return Err(parse_error(message));
    }

    let mut trivia = Trivia::default();
    trivia.collect(root);
    Ok(trivia.regenerate(code))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Byte ranges the regenerated source treats specially
#[derive(Debug, Default)]
struct Trivia {
    comments: Vec<Range<usize>>,
    /// String literals; their contents are reproduced exactly
    strings: Vec<Range<usize>>,
}

impl Trivia {
    fn collect(&mut self, node: Node<'_>) {
        match node.kind() {
            "comment" => {
                self.comments.push(node.byte_range());
                return;
            }
            "string" => {
                self.strings.push(node.byte_range());
                return;
            }
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(child);
        }
    }

    fn in_string(&self, offset: usize) -> bool {
        self.strings
            .iter()
            .any(|range| range.start < offset && offset < range.end)
    }

    fn regenerate(&self, code: &str) -> String {
        let mut lines: Vec<&str> = Vec::new();
        let mut pending_blank = false;
        let mut offset = 0;

        for raw in code.split('\n') {
            let (start, end) = (offset, offset + raw.len());
            offset = end + 1;

            // Comments run to the end of the line
            let cut = self
                .comments
                .iter()
                .find(|c| c.start >= start && c.start < end)
                .map_or(end, |c| c.start);
            let mut line = &code[start..cut];
            if !self.in_string(end) {
                line = line.trim_end();
            }

            if line.is_empty() && !self.in_string(start) {
                // A comment-only line disappears entirely
                if cut == end {
                    pending_blank = !lines.is_empty();
                }
                continue;
            }
            if pending_blank {
                lines.push("");
                pending_blank = false;
            }
            lines.push(line);
        }

        if lines.is_empty() {
            return String::new();
        }
        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}
