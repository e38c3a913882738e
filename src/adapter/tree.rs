// src/adapter/tree.rs
//! Tree-based indexing for dialects with a native grammar.
//!
//! Most precise of the three strategies: depth comes from the parse tree
//! itself. Python `elif` clauses are re-nested into the else arm so chain
//! depth matches what the delimiter and indent strategies would report for
//! the equivalent `else { if ... }` spelling.

use tree_sitter::{Node, Parser};

use crate::adapter::{body_is_terminal, normalize_condition};
use crate::dialect::Dialect;
use crate::error::{RefactorError, Result};
use crate::types::{Block, BlockKind, Branch, Span};

pub fn index(dialect: Dialect, text: &str) -> Result<Block> {
    let grammar = dialect.grammar().ok_or_else(|| {
        RefactorError::MalformedStructure(format!("no grammar for dialect {dialect}"))
    })?;

    let mut parser = Parser::new();
    parser.set_language(grammar).map_err(|e| {
        RefactorError::MalformedStructure(format!("grammar rejected: {e:?}"))
    })?;

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| RefactorError::MalformedStructure("parser produced no tree".into()))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(RefactorError::MalformedStructure(
            "parse tree contains errors".into(),
        ));
    }

    let builder = Builder { dialect, text };
    let mut block = Block::new(BlockKind::Other, 0, span_of(root));
    block.children = builder.collect(root, 1);
    Ok(block)
}

fn span_of(node: Node) -> Span {
    Span::new(
        node.start_byte(),
        node.end_byte(),
        node.start_position().row + 1,
        node.end_position().row + 1,
    )
}

struct Builder<'a> {
    dialect: Dialect,
    text: &'a str,
}

impl<'a> Builder<'a> {
    /// Gathers conditional and loop blocks among `node`'s descendants,
    /// treating every other construct as a transparent container.
    fn collect(&self, node: Node, depth: usize) -> Vec<Block> {
        let kinds = self.dialect.tree_kinds();
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() {
                continue;
            }
            if kinds.conditional.contains(&child.kind()) {
                out.push(self.conditional(child, depth));
            } else if kinds.loops.contains(&child.kind()) {
                out.push(self.repeat(child, depth));
            } else {
                out.extend(self.collect(child, depth));
            }
        }
        out
    }

    fn repeat(&self, node: Node, depth: usize) -> Block {
        let mut block = Block::new(BlockKind::Loop, depth, span_of(node));
        let body = node.child_by_field_name("body").unwrap_or(node);
        block.children = self.collect(body, depth + 1);
        block
    }

    fn conditional(&self, node: Node, depth: usize) -> Block {
        match self.dialect {
            Dialect::Python => self.python_conditional(node, depth),
            _ => self.braced_conditional(node, depth),
        }
    }

    /// Rust and TypeScript conditionals: condition/consequence fields plus an
    /// optional alternative holding either a plain else body or an `else if`.
    fn braced_conditional(&self, node: Node, depth: usize) -> Block {
        let mut block = Block::new(BlockKind::Conditional, depth, span_of(node));

        let condition = node
            .child_by_field_name("condition")
            .or_else(|| node.child_by_field_name("value"));
        let cond_text = condition.map_or(String::new(), |c| self.node_text(c));

        if let Some(consequence) = node
            .child_by_field_name("consequence")
            .or_else(|| node.child_by_field_name("body"))
        {
            block
                .branches
                .push(self.branch(normalize_condition(&cond_text), consequence, depth));
        }

        if let Some(alternative) = node.child_by_field_name("alternative") {
            if let Some(branch) = self.else_branch(alternative, depth) {
                block.branches.push(branch);
            }
        }
        block
    }

    /// Unwraps an `else_clause` into a trailing branch. An `else if` becomes
    /// a body block containing one nested conditional, preserving chain depth.
    fn else_branch(&self, alternative: Node, depth: usize) -> Option<Branch> {
        let kinds = self.dialect.tree_kinds();
        let inner = (0..alternative.named_child_count())
            .filter_map(|i| alternative.named_child(i))
            .next()?;

        if kinds.conditional.contains(&inner.kind()) {
            let mut body = Block::new(BlockKind::Other, depth + 1, span_of(inner));
            body.children = vec![self.conditional(inner, depth + 1)];
            return Some(Branch {
                condition: String::new(),
                body,
                terminal: false,
            });
        }
        Some(self.branch(String::new(), inner, depth))
    }

    /// Python conditionals: `elif` clauses are siblings in the parse tree but
    /// re-nest into the else arm here so they count toward chain depth.
    fn python_conditional(&self, node: Node, depth: usize) -> Block {
        let mut block = Block::new(BlockKind::Conditional, depth, span_of(node));

        let cond_text = node
            .child_by_field_name("condition")
            .map_or(String::new(), |c| self.node_text(c));
        if let Some(consequence) = node.child_by_field_name("consequence") {
            block
                .branches
                .push(self.branch(normalize_condition(&cond_text), consequence, depth));
        }

        let mut elifs = Vec::new();
        let mut else_clause = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "elif_clause" => elifs.push(child),
                "else_clause" => else_clause = Some(child),
                _ => {}
            }
        }

        if let Some(branch) = self.python_tail(&elifs, else_clause, node.end_byte(), depth) {
            block.branches.push(branch);
        }
        block
    }

    /// Builds the else arm from a run of elif clauses plus an optional final
    /// else clause, nesting one conditional per elif.
    fn python_tail(
        &self,
        elifs: &[Node],
        else_clause: Option<Node>,
        chain_end: usize,
        depth: usize,
    ) -> Option<Branch> {
        let Some((head, rest)) = elifs.split_first() else {
            let clause = else_clause?;
            let body = clause
                .child_by_field_name("body")
                .unwrap_or(clause);
            return Some(self.branch(String::new(), body, depth));
        };

        let mut nested = Block::new(
            BlockKind::Conditional,
            depth + 1,
            Span::new(
                head.start_byte(),
                chain_end,
                head.start_position().row + 1,
                head.end_position().row + 1,
            ),
        );
        let cond_text = head
            .child_by_field_name("condition")
            .map_or(String::new(), |c| self.node_text(c));
        if let Some(consequence) = head.child_by_field_name("consequence") {
            nested
                .branches
                .push(self.branch(normalize_condition(&cond_text), consequence, depth + 1));
        }
        if let Some(branch) = self.python_tail(rest, else_clause, chain_end, depth + 1) {
            nested.branches.push(branch);
        }

        let mut body = Block::new(BlockKind::Other, depth + 1, nested.span);
        body.children = vec![nested];
        Some(Branch {
            condition: String::new(),
            body,
            terminal: false,
        })
    }

    fn branch(&self, condition: String, body_node: Node, depth: usize) -> Branch {
        let mut span = span_of(body_node);
        // Braced bodies span their delimiters; narrow to the interior so the
        // sliced text is the statements alone.
        if matches!(body_node.kind(), "block" | "statement_block")
            && self.text.get(span.start..=span.start) == Some("{")
        {
            span.start = (span.start + 1).min(span.end);
            span.end = span.end.saturating_sub(1).max(span.start);
        }
        let mut body = Block::new(BlockKind::Other, depth + 1, span);
        body.children = self.collect(body_node, depth + 1);
        let terminal = body_is_terminal(self.span_text(body.span));
        Branch {
            condition,
            body,
            terminal,
        }
    }

    fn node_text(&self, node: Node) -> String {
        node.utf8_text(self.text.as_bytes())
            .unwrap_or_default()
            .to_string()
    }

    fn span_text(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_python(code: &str) -> Block {
        index(Dialect::Python, code).expect("index failed")
    }

    #[test]
    fn test_flat_function_has_no_conditionals() {
        let root = index_python("def f():\n    x = 1\n    return x\n");
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_nested_if_builds_chain() {
        let code = "def f(a, b):\n    if a:\n        if b:\n            return 1\n";
        let root = index_python(code);
        assert_eq!(root.children.len(), 1);
        let outer = &root.children[0];
        assert!(outer.is_conditional());
        assert_eq!(outer.branches[0].condition, "a");
        let body = &outer.branches[0].body;
        assert_eq!(body.children.len(), 1);
        assert_eq!(body.children[0].branches[0].condition, "b");
    }

    #[test]
    fn test_elif_renests_into_else_arm() {
        let code = "def f(x):\n    if x > 2:\n        return 2\n    elif x > 1:\n        return 1\n    else:\n        return 0\n";
        let root = index_python(code);
        let outer = &root.children[0];
        assert_eq!(outer.branches.len(), 2);
        let else_arm = &outer.branches[1];
        assert!(else_arm.condition.is_empty());
        assert_eq!(else_arm.body.children.len(), 1);
        let elif = &else_arm.body.children[0];
        assert!(elif.is_conditional());
        assert_eq!(elif.branches[0].condition, "x > 1");
        assert_eq!(elif.branches.len(), 2);
    }

    #[test]
    fn test_terminal_branch_flag() {
        let code = "def f(a):\n    if a:\n        return 1\n";
        let root = index_python(code);
        assert!(root.children[0].branches[0].terminal);
    }

    #[test]
    fn test_loop_resets_kind() {
        let code = "def f(xs):\n    if xs:\n        for x in xs:\n            if x:\n                return x\n";
        let root = index_python(code);
        let outer = &root.children[0];
        let body = &outer.branches[0].body;
        assert_eq!(body.children[0].kind, BlockKind::Loop);
        assert!(body.children[0].children[0].is_conditional());
    }

    #[test]
    fn test_rust_else_if_nests() {
        let code = "fn f(x: i32) -> i32 { if x > 1 { 1 } else if x > 0 { 2 } else { 3 } }";
        let root = index(Dialect::Rust, code).expect("index failed");
        let outer = &root.children[0];
        assert_eq!(outer.branches.len(), 2);
        let else_body = &outer.branches[1].body;
        assert_eq!(else_body.children.len(), 1);
        assert!(else_body.children[0].is_conditional());
    }

    #[test]
    fn test_typescript_condition_unwrapped() {
        let code = "function f(x) { if (x > 0) { return 1; } }";
        let root = index(Dialect::TypeScript, code).expect("index failed");
        assert_eq!(root.children[0].branches[0].condition, "x > 0");
    }

    #[test]
    fn test_parse_error_is_malformed() {
        let err = index(Dialect::Rust, "fn f( { if x {").unwrap_err();
        assert!(matches!(err, RefactorError::MalformedStructure(_)));
    }
}
