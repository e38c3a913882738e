// src/adapter/indent.rs
//! Indentation-tracking indexing, the fallback for any dialect.
//!
//! Depth comes from leading-whitespace run length relative to the unit's
//! detected indent width. Files mixing tabs and spaces are rejected with
//! `malformed-structure` rather than guessed at.

use crate::adapter::body_is_terminal;
use crate::dialect::Dialect;
use crate::error::{RefactorError, Result};
use crate::types::{Block, BlockKind, Branch, Span};

pub fn index(_dialect: Dialect, text: &str) -> Result<Block> {
    let lines = scan_lines(text)?;
    let parser = LineParser { text, lines: &lines };
    let mut idx = 0;
    let children = parser.parse_level(&mut idx, 0);
    let mut root = Block::new(
        BlockKind::Other,
        0,
        Span::new(0, text.len(), 1, lines.last().map_or(1, |l| l.number)),
    );
    root.children = children;
    Ok(root)
}

struct Line<'a> {
    start: usize,
    end: usize,
    indent: usize,
    content: &'a str,
    number: usize,
}

fn scan_lines(text: &str) -> Result<Vec<Line<'_>>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    let mut seen_tabs = false;
    let mut seen_spaces = false;

    for (i, raw) in text.split('\n').enumerate() {
        let end = offset + raw.len();
        let lead: String = raw.chars().take_while(|c| c.is_whitespace()).collect();
        if !lead.is_empty() && !raw.trim().is_empty() {
            if lead.contains('\t') && lead.contains(' ') {
                return Err(RefactorError::MalformedStructure(format!(
                    "line {} mixes tabs and spaces in its indentation",
                    i + 1
                )));
            }
            seen_tabs |= lead.contains('\t');
            seen_spaces |= lead.contains(' ');
            if seen_tabs && seen_spaces {
                return Err(RefactorError::MalformedStructure(
                    "inconsistent indentation: both tabs and spaces in use".into(),
                ));
            }
        }
        lines.push(Line {
            start: offset,
            end,
            indent: lead.chars().count(),
            content: raw.trim(),
            number: i + 1,
        });
        offset = end + 1;
    }
    Ok(lines)
}

struct LineParser<'a> {
    text: &'a str,
    lines: &'a [Line<'a>],
}

impl<'a> LineParser<'a> {
    /// Parses all blocks at `level`, stopping at the first dedent.
    fn parse_level(&self, idx: &mut usize, level: usize) -> Vec<Block> {
        let mut out = Vec::new();
        while *idx < self.lines.len() {
            let line = &self.lines[*idx];
            if line.content.is_empty() {
                *idx += 1;
                continue;
            }
            if line.indent < level {
                break;
            }
            if line.indent > level {
                // Continuation or stray deep line; structure was already
                // claimed by a header above, so consume and move on.
                *idx += 1;
                continue;
            }
            if let Some(cond) = header_condition(line.content, &["if"]) {
                out.push(self.conditional(idx, line.indent, cond));
            } else if is_loop_header(line.content) {
                out.push(self.repeat(idx, line.indent));
            } else {
                *idx += 1;
            }
        }
        out
    }

    fn repeat(&self, idx: &mut usize, level: usize) -> Block {
        let header = &self.lines[*idx];
        *idx += 1;
        let (children, end) = self.body(idx, level);
        let mut block = Block::new(
            BlockKind::Loop,
            0,
            Span::new(header.start, end.0, header.number, end.1),
        );
        block.children = children;
        block
    }

    /// Parses an if header plus any elif/else arms at the same indent.
    /// Each elif re-nests into the else arm, exactly as the tree strategy
    /// does for Python.
    fn conditional(&self, idx: &mut usize, level: usize, condition: String) -> Block {
        let header = &self.lines[*idx];
        *idx += 1;
        let (then_children, then_end) = self.body(idx, level);
        let then_span = Span::new(header.end + 1, then_end.0, header.number + 1, then_end.1);
        let then_branch = self.branch(condition, then_children, then_span);

        let mut arms: Vec<(String, Vec<Block>, Span)> = Vec::new();
        let mut else_arm: Option<(Vec<Block>, Span)> = None;
        while *idx < self.lines.len() {
            let line = &self.lines[*idx];
            if line.content.is_empty() {
                *idx += 1;
                continue;
            }
            if line.indent != level {
                break;
            }
            if let Some(cond) = header_condition(line.content, &["elif", "else if"]) {
                let arm_header_end = line.end;
                let arm_line = line.number;
                *idx += 1;
                let (children, end) = self.body(idx, level);
                arms.push((
                    cond,
                    children,
                    Span::new(arm_header_end + 1, end.0, arm_line + 1, end.1),
                ));
            } else if is_else_header(line.content) {
                let arm_header_end = line.end;
                let arm_line = line.number;
                *idx += 1;
                let (children, end) = self.body(idx, level);
                else_arm = Some((children, Span::new(arm_header_end + 1, end.0, arm_line + 1, end.1)));
                break;
            } else {
                break;
            }
        }

        let chain_end = else_arm
            .as_ref()
            .map(|(_, s)| (s.end, s.line_end))
            .or_else(|| arms.last().map(|(_, _, s)| (s.end, s.line_end)))
            .unwrap_or((then_span.end, then_span.line_end));

        let mut block = Block::new(
            BlockKind::Conditional,
            0,
            Span::new(header.start, chain_end.0, header.number, chain_end.1),
        );
        block.branches.push(then_branch);
        if let Some(tail) = self.fold_arms(arms, else_arm) {
            block.branches.push(tail);
        }
        block
    }

    /// Folds elif arms innermost-first into a single else branch holding a
    /// nested conditional chain.
    fn fold_arms(
        &self,
        arms: Vec<(String, Vec<Block>, Span)>,
        else_arm: Option<(Vec<Block>, Span)>,
    ) -> Option<Branch> {
        let mut tail: Option<Branch> = else_arm.map(|(children, span)| {
            self.branch(String::new(), children, span)
        });

        for (cond, children, span) in arms.into_iter().rev() {
            let mut nested = Block::new(BlockKind::Conditional, 0, span);
            nested.branches.push(self.branch(cond, children, span));
            if let Some(else_branch) = tail.take() {
                if else_branch.body.span.end > nested.span.end {
                    nested.span.end = else_branch.body.span.end;
                    nested.span.line_end = else_branch.body.span.line_end;
                }
                nested.branches.push(else_branch);
            }
            let mut body = Block::new(BlockKind::Other, 0, nested.span);
            body.children = vec![nested];
            tail = Some(Branch {
                condition: String::new(),
                body,
                terminal: false,
            });
        }
        tail
    }

    fn branch(&self, condition: String, children: Vec<Block>, span: Span) -> Branch {
        let mut body = Block::new(BlockKind::Other, 0, span);
        body.children = children;
        let text = self.text.get(span.start.min(span.end)..span.end).unwrap_or_default();
        Branch {
            condition,
            body,
            terminal: body_is_terminal(text),
        }
    }

    /// Consumes the indented body following a header line. Returns the nested
    /// blocks and the (byte, line) position where the body ends.
    fn body(&self, idx: &mut usize, header_level: usize) -> (Vec<Block>, (usize, usize)) {
        let body_level = self
            .lines
            .get(*idx..)
            .and_then(|rest| {
                rest.iter()
                    .find(|l| !l.content.is_empty())
                    .filter(|l| l.indent > header_level)
                    .map(|l| l.indent)
            });
        let Some(body_level) = body_level else {
            let end = self.lines.get(idx.saturating_sub(1)).map_or((0, 1), |l| (l.end, l.number));
            return (Vec::new(), end);
        };

        let children = self.parse_level(idx, body_level);
        // parse_level stops on dedent; find the last non-empty consumed line.
        let mut last = idx.saturating_sub(1);
        while last > 0 && self.lines[last].content.is_empty() {
            last -= 1;
        }
        let end_line = &self.lines[last];
        (children, (end_line.end, end_line.number))
    }
}

fn header_condition(content: &str, keywords: &[&str]) -> Option<String> {
    for kw in keywords {
        if let Some(rest) = content.strip_prefix(kw) {
            let rest = rest.trim_start();
            if rest.starts_with('(') || content.starts_with(&format!("{kw} ")) {
                let cond = rest
                    .trim_end_matches('{')
                    .trim_end_matches(':')
                    .trim();
                return Some(crate::adapter::normalize_condition(cond));
            }
        }
    }
    None
}

fn is_loop_header(content: &str) -> bool {
    ["for ", "while ", "for(", "while(", "loop ", "do "]
        .iter()
        .any(|kw| content.starts_with(kw))
        || content == "loop" || content == "do"
}

fn is_else_header(content: &str) -> bool {
    matches!(content, "else" | "else:" | "else {")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_generic(code: &str) -> Result<Block> {
        index(Dialect::Generic, code)
    }

    #[test]
    fn test_depth_from_indentation() {
        let code = "if a:\n    if b:\n        if c:\n            return 1\n";
        let root = index_generic(code).expect("index failed");
        let outer = &root.children[0];
        assert!(outer.is_conditional());
        let mid = &outer.branches[0].body.children[0];
        let inner = &mid.branches[0].body.children[0];
        assert_eq!(inner.branches[0].condition, "c");
        assert!(inner.branches[0].terminal);
    }

    #[test]
    fn test_mixed_tabs_and_spaces_rejected() {
        let err = index_generic("if a:\n\t if b:\n\t\t return 1\n").unwrap_err();
        assert!(matches!(err, RefactorError::MalformedStructure(_)));
    }

    #[test]
    fn test_tabs_or_spaces_across_lines_rejected() {
        let err = index_generic("if a:\n\tx = 1\nif b:\n    y = 2\n").unwrap_err();
        assert!(matches!(err, RefactorError::MalformedStructure(_)));
    }

    #[test]
    fn test_elif_renests() {
        let code = "if a:\n    return 1\nelif b:\n    return 2\nelse:\n    return 3\n";
        let root = index_generic(code).expect("index failed");
        let outer = &root.children[0];
        assert_eq!(outer.branches.len(), 2);
        let elif = &outer.branches[1].body.children[0];
        assert!(elif.is_conditional());
        assert_eq!(elif.branches[0].condition, "b");
        assert_eq!(elif.branches.len(), 2);
    }

    #[test]
    fn test_loop_block() {
        let code = "while x:\n    if y:\n        break\n";
        let root = index_generic(code).expect("index failed");
        assert_eq!(root.children[0].kind, BlockKind::Loop);
        assert!(root.children[0].children[0].is_conditional());
    }
}
