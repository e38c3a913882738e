// src/detector.rs
//! Nested-conditional detection over adapter block trees.
//!
//! A chain is a run of conditionals, each nested directly in a branch body
//! of the previous one. Loops and other blocks break the run. Only maximal
//! chains are reported: once a region is emitted, its interior is consumed
//! and never re-reported as a sub-region.

use crate::types::{
    Block, ChainLevel, ChainShape, ConditionalRegion, Fingerprint, Severity, Span,
};

pub struct Detector {
    threshold: usize,
}

impl Detector {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Finds all maximal chains at or above the threshold, ordered by start
    /// offset.
    #[must_use]
    pub fn detect(&self, root: &Block, text: &str) -> Vec<ConditionalRegion> {
        let mut out = Vec::new();
        for child in root.nested() {
            self.visit(child, text, &mut out);
        }
        out.sort_by_key(|r| r.span.start);
        out
    }

    fn visit(&self, block: &Block, text: &str, out: &mut Vec<ConditionalRegion>) {
        if !block.is_conditional() {
            for child in block.nested() {
                self.visit(child, text, out);
            }
            return;
        }

        let path = chain_path(block);
        if path.len() >= self.threshold {
            out.push(self.region(&path, text));
            return;
        }
        // Short chain: keep walking everything hanging off it.
        for (i, cond) in path.iter().enumerate() {
            let next = path.get(i + 1).copied();
            for branch in &cond.branches {
                for child in &branch.body.children {
                    if next.is_some_and(|n| std::ptr::eq(n, child)) {
                        continue;
                    }
                    self.visit(child, text, out);
                }
            }
        }
    }

    fn region(&self, path: &[&Block], text: &str) -> ConditionalRegion {
        let span = chain_span(path);
        let shape = chain_shape(path);
        let levels = chain_levels(path, text);
        let trailing_else = path
            .last()
            .and_then(|cond| else_arm(cond))
            .map(|body| slice(text, body.span).to_string());

        let fingerprint = Fingerprint::new(shape, &levels, path.len(), trailing_else.is_some());
        ConditionalRegion {
            span,
            max_depth: path.len(),
            severity: Severity::from_depth(path.len(), self.threshold),
            shape,
            levels,
            trailing_else,
            indent: leading_indent(text, span.start),
            fingerprint,
        }
    }
}

/// Longest run of directly nested conditionals starting at `cond`.
/// First branch wins on equal-length tails, keeping detection deterministic.
#[must_use]
pub fn chain_path(cond: &Block) -> Vec<&Block> {
    let mut path = vec![cond];
    let mut best: Vec<&Block> = Vec::new();
    for branch in &cond.branches {
        for child in &branch.body.children {
            if child.is_conditional() {
                let tail = chain_path(child);
                if tail.len() > best.len() {
                    best = tail;
                }
            }
        }
    }
    path.extend(best);
    path
}

/// Maximum chain depth of any conditional overlapping `target`.
/// Used by the validator to confirm a rewrite actually flattened the region.
#[must_use]
pub fn max_chain_depth_within(root: &Block, target: &Span) -> usize {
    let mut max = 0;
    let mut stack = vec![root];
    while let Some(block) = stack.pop() {
        for child in block.nested() {
            if child.is_conditional() && child.span.overlaps(target) {
                max = max.max(chain_path(child).len());
            }
            stack.push(child);
        }
    }
    max
}

/// Number of conditional branches overlapping `target`.
#[must_use]
pub fn branch_count_within(root: &Block, target: &Span) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(block) = stack.pop() {
        for child in block.nested() {
            if child.is_conditional() && child.span.overlaps(target) {
                count += child.branches.len();
            }
            stack.push(child);
        }
    }
    count
}

fn chain_span(path: &[&Block]) -> Span {
    let mut span = path[0].span;
    for cond in path {
        if cond.span.end > span.end {
            span.end = cond.span.end;
            span.line_end = cond.span.line_end;
        }
    }
    span
}

fn chain_shape(path: &[&Block]) -> ChainShape {
    let mut then_links = 0;
    let mut else_links = 0;
    for pair in path.windows(2) {
        let (outer, inner) = (pair[0], pair[1]);
        for branch in &outer.branches {
            if branch.body.children.iter().any(|c| std::ptr::eq(c, inner)) {
                if branch.condition.is_empty() {
                    else_links += 1;
                } else {
                    then_links += 1;
                }
            }
        }
    }
    match (then_links, else_links) {
        (_, 0) => ChainShape::Conjunctive,
        (0, _) => ChainShape::ElseIf,
        _ => ChainShape::Mixed,
    }
}

fn chain_levels(path: &[&Block], text: &str) -> Vec<ChainLevel> {
    path.iter()
        .enumerate()
        .map(|(i, cond)| {
            let next = path.get(i + 1);
            let then = cond.branches.first();
            let else_branch = else_arm(cond);
            let else_is_link = next.is_some_and(|n| {
                else_branch.is_some_and(|body| {
                    body.children.iter().any(|c| std::ptr::eq(c, *n))
                })
            });
            ChainLevel {
                condition: then.map_or(String::new(), |b| b.condition.clone()),
                body: then.map_or(String::new(), |b| slice(text, b.body.span).to_string()),
                else_body: else_branch
                    .filter(|_| !else_is_link)
                    .map(|body| slice(text, body.span).to_string()),
                terminal: then.is_some_and(|b| b.terminal),
                else_link: else_is_link,
            }
        })
        .collect()
}

fn else_arm(cond: &Block) -> Option<&Block> {
    cond.branches
        .iter()
        .skip(1)
        .find(|b| b.condition.is_empty())
        .map(|b| &b.body)
}

fn slice(text: &str, span: Span) -> &str {
    text.get(span.start.min(span.end)..span.end).unwrap_or_default()
}

fn leading_indent(text: &str, start: usize) -> String {
    let line_start = text[..start.min(text.len())]
        .rfind('\n')
        .map_or(0, |i| i + 1);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::dialect::Dialect;

    fn detect_python(code: &str, threshold: usize) -> Vec<ConditionalRegion> {
        let root = Adapter::for_dialect(Dialect::Python)
            .index(code)
            .expect("index failed");
        Detector::new(threshold).detect(&root, code)
    }

    #[test]
    fn test_below_threshold_is_quiet() {
        let code = "def f(a, b):\n    if a:\n        if b:\n            return 1\n";
        assert!(detect_python(code, 3).is_empty());
    }

    #[test]
    fn test_maximal_chain_reported_once() {
        let code = concat!(
            "def f(a, b, c, d):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                if d:\n",
            "                    return 1\n",
        );
        let regions = detect_python(code, 3);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].max_depth, 4);
        assert_eq!(regions[0].severity, Severity::High);
        assert_eq!(regions[0].shape, ChainShape::Conjunctive);
    }

    #[test]
    fn test_exact_threshold_is_medium() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let regions = detect_python(code, 3);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].severity, Severity::Medium);
    }

    #[test]
    fn test_loop_breaks_chain() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        for x in b:\n",
            "            if x:\n",
            "                if c:\n",
            "                    return 1\n",
        );
        assert!(detect_python(code, 3).is_empty());
    }

    #[test]
    fn test_elif_ladder_is_else_if_shape() {
        let code = concat!(
            "def grade(score):\n",
            "    if score >= 90:\n",
            "        return 'A'\n",
            "    elif score >= 80:\n",
            "        return 'B'\n",
            "    elif score >= 70:\n",
            "        return 'C'\n",
            "    elif score >= 60:\n",
            "        return 'D'\n",
            "    else:\n",
            "        return 'F'\n",
        );
        let regions = detect_python(code, 3);
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.shape, ChainShape::ElseIf);
        assert_eq!(region.max_depth, 4);
        assert!(region.trailing_else.is_some());
        assert_eq!(region.levels.len(), 4);
        assert_eq!(region.levels[0].condition, "score >= 90");
        assert_eq!(region.levels[3].condition, "score >= 60");
    }

    #[test]
    fn test_sibling_regions_ordered_by_offset() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
            "def g(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 2\n",
        );
        let regions = detect_python(code, 3);
        assert_eq!(regions.len(), 2);
        assert!(regions[0].span.start < regions[1].span.start);
    }

    #[test]
    fn test_fingerprint_has_structure() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let regions = detect_python(code, 3);
        let fp = &regions[0].fingerprint;
        assert_eq!(fp.chain_depth, 3);
        assert!(fp.has_early_exit);
        assert!(!fp.has_trailing_else);
        assert_eq!(fp.digest.len(), 64);
    }
}
