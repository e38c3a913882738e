// src/transform/guard.rs
//! Guard-clause rewrite: one inverted guard per chain level, innermost body
//! landing at depth 1. Applies de Morgan inversion per level; a level's else
//! body becomes its guard's exit body, a bare exit otherwise.

use crate::dialect::Dialect;
use crate::transform::{finish, reindent, STEP};
use crate::types::ConditionalRegion;

#[must_use]
pub fn render(dialect: Dialect, region: &ConditionalRegion) -> String {
    let indent = &region.indent;
    let inner_indent = format!("{indent}{STEP}");
    let mut lines = Vec::new();

    for level in &region.levels {
        let guard = dialect.negate(&level.condition);
        lines.push(format!("{indent}{}", dialect.if_header(&guard)));
        match &level.else_body {
            Some(body) => lines.extend(reindent(body, &inner_indent)),
            None => lines.push(format!("{inner_indent}{}", dialect.bare_exit())),
        }
        if !dialect.block_close().is_empty() {
            lines.push(format!("{indent}{}", dialect.block_close()));
        }
    }

    if let Some(last) = region.levels.last() {
        lines.extend(reindent(&last.body, indent));
    }
    finish(lines, indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::detector::Detector;

    fn only_region(dialect: Dialect, code: &str) -> ConditionalRegion {
        let root = Adapter::for_dialect(dialect).index(code).expect("index failed");
        let mut regions = Detector::new(3).detect(&root, code);
        assert_eq!(regions.len(), 1);
        regions.remove(0)
    }

    #[test]
    fn test_python_guards_flatten_to_depth_one() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let region = only_region(Dialect::Python, code);
        let out = render(Dialect::Python, &region);
        assert_eq!(
            out,
            concat!(
                "if not (a):\n",
                "        return\n",
                "    if not (b):\n",
                "        return\n",
                "    if not (c):\n",
                "        return\n",
                "    return 1",
            )
        );
    }

    #[test]
    fn test_else_body_becomes_guard_exit() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
            "    else:\n",
            "        return 0\n",
        );
        let region = only_region(Dialect::Python, code);
        let out = render(Dialect::Python, &region);
        assert!(out.starts_with("if not (a):\n        return 0"));
    }
}
