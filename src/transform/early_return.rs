// src/transform/early_return.rs
//! Early-return rewrite: each arm of an else-if ladder becomes an
//! independent top-level conditional, preserving evaluation order. The
//! trailing else, when present, becomes the unconditional tail.

use crate::dialect::Dialect;
use crate::transform::{finish, reindent, STEP};
use crate::types::ConditionalRegion;

#[must_use]
pub fn render(dialect: Dialect, region: &ConditionalRegion) -> String {
    let indent = &region.indent;
    let inner_indent = format!("{indent}{STEP}");
    let mut lines = Vec::new();

    for level in &region.levels {
        lines.push(format!("{indent}{}", dialect.if_header(&level.condition)));
        lines.extend(reindent(&level.body, &inner_indent));
        if !dialect.block_close().is_empty() {
            lines.push(format!("{indent}{}", dialect.block_close()));
        }
    }

    if let Some(tail) = &region.trailing_else {
        lines.extend(reindent(tail, indent));
    }
    finish(lines, indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::detector::Detector;

    #[test]
    fn test_ladder_flattens_in_order() {
        let code = concat!(
            "def grade(score):\n",
            "    if score >= 90:\n",
            "        return 'A'\n",
            "    elif score >= 80:\n",
            "        return 'B'\n",
            "    elif score >= 70:\n",
            "        return 'C'\n",
            "    else:\n",
            "        return 'F'\n",
        );
        let root = Adapter::for_dialect(Dialect::Python)
            .index(code)
            .expect("index failed");
        let mut regions = Detector::new(3).detect(&root, code);
        let region = regions.remove(0);
        let out = render(Dialect::Python, &region);
        assert_eq!(
            out,
            concat!(
                "if score >= 90:\n",
                "        return 'A'\n",
                "    if score >= 80:\n",
                "        return 'B'\n",
                "    if score >= 70:\n",
                "        return 'C'\n",
                "    return 'F'",
            )
        );
    }
}
