// src/selector.rs
//! Rewrite-pattern selection policy. Evaluated in order, first match wins;
//! guard clauses beat early returns when both apply because they always
//! remove more nesting.

use regex::Regex;

use crate::adapter::body_is_terminal;
use crate::error::{RefactorError, Result};
use crate::types::{ChainShape, ConditionalRegion, PatternKind};

pub struct Selector;

impl Selector {
    /// Picks a pattern for the region, or reports the region as infeasible.
    ///
    /// # Errors
    ///
    /// Returns `TransformInfeasible` when a condition carries side effects
    /// that a rewrite could evaluate a different number of times.
    pub fn select(region: &ConditionalRegion) -> Result<PatternKind> {
        if let Some(cond) = region
            .levels
            .iter()
            .map(|l| l.condition.as_str())
            .find(|c| has_side_effect(c))
        {
            return Err(RefactorError::TransformInfeasible {
                line_start: region.span.line_start,
                line_end: region.span.line_end,
                reason: format!("condition `{}` has side effects", cond.trim()),
            });
        }

        if Self::guard_applies(region) {
            return Ok(PatternKind::GuardClause);
        }
        if Self::early_return_applies(region) {
            return Ok(PatternKind::EarlyReturn);
        }
        Ok(PatternKind::MethodExtraction)
    }

    /// Conjunctive chain whose innermost body exits and whose else arms,
    /// where present, all exit too: each level inverts into a guard.
    fn guard_applies(region: &ConditionalRegion) -> bool {
        if region.shape != ChainShape::Conjunctive {
            return false;
        }
        let Some(last) = region.levels.last() else {
            return false;
        };
        last.terminal
            && region
                .levels
                .iter()
                .all(|l| l.else_body.as_deref().map_or(true, body_is_terminal))
    }

    /// Else-if ladder over a single subject where every arm terminates:
    /// flattens to one conditional per arm without inversion.
    fn early_return_applies(region: &ConditionalRegion) -> bool {
        if region.shape != ChainShape::ElseIf {
            return false;
        }
        if !region.levels.iter().all(|l| l.terminal) {
            return false;
        }
        if region
            .trailing_else
            .as_deref()
            .is_some_and(|body| !body_is_terminal(body))
        {
            return false;
        }
        same_subject(region.levels.iter().map(|l| l.condition.as_str()))
    }
}

/// True when every condition opens with the same identifier.
fn same_subject<'a>(conditions: impl Iterator<Item = &'a str>) -> bool {
    // An identifier that isn't a unary keyword.
    let Ok(ident) = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*") else {
        return false;
    };
    let mut subject: Option<String> = None;
    for cond in conditions {
        let Some(first) = ident
            .find_iter(cond)
            .map(|m| m.as_str())
            .find(|w| !matches!(*w, "not" | "await"))
        else {
            return false;
        };
        match &subject {
            None => subject = Some(first.to_string()),
            Some(s) if s == first => {}
            Some(_) => return false,
        }
    }
    subject.is_some()
}

/// Assignment or increment/decrement anywhere in a condition.
fn has_side_effect(cond: &str) -> bool {
    if cond.contains("++") || cond.contains("--") {
        return true;
    }
    let bytes = cond.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'=' {
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| bytes.get(p)).copied();
        let next = bytes.get(i + 1).copied();
        if next == Some(b'=') || next == Some(b'>') {
            continue;
        }
        if matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) {
            continue;
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::detector::Detector;
    use crate::dialect::Dialect;

    fn region_for(code: &str) -> ConditionalRegion {
        let root = Adapter::for_dialect(Dialect::Python)
            .index(code)
            .expect("index failed");
        let mut regions = Detector::new(3).detect(&root, code);
        assert_eq!(regions.len(), 1, "expected exactly one region");
        regions.remove(0)
    }

    #[test]
    fn test_conjunctive_terminal_chain_selects_guard() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let pattern = Selector::select(&region_for(code)).expect("select failed");
        assert_eq!(pattern, PatternKind::GuardClause);
    }

    #[test]
    fn test_range_ladder_selects_early_return() {
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
        let pattern = Selector::select(&region_for(code)).expect("select failed");
        assert_eq!(pattern, PatternKind::EarlyReturn);
    }

    #[test]
    fn test_mixed_subjects_fall_back_to_extraction() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a > 0:\n",
            "        return 1\n",
            "    elif b > 0:\n",
            "        return 2\n",
            "    elif c > 0:\n",
            "        return 3\n",
        );
        let pattern = Selector::select(&region_for(code)).expect("select failed");
        assert_eq!(pattern, PatternKind::MethodExtraction);
    }

    #[test]
    fn test_non_terminal_body_selects_extraction() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                log(a)\n",
            "                total = a + b\n",
        );
        let pattern = Selector::select(&region_for(code)).expect("select failed");
        assert_eq!(pattern, PatternKind::MethodExtraction);
    }

    #[test]
    fn test_side_effecting_condition_is_infeasible() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if (a := next(b)):\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let err = Selector::select(&region_for(code)).unwrap_err();
        assert!(matches!(err, RefactorError::TransformInfeasible { .. }));
    }

    #[test]
    fn test_comparisons_are_not_side_effects() {
        assert!(!has_side_effect("a == b"));
        assert!(!has_side_effect("a != b"));
        assert!(!has_side_effect("a <= b"));
        assert!(!has_side_effect("a >= b"));
        assert!(has_side_effect("a = b"));
        assert!(has_side_effect("a += 1"));
        assert!(has_side_effect("i++ < n"));
    }
}
