// src/metrics.rs
//! Before/after structural comparison and the confidence score.

use crate::detector::{branch_count_within, max_chain_depth_within};
use crate::types::{Block, ConditionalRegion, MetricsSnapshot, PatternKind, Span};

pub struct MetricsComparator;

impl MetricsComparator {
    /// Builds the snapshot for an accepted candidate from the region and the
    /// re-indexed post-rewrite tree.
    #[must_use]
    pub fn compare(
        region: &ConditionalRegion,
        after_root: &Block,
        after_span: &Span,
        pattern: PatternKind,
        repair_attempts: usize,
    ) -> MetricsSnapshot {
        let depth_before = region.max_depth;
        let depth_after = max_chain_depth_within(after_root, after_span);
        let branches_before = region.levels.len() + usize::from(region.trailing_else.is_some());
        let branches_after = branch_count_within(after_root, after_span);
        MetricsSnapshot {
            depth_before,
            depth_after,
            branches_before,
            branches_after,
            confidence: confidence(pattern, depth_before, depth_after, repair_attempts),
        }
    }
}

/// Weighted blend of the pattern's base confidence and the achieved depth
/// reduction, degraded by 0.1 per repair attempt, floored at 0.1.
#[must_use]
pub fn confidence(
    pattern: PatternKind,
    depth_before: usize,
    depth_after: usize,
    repair_attempts: usize,
) -> f64 {
    if depth_before == 0 {
        return 0.1;
    }
    let reduction = depth_before.saturating_sub(depth_after) as f64 / depth_before as f64;
    let raw = 0.6 * pattern.base_confidence() + 0.4 * reduction;
    let penalized = raw - 0.1 * repair_attempts as f64;
    penalized.clamp(0.1, 1.0)
}
