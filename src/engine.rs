// src/engine.rs
//! Per-unit refactoring pipeline and the parallel map across units.
//!
//! Units are independent; regions within a unit are processed strictly in
//! order, ascending by start offset, with byte offsets shifted as earlier
//! splices change the text length. A region overlapping an already
//! rewritten range is skipped and flagged rather than spliced against stale
//! offsets. One failing region never aborts its siblings.

use rayon::prelude::*;

use crate::adapter::Adapter;
use crate::config::RefactorConfig;
use crate::detector::Detector;
use crate::metrics::MetricsComparator;
use crate::selector::Selector;
use crate::suggest::{BoundedSuggestions, NoopSuggestions, SuggestionProvider};
use crate::transform::TransformEngine;
use crate::types::{
    ConditionalRegion, Flag, PatternKind, RefactorReport, RegionOutcome, SourceUnit, UnitReport,
};
use crate::validate::Validator;

pub struct RefactorEngine {
    config: RefactorConfig,
    provider: Box<dyn SuggestionProvider>,
}

impl RefactorEngine {
    #[must_use]
    pub fn new(config: RefactorConfig) -> Self {
        Self {
            config,
            provider: Box::new(NoopSuggestions),
        }
    }

    /// Installs an external suggestion provider, wrapped so a single lookup
    /// can never block longer than the configured budget.
    #[must_use]
    pub fn with_provider(config: RefactorConfig, provider: Box<dyn SuggestionProvider>) -> Self {
        let timeout = std::time::Duration::from_millis(config.provider_timeout_ms);
        Self {
            provider: Box::new(BoundedSuggestions::new(provider, timeout)),
            config,
        }
    }

    /// Processes all units in parallel.
    #[must_use]
    pub fn refactor_units(&self, units: &[SourceUnit]) -> RefactorReport {
        let start = std::time::Instant::now();
        let unit_reports: Vec<UnitReport> = units
            .par_iter()
            .map(|unit| self.refactor_unit(unit))
            .collect();

        let total_regions = unit_reports.iter().map(|u| u.outcomes.len()).sum();
        let total_rewritten = unit_reports.iter().map(UnitReport::rewritten_count).sum();
        RefactorReport {
            units: unit_reports,
            total_regions,
            total_rewritten,
            duration_ms: start.elapsed().as_millis(),
        }
    }

    /// Runs detect -> select -> transform -> validate -> measure for one
    /// unit. The returned report carries the unit's (possibly rewritten)
    /// full text and one outcome per detected region.
    #[must_use]
    pub fn refactor_unit(&self, unit: &SourceUnit) -> UnitReport {
        let adapter = Adapter::for_dialect(unit.dialect);
        let root = match adapter.index(&unit.text) {
            Ok(root) => root,
            Err(e) => {
                return UnitReport {
                    identity: unit.identity.clone(),
                    dialect: unit.dialect.tag().to_string(),
                    text: unit.text.clone(),
                    outcomes: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        let regions = Detector::new(self.config.depth_threshold).detect(&root, &unit.text);
        let mut text = unit.text.clone();
        let mut delta: i64 = 0;
        let mut rewritten: Vec<crate::types::Span> = Vec::new();
        let mut outcomes = Vec::new();

        for region in regions {
            if rewritten.iter().any(|s| s.overlaps(&region.span)) {
                outcomes.push(skipped_outcome(
                    &region,
                    Flag::OverlapSkipped,
                    "range already rewritten by an earlier candidate".to_string(),
                ));
                continue;
            }
            let outcome = self.process_region(&adapter, &mut text, &mut delta, &region);
            if outcome.pattern.is_some() {
                rewritten.push(region.span);
            }
            outcomes.push(outcome);
        }

        UnitReport {
            identity: unit.identity.clone(),
            dialect: unit.dialect.tag().to_string(),
            text,
            outcomes,
            error: None,
        }
    }

    fn process_region(
        &self,
        adapter: &Adapter,
        text: &mut String,
        delta: &mut i64,
        region: &ConditionalRegion,
    ) -> RegionOutcome {
        let pattern = match Selector::select(region) {
            Ok(p) => p,
            Err(e) => {
                return skipped_outcome(region, Flag::TransformInfeasible, e.to_string());
            }
        };

        // Shift the region into the unit's current coordinates.
        let mut shifted = region.clone();
        shifted.span.start = offset(region.span.start, *delta);
        shifted.span.end = offset(region.span.end, *delta);

        let candidate =
            TransformEngine::new(adapter.dialect(), self.provider.as_ref()).apply(text, &shifted, pattern);
        let validator = Validator::new(
            *adapter,
            self.config.max_repair_attempts,
            self.config.depth_threshold,
        );
        let (candidate, result) = validator.run(text, &shifted, candidate);

        if !result.valid {
            let error = crate::error::RefactorError::ValidationExhausted {
                attempts: result.repair_attempts,
                last_error: result
                    .error
                    .unwrap_or_else(|| "validation failed".to_string()),
            };
            return skipped_outcome(region, Flag::ValidationExhausted, error.to_string());
        }

        let Ok(after_root) = adapter.index(&candidate.full_text) else {
            // Validation just proved this parses; treat a flake as a reject.
            return skipped_outcome(
                region,
                Flag::ValidationExhausted,
                "post-rewrite indexing failed".to_string(),
            );
        };
        let metrics = MetricsComparator::compare(
            region,
            &after_root,
            &candidate.region_span,
            pattern,
            result.repair_attempts,
        );

        let mut flags = Vec::new();
        if metrics.confidence < self.config.acceptance_confidence {
            flags.push(Flag::LowConfidence);
        }

        *delta += (candidate.region_span.end - candidate.region_span.start) as i64
            - (shifted.span.end - shifted.span.start) as i64;
        *text = candidate.full_text;

        RegionOutcome {
            span: region.span,
            severity: region.severity,
            pattern: Some(pattern),
            metrics: Some(metrics),
            flags,
            description: describe(pattern, metrics.depth_before, metrics.depth_after),
        }
    }
}

fn offset(pos: usize, delta: i64) -> usize {
    usize::try_from(pos as i64 + delta).unwrap_or(pos)
}

fn skipped_outcome(region: &ConditionalRegion, flag: Flag, description: String) -> RegionOutcome {
    RegionOutcome {
        span: region.span,
        severity: region.severity,
        pattern: None,
        metrics: None,
        flags: vec![flag],
        description,
    }
}

fn describe(pattern: PatternKind, before: usize, after: usize) -> String {
    let what = match pattern {
        PatternKind::GuardClause => "inverted conditions into guard clauses",
        PatternKind::EarlyReturn => "flattened branch ladder into early returns",
        PatternKind::MethodExtraction => "extracted branch bodies into subroutines",
    };
    format!("{what} (depth {before} -> {after})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn engine() -> RefactorEngine {
        RefactorEngine::new(RefactorConfig::default())
    }

    #[test]
    fn test_unit_with_no_regions_is_untouched() {
        let unit = SourceUnit::new("a.py", Dialect::Python, "def f():\n    return 1\n");
        let report = engine().refactor_unit(&unit);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.text, unit.text);
        assert!(report.error.is_none());
    }

    #[test]
    fn test_malformed_unit_reports_error_and_keeps_text() {
        let unit = SourceUnit::new(
            "b.java",
            Dialect::Java,
            "void f() { if (a) { if (b) { if (c) { go(); } }",
        );
        let report = engine().refactor_unit(&unit);
        assert!(report.error.is_some());
        assert_eq!(report.text, unit.text);
    }

    #[test]
    fn test_guard_rewrite_applies_end_to_end() {
        let code = concat!(
            "def f(a, b, c):\n",
            "    if a:\n",
            "        if b:\n",
            "            if c:\n",
            "                return 1\n",
        );
        let unit = SourceUnit::new("c.py", Dialect::Python, code);
        let report = engine().refactor_unit(&unit);
        assert_eq!(report.outcomes.len(), 1);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.pattern, Some(PatternKind::GuardClause));
        let metrics = outcome.metrics.expect("metrics missing");
        assert_eq!(metrics.depth_before, 3);
        assert_eq!(metrics.depth_after, 1);
        assert!(report.text.contains("if not (a):"));
    }
}
