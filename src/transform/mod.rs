// src/transform/mod.rs
//! Transform engine: renders a chosen pattern over a region's text and
//! splices the result back into a copy of the unit. The `SourceUnit` itself
//! is never mutated.

pub mod early_return;
pub mod extract;
pub mod guard;

use crate::dialect::Dialect;
use crate::suggest::SuggestionProvider;
use crate::types::{ConditionalRegion, PatternKind, RefactoringCandidate, Span};

pub struct TransformEngine<'a> {
    dialect: Dialect,
    provider: &'a dyn SuggestionProvider,
}

impl<'a> TransformEngine<'a> {
    #[must_use]
    pub fn new(dialect: Dialect, provider: &'a dyn SuggestionProvider) -> Self {
        Self { dialect, provider }
    }

    /// Applies `pattern` to the region and returns the candidate holding both
    /// the rewritten span and the full unit text with the span spliced in.
    #[must_use]
    pub fn apply(
        &self,
        unit_text: &str,
        region: &ConditionalRegion,
        pattern: PatternKind,
    ) -> RefactoringCandidate {
        let (rewritten, stubs) = match pattern {
            PatternKind::GuardClause => (guard::render(self.dialect, region), Vec::new()),
            PatternKind::EarlyReturn => (early_return::render(self.dialect, region), Vec::new()),
            PatternKind::MethodExtraction => extract::render(self.dialect, region, self.provider),
        };
        let full_text = splice(unit_text, region.span, &rewritten);
        let region_span = Span::new(
            region.span.start,
            region.span.start + rewritten.len(),
            region.span.line_start,
            region.span.line_start + rewritten.lines().count().saturating_sub(1),
        );
        RefactoringCandidate {
            pattern,
            region_span,
            rewritten,
            full_text,
            stubs,
        }
    }
}

/// Replaces `span` in `text` with `replacement`.
#[must_use]
pub fn splice(text: &str, span: Span, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(text.get(..span.start).unwrap_or_default());
    out.push_str(replacement);
    out.push_str(text.get(span.end..).unwrap_or_default());
    out
}

/// Unit of extra indentation for rendered bodies.
pub(crate) const STEP: &str = "    ";

/// Re-homes a body extracted from the original text under `indent`.
///
/// The first line of a tree-sliced body starts mid-line (spans begin at the
/// first statement), so it is trimmed independently; the remaining lines
/// drop their common leading run and keep any deeper relative nesting.
pub(crate) fn reindent(body: &str, indent: &str) -> Vec<String> {
    let mut lines = body.lines();
    let Some(first) = lines.next() else {
        return Vec::new();
    };
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![format!("{indent}{}", first.trim_start())];
    for line in rest {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            let stripped = line.get(common.min(line.len() - line.trim_start().len())..)
                .unwrap_or_else(|| line.trim_start());
            out.push(format!("{indent}{stripped}"));
        }
    }
    out
}

/// Joins rendered lines, dropping the base indent from the first line so the
/// result can replace a span that starts after the line's indentation.
pub(crate) fn finish(lines: Vec<String>, indent: &str) -> String {
    let joined = lines.join("\n");
    joined
        .strip_prefix(indent)
        .map_or(joined.clone(), str::to_string)
}
