// src/types.rs
//! Common data structures shared by the adapter, detector and engine layers.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::dialect::Dialect;

/// Immutable input to the engine. The core only ever reads it.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub identity: String,
    pub dialect: Dialect,
    pub text: String,
}

impl SourceUnit {
    #[must_use]
    pub fn new(identity: impl Into<String>, dialect: Dialect, text: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            dialect,
            text: text.into(),
        }
    }
}

/// Byte and line extent of a structural node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line_start: usize,
    pub line_end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize, line_start: usize, line_end: usize) -> Self {
        Self { start, end, line_start, line_end }
    }

    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Conditional,
    Loop,
    Other,
}

/// One arm of a conditional block. The trailing `else` arm has an empty
/// condition. Nested structure lives in `body.children`.
#[derive(Debug, Clone)]
pub struct Branch {
    pub condition: String,
    pub body: Block,
    pub terminal: bool,
}

/// A structural node produced by a dialect adapter.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub depth: usize,
    pub span: Span,
    pub children: Vec<Block>,
    pub branches: Vec<Branch>,
}

impl Block {
    #[must_use]
    pub fn new(kind: BlockKind, depth: usize, span: Span) -> Self {
        Self {
            kind,
            depth,
            span,
            children: Vec::new(),
            branches: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.kind == BlockKind::Conditional
    }

    /// All blocks nested one level down, whichever side they live on.
    #[must_use]
    pub fn nested(&self) -> Vec<&Block> {
        let mut out: Vec<&Block> = self.children.iter().collect();
        for branch in &self.branches {
            out.push(&branch.body);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    /// Medium at exactly the threshold, high beyond it.
    #[must_use]
    pub fn from_depth(depth: usize, threshold: usize) -> Self {
        if depth > threshold {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// How the conditionals in a chain are linked to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainShape {
    /// Each conditional nests in the previous one's then-branch.
    Conjunctive,
    /// Each conditional nests in the previous one's else-branch.
    ElseIf,
    Mixed,
}

/// One level of a detected chain, outermost first.
#[derive(Debug, Clone, Serialize)]
pub struct ChainLevel {
    pub condition: String,
    pub body: String,
    pub else_body: Option<String>,
    pub terminal: bool,
    /// True when the chain continues through this level's else arm.
    pub else_link: bool,
}

/// Structural fingerprint of a region. Cosmetic edits (identifier renames)
/// do not change the digest.
#[derive(Debug, Clone, Serialize)]
pub struct Fingerprint {
    pub branch_count: usize,
    pub chain_depth: usize,
    pub has_trailing_else: bool,
    pub has_early_exit: bool,
    pub digest: String,
}

impl Fingerprint {
    #[must_use]
    pub fn new(
        shape: ChainShape,
        levels: &[ChainLevel],
        chain_depth: usize,
        has_trailing_else: bool,
    ) -> Self {
        let has_early_exit = levels.iter().any(|l| l.terminal);
        let mut hasher = Sha256::new();
        hasher.update(format!("{shape:?}"));
        hasher.update([u8::from(has_trailing_else), u8::from(has_early_exit)]);
        hasher.update(levels.len().to_le_bytes());
        hasher.update(chain_depth.to_le_bytes());
        for level in levels {
            hasher.update([u8::from(level.terminal), u8::from(level.else_body.is_some())]);
        }
        Self {
            branch_count: levels.len(),
            chain_depth,
            has_trailing_else,
            has_early_exit,
            digest: format!("{:x}", hasher.finalize()),
        }
    }
}

/// A maximal nesting chain at or above the configured depth threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionalRegion {
    pub span: Span,
    pub max_depth: usize,
    pub severity: Severity,
    pub shape: ChainShape,
    pub levels: Vec<ChainLevel>,
    pub trailing_else: Option<String>,
    /// Leading whitespace of the region's first line, used for re-rendering.
    pub indent: String,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    GuardClause,
    EarlyReturn,
    MethodExtraction,
}

impl PatternKind {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::GuardClause => "guard-clause",
            Self::EarlyReturn => "early-return",
            Self::MethodExtraction => "method-extraction",
        }
    }

    #[must_use]
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::GuardClause => 0.9,
            Self::EarlyReturn => 0.75,
            Self::MethodExtraction => 0.6,
        }
    }
}

/// A subroutine introduced by method extraction.
#[derive(Debug, Clone, Serialize)]
pub struct SubroutineStub {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
    pub comment: Option<String>,
}

/// A rewrite produced by the transform engine, transient until validated.
#[derive(Debug, Clone)]
pub struct RefactoringCandidate {
    pub pattern: PatternKind,
    pub region_span: Span,
    pub rewritten: String,
    pub full_text: String,
    pub stubs: Vec<SubroutineStub>,
}

/// Outcome of the validation loop for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
    pub repair_attempts: usize,
    /// For method extraction: every stub body round-tripped the adapter.
    pub stubs_validated: bool,
}

/// Before/after structural deltas for an accepted candidate.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub depth_before: usize,
    pub depth_after: usize,
    pub branches_before: usize,
    pub branches_after: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    LowConfidence,
    MalformedStructure,
    TransformInfeasible,
    ValidationExhausted,
    OverlapSkipped,
}

/// Per-region result in a unit report.
#[derive(Debug, Clone, Serialize)]
pub struct RegionOutcome {
    pub span: Span,
    pub severity: Severity,
    pub pattern: Option<PatternKind>,
    pub metrics: Option<MetricsSnapshot>,
    pub flags: Vec<Flag>,
    pub description: String,
}

impl RegionOutcome {
    /// The report tag for the applied pattern, `"not-refactored"` when the
    /// region was left untouched.
    #[must_use]
    pub fn pattern_tag(&self) -> &'static str {
        self.pattern.map_or("not-refactored", PatternKind::tag)
    }

    #[must_use]
    pub fn confidence(&self) -> Option<f64> {
        self.metrics.map(|m| m.confidence)
    }
}

/// Results for a single source unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub identity: String,
    pub dialect: String,
    pub text: String,
    pub outcomes: Vec<RegionOutcome>,
    pub error: Option<String>,
}

impl UnitReport {
    /// Returns true if any region was rewritten.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(|o| o.pattern.is_some())
    }

    #[must_use]
    pub fn rewritten_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.pattern.is_some()).count()
    }
}

/// Aggregated results across all processed units.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefactorReport {
    pub units: Vec<UnitReport>,
    pub total_regions: usize,
    pub total_rewritten: usize,
    pub duration_ms: u128,
}

impl RefactorReport {
    #[must_use]
    pub fn has_unflattened(&self) -> bool {
        self.total_regions > self.total_rewritten
    }
}
