// src/validate.rs
//! Validation and bounded repair of refactoring candidates.
//!
//! State machine: Produced -> Validating -> {Accepted, Repairing ->
//! Validating, Rejected}. A candidate is well-formed when the same adapter
//! re-indexes its full text without a structural error AND the rewritten
//! span's maximum chain depth is strictly below the original region depth
//! and below the detection threshold.
//! Repairs are a fixed, non-generative set, tried in order: delimiter
//! balancing, trailing-colon insertion, reverting the last emitted branch.
//! After the attempt budget the candidate is discarded; the caller keeps the
//! original text for that region.

use crate::adapter::Adapter;
use crate::detector::max_chain_depth_within;
use crate::dialect::{Dialect, Flavor};
use crate::transform::splice;
use crate::types::{ConditionalRegion, RefactoringCandidate, Span, ValidationResult};

pub struct Validator {
    adapter: Adapter,
    max_attempts: usize,
    threshold: usize,
}

impl Validator {
    #[must_use]
    pub fn new(adapter: Adapter, max_attempts: usize, threshold: usize) -> Self {
        Self {
            adapter,
            max_attempts,
            threshold,
        }
    }

    /// Validates a candidate, repairing up to the configured budget.
    /// Always returns; `result.valid` tells the caller whether the candidate
    /// may replace the original region.
    #[must_use]
    pub fn run(
        &self,
        unit_text: &str,
        region: &ConditionalRegion,
        mut candidate: RefactoringCandidate,
    ) -> (RefactoringCandidate, ValidationResult) {
        let mut attempts = 0;
        loop {
            match self.check(region.max_depth, &candidate) {
                Ok(()) => {
                    return (
                        candidate,
                        ValidationResult {
                            valid: true,
                            error: None,
                            repair_attempts: attempts,
                            stubs_validated: true,
                        },
                    );
                }
                Err(reason) => {
                    if attempts >= self.max_attempts {
                        return (
                            candidate,
                            ValidationResult {
                                valid: false,
                                error: Some(reason),
                                repair_attempts: attempts,
                                stubs_validated: false,
                            },
                        );
                    }
                    candidate = self.repair(unit_text, region, candidate, attempts);
                    attempts += 1;
                }
            }
        }
    }

    fn check(
        &self,
        original_depth: usize,
        candidate: &RefactoringCandidate,
    ) -> std::result::Result<(), String> {
        let root = self
            .adapter
            .index(&candidate.full_text)
            .map_err(|e| e.to_string())?;

        let depth = max_chain_depth_within(&root, &candidate.region_span);
        if depth >= original_depth {
            return Err(format!(
                "rewritten depth {depth} does not improve on original depth {original_depth}"
            ));
        }
        // A rewrite that merely shaves a level would be re-detected on the
        // next pass; the region must end up below the threshold.
        if depth >= self.threshold {
            return Err(format!(
                "rewritten depth {depth} is still at or above threshold {}",
                self.threshold
            ));
        }

        for stub in &candidate.stubs {
            let probe = probe_unit(self.adapter.dialect(), &stub.body);
            self.adapter
                .index(&probe)
                .map_err(|e| format!("stub `{}` failed round-trip: {e}", stub.name))?;
        }
        Ok(())
    }

    /// One corrective pass. Each attempt applies the next heuristic in the
    /// fixed set and re-splices the candidate into the unit.
    fn repair(
        &self,
        unit_text: &str,
        region: &ConditionalRegion,
        candidate: RefactoringCandidate,
        attempt: usize,
    ) -> RefactoringCandidate {
        let dialect = self.adapter.dialect();
        let rewritten = match attempt {
            0 => balance_delimiters(dialect, &candidate.rewritten, &region.indent),
            1 => insert_trailing_colons(dialect, &candidate.rewritten),
            _ => revert_last_branch(&candidate.rewritten, &region.indent),
        };
        rebuild(unit_text, region, candidate, rewritten)
    }
}

fn rebuild(
    unit_text: &str,
    region: &ConditionalRegion,
    candidate: RefactoringCandidate,
    rewritten: String,
) -> RefactoringCandidate {
    let full_text = splice(unit_text, region.span, &rewritten);
    let region_span = Span::new(
        region.span.start,
        region.span.start + rewritten.len(),
        region.span.line_start,
        region.span.line_start + rewritten.lines().count().saturating_sub(1),
    );
    RefactoringCandidate {
        rewritten,
        full_text,
        region_span,
        ..candidate
    }
}

/// Appends missing closers (or drops trailing extras) so brace counts match.
fn balance_delimiters(dialect: Dialect, rewritten: &str, indent: &str) -> String {
    if dialect.flavor() != Flavor::Braced {
        return rewritten.to_string();
    }
    let opens = rewritten.matches('{').count();
    let closes = rewritten.matches('}').count();
    let mut out = rewritten.to_string();
    if opens > closes {
        for _ in 0..(opens - closes) {
            out.push('\n');
            out.push_str(indent);
            out.push('}');
        }
    } else {
        for _ in 0..(closes - opens) {
            if let Some(pos) = out.rfind('}') {
                out.replace_range(pos..=pos, "");
            }
        }
    }
    out
}

/// Adds the colon an indented-flavor header line is missing.
fn insert_trailing_colons(dialect: Dialect, rewritten: &str) -> String {
    if dialect.flavor() != Flavor::Indented {
        return rewritten.to_string();
    }
    let headers = ["if ", "elif ", "else", "for ", "while ", "def "];
    rewritten
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let is_header = headers.iter().any(|h| trimmed.starts_with(h));
            if is_header && !trimmed.ends_with(':') && !trimmed.is_empty() {
                format!("{line}:")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drops the most recently emitted branch: everything from the last
/// top-level `if` header onward.
fn revert_last_branch(rewritten: &str, indent: &str) -> String {
    let marker = format!("\n{indent}if ");
    match rewritten.rfind(&marker) {
        Some(pos) if pos > 0 => rewritten[..pos].to_string(),
        _ => rewritten.to_string(),
    }
}

/// Wraps a stub body in a minimal harness so fragments index cleanly.
fn probe_unit(dialect: Dialect, body: &str) -> String {
    match dialect {
        Dialect::Rust => format!("fn probe() {{\n{body}\n}}\n"),
        Dialect::TypeScript => format!("function probe() {{\n{body}\n}}\n"),
        Dialect::Java | Dialect::C | Dialect::Cpp => format!("void probe() {{\n{body}\n}}\n"),
        Dialect::Python | Dialect::Generic => {
            let indented: Vec<String> = body
                .lines()
                .map(|l| {
                    if l.trim().is_empty() {
                        String::new()
                    } else {
                        format!("    {}", l.trim_start())
                    }
                })
                .collect();
            format!("def probe():\n{}\n", indented.join("\n"))
        }
    }
}
