// src/transform/extract.rs
//! Method-extraction rewrite: every branch payload moves into its own
//! subroutine and the region becomes a flat dispatch. Dispatch conditions
//! are made mutually exclusive by folding in the negations of the
//! conditions that guarded each payload, so plain sequential conditionals
//! reproduce the original first-match-wins order at depth 1.
//!
//! Subroutine names come from the suggestion provider when it answers in
//! time, `branch_1..n` otherwise. Rust stubs render as closures so inferred
//! parameters can stay untyped.

use regex::Regex;

use crate::dialect::Dialect;
use crate::suggest::{sanitize_name, SuggestionProvider};
use crate::transform::{finish, reindent, STEP};
use crate::types::{ConditionalRegion, SubroutineStub};

#[must_use]
pub fn render(
    dialect: Dialect,
    region: &ConditionalRegion,
    provider: &dyn SuggestionProvider,
) -> (String, Vec<SubroutineStub>) {
    let arms = exclusive_arms(dialect, region);
    let indent = &region.indent;
    let inner_indent = format!("{indent}{STEP}");

    let mut stubs = Vec::new();
    let mut stub_lines: Vec<String> = Vec::new();
    let mut dispatch: Vec<String> = Vec::new();

    for (i, arm) in arms.iter().enumerate() {
        let suggestion = provider.suggest(&region.fingerprint);
        let name = suggestion
            .as_ref()
            .and_then(|s| sanitize_name(&s.name))
            .map_or_else(|| format!("branch_{}", i + 1), |n| format!("{n}_{}", i + 1));
        let comment = suggestion
            .as_ref()
            .map(|s| s.comment.trim().to_string())
            .filter(|c| !c.is_empty());
        let params = free_identifiers(dialect, &arm.body);
        let args = params.join(", ");

        if let Some(comment) = &comment {
            stub_lines.push(format!("{indent}{} {comment}", dialect.comment_prefix()));
        }
        let (header, footer) = dialect.stub_decl(&name, &args);
        stub_lines.push(format!("{indent}{header}"));
        stub_lines.extend(reindent(&arm.body, &inner_indent));
        if !footer.is_empty() {
            stub_lines.push(format!("{indent}{footer}"));
        }
        stub_lines.push(String::new());

        dispatch.push(format!("{indent}{}", dialect.if_header(&arm.condition)));
        dispatch.push(format!("{inner_indent}{}", dialect.call_stmt(&name, &args)));
        if !dialect.block_close().is_empty() {
            dispatch.push(format!("{indent}{}", dialect.block_close()));
        }

        stubs.push(SubroutineStub {
            name,
            params,
            body: arm.body.clone(),
            comment,
        });
    }

    stub_lines.extend(dispatch);
    (finish(stub_lines, indent), stubs)
}

struct Arm {
    condition: String,
    body: String,
}

/// Flattens the chain into mutually exclusive (condition, payload) pairs.
/// `reach` accumulates the conditions that must have held to arrive at each
/// level, following then-links positively and else-links negatively.
fn exclusive_arms(dialect: Dialect, region: &ConditionalRegion) -> Vec<Arm> {
    let mut arms = Vec::new();
    let mut reach: Vec<String> = Vec::new();
    let last = region.levels.len().saturating_sub(1);

    for (i, level) in region.levels.iter().enumerate() {
        let positive = format!("({})", level.condition.trim());
        let negative = dialect.negate(&level.condition);

        if i == last {
            arms.push(Arm {
                condition: combine(dialect, &reach, &positive),
                body: level.body.clone(),
            });
            if let Some(else_body) = &level.else_body {
                arms.push(Arm {
                    condition: combine(dialect, &reach, &negative),
                    body: else_body.clone(),
                });
            }
        } else if level.else_link {
            arms.push(Arm {
                condition: combine(dialect, &reach, &positive),
                body: level.body.clone(),
            });
            reach.push(negative);
        } else {
            if let Some(else_body) = &level.else_body {
                arms.push(Arm {
                    condition: combine(dialect, &reach, &negative),
                    body: else_body.clone(),
                });
            }
            reach.push(positive);
        }
    }
    arms
}

fn combine(dialect: Dialect, reach: &[String], tail: &str) -> String {
    let mut parts: Vec<&str> = reach.iter().map(String::as_str).collect();
    parts.push(tail);
    parts.join(&format!(" {} ", dialect.and_op()))
}

/// Infers the enclosing-scope names a payload reads: identifiers that are
/// not dialect keywords, not call targets, not member accesses, and not
/// assigned locally before first use.
fn free_identifiers(dialect: Dialect, body: &str) -> Vec<String> {
    let Ok(ident) = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*") else {
        return Vec::new();
    };
    let keywords = dialect.keywords();
    let bytes = body.as_bytes();
    let mut params: Vec<String> = Vec::new();
    let mut locals: Vec<String> = Vec::new();

    for m in ident.find_iter(body) {
        let word = m.as_str();
        if keywords.contains(&word) {
            continue;
        }
        if params.iter().any(|p| p == word) || locals.iter().any(|l| l == word) {
            continue;
        }
        let prev = m.start().checked_sub(1).and_then(|p| bytes.get(p)).copied();
        if prev == Some(b'.') || prev == Some(b'"') || prev == Some(b'\'') {
            continue;
        }
        let mut after = m.end();
        while bytes.get(after).is_some_and(u8::is_ascii_whitespace) {
            after += 1;
        }
        match bytes.get(after).copied() {
            // Call target or declaration-like use.
            Some(b'(') => continue,
            // First sight as an assignment target: a local, not a read.
            Some(b'=') if bytes.get(after + 1) != Some(&b'=') => {
                locals.push(word.to_string());
                continue;
            }
            _ => {}
        }
        params.push(word.to_string());
    }
    params
}
