// src/adapter/mod.rs
//! Dialect adapter layer: three indexing strategies behind one contract.
//!
//! `index(text)` turns raw source into a `Block` tree. The strategies produce
//! structurally comparable trees, so everything downstream of this module is
//! adapter-agnostic.

pub mod delimiter;
pub mod indent;
pub mod tree;

use crate::dialect::{Dialect, Strategy};
use crate::error::Result;
use crate::types::Block;

#[derive(Debug, Clone, Copy)]
pub struct Adapter {
    dialect: Dialect,
}

impl Adapter {
    #[must_use]
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Indexes `text` into a root block at depth 0.
    ///
    /// # Errors
    ///
    /// Returns `MalformedStructure` when the text cannot be indexed
    /// consistently (parse errors, unbalanced delimiters, mixed indentation).
    pub fn index(&self, text: &str) -> Result<Block> {
        match self.dialect.strategy() {
            Strategy::Tree => tree::index(self.dialect, text),
            Strategy::Delimiter => delimiter::index(self.dialect, text),
            Strategy::Indent => indent::index(self.dialect, text),
        }
    }
}

/// Shared terminal-statement check, applied to branch body text by every
/// strategy so the flag means the same thing regardless of dialect.
#[must_use]
pub fn body_is_terminal(body: &str) -> bool {
    let Some(last) = body.lines().rev().find(|l| !l.trim().is_empty()) else {
        return false;
    };
    let trimmed = last.trim();
    ["return", "throw", "raise", "break", "continue", "goto"]
        .iter()
        .any(|kw| {
            trimmed == *kw
                || trimmed.starts_with(&format!("{kw} "))
                || trimmed.starts_with(&format!("{kw};"))
                || trimmed.starts_with(&format!("{kw}("))
        })
}

/// Strips one layer of enclosing parentheses from a condition, if balanced.
#[must_use]
pub fn normalize_condition(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        // Only unwrap when the outer pair actually matches.
        let mut depth = 0i32;
        for (i, c) in inner.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 && i < inner.len() - 1 {
                        return trimmed.to_string();
                    }
                }
                _ => {}
            }
        }
        if depth == 0 {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}
