// src/suggest.rs
//! Optional naming collaborator for extracted subroutines.
//!
//! The provider is a side-effect-free lookup with a no-op default. The
//! engine calls it at most once per extracted subroutine and never blocks
//! on it: `BoundedSuggestions` enforces a hard timeout.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::types::Fingerprint;

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub name: String,
    pub comment: String,
}

pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, fingerprint: &Fingerprint) -> Option<Suggestion>;
}

impl SuggestionProvider for Box<dyn SuggestionProvider> {
    fn suggest(&self, fingerprint: &Fingerprint) -> Option<Suggestion> {
        self.as_ref().suggest(fingerprint)
    }
}

/// Default collaborator: never suggests anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSuggestions;

impl SuggestionProvider for NoopSuggestions {
    fn suggest(&self, _fingerprint: &Fingerprint) -> Option<Suggestion> {
        None
    }
}

/// Wraps a provider with a wall-clock budget. A lookup that overruns the
/// budget resolves to `None`; the worker is detached and its late answer
/// dropped.
pub struct BoundedSuggestions<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> BoundedSuggestions<P>
where
    P: SuggestionProvider + 'static,
{
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<P> SuggestionProvider for BoundedSuggestions<P>
where
    P: SuggestionProvider + 'static,
{
    fn suggest(&self, fingerprint: &Fingerprint) -> Option<Suggestion> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let fp = fingerprint.clone();
        thread::spawn(move || {
            let _ = tx.send(inner.suggest(&fp));
        });
        rx.recv_timeout(self.timeout).ok().flatten()
    }
}

/// Reduces a suggested name to a safe identifier, or rejects it entirely.
#[must_use]
pub fn sanitize_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_').to_string();
    if cleaned.is_empty() || cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(cleaned.to_lowercase())
}
