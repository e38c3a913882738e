// src/config.rs
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RefactorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorConfig {
    /// Chain depth at which a region is reported (and eligible for rewrite).
    #[serde(default = "default_depth_threshold")]
    pub depth_threshold: usize,
    /// Upper bound on corrective passes inside the validation loop.
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: usize,
    /// Candidates below this confidence are applied but flagged for review.
    #[serde(default = "default_acceptance_confidence")]
    pub acceptance_confidence: f64,
    /// Budget for a single suggestion-provider lookup.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
}

impl Default for RefactorConfig {
    fn default() -> Self {
        Self {
            depth_threshold: default_depth_threshold(),
            max_repair_attempts: default_max_repair_attempts(),
            acceptance_confidence: default_acceptance_confidence(),
            provider_timeout_ms: default_provider_timeout_ms(),
        }
    }
}

const fn default_depth_threshold() -> usize { 3 }
const fn default_max_repair_attempts() -> usize { 3 }
const fn default_acceptance_confidence() -> f64 { 0.5 }
const fn default_provider_timeout_ms() -> u64 { 250 }

impl RefactorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config with defaults, then applies `denest.toml` from `root`
    /// when one exists. Unreadable or unparsable files fall back to defaults.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let mut config = Self::new();
        if let Ok(content) = std::fs::read_to_string(root.join("denest.toml")) {
            config.parse_toml(&content);
        }
        config
    }

    pub fn parse_toml(&mut self, content: &str) {
        if let Ok(file) = toml::from_str::<DenestToml>(content) {
            *self = file.rules;
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is outside its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.depth_threshold < 2 {
            return Err(RefactorError::Other(format!(
                "depth_threshold must be >= 2 (got {})",
                self.depth_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.acceptance_confidence) {
            return Err(RefactorError::Other(format!(
                "acceptance_confidence must be within [0, 1] (got {})",
                self.acceptance_confidence
            )));
        }
        Ok(())
    }
}

/// On-disk layout of `denest.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DenestToml {
    #[serde(default)]
    pub rules: RefactorConfig,
}
