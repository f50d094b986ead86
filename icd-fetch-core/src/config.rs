use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_OUTPUT_DIR: &str = "icd_data";
pub const DEFAULT_DELAY_SECS: f64 = 0.5;
pub const DEFAULT_LOG_FILE: &str = "icd_api.log";
pub const DEFAULT_BASE_URL: &str = "https://id.who.int/icd/release/10/2010";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TOKEN_URL: &str = "https://icdaccessmanagement.who.int/connect/token";

/// Top-level chapters of ICD-10, used when the release root cannot be fetched.
pub const ICD10_CHAPTERS: [&str; 22] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV", "XV",
    "XVI", "XVII", "XVIII", "XIX", "XX", "XXI", "XXII",
];

/// The resolved configuration for one run. Built once at startup and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    #[serde(skip_serializing)]
    pub token: String,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub log_file: PathBuf,
    pub base_url: String,
    pub language: String,
    /// Identifier the traversal starts from. Empty means the release root.
    pub root: String,
}

impl EffectiveConfig {
    /// Rejects an empty token so that no request is ever issued without one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    /// Children to fall back on when the seed node cannot be fetched.
    pub fn seed_fallback(&self) -> Vec<String> {
        if self.root.is_empty() {
            ICD10_CHAPTERS.iter().map(|c| c.to_string()).collect()
        } else {
            Vec::new()
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            delay_secs = self.delay.as_secs_f64(),
            log_file = %self.log_file.display(),
            base_url = %self.base_url,
            root = %self.root,
            "Loaded EffectiveConfig"
        );
        debug!(
            config = %serde_json::to_string(self).unwrap_or_default(),
            "EffectiveConfig (token redacted)"
        );
    }
}

/// Parses a delay in seconds. Negative, non-finite and non-numeric values are rejected.
pub fn parse_delay(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "delay".to_string(),
        value: raw.to_string(),
    };
    let secs: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs_f64(secs))
}
