//! Harness config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use vumetrics_core::error::{MetricsError, Result};

pub use schema::{HarnessConfig, LoadSection, ReportSection, TrendSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<HarnessConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

/// Load `path` when it exists, otherwise fall back to defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<HarnessConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_from_file(path)
    } else {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        Ok(HarnessConfig::default())
    }
}

pub fn load_from_str(s: &str) -> Result<HarnessConfig> {
    let cfg: HarnessConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
