// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AtlasPrintError, Result};
use crate::types::PREDEFINED_SCALES;

/// Filter settings shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Candidate scales installed on every atlas before export.
    pub predefined_scales: Vec<f64>,
    /// Directory for exported documents (OS temp dir when unset).
    pub export_dir: Option<PathBuf>,
    /// Plugin descriptor file holding `[general] name/version`.
    pub metadata_path: Option<PathBuf>,
    /// Per-page naming rule handed to the atlas (renderer default when unset).
    pub page_name_expression: Option<String>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predefined_scales: PREDEFINED_SCALES.to_vec(),
            export_dir: None,
            metadata_path: None,
            page_name_expression: None,
            log_filter: "info".into(),
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            AtlasPrintError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            AtlasPrintError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load the config, or fall back to defaults with a warning.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.predefined_scales.is_empty() {
            return Err(AtlasPrintError::Configuration(
                "predefined_scales must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .predefined_scales
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(AtlasPrintError::Configuration(format!(
                "predefined scale {bad} is not a positive number"
            )));
        }
        Ok(())
    }

    /// Directory exported documents are written to.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_builtin_scales() {
        let config = AppConfig::default();
        assert_eq!(config.predefined_scales.len(), 18);
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_export_dir(), std::env::temp_dir());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlasprint.json");
        std::fs::write(&path, r#"{"page_name_expression": "\"name\""}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.page_name_expression.as_deref(), Some("\"name\""));
        assert_eq!(config.predefined_scales, PREDEFINED_SCALES.to_vec());
    }

    #[test]
    fn rejects_non_positive_scale() {
        let config = AppConfig {
            predefined_scales: vec![1000.0, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AtlasPrintError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlasprint.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(AppConfig::load(&path).is_err());
        assert_eq!(AppConfig::load_or_default(Some(&path)), AppConfig::default());
    }
}
