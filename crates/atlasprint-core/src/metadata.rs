// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin metadata — `name` and `version` read once at startup from the
// package descriptor (INI, `[general]` section).

use std::path::Path;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AtlasPrintError, Result};

/// Section of the descriptor holding the plugin identity.
const GENERAL_SECTION: &str = "general";

/// Identity echoed by `GetCapabilitiesAtlas`.
///
/// Both fields are optional: a missing descriptor yields an empty object
/// rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
        }
    }

    /// True when neither field was found.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none()
    }

    /// Parse the descriptor at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AtlasPrintError::Metadata(format!(
                "descriptor not found: {}",
                path.display()
            )));
        }

        let source = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
            .build()
            .map_err(|e| AtlasPrintError::Metadata(format!("{}: {e}", path.display())))?;

        let name = source.get_string(&format!("{GENERAL_SECTION}.name")).ok();
        let version = source.get_string(&format!("{GENERAL_SECTION}.version")).ok();
        debug!(?name, ?version, "plugin metadata parsed");

        Ok(Self { name, version })
    }

    /// Load metadata, falling back to an empty value on any failure.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(target: "atlasprint", error = %e, "plugin metadata unavailable");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_general_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.txt");
        std::fs::write(
            &path,
            "[general]\nname=atlasprint\nqgisMinimumVersion=3.4\nversion=3.2.0\nauthor=3Liz\n",
        )
        .unwrap();

        let meta = PluginMetadata::from_file(&path).unwrap();
        assert_eq!(meta, PluginMetadata::new("atlasprint", "3.2.0"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let meta = PluginMetadata::load_or_empty(Some(&dir.path().join("nope.txt")));
        assert!(meta.is_empty());
        assert_eq!(serde_json::to_string(&meta).unwrap(), "{}");
    }

    #[test]
    fn no_path_is_empty() {
        assert!(PluginMetadata::load_or_empty(None).is_empty());
    }

    #[test]
    fn missing_keys_stay_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.txt");
        std::fs::write(&path, "[general]\nname=atlasprint\n").unwrap();

        let meta = PluginMetadata::from_file(&path).unwrap();
        assert_eq!(meta.name.as_deref(), Some("atlasprint"));
        assert_eq!(meta.version, None);
    }
}
