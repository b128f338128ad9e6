// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application services: everything the filter needs, loaded once.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use atlasprint_bridge::BufferedRequestHandler;
use atlasprint_core::error::Result;
use atlasprint_core::{AppConfig, PluginMetadata};
use atlasprint_layout::{PdfLayoutExporter, Project};
use atlasprint_server::{AtlasPrintFilter, FilterOutcome};

use super::data_dir;

/// Body the stand-in host sends when no filter takes over.
pub const UNHANDLED_BODY: &[u8] = b"unhandled request\n";

/// Loaded configuration and the filter built from it.
pub struct AppServices {
    pub config: AppConfig,
    pub filter: AtlasPrintFilter,
}

impl AppServices {
    /// Load config (explicit file must be valid), metadata and project.
    pub fn init(project: &Path, config: Option<&Path>, metadata: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::load_or_default(data_dir::default_config_path().as_deref()),
        };
        Self::with_config(project, config, metadata)
    }

    pub fn with_config(project: &Path, config: AppConfig, metadata: Option<&Path>) -> Result<Self> {
        config.validate()?;
        let metadata_path = data_dir::metadata_path(metadata.or(config.metadata_path.as_deref()));
        let metadata = PluginMetadata::load_or_empty(metadata_path.as_deref());
        let project = Arc::new(Project::load(project)?);

        info!(
            project = project.title(),
            layouts = project.layout_manager().len(),
            export_dir = %config.resolved_export_dir().display(),
            "services initialised"
        );

        let filter = AtlasPrintFilter::new(
            project,
            Arc::new(PdfLayoutExporter::new()),
            config.clone(),
            metadata,
        );
        Ok(Self { config, filter })
    }

    /// Answer one request against a buffered stand-in host.
    pub fn handle(&self, params: Vec<(String, String)>) -> (FilterOutcome, BufferedRequestHandler) {
        let mut handler =
            BufferedRequestHandler::new(params).with_default_response("text/plain", UNHANDLED_BODY);
        let outcome = self.filter.response_complete(&mut handler);
        (outcome, handler)
    }
}
