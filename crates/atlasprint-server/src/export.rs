// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestration: look up, lock, prepare and export one composition.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

use tracing::{error, info, instrument};

use atlasprint_core::AtlasPrintError;
use atlasprint_core::error::Result;
use atlasprint_layout::{LayoutExporter, Project};

use crate::LOG_TARGET;
use crate::artifact::ExportArtifact;
use crate::atlas::prepare_atlas;

/// Turns a template name and filter into an exported document.
pub struct ExportOrchestrator {
    project: Arc<Project>,
    exporter: Arc<dyn LayoutExporter>,
    export_dir: PathBuf,
}

impl ExportOrchestrator {
    pub fn new(project: Arc<Project>, exporter: Arc<dyn LayoutExporter>, export_dir: PathBuf) -> Self {
        Self {
            project,
            exporter,
            export_dir,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Export `composition_name` filtered by `filter`.
    ///
    /// The composition stays locked from atlas preparation until the export
    /// returns. Print layouts are prepared as atlases; other compositions are
    /// exported as they are. Success needs both a successful export and the
    /// file on disk afterwards.
    #[instrument(skip(self, scales, page_name_expression))]
    pub fn export_document(
        &self,
        composition_name: &str,
        scales: &[f64],
        filter: &str,
        page_name_expression: Option<&str>,
    ) -> Result<ExportArtifact> {
        let handle = self
            .project
            .layout_manager()
            .layout_by_name(composition_name)
            .ok_or_else(|| {
                error!(target: LOG_TARGET, composition = composition_name, "composition not found");
                AtlasPrintError::CompositionNotFound(composition_name.to_string())
            })?;
        // Every request resets the atlas fields, so a poisoned lock is safe to reuse.
        let mut composition = handle.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(layout) = composition.as_print_layout_mut() {
            prepare_atlas(layout, &self.project, scales, filter, page_name_expression)?;
        }

        let artifact = ExportArtifact::allocate(&self.export_dir, composition_name)?;
        let result = self
            .exporter
            .export_to_pdf(&composition, &self.project, artifact.path());
        drop(composition);

        if !result.is_success() {
            error!(
                target: LOG_TARGET,
                path = %artifact.path().display(),
                outcome = %result.outcome,
                error = %result.error,
                "export not generated"
            );
            return Err(AtlasPrintError::Export {
                path: artifact.path().to_path_buf(),
                message: result.error,
            });
        }
        if !artifact.exists() {
            error!(target: LOG_TARGET, path = %artifact.path().display(), "export not generated");
            return Err(AtlasPrintError::ArtifactMissing(artifact.path().to_path_buf()));
        }

        info!(
            target: LOG_TARGET,
            outcome = "success",
            path = %artifact.path().display(),
            "path generated"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use atlasprint_core::PREDEFINED_SCALES;
    use atlasprint_layout::{
        Composition, DataProvider, ExportOutcome, ExportResult, Feature, Field, MapItem,
        PdfLayoutExporter, PrintLayout, Report, VectorLayer,
    };

    fn project() -> Arc<Project> {
        let provider = DataProvider::new(vec![Field::new("gid")], vec![0]).with_features(vec![
            Feature::new(1).with_attribute("gid", 1),
            Feature::new(2).with_attribute("gid", 2),
        ]);
        let mut project = Project::new("t");
        project.add_layer(VectorLayer::new("parcels", provider));
        project.add_layout(Composition::PrintLayout(
            PrintLayout::new("sheet")
                .with_coverage_layer("parcels")
                .with_reference_map(MapItem::new(180.0, 120.0)),
        ));
        project.add_layout(Composition::Report(Report::new("summary")));
        Arc::new(project)
    }

    fn orchestrator(dir: &Path, exporter: Arc<dyn LayoutExporter>) -> ExportOrchestrator {
        ExportOrchestrator::new(project(), exporter, dir.to_path_buf())
    }

    /// Claims success without writing anything.
    struct PhantomExporter;

    impl LayoutExporter for PhantomExporter {
        fn export_to_pdf(&self, _: &Composition, _: &Project, _: &Path) -> ExportResult {
            ExportResult::success()
        }
    }

    /// Writes a file, then reports failure.
    struct FailingExporter;

    impl LayoutExporter for FailingExporter {
        fn export_to_pdf(&self, _: &Composition, _: &Project, path: &Path) -> ExportResult {
            std::fs::write(path, b"partial").unwrap();
            ExportResult::failure(ExportOutcome::PrintError, "renderer crashed")
        }
    }

    #[test]
    fn exports_filtered_atlas() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(PdfLayoutExporter::new()));
        let artifact = orch
            .export_document("sheet", &PREDEFINED_SCALES, "$id = 2", None)
            .unwrap();

        let bytes = artifact.read().unwrap();
        assert_eq!(lopdf::Document::load_mem(&bytes).unwrap().get_pages().len(), 1);

        let handle = orch.project().layout_manager().layout_by_name("sheet").unwrap();
        let composition = handle.lock().unwrap();
        let atlas = &composition.as_print_layout().unwrap().atlas;
        assert_eq!(atlas.filter_expression.as_deref(), Some(r#""gid" IN (2)"#));
    }

    #[test]
    fn reports_pass_through_unprepared() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(PdfLayoutExporter::new()));
        let artifact = orch
            .export_document("summary", &PREDEFINED_SCALES, "\"\"", None)
            .unwrap();
        assert!(artifact.exists());
    }

    #[test]
    fn unknown_composition_is_distinct_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(PdfLayoutExporter::new()));
        let err = orch
            .export_document("nope", &PREDEFINED_SCALES, "$id = 1", None)
            .unwrap_err();
        assert!(matches!(err, AtlasPrintError::CompositionNotFound(name) if name == "nope"));
    }

    #[test]
    fn success_without_file_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(PhantomExporter));
        let err = orch
            .export_document("sheet", &PREDEFINED_SCALES, "$id = 1", None)
            .unwrap_err();
        assert!(matches!(err, AtlasPrintError::ArtifactMissing(_)));
    }

    #[test]
    fn failed_export_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(FailingExporter));
        let err = orch
            .export_document("sheet", &PREDEFINED_SCALES, "$id = 1", None)
            .unwrap_err();
        assert!(matches!(err, AtlasPrintError::Export { ref message, .. } if message == "renderer crashed"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_atlas_is_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), Arc::new(PdfLayoutExporter::new()));
        let err = orch
            .export_document("sheet", &PREDEFINED_SCALES, "\"gid\" = 999", None)
            .unwrap_err();
        assert!(matches!(err, AtlasPrintError::Export { .. }));
    }
}
