// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// atlasprint-layout — In-memory project model and layout export.
//
// Holds the vector layers that drive atlas iteration, the named print
// compositions (print layouts and reports), and the PDF exporter that renders
// a prepared composition to disk.

pub mod composition;
pub mod export;
pub mod feature;
pub mod layer;
pub mod project;

pub use composition::{
    AtlasScalingMode, AtlasSettings, Composition, MapItem, PrintLayout, Report, ReportContext,
};
pub use export::pdf::PdfLayoutExporter;
pub use export::{ExportOutcome, ExportResult, LayoutExporter};
pub use feature::{Extent, Feature, FeatureScope, Field};
pub use layer::{DataProvider, VectorLayer};
pub use project::{LayoutManager, Project};
