// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print compositions: layouts (atlas-capable) and reports.

use serde::{Deserialize, Serialize};

use atlasprint_core::{Orientation, PaperSize};
use atlasprint_expr::FeatureRequest;

/// How an atlas-driven map picks its scale for each feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtlasScalingMode {
    /// Keep the map's own scale.
    Fixed,
    /// Pick from the report context's predefined scales.
    Predefined,
    /// Zoom to the feature extent.
    #[default]
    Auto,
}

/// The map frame whose extent follows the atlas feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapItem {
    #[serde(default)]
    pub atlas_driven: bool,
    #[serde(default)]
    pub scaling_mode: AtlasScalingMode,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl MapItem {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            atlas_driven: false,
            scaling_mode: AtlasScalingMode::default(),
            width_mm,
            height_mm,
        }
    }
}

/// Atlas iteration settings of a print layout.
///
/// `coverage_layer` and `page_name_expression` come from the project. The
/// remaining fields are installed per request and cleared by [`reset`].
///
/// [`reset`]: AtlasSettings::reset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasSettings {
    pub enabled: bool,
    pub coverage_layer: Option<String>,
    pub page_name_expression: Option<String>,
    #[serde(skip)]
    pub page_name_override: Option<String>,
    #[serde(skip)]
    pub filter_features: bool,
    #[serde(skip)]
    pub filter_expression: Option<String>,
    /// Fast-path selection equivalent to `filter_expression`.
    #[serde(skip)]
    pub feature_request: Option<FeatureRequest>,
}

impl AtlasSettings {
    /// Clear everything a previous request may have installed.
    pub fn reset(&mut self) {
        self.page_name_override = None;
        self.filter_features = false;
        self.filter_expression = None;
        self.feature_request = None;
    }

    /// Page-name rule in force: the per-request override, else the project's.
    pub fn effective_page_name(&self) -> Option<&str> {
        self.page_name_override
            .as_deref()
            .or(self.page_name_expression.as_deref())
    }
}

/// Settings shared by layouts and reports during iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportContext {
    pub predefined_scales: Vec<f64>,
}

impl ReportContext {
    pub fn set_predefined_scales(&mut self, scales: &[f64]) {
        self.predefined_scales = scales.to_vec();
    }
}

/// A single-page layout, optionally iterated as an atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintLayout {
    pub name: String,
    #[serde(default)]
    pub paper: PaperSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub atlas: AtlasSettings,
    #[serde(default)]
    pub reference_map: Option<MapItem>,
    #[serde(skip)]
    pub report_context: ReportContext,
}

impl PrintLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paper: PaperSize::default(),
            orientation: Orientation::default(),
            atlas: AtlasSettings::default(),
            reference_map: None,
            report_context: ReportContext::default(),
        }
    }

    pub fn with_coverage_layer(mut self, layer: impl Into<String>) -> Self {
        self.atlas.coverage_layer = Some(layer.into());
        self
    }

    pub fn with_reference_map(mut self, map: MapItem) -> Self {
        self.reference_map = Some(map);
        self
    }

    pub fn reference_map_mut(&mut self) -> Option<&mut MapItem> {
        self.reference_map.as_mut()
    }
}

/// A report: sections driven by an optional coverage layer, never filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    #[serde(default)]
    pub paper: PaperSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub coverage_layer: Option<String>,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paper: PaperSize::default(),
            orientation: Orientation::default(),
            coverage_layer: None,
        }
    }
}

/// A named composition stored in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Composition {
    PrintLayout(PrintLayout),
    Report(Report),
}

impl Composition {
    pub fn name(&self) -> &str {
        match self {
            Self::PrintLayout(layout) => &layout.name,
            Self::Report(report) => &report.name,
        }
    }

    /// The layout, when this composition can drive an atlas.
    pub fn as_print_layout_mut(&mut self) -> Option<&mut PrintLayout> {
        match self {
            Self::PrintLayout(layout) => Some(layout),
            Self::Report(_) => None,
        }
    }

    pub fn as_print_layout(&self) -> Option<&PrintLayout> {
        match self {
            Self::PrintLayout(layout) => Some(layout),
            Self::Report(_) => None,
        }
    }

    /// Page size in millimetres after orientation.
    pub fn page_size_mm(&self) -> (u32, u32) {
        let (paper, orientation) = match self {
            Self::PrintLayout(l) => (l.paper, l.orientation),
            Self::Report(r) => (r.paper, r.orientation),
        };
        orientation.apply(paper.dimensions_mm())
    }
}
