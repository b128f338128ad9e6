// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF layout exporter built on `printpdf` 0.8.
//
// Atlas layouts produce one page per selected coverage feature, labelled with
// the page name and the scale picked for the reference map. Reports and plain
// layouts produce flowing text pages.

use std::path::Path;

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use atlasprint_expr::{Expression, FeatureRequest};

use super::{ExportOutcome, ExportResult, LayoutExporter};
use crate::composition::{AtlasScalingMode, Composition, MapItem, PrintLayout, Report};
use crate::feature::{Extent, FeatureScope};
use crate::project::Project;

/// Text content of one output page.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PageContent {
    pub(crate) lines: Vec<String>,
}

/// Writes compositions as PDF documents.
#[derive(Debug, Clone)]
pub struct PdfLayoutExporter {
    font_size_pt: f32,
    line_height_pt: f32,
    margin_mm: f32,
}

impl Default for PdfLayoutExporter {
    fn default() -> Self {
        Self {
            font_size_pt: 11.0,
            line_height_pt: 14.0,
            margin_mm: 20.0,
        }
    }
}

impl PdfLayoutExporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines_per_page(&self, page_h_mm: u32) -> usize {
        let usable_pt = Mm(page_h_mm as f32).into_pt().0 - 2.0 * Mm(self.margin_mm).into_pt().0;
        ((usable_pt / self.line_height_pt) as usize).max(1)
    }

    /// Lay the composition out as text pages without rendering.
    pub(crate) fn layout_pages(
        &self,
        composition: &Composition,
        project: &Project,
    ) -> Result<Vec<PageContent>, ExportResult> {
        let (_, page_h) = composition.page_size_mm();
        let per_page = self.lines_per_page(page_h);
        match composition {
            Composition::PrintLayout(layout) if layout.atlas.enabled => {
                atlas_pages(layout, project, per_page)
            }
            Composition::PrintLayout(layout) => Ok(vec![PageContent {
                lines: vec![layout.name.clone()],
            }]),
            Composition::Report(report) => report_pages(report, project, per_page),
        }
    }

    /// Serialise pages top to bottom in Helvetica.
    fn render(&self, title: &str, (w_mm, h_mm): (u32, u32), pages: &[PageContent]) -> Vec<u8> {
        let (page_w, page_h) = (Mm(w_mm as f32), Mm(h_mm as f32));
        let page_h_pt = page_h.into_pt().0;
        let margin_pt = Mm(self.margin_mm).into_pt().0;

        let mut doc = PdfDocument::new(title);
        let pdf_pages: Vec<PdfPage> = pages
            .iter()
            .map(|page| {
                let mut ops = Vec::with_capacity(page.lines.len() * 5);
                for (idx, line) in page.lines.iter().enumerate() {
                    let y_pt = page_h_pt - margin_pt - idx as f32 * self.line_height_pt;
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(y_pt),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(self.font_size_pt),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(line.clone())],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pages = pages.len(), warnings = warnings.len(), "PDF serialised");
        bytes
    }
}

impl LayoutExporter for PdfLayoutExporter {
    #[instrument(skip_all, fields(composition = composition.name(), path = %path.display()))]
    fn export_to_pdf(
        &self,
        composition: &Composition,
        project: &Project,
        path: &Path,
    ) -> ExportResult {
        let pages = match self.layout_pages(composition, project) {
            Ok(pages) => pages,
            Err(failure) => {
                warn!(outcome = %failure.outcome, error = %failure.error, "layout failed");
                return failure;
            }
        };

        let bytes = self.render(composition.name(), composition.page_size_mm(), &pages);
        if let Err(e) = std::fs::write(path, &bytes) {
            return ExportResult::failure(
                ExportOutcome::FileError,
                format!("cannot write {}: {e}", path.display()),
            );
        }

        info!(pages = pages.len(), bytes = bytes.len(), "composition exported");
        ExportResult::success()
    }
}

fn atlas_pages(
    layout: &PrintLayout,
    project: &Project,
    per_page: usize,
) -> Result<Vec<PageContent>, ExportResult> {
    let atlas = &layout.atlas;
    let layer_name = atlas.coverage_layer.as_deref().ok_or_else(|| {
        ExportResult::failure(ExportOutcome::PrintError, "atlas has no coverage layer")
    })?;
    let layer = project.layer(layer_name).ok_or_else(|| {
        ExportResult::failure(
            ExportOutcome::PrintError,
            format!("coverage layer '{layer_name}' not found"),
        )
    })?;

    let request = match (atlas.filter_features, &atlas.feature_request, &atlas.filter_expression) {
        (false, _, _) => None,
        (true, Some(request), _) => Some(request.clone()),
        (true, None, Some(source)) => Some(FeatureRequest::filter_expression(source).map_err(
            |e| ExportResult::failure(ExportOutcome::PrintError, format!("atlas filter: {e}")),
        )?),
        (true, None, None) => None,
    };
    let features = layer.get_features(request.as_ref());
    if features.is_empty() {
        return Err(ExportResult::failure(
            ExportOutcome::IteratorError,
            "atlas has no feature to iterate",
        ));
    }

    let page_name = atlas
        .effective_page_name()
        .map(Expression::parse)
        .transpose()
        .map_err(|e| {
            ExportResult::failure(ExportOutcome::PrintError, format!("page name: {e}"))
        })?;

    let scales = &layout.report_context.predefined_scales;
    let predefined_map = layout
        .reference_map
        .as_ref()
        .filter(|m| m.atlas_driven && m.scaling_mode == AtlasScalingMode::Predefined);

    let total = features.len();
    let pages = features
        .iter()
        .enumerate()
        .map(|(idx, feature)| {
            let scope = FeatureScope {
                feature,
                layer_name,
                number: idx + 1,
                total,
            };
            let name = page_name
                .as_ref()
                .map(|expr| expr.evaluate(&scope))
                .filter(|v| !v.is_null())
                .map_or_else(|| feature.id.to_string(), |v| value_text(&v));

            let mut lines = vec![layout.name.clone(), format!("Page {}/{total}: {name}", idx + 1)];
            if let Some(map) = predefined_map {
                if let Some(scale) = choose_scale(feature.extent.as_ref(), map, scales) {
                    lines.push(format!("Scale 1:{scale}"));
                }
            }
            lines.extend(
                feature
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", value_text(v))),
            );
            lines.truncate(per_page);
            PageContent { lines }
        })
        .collect();

    Ok(pages)
}

fn report_pages(
    report: &Report,
    project: &Project,
    per_page: usize,
) -> Result<Vec<PageContent>, ExportResult> {
    let mut lines = vec![report.name.clone()];
    if let Some(layer_name) = report.coverage_layer.as_deref() {
        let layer = project.layer(layer_name).ok_or_else(|| {
            ExportResult::failure(
                ExportOutcome::PrintError,
                format!("coverage layer '{layer_name}' not found"),
            )
        })?;
        lines.extend(
            layer
                .get_features(None)
                .iter()
                .map(|f| format!("Section {}", f.id)),
        );
    }
    Ok(lines
        .chunks(per_page)
        .map(|chunk| PageContent {
            lines: chunk.to_vec(),
        })
        .collect())
}

/// Pick the first scale at which `extent` fits the map frame.
///
/// Extents are in metres and frames in millimetres. Falls back to the last
/// (smallest) scale when nothing fits, and to the first scale for points.
pub fn choose_scale(extent: Option<&Extent>, map: &MapItem, scales: &[f64]) -> Option<f64> {
    let first = *scales.first()?;
    let Some(extent) = extent.filter(|e| !e.is_point()) else {
        return Some(first);
    };
    scales
        .iter()
        .copied()
        .find(|scale| {
            extent.width() * 1000.0 / scale <= map.width_mm
                && extent.height() * 1000.0 / scale <= map.height_mm
        })
        .or_else(|| scales.last().copied())
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
