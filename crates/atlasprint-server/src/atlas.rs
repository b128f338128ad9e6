// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atlas preparation: per-request configuration of a print layout.

use tracing::{debug, error, instrument, warn};

use atlasprint_core::error::Result;
use atlasprint_core::{AtlasPrintError, REPORT_FILTER};
use atlasprint_expr::Expression;
use atlasprint_layout::{AtlasScalingMode, AtlasSettings, DataProvider, PrintLayout, Project};

use crate::LOG_TARGET;
use crate::filter::translate;

/// Configure `layout` to iterate the features selected by `filter`.
///
/// Clears whatever a previous request installed, enables the atlas, switches
/// the reference map to predefined scales and installs the translated filter.
/// The report filter enables the atlas without excluding any feature.
#[instrument(skip_all, fields(layout = %layout.name, filter = %filter))]
pub fn prepare_atlas<'a>(
    layout: &'a mut PrintLayout,
    project: &Project,
    scales: &[f64],
    filter: &str,
    page_name_expression: Option<&str>,
) -> Result<&'a AtlasSettings> {
    layout.atlas.reset();

    if filter.trim().is_empty() {
        error!(target: LOG_TARGET, "No feature_filter provided!");
        return Err(AtlasPrintError::NoFeatureFilter);
    }

    layout.atlas.enabled = true;
    match layout.reference_map_mut() {
        Some(map) => {
            map.atlas_driven = true;
            map.scaling_mode = AtlasScalingMode::Predefined;
        }
        None => warn!(target: LOG_TARGET, "layout has no reference map"),
    }
    layout.report_context.set_predefined_scales(scales);
    if let Some(page_name) = page_name_expression {
        layout.atlas.page_name_override = Some(page_name.to_string());
    }

    if filter == REPORT_FILTER {
        debug!(target: LOG_TARGET, "report filter, no feature excluded");
        return Ok(&layout.atlas);
    }

    let layer_name = layout
        .atlas
        .coverage_layer
        .clone()
        .ok_or_else(|| AtlasPrintError::NoCoverageLayer(layout.name.clone()))?;
    let layer = project
        .layer(&layer_name)
        .ok_or(AtlasPrintError::CoverageLayerNotFound(layer_name))?;

    let expression =
        Expression::parse(filter).map_err(|e| AtlasPrintError::ExpressionParse(e.to_string()))?;
    let unknown = unknown_columns(&expression, layer.data_provider());
    if !unknown.is_empty() {
        warn!(
            target: LOG_TARGET,
            layer = %layer.name,
            columns = ?unknown,
            "filter references columns the coverage layer does not have"
        );
    }
    let effective = translate(&expression, layer.data_provider());

    layout.atlas.filter_features = true;
    layout.atlas.filter_expression = Some(effective.expression.expression().to_string());
    layout.atlas.feature_request = Some(effective.request);
    Ok(&layout.atlas)
}

/// Columns of `expression` missing from `provider`; they evaluate to NULL.
fn unknown_columns(expression: &Expression, provider: &DataProvider) -> Vec<String> {
    expression
        .referenced_columns()
        .into_iter()
        .filter(|column| !provider.fields().iter().any(|f| &f.name == column))
        .collect()
}
