// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// atlasprint-server — The atlas print request filter.
//
// Pipeline, leaf first:
//   filter      rewrite `$id` filters onto the primary key
//   atlas       install scales, page name and filter on a print layout
//   export      lock, prepare and export a composition to a temp artifact
//   dispatcher  classify the request, validate, answer with PDF or JSON

pub mod artifact;
pub mod atlas;
pub mod dispatcher;
pub mod export;
pub mod filter;
pub mod params;

pub use artifact::ExportArtifact;
pub use atlas::prepare_atlas;
pub use dispatcher::{AtlasPrintFilter, FilterOutcome};
pub use export::ExportOrchestrator;
pub use filter::{EffectiveFilter, extract_feature_id, translate};
pub use params::{PrintRequest, RequestParameters};

/// Log target shared by every pipeline stage.
pub const LOG_TARGET: &str = "atlasprint";
