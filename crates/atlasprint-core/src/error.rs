// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Atlasprint.

use std::path::PathBuf;

use thiserror::Error;

/// Message returned to the caller for every generation failure.
pub const GENERATION_FAILED_MESSAGE: &str = "ATLAS - Error while generating the PDF";

/// Message returned to the caller when the exported document cannot be read.
pub const READ_FAILED_MESSAGE: &str = "Error occured while reading PDF file";

/// Top-level error type for all Atlasprint operations.
#[derive(Debug, Error)]
pub enum AtlasPrintError {
    // -- Request validation --
    #[error("Missing parameters: {} required.", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("An error occurred while parsing the given expression: {0}")]
    ExpressionParse(String),

    // -- Composition / atlas preparation --
    #[error("no feature filter provided")]
    NoFeatureFilter,

    #[error("composition not found: {0}")]
    CompositionNotFound(String),

    #[error("coverage layer not found: {0}")]
    CoverageLayerNotFound(String),

    #[error("composition has no atlas coverage layer: {0}")]
    NoCoverageLayer(String),

    // -- Export --
    #[error("export not generated {path}: {message}")]
    Export { path: PathBuf, message: String },

    #[error("export reported success but no file exists at {0}")]
    ArtifactMissing(PathBuf),

    #[error("failed to read exported document: {0}")]
    ArtifactRead(String),

    #[error("document generation panicked: {0}")]
    GenerationPanicked(String),

    // -- Configuration / metadata --
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("plugin metadata error: {0}")]
    Metadata(String),

    #[error("project error: {0}")]
    Project(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AtlasPrintError {
    /// HTTP-style status code reported to the caller for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameters(_) | Self::ExpressionParse(_) => 400,
            _ => 500,
        }
    }

    /// Whether this error is a request validation failure (reported as 400).
    pub fn is_validation(&self) -> bool {
        self.status_code() == 400
    }

    /// Message placed in the `message` field of the JSON failure body.
    ///
    /// Validation errors echo their own text; every generation-stage error
    /// collapses into the fixed generation message so engine internals never
    /// reach the caller.
    pub fn response_message(&self) -> String {
        match self {
            Self::MissingParameters(_) | Self::ExpressionParse(_) => self.to_string(),
            Self::ArtifactRead(_) => READ_FAILED_MESSAGE.to_owned(),
            _ => GENERATION_FAILED_MESSAGE.to_owned(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AtlasPrintError>;
