// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export module — rendering compositions to documents on disk.

pub mod pdf;

use std::fmt;
use std::path::Path;

use crate::composition::Composition;
use crate::project::Project;

/// Result code of a layout export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Success,
    /// The target file could not be written.
    FileError,
    /// The composition could not be laid out.
    PrintError,
    /// The atlas had no feature to iterate.
    IteratorError,
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::FileError => "file error",
            Self::PrintError => "print error",
            Self::IteratorError => "iterator error",
        };
        f.write_str(s)
    }
}

/// Outcome code plus the engine's error text (empty on success).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub outcome: ExportOutcome,
    pub error: String,
}

impl ExportResult {
    pub fn success() -> Self {
        Self {
            outcome: ExportOutcome::Success,
            error: String::new(),
        }
    }

    pub fn failure(outcome: ExportOutcome, error: impl Into<String>) -> Self {
        Self {
            outcome,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ExportOutcome::Success
    }
}

/// Renders a prepared composition to a file.
pub trait LayoutExporter: Send + Sync {
    fn export_to_pdf(&self, composition: &Composition, project: &Project, path: &Path)
    -> ExportResult;
}
