// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Atlasprint request filter.

use serde::{Deserialize, Serialize};

use crate::metadata::PluginMetadata;

/// The only service this filter augments.
pub const SERVICE_WMS: &str = "WMS";

/// Candidate scales the renderer picks from for each atlas page.
pub const PREDEFINED_SCALES: [f64; 18] = [
    500.0,
    1_000.0,
    2_500.0,
    5_000.0,
    10_000.0,
    25_000.0,
    50_000.0,
    100_000.0,
    250_000.0,
    500_000.0,
    1_000_000.0,
    2_500_000.0,
    5_000_000.0,
    10_000_000.0,
    25_000_000.0,
    50_000_000.0,
    100_000_000.0,
    250_000_000.0,
];

/// Filter installed for `GetReport`: an empty quoted identifier, which parses
/// cleanly and excludes nothing.
pub const REPORT_FILTER: &str = "\"\"";

/// Operation family a request belongs to, derived from `SERVICE` + `REQUEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    GetCapabilitiesAtlas,
    GetPrintAtlas,
    GetReport,
    /// Not ours: the host's default response is left untouched.
    NotApplicable,
}

impl OperationKind {
    /// Classify a request from its raw `SERVICE` and `REQUEST` values.
    ///
    /// Both comparisons are case-insensitive.  Anything other than a WMS
    /// request naming one of the atlas operations is `NotApplicable`.
    pub fn classify(service: Option<&str>, request: Option<&str>) -> Self {
        match service {
            Some(s) if s.eq_ignore_ascii_case(SERVICE_WMS) => {}
            _ => return Self::NotApplicable,
        }
        request.map_or(Self::NotApplicable, Self::from_request)
    }

    /// Map a `REQUEST` value onto an operation (case-insensitive).
    pub fn from_request(request: &str) -> Self {
        match request.to_ascii_lowercase().as_str() {
            "getcapabilitiesatlas" => Self::GetCapabilitiesAtlas,
            "getprintatlas" => Self::GetPrintAtlas,
            "getreport" => Self::GetReport,
            _ => Self::NotApplicable,
        }
    }

    /// Canonical `REQUEST` spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetCapabilitiesAtlas => "GetCapabilitiesAtlas",
            Self::GetPrintAtlas => "GetPrintAtlas",
            Self::GetReport => "GetReport",
            Self::NotApplicable => "NotApplicable",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content types this filter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Json,
}

impl DocumentType {
    /// MIME type string for the `Content-Type` response header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Json => "text/json",
        }
    }

    /// File extension used for exported artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }
}

/// Standard paper sizes for print layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Apply the orientation to portrait dimensions.
    pub fn apply(&self, (w, h): (u32, u32)) -> (u32, u32) {
        match self {
            Self::Portrait => (w, h),
            Self::Landscape => (h, w),
        }
    }
}

/// Outcome field of a JSON status body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// JSON body returned for capabilities and for every failure.
///
/// Serialises as `{"status":"success","metadata":{..}}` or
/// `{"status":"fail","message":".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PluginMetadata>,
}

impl StatusBody {
    pub fn success(metadata: PluginMetadata) -> Self {
        Self {
            status: Status::Success,
            message: None,
            metadata: Some(metadata),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: Some(message.into()),
            metadata: None,
        }
    }
}

/// The single response produced for an in-scope request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON status object with an HTTP-style status code.
    Json { status_code: u16, body: StatusBody },
    /// Raw document bytes, always served with status 200.
    Document {
        document_type: DocumentType,
        bytes: Vec<u8>,
    },
}

impl ResponseBody {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Json { status_code, .. } => *status_code,
            Self::Document { .. } => 200,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json { .. } => DocumentType::Json.mime_type(),
            Self::Document { document_type, .. } => document_type.mime_type(),
        }
    }
}
