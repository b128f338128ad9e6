// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed view over the request's parameter map.

use std::collections::HashMap;

use atlasprint_core::error::Result;
use atlasprint_core::{AtlasPrintError, OperationKind, REPORT_FILTER};

pub const PARAM_SERVICE: &str = "SERVICE";
pub const PARAM_REQUEST: &str = "REQUEST";
pub const PARAM_TEMPLATE: &str = "TEMPLATE";
pub const PARAM_EXP_FILTER: &str = "EXP_FILTER";

/// The parameters this filter reads. Lookup is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    pub service: Option<String>,
    pub request: Option<String>,
    pub template: Option<String>,
    pub exp_filter: Option<String>,
}

/// A validated atlas print: what to export and how to filter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintRequest {
    pub template: String,
    pub filter: String,
    /// Operation the caller asked for, before `GetReport` normalisation.
    pub requested: OperationKind,
}

impl RequestParameters {
    pub fn from_map(params: &HashMap<String, String>) -> Self {
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        };
        Self {
            service: get(PARAM_SERVICE),
            request: get(PARAM_REQUEST),
            template: get(PARAM_TEMPLATE),
            exp_filter: get(PARAM_EXP_FILTER),
        }
    }

    pub fn operation(&self) -> OperationKind {
        OperationKind::classify(self.service.as_deref(), self.request.as_deref())
    }

    /// Validate required parameters and fold `GetReport` into an atlas print.
    ///
    /// A report needs only `TEMPLATE` and always gets the empty report filter,
    /// whatever `EXP_FILTER` says. An atlas print needs both parameters.
    pub fn print_request(&self, operation: OperationKind) -> Result<PrintRequest> {
        let report = operation == OperationKind::GetReport;
        let filter = if report {
            Some(REPORT_FILTER.to_string())
        } else {
            self.exp_filter.clone()
        };

        match (&self.template, filter) {
            (Some(template), Some(filter)) => Ok(PrintRequest {
                template: template.clone(),
                filter,
                requested: operation,
            }),
            (template, filter) => {
                let mut missing = Vec::new();
                if template.is_none() {
                    missing.push(PARAM_TEMPLATE.to_string());
                }
                if filter.is_none() {
                    missing.push(PARAM_EXP_FILTER.to_string());
                }
                Err(AtlasPrintError::MissingParameters(missing))
            }
        }
    }
}
