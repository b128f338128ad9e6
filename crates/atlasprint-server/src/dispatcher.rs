// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request dispatcher — the filter's entry point.
//
// Out-of-scope requests return before touching the response. In-scope
// requests get exactly one response: capabilities JSON, a PDF, or a JSON
// failure. The document is read completely before the response is cleared,
// so a read failure never follows a committed 200.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use atlasprint_bridge::{CONTENT_TYPE_HEADER, RequestHandler, STATUS_HEADER, ServerInterface};
use atlasprint_core::error::Result;
use atlasprint_core::{
    AppConfig, AtlasPrintError, DocumentType, OperationKind, PluginMetadata, ResponseBody,
    StatusBody,
};
use atlasprint_expr::Expression;
use atlasprint_layout::{LayoutExporter, Project};

use crate::LOG_TARGET;
use crate::artifact::ExportArtifact;
use crate::export::ExportOrchestrator;
use crate::params::{PrintRequest, RequestParameters};

/// What the filter did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Not an atlas request; the host response is untouched.
    PassThrough,
    /// The response was replaced; carries its status code.
    Responded(u16),
}

/// The atlas print filter installed on the host server.
pub struct AtlasPrintFilter {
    orchestrator: ExportOrchestrator,
    config: AppConfig,
    metadata: PluginMetadata,
}

impl AtlasPrintFilter {
    pub fn new(
        project: Arc<Project>,
        exporter: Arc<dyn LayoutExporter>,
        config: AppConfig,
        metadata: PluginMetadata,
    ) -> Self {
        info!(target: LOG_TARGET, "atlasprint filter initialised");
        let orchestrator =
            ExportOrchestrator::new(project, exporter, config.resolved_export_dir());
        Self {
            orchestrator,
            config,
            metadata,
        }
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    /// Host hook: answer the current request of `server`.
    pub fn on_response_complete(&self, server: &mut dyn ServerInterface) -> FilterOutcome {
        self.response_complete(server.request_handler())
    }

    /// Inspect the request and replace the response when it is ours.
    #[instrument(skip_all)]
    pub fn response_complete(&self, handler: &mut dyn RequestHandler) -> FilterOutcome {
        let params = RequestParameters::from_map(&handler.parameter_map());
        let operation = params.operation();

        let response = match operation {
            OperationKind::NotApplicable => {
                debug!(
                    target: LOG_TARGET,
                    service = ?params.service,
                    request = ?params.request,
                    "not an atlas request"
                );
                return FilterOutcome::PassThrough;
            }
            OperationKind::GetCapabilitiesAtlas => ResponseBody::Json {
                status_code: 200,
                body: StatusBody::success(self.metadata.clone()),
            },
            OperationKind::GetPrintAtlas | OperationKind::GetReport => {
                match self.print(&params, operation) {
                    Ok(bytes) => ResponseBody::Document {
                        document_type: DocumentType::Pdf,
                        bytes,
                    },
                    Err(e) => failure(&e),
                }
            }
        };

        let status = response.status_code();
        write_response(handler, &response);
        FilterOutcome::Responded(status)
    }

    /// Validate, generate and read the document.
    fn print(&self, params: &RequestParameters, operation: OperationKind) -> Result<Vec<u8>> {
        let request = params.print_request(operation)?;

        if let Some(message) = Expression::parser_error_string(&request.filter) {
            error!(target: LOG_TARGET, error = %message, "ATLAS - ERROR EXPRESSION");
            return Err(AtlasPrintError::ExpressionParse(message));
        }

        let artifact = self.generate(&request).inspect_err(|e| {
            error!(target: LOG_TARGET, error = %e, "ATLAS - PDF CREATION ERROR");
        })?;
        read_artifact(artifact)
    }

    /// Run the export with panics contained.
    fn generate(&self, request: &PrintRequest) -> Result<ExportArtifact> {
        let run = || {
            self.orchestrator.export_document(
                &request.template,
                &self.config.predefined_scales,
                &request.filter,
                self.config.page_name_expression.as_deref(),
            )
        };
        panic::catch_unwind(AssertUnwindSafe(run))
            .unwrap_or_else(|payload| Err(AtlasPrintError::GenerationPanicked(panic_text(&*payload))))
    }
}

/// Read then delete, whatever the read outcome.
fn read_artifact(artifact: ExportArtifact) -> Result<Vec<u8>> {
    let bytes = artifact.read().inspect_err(|e| {
        error!(target: LOG_TARGET, error = %e, "ATLAS - PDF READING ERROR");
    });
    if let Err(e) = artifact.close() {
        error!(target: LOG_TARGET, error = %e, "failed to remove export artifact");
    }
    bytes
}

fn failure(err: &AtlasPrintError) -> ResponseBody {
    if err.is_validation() {
        info!(target: LOG_TARGET, error = %err, "request rejected");
    }
    ResponseBody::Json {
        status_code: err.status_code(),
        body: StatusBody::fail(err.response_message()),
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Replace the host response with `response`.
fn write_response(handler: &mut dyn RequestHandler, response: &ResponseBody) {
    let body = match response {
        ResponseBody::Json { body, .. } => serde_json::to_vec(body).unwrap_or_else(|e| {
            error!(target: LOG_TARGET, error = %e, "failed to serialise response body");
            Vec::new()
        }),
        ResponseBody::Document { bytes, .. } => bytes.clone(),
    };

    handler.clear();
    handler.set_response_header(CONTENT_TYPE_HEADER, response.content_type());
    handler.set_response_header(STATUS_HEADER, &response.status_code().to_string());
    handler.append_body(&body);
}
