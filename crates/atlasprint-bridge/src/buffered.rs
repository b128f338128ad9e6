// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory host used by tests and the command-line runner.
//
// The handler starts out holding the host's default response so a filter
// that passes a request through leaves it observable and untouched.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::traits::{CONTENT_TYPE_HEADER, RequestHandler, STATUS_HEADER, ServerInterface};

/// Request handler that buffers the whole response.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedRequestHandler {
    parameters: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl BufferedRequestHandler {
    /// Build from raw parameters. Keys are upper-cased as the host does.
    pub fn new<K, V>(parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_uppercase(), v.into()))
            .collect();
        Self {
            parameters,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Pre-fill the response the host would send if no filter intervened.
    pub fn with_default_response(mut self, content_type: &str, body: &[u8]) -> Self {
        self.headers = vec![
            (CONTENT_TYPE_HEADER.to_string(), content_type.to_string()),
            (STATUS_HEADER.to_string(), "200".to_string()),
        ];
        self.body = body.to_vec();
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsed `Status` header.
    pub fn status(&self) -> Option<u16> {
        self.header(STATUS_HEADER)?.parse().ok()
    }

    /// Body parsed as JSON, when it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

impl RequestHandler for BufferedRequestHandler {
    fn parameter_map(&self) -> HashMap<String, String> {
        self.parameters.clone()
    }

    fn set_response_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn append_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    fn clear(&mut self) {
        debug!(
            headers = self.headers.len(),
            body_len = self.body.len(),
            "response cleared"
        );
        self.headers.clear();
        self.body.clear();
    }
}

/// Server owning a single buffered request.
#[derive(Debug, Clone)]
pub struct BufferedServer {
    handler: BufferedRequestHandler,
}

impl BufferedServer {
    pub fn new(handler: BufferedRequestHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &BufferedRequestHandler {
        &self.handler
    }

    pub fn into_handler(self) -> BufferedRequestHandler {
        self.handler
    }
}

impl ServerInterface for BufferedServer {
    fn request_handler(&mut self) -> &mut dyn RequestHandler {
        &mut self.handler
    }
}
