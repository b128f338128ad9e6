// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-side request and server traits.

use std::collections::HashMap;

/// Response header carrying the HTTP-style status code.
pub const STATUS_HEADER: &str = "Status";

/// Response header carrying the MIME type.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Access to the request being answered and to its response buffer.
pub trait RequestHandler {
    /// Query parameters with upper-cased keys.
    fn parameter_map(&self) -> HashMap<String, String>;

    /// Set (or replace) a response header.
    fn set_response_header(&mut self, name: &str, value: &str);

    /// Append bytes to the response body.
    fn append_body(&mut self, bytes: &[u8]);

    /// Drop headers and body produced so far.
    fn clear(&mut self);
}

/// The host server as seen by a filter.
pub trait ServerInterface {
    fn request_handler(&mut self) -> &mut dyn RequestHandler;
}
