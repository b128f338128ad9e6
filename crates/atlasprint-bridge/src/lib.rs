// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// atlasprint-bridge — Host map-server bridge abstractions.
//
// The host owns request transport. Filters see it only through the
// `RequestHandler` and `ServerInterface` traits; `buffered` provides an
// in-memory host for tests and the command-line runner.

pub mod buffered;
pub mod traits;

pub use buffered::{BufferedRequestHandler, BufferedServer};
pub use traits::{CONTENT_TYPE_HEADER, RequestHandler, STATUS_HEADER, ServerInterface};
