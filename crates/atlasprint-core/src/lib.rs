// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atlasprint — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod metadata;
pub mod types;

pub use config::AppConfig;
pub use error::AtlasPrintError;
pub use metadata::PluginMetadata;
pub use types::*;
