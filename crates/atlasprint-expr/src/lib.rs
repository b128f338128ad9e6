// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// atlasprint-expr — the feature-filter expression language.
//
// Provides a lexer and recursive-descent parser producing an AST, a
// three-valued evaluator over feature attributes, and the `FeatureRequest`
// fast-path object used to select atlas features either by row identifier or
// by expression.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod request;

pub use ast::{BinaryOp, Node, UnaryOp};
pub use eval::{EvalContext, to_bool};
pub use parser::{Expression, ParseError};
pub use request::FeatureRequest;

/// Textual token of the row-identifier pseudo-variable.
pub const FEATURE_ID_TOKEN: &str = "$id";
