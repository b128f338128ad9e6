// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature selection handed to a coverage layer.

use std::fmt;

use crate::eval::EvalContext;
use crate::parser::{Expression, ParseError};

/// How the atlas picks its features from the coverage layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRequest {
    /// Select exactly one row by its identifier.
    FilterFid(i64),
    /// Select every row the expression evaluates true for.
    FilterExpression(Expression),
}

impl FeatureRequest {
    pub fn filter_fid(id: i64) -> Self {
        Self::FilterFid(id)
    }

    /// Build an expression request, parsing `source` up front.
    pub fn filter_expression(source: &str) -> Result<Self, ParseError> {
        Expression::parse(source).map(Self::FilterExpression)
    }

    /// Does the row described by `ctx` satisfy this request?
    pub fn matches(&self, ctx: &dyn EvalContext) -> bool {
        match self {
            Self::FilterFid(id) => ctx.feature_id() == Some(*id),
            Self::FilterExpression(expr) => expr.matches(ctx),
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match self {
            Self::FilterExpression(expr) => Some(expr),
            Self::FilterFid(_) => None,
        }
    }
}

impl fmt::Display for FeatureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilterFid(id) => write!(f, "fid={id}"),
            Self::FilterExpression(expr) => write!(f, "expression={expr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct Row(i64, Value);

    impl EvalContext for Row {
        fn feature_id(&self) -> Option<i64> {
            Some(self.0)
        }

        fn attribute(&self, name: &str) -> Option<&Value> {
            self.1.get(name)
        }
    }

    #[test]
    fn fid_request_matches_identifier_only() {
        let req = FeatureRequest::filter_fid(7);
        assert!(req.matches(&Row(7, json!({}))));
        assert!(!req.matches(&Row(8, json!({}))));
        assert!(req.expression().is_none());
    }

    #[test]
    fn expression_request_evaluates_attributes() {
        let req = FeatureRequest::filter_expression("\"gid\" IN (42)").unwrap();
        assert!(req.matches(&Row(1, json!({"gid": 42}))));
        assert!(!req.matches(&Row(42, json!({"gid": 1}))));
        assert_eq!(req.to_string(), "expression=\"gid\" IN (42)");
    }

    #[test]
    fn invalid_expression_is_rejected() {
        assert!(FeatureRequest::filter_expression("\"gid\" IN (").is_err());
    }
}
