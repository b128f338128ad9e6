// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter translation.
//
// `$id` cannot be compiled into a provider query, so an atlas filtered on it
// scans the whole layer. When the filter uses `$id`, the first run of digits
// anywhere in the text is taken as the feature id. With a single-column
// primary key the filter becomes `"<pk>" IN (<id>)`. Otherwise the filter is
// kept as is, and only a bare `$id = n` or `$id IN (n)` is fetched by id.
//
// Only the first digit run is used, so filters naming several ids select one
// once rewritten.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use atlasprint_expr::{BinaryOp, Expression, FEATURE_ID_TOKEN, FeatureRequest, Node};
use atlasprint_layout::DataProvider;

use crate::LOG_TARGET;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit-run pattern is valid"));

/// Filter to install on the atlas plus the equivalent fast-path request.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveFilter {
    pub expression: Expression,
    pub request: FeatureRequest,
    /// True when the filter was rewritten onto the primary key.
    pub rewritten: bool,
}

/// Candidate feature id of a `$id` filter.
pub fn extract_feature_id(filter: &str) -> Option<i64> {
    if !filter.contains(FEATURE_ID_TOKEN) {
        return None;
    }
    first_digit_run(filter)
}

fn first_digit_run(text: &str) -> Option<i64> {
    DIGIT_RUN.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Translate a parsed filter against the coverage layer's provider.
pub fn translate(filter: &Expression, provider: &DataProvider) -> EffectiveFilter {
    let unchanged = || EffectiveFilter {
        expression: filter.clone(),
        request: FeatureRequest::FilterExpression(filter.clone()),
        rewritten: false,
    };
    if !filter.uses_feature_id() {
        return unchanged();
    }
    let Some(fid) = first_digit_run(filter.expression()) else {
        return unchanged();
    };

    match provider.single_pk_name() {
        Some(pk) => {
            let rewritten = Expression::from_node(Node::InList {
                operand: Box::new(Node::Column(pk.to_string())),
                list: vec![Node::Literal(Value::from(fid))],
                negated: false,
            });
            info!(
                target: LOG_TARGET,
                feature_filter = rewritten.expression(),
                "feature_filter changed"
            );
            EffectiveFilter {
                request: FeatureRequest::FilterExpression(rewritten.clone()),
                expression: rewritten,
                rewritten: true,
            }
        }
        None => {
            let request = match single_feature_id(filter) {
                Some(id) => FeatureRequest::filter_fid(id),
                None => FeatureRequest::FilterExpression(filter.clone()),
            };
            debug!(
                target: LOG_TARGET,
                pk_count = provider.pk_attribute_indexes().len(),
                request = %request,
                "no single primary key, keeping the $id filter"
            );
            EffectiveFilter {
                expression: filter.clone(),
                request,
                rewritten: false,
            }
        }
    }
}

/// The id of a filter that is exactly `$id = n` or `$id IN (n)`.
fn single_feature_id(filter: &Expression) -> Option<i64> {
    let literal = match filter.root()? {
        Node::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        } if is_feature_id(left) => &**right,
        Node::InList {
            operand,
            list,
            negated: false,
        } if is_feature_id(operand) => match list.as_slice() {
            [only] => only,
            _ => return None,
        },
        _ => return None,
    };
    match literal {
        Node::Literal(value) => value.as_i64(),
        _ => None,
    }
}

fn is_feature_id(node: &Node) -> bool {
    matches!(node, Node::FeatureVariable(name) if name.eq_ignore_ascii_case(&FEATURE_ID_TOKEN[1..]))
}
