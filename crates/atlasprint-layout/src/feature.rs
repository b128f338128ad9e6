// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Features and their attribute schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use atlasprint_expr::EvalContext;

/// Bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        (self.xmax - self.xmin).abs()
    }

    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin).abs()
    }

    /// True for a degenerate (point) extent.
    pub fn is_point(&self) -> bool {
        self.width() == 0.0 && self.height() == 0.0
    }
}

/// A column declared by a data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default = "default_type_name")]
    pub type_name: String,
}

fn default_type_name() -> String {
    "string".into()
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: default_type_name(),
        }
    }

    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One row of a vector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Internal row identifier, the value of `$id`.
    pub id: i64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub extent: Option<Extent>,
}

impl Feature {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            attributes: Map::new(),
            extent: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }
}

impl EvalContext for Feature {
    fn feature_id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// A feature evaluated while iterating an atlas.
///
/// Exposes `@layer_name`, `@atlas_featureid`, `@atlas_featurenumber` and
/// `@atlas_totalfeatures` to page-name expressions.
pub struct FeatureScope<'a> {
    pub feature: &'a Feature,
    pub layer_name: &'a str,
    /// 1-based position in the iteration.
    pub number: usize,
    pub total: usize,
}

impl EvalContext for FeatureScope<'_> {
    fn feature_id(&self) -> Option<i64> {
        Some(self.feature.id)
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.feature.attributes.get(name)
    }

    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "layer_name" => Some(Value::from(self.layer_name)),
            "atlas_featureid" => Some(Value::from(self.feature.id)),
            "atlas_featurenumber" => Some(Value::from(self.number as u64)),
            "atlas_totalfeatures" => Some(Value::from(self.total as u64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlasprint_expr::Expression;
    use serde_json::json;

    #[test]
    fn feature_deserialises_with_defaults() {
        let feature: Feature = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(feature, Feature::new(3));
    }

    #[test]
    fn scope_exposes_atlas_variables() {
        let feature = Feature::new(9).with_attribute("name", "Lyon");
        let scope = FeatureScope {
            feature: &feature,
            layer_name: "communes",
            number: 2,
            total: 5,
        };
        let expr = Expression::parse("\"name\" || ' ' || @atlas_featurenumber || '/' || @atlas_totalfeatures")
            .unwrap();
        assert_eq!(expr.evaluate(&scope), json!("Lyon 2/5"));
        assert_eq!(scope.variable("layer_name"), Some(json!("communes")));
        assert_eq!(scope.variable("nope"), None);
    }

    #[test]
    fn extent_dimensions() {
        let extent = Extent::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(extent.width(), 100.0);
        assert_eq!(extent.height(), 50.0);
        assert!(!extent.is_point());
        assert!(Extent::new(1.0, 1.0, 1.0, 1.0).is_point());
    }
}
