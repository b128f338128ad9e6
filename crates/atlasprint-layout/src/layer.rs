// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vector layers and their data providers.

use serde::{Deserialize, Serialize};

use atlasprint_expr::FeatureRequest;

use crate::feature::{Feature, Field};

/// Storage backing a vector layer: schema, key columns and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataProvider {
    #[serde(default)]
    fields: Vec<Field>,
    /// Indexes into `fields` forming the primary key.
    #[serde(default)]
    pk_attribute_indexes: Vec<usize>,
    #[serde(default)]
    features: Vec<Feature>,
}

impl DataProvider {
    pub fn new(fields: Vec<Field>, pk_attribute_indexes: Vec<usize>) -> Self {
        Self {
            fields,
            pk_attribute_indexes,
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn pk_attribute_indexes(&self) -> &[usize] {
        &self.pk_attribute_indexes
    }

    /// Name of the single primary-key column, if the key is not composite.
    pub fn single_pk_name(&self) -> Option<&str> {
        match self.pk_attribute_indexes.as_slice() {
            [index] => self.fields.get(*index).map(|f| f.name.as_str()),
            _ => None,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

/// A named layer of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
    pub name: String,
    #[serde(default)]
    pub provider: DataProvider,
}

impl VectorLayer {
    pub fn new(name: impl Into<String>, provider: DataProvider) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn data_provider(&self) -> &DataProvider {
        &self.provider
    }

    /// Features selected by `request`, or every feature when `None`.
    pub fn get_features(&self, request: Option<&FeatureRequest>) -> Vec<&Feature> {
        let all = self.provider.features.iter();
        match request {
            Some(request) => all.filter(|f| request.matches(*f)).collect(),
            None => all.collect(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.provider.features.len()
    }
}
