// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loaded project: layers plus the composition registry.
//
// Every composition sits behind its own mutex. A request holds that lock from
// atlas preparation through export so two requests for the same template
// cannot interleave their filter settings.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{info, warn};

use atlasprint_core::AtlasPrintError;
use atlasprint_core::error::Result;

use crate::composition::Composition;
use crate::layer::VectorLayer;

/// Named compositions of a project.
#[derive(Debug, Default)]
pub struct LayoutManager {
    layouts: HashMap<String, Arc<Mutex<Composition>>>,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a composition. Returns `false` if the name is taken.
    pub fn add_layout(&mut self, composition: Composition) -> bool {
        let name = composition.name().to_string();
        if self.layouts.contains_key(&name) {
            return false;
        }
        self.layouts.insert(name, Arc::new(Mutex::new(composition)));
        true
    }

    pub fn layout_by_name(&self, name: &str) -> Option<Arc<Mutex<Composition>>> {
        self.layouts.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.layouts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

#[derive(Deserialize)]
struct ProjectFile {
    #[serde(default)]
    title: String,
    #[serde(default)]
    layers: Vec<VectorLayer>,
    #[serde(default)]
    layouts: Vec<Composition>,
}

/// The active project, shared by every request.
#[derive(Debug, Default)]
pub struct Project {
    title: String,
    layers: Vec<VectorLayer>,
    layout_manager: LayoutManager,
}

impl Project {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Load a project from its JSON description.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            AtlasPrintError::Project(format!("failed to read {}: {e}", path.display()))
        })?;
        let project = Self::from_json(&data)?;
        info!(
            path = %path.display(),
            layers = project.layers.len(),
            layouts = project.layout_manager.len(),
            "project loaded"
        );
        Ok(project)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let file: ProjectFile = serde_json::from_str(data)
            .map_err(|e| AtlasPrintError::Project(format!("invalid project: {e}")))?;

        let mut project = Self::new(file.title);
        for layer in file.layers {
            project.add_layer(layer);
        }
        for composition in file.layouts {
            let name = composition.name().to_string();
            if !project.layout_manager.add_layout(composition) {
                warn!(layout = %name, "duplicate layout name ignored");
            }
        }
        Ok(project)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_layer(&mut self, layer: VectorLayer) {
        self.layers.push(layer);
    }

    pub fn add_layout(&mut self, composition: Composition) -> bool {
        self.layout_manager.add_layout(composition)
    }

    pub fn layer(&self, name: &str) -> Option<&VectorLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layers(&self) -> &[VectorLayer] {
        &self.layers
    }

    pub fn layout_manager(&self) -> &LayoutManager {
        &self.layout_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{PrintLayout, Report};

    const PROJECT: &str = r#"{
        "title": "Cadastre",
        "layers": [{
            "name": "parcels",
            "provider": {
                "fields": [{"name": "gid", "type_name": "integer"}, {"name": "label"}],
                "pk_attribute_indexes": [0],
                "features": [
                    {"id": 1, "attributes": {"gid": 10, "label": "A"}},
                    {"id": 2, "attributes": {"gid": 20, "label": "B"}}
                ]
            }
        }],
        "layouts": [
            {"type": "print_layout", "name": "sheet", "atlas": {"coverage_layer": "parcels"}},
            {"type": "report", "name": "summary"},
            {"type": "report", "name": "sheet"}
        ]
    }"#;

    #[test]
    fn loads_layers_and_layouts() {
        let project = Project::from_json(PROJECT).unwrap();
        assert_eq!(project.title(), "Cadastre");
        assert_eq!(project.layer("parcels").unwrap().feature_count(), 2);
        assert!(project.layer("roads").is_none());
        assert_eq!(project.layout_manager().names(), vec!["sheet", "summary"]);

        let sheet = project.layout_manager().layout_by_name("sheet").unwrap();
        assert!(matches!(*sheet.lock().unwrap(), Composition::PrintLayout(_)));
    }

    #[test]
    fn lookup_returns_shared_handle() {
        let mut project = Project::new("t");
        assert!(project.add_layout(Composition::PrintLayout(PrintLayout::new("a"))));
        assert!(!project.add_layout(Composition::Report(Report::new("a"))));

        let first = project.layout_manager().layout_by_name("a").unwrap();
        let second = project.layout_manager().layout_by_name("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(project.layout_manager().layout_by_name("missing").is_none());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AtlasPrintError::Project(_)));
    }

    #[test]
    fn invalid_json_is_project_error() {
        assert!(matches!(
            Project::from_json("{\"layers\": 3}"),
            Err(AtlasPrintError::Project(_))
        ));
    }
}
