//! End-to-end scenarios chaining resolution, override merging, forest
//! projection, and structural inlining against small in-memory catalogs.
//! Mirrors the teacher's `tests/integration/e2e.rs` in spirit: exercising
//! more than one component together rather than a single function in
//! isolation.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use wic_core::{
    forest::project_forest, inline_at, merge_overrides, resolve_document, Catalog, Document,
    DocumentBody, StepValue, ToolDescriptor,
};
use wic_types::{Diagnostics, StepId, WicError};

struct FixtureCatalog {
    tools: HashSet<String>,
    documents: HashMap<(String, String), (PathBuf, Document)>,
}

impl Catalog for FixtureCatalog {
    fn has_namespace(&self, namespace: &str) -> bool {
        namespace == "global"
    }

    fn lookup_tool(&self, stem: &str) -> Option<ToolDescriptor> {
        self.tools.contains(stem).then(|| ToolDescriptor {
            stem: stem.to_string(),
        })
    }

    fn lookup_document_path(&self, namespace: &str, stem: &str) -> Option<PathBuf> {
        self.documents
            .get(&(namespace.to_string(), stem.to_string()))
            .map(|(p, _)| p.clone())
    }

    fn load_document(&self, path: &Path) -> Result<Document, WicError> {
        self.documents
            .values()
            .find(|(p, _)| p == path)
            .map(|(_, d)| d.clone())
            .ok_or_else(|| WicError::DocumentNotFound {
                path: path.display().to_string(),
            })
    }
}

fn parse(src: &str) -> Document {
    let value: Value = serde_yaml::from_str(src).unwrap();
    Document::from_value(&value).unwrap()
}

#[test]
fn trivial_document_round_trips_through_resolve_and_merge_unchanged() {
    let root = parse("steps:\n  - echo:\n      message: hi\n");
    let catalog = FixtureCatalog {
        tools: ["echo".to_string()].into_iter().collect(),
        documents: HashMap::new(),
    };

    let (_, mut resolved) =
        resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
    merge_overrides(&mut resolved, &serde_yaml::Mapping::new()).unwrap();

    let steps = match &resolved.body {
        DocumentBody::Steps(s) => s,
        DocumentBody::Backends(_) => panic!("expected steps"),
    };
    assert_eq!(steps.len(), 1);
    assert!(matches!(steps[0].value, StepValue::Args(_)));
}

#[test]
fn subworkflow_overrides_propagate_through_merge_and_project_into_forest() {
    let sub = parse("steps:\n  - inner:\n      value: default\n");
    let root_value: Value = serde_yaml::from_str(
        "wic:\n  steps:\n    '(1, sub.yml)':\n      inner:\n        value: overridden\nsteps:\n  - sub.yml: null\n",
    )
    .unwrap();
    let root = Document::from_value(&root_value).unwrap();

    let mut documents = HashMap::new();
    documents.insert(
        ("global".to_string(), "sub".to_string()),
        (PathBuf::from("sub.yml"), sub),
    );
    let catalog = FixtureCatalog {
        tools: ["inner".to_string()].into_iter().collect(),
        documents,
    };

    let (root_id, mut resolved) =
        resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
    merge_overrides(&mut resolved, &serde_yaml::Mapping::new()).unwrap();

    let steps = match &resolved.body {
        DocumentBody::Steps(s) => s,
        DocumentBody::Backends(_) => panic!("expected steps"),
    };
    let StepValue::Subworkflow { subtree, .. } = &steps[0].value else {
        panic!("expected subworkflow");
    };
    let sub_steps = match &subtree.body {
        DocumentBody::Steps(s) => s,
        DocumentBody::Backends(_) => panic!("expected steps"),
    };
    let args = match &sub_steps[0].value {
        StepValue::Args(m) => m,
        other => panic!("expected args, got {other:?}"),
    };
    assert_eq!(args.get("value").unwrap().as_str(), Some("overridden"));

    let forest = project_forest(root_id, &resolved);
    assert_eq!(forest.children.len(), 1);
}

#[test]
fn resolved_subworkflow_can_be_structurally_inlined() {
    let sub = parse("steps:\n  - a.yml: null\n  - b.yml: null\n");
    let root = parse("steps:\n  - pre.yml: null\n  - sub.yml: null\n  - post.yml: null\n");

    let mut documents = HashMap::new();
    documents.insert(
        ("global".to_string(), "sub".to_string()),
        (PathBuf::from("sub.yml"), sub),
    );
    let catalog = FixtureCatalog {
        tools: ["pre", "post", "a", "b"].into_iter().map(String::from).collect(),
        documents,
    };

    let (root_id, mut resolved) =
        resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
    merge_overrides(&mut resolved, &serde_yaml::Mapping::new()).unwrap();

    let paths = wic_core::inlineable_paths(&root_id, &resolved);
    assert_eq!(paths.len(), 1);

    let mut diagnostics = Diagnostics::new();
    let (_, inlined, arity) = inline_at(&root_id, &resolved, &paths[0], &mut diagnostics).unwrap();

    assert_eq!(arity, 2);
    let steps = match &inlined.body {
        DocumentBody::Steps(s) => s,
        DocumentBody::Backends(_) => panic!("expected steps"),
    };
    let keys: Vec<&str> = steps.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["pre.yml", "a.yml", "b.yml", "post.yml"]);
}
