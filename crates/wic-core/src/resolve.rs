//! The resolver: loads the root document and recursively expands every
//! subworkflow reference into a `{subtree, parentargs}` pair, leaving tool
//! steps untouched. Spec.md §4.3.

use serde_yaml::{Mapping, Value};
use wic_types::{StepId, WicError};

use crate::catalog::Catalog;
use crate::document::{Document, DocumentBody, StepValue};
use crate::ident::stem_of_step_key;
use crate::validator::Validator;

/// Recursively resolves `document`, validating each node (unless `validator`
/// is `None`, meaning validation is suppressed) before expanding its
/// children. Steps are processed in document order; a document with
/// `backends` has each backend body resolved independently under a `StepId`
/// that pairs the backend's own name with the document's namespace.
pub fn resolve_document(
    step_id: StepId,
    mut document: Document,
    catalog: &dyn Catalog,
    validator: Option<&dyn Validator>,
) -> Result<(StepId, Document), WicError> {
    if let Some(validator) = validator {
        validator
            .validate(&document)
            .map_err(|_reason| WicError::ValidationFailed {
                stem: step_id.stem.clone(),
            })?;
    }

    if let DocumentBody::Backends(backends) = document.body {
        let namespace = document.meta.namespace();
        let mut resolved = indexmap::IndexMap::new();
        for (name, body) in backends {
            let backend_id = StepId::new(name.clone(), namespace.clone());
            let (_, resolved_body) = resolve_document(backend_id, body, catalog, validator)?;
            resolved.insert(name, resolved_body);
        }
        document.body = DocumentBody::Backends(resolved);
        return Ok((step_id, document));
    }

    let doc_namespace = document.meta.namespace();
    let Document { body, meta, .. } = &mut document;
    if let DocumentBody::Steps(steps) = body {
        for (i, entry) in steps.iter_mut().enumerate() {
            let stem = stem_of_step_key(&entry.key);
            if catalog.lookup_tool(&stem).is_some() {
                continue;
            }

            let step_meta = meta.step_entry(i, &entry.key);
            let namespace = step_namespace(&step_meta, &doc_namespace);

            if !catalog.has_namespace(&namespace) {
                return Err(WicError::NamespaceMiss {
                    namespace,
                    stem: entry.key.clone(),
                });
            }

            let path = catalog.lookup_document_path(&namespace, &stem).ok_or_else(|| {
                let hint = (stem == "in")
                    .then(|| "check the indentation of the `in` tag in the parent document".to_string());
                WicError::StemMiss {
                    namespace: namespace.clone(),
                    stem: stem.clone(),
                    hint,
                }
            })?;

            let sub_raw = catalog.load_document(&path)?;
            let sub_step_id = StepId::new(stem.clone(), namespace.clone());
            let (_, resolved_sub) = resolve_document(sub_step_id.clone(), sub_raw, catalog, validator)?;

            let parentargs = match &entry.value {
                StepValue::Empty => Mapping::new(),
                StepValue::Args(m) => m.clone(),
                StepValue::Subworkflow { .. } => unreachable!("pre-resolution step is never a Subworkflow"),
            };

            entry.value = StepValue::Subworkflow {
                step_id: sub_step_id,
                subtree: Box::new(resolved_sub),
                parentargs,
            };
        }
    }

    Ok((step_id, document))
}

/// The namespace a step's subworkflow reference should be looked up under:
/// the step's own `meta.wic.namespace` directive, falling back to the
/// enclosing document's namespace.
fn step_namespace(step_meta: &Mapping, doc_namespace: &str) -> String {
    step_meta
        .get("wic")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| doc_namespace.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolDescriptor;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    struct FakeCatalog {
        tools: HashMap<String, ToolDescriptor>,
        documents: HashMap<(String, String), (PathBuf, Document)>,
        namespaces: std::collections::HashSet<String>,
    }

    impl Catalog for FakeCatalog {
        fn has_namespace(&self, namespace: &str) -> bool {
            self.namespaces.contains(namespace)
        }

        fn lookup_tool(&self, stem: &str) -> Option<ToolDescriptor> {
            self.tools.get(stem).cloned()
        }

        fn lookup_document_path(&self, namespace: &str, stem: &str) -> Option<PathBuf> {
            self.documents
                .get(&(namespace.to_string(), stem.to_string()))
                .map(|(path, _)| path.clone())
        }

        fn load_document(&self, path: &Path) -> Result<Document, WicError> {
            self.documents
                .values()
                .find(|(p, _)| p == path)
                .map(|(_, doc)| doc.clone())
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
    fn trivial_resolve_leaves_tool_only_document_unchanged() {
        let root = parse("steps:\n  - echo:\n      message: hi\n");
        let mut tools = HashMap::new();
        tools.insert(
            "echo".to_string(),
            ToolDescriptor {
                stem: "echo".to_string(),
            },
        );
        let catalog = FakeCatalog {
            tools,
            documents: HashMap::new(),
            namespaces: ["global".to_string()].into_iter().collect(),
        };

        let (_, resolved) = resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
        match resolved.body {
            DocumentBody::Steps(steps) => {
                assert_eq!(steps.len(), 1);
                assert!(matches!(steps[0].value, StepValue::Args(_)));
            }
            DocumentBody::Backends(_) => panic!("expected steps body"),
        }
    }

    #[test]
    fn subworkflow_reference_is_expanded() {
        let root = parse("steps:\n  - a.yml:\n      message: hi\n  - sub.yml: null\n  - b.yml: null\n");
        let sub = parse("steps:\n  - c.yml: null\n  - d.yml: null\n");

        let mut tools = HashMap::new();
        for t in ["a", "b", "c", "d"] {
            tools.insert(
                t.to_string(),
                ToolDescriptor {
                    stem: t.to_string(),
                },
            );
        }
        let mut documents = HashMap::new();
        documents.insert(
            ("global".to_string(), "sub".to_string()),
            (PathBuf::from("sub.yml"), sub),
        );
        let catalog = FakeCatalog {
            tools,
            documents,
            namespaces: ["global".to_string()].into_iter().collect(),
        };

        let (_, resolved) = resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
        let steps = match resolved.body {
            DocumentBody::Steps(s) => s,
            DocumentBody::Backends(_) => panic!("expected steps body"),
        };
        assert!(matches!(steps[0].value, StepValue::Args(_)));
        match &steps[1].value {
            StepValue::Subworkflow { subtree, .. } => {
                let sub_steps = match &subtree.body {
                    DocumentBody::Steps(s) => s,
                    DocumentBody::Backends(_) => panic!("expected steps body"),
                };
                assert_eq!(sub_steps.len(), 2);
            }
            other => panic!("expected subworkflow, got {other:?}"),
        }
        assert!(matches!(steps[2].value, StepValue::Args(_)));
    }

    #[test]
    fn missing_namespace_is_fatal() {
        let root = parse("steps:\n  - sub.yml: null\n");
        let catalog = FakeCatalog {
            tools: HashMap::new(),
            documents: HashMap::new(),
            namespaces: std::collections::HashSet::new(),
        };
        let err = resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap_err();
        assert!(matches!(err, WicError::NamespaceMiss { .. }));
    }

    #[test]
    fn missing_stem_named_in_gets_indentation_hint() {
        let root = parse("steps:\n  - in.yml: null\n");
        let catalog = FakeCatalog {
            tools: HashMap::new(),
            documents: HashMap::new(),
            namespaces: ["global".to_string()].into_iter().collect(),
        };
        let err = resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap_err();
        match err {
            WicError::StemMiss { hint: Some(h), .. } => assert!(h.contains("indentation")),
            other => panic!("expected StemMiss with hint, got {other:?}"),
        }
    }

    #[test]
    fn backends_are_each_resolved_independently() {
        let root = parse(
            "wic:\n  backends:\n    slurm:\n      steps:\n        - a.yml: null\n    local:\n      steps:\n        - b.yml: null\n",
        );
        let mut tools = HashMap::new();
        for t in ["a", "b"] {
            tools.insert(
                t.to_string(),
                ToolDescriptor {
                    stem: t.to_string(),
                },
            );
        }
        let catalog = FakeCatalog {
            tools,
            documents: HashMap::new(),
            namespaces: ["global".to_string()].into_iter().collect(),
        };
        let (_, resolved) = resolve_document(StepId::new("root", "global"), root, &catalog, None).unwrap();
        match resolved.body {
            DocumentBody::Backends(backends) => assert_eq!(backends.len(), 2),
            DocumentBody::Steps(_) => panic!("expected backends body"),
        }
    }
}
