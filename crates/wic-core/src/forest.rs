//! The forest projector: a read-only recursive view over a resolved,
//! merged document that exposes each subworkflow reference as its own
//! subtree. Pure; does not copy the underlying document. Spec.md §4.5.

use wic_types::StepId;

use crate::document::{Document, DocumentBody, StepValue};

/// A node in the projected forest: the step identifying this document, a
/// borrow of the document itself, and one child per subworkflow reference
/// (in original step order) or, for a backend-bearing document, one child
/// per backend.
#[derive(Debug)]
pub struct Forest<'a> {
    pub step_id: StepId,
    pub document: &'a Document,
    pub children: Vec<(StepId, Forest<'a>)>,
}

/// Projects `document` (identified by `step_id`) into a [`Forest`]. Valid
/// only as long as `document` is not mutated further.
pub fn project_forest<'a>(step_id: StepId, document: &'a Document) -> Forest<'a> {
    let children = match &document.body {
        DocumentBody::Backends(backends) => backends
            .iter()
            .map(|(name, body)| {
                let id = StepId::new(name.clone(), document.meta.namespace());
                (id.clone(), project_forest(id, body))
            })
            .collect(),
        DocumentBody::Steps(steps) => steps
            .iter()
            .filter_map(|entry| match &entry.value {
                StepValue::Subworkflow { step_id, subtree, .. } => {
                    Some((step_id.clone(), project_forest(step_id.clone(), subtree)))
                }
                _ => None,
            })
            .collect(),
    };

    Forest {
        step_id,
        document,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_yaml::{Mapping, Value};

    #[test]
    fn forest_has_no_children_for_tool_only_document() {
        let value: Value = serde_yaml::from_str("steps:\n  - echo.yml:\n      message: hi\n").unwrap();
        let doc = Document::from_value(&value).unwrap();
        let forest = project_forest(StepId::new("root", "global"), &doc);
        assert!(forest.children.is_empty());
    }

    #[test]
    fn forest_yields_one_child_per_subworkflow_in_order() {
        let sub_value: Value = serde_yaml::from_str("steps:\n  - c.yml: null\n").unwrap();
        let sub = Document::from_value(&sub_value).unwrap();

        let root_value: Value = serde_yaml::from_str("steps:\n  - a.yml: null\n  - s.yml: null\n").unwrap();
        let mut root = Document::from_value(&root_value).unwrap();
        if let DocumentBody::Steps(steps) = &mut root.body {
            steps[1].value = StepValue::Subworkflow {
                step_id: StepId::new("s", "global"),
                subtree: Box::new(sub),
                parentargs: Mapping::new(),
            };
        }

        let forest = project_forest(StepId::new("root", "global"), &root);
        assert_eq!(forest.children.len(), 1);
        assert_eq!(forest.children[0].0, StepId::new("s", "global"));
    }
}
