//! The structural inliner: discovers which subworkflows may be spliced
//! into their parents (`inlineable_paths`) and performs that splice
//! (`inline_at`), re-indexing sibling per-step directives and applying
//! deferred parent arguments (`apply_args`). Spec.md §4.6.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use wic_types::{Diagnostics, Namespaces, StepId, Warning, WicError};

use crate::document::{Document, DocumentBody, Meta, StepEntry, StepValue};
use crate::ident::{meta_step_key, reindex_meta_steps, step_name};

/// Returns every namespace path at which inlining is permitted: a
/// subworkflow is inline-eligible when its own `meta.inlineable` is true
/// (the default), it is not the root, and its immediate parent is not a
/// backend document. The walk descends into backends but does not yield
/// paths at the backend level itself.
pub fn inlineable_paths(step_id: &StepId, document: &Document) -> Vec<Namespaces> {
    inlineable_paths_inner(step_id, document, false, Vec::new())
}

fn inlineable_paths_inner(
    step_id: &StepId,
    document: &Document,
    is_backend_body: bool,
    prefix: Namespaces,
) -> Vec<Namespaces> {
    if let DocumentBody::Backends(backends) = &document.body {
        let mut out = Vec::new();
        for (name, body) in backends {
            let backend_id = StepId::new(name.clone(), document.meta.namespace());
            out.extend(inlineable_paths_inner(&backend_id, body, true, prefix.clone()));
        }
        return out;
    }

    let mut namespaces = if document.meta.inlineable() && !prefix.is_empty() && !is_backend_body {
        vec![prefix.clone()]
    } else {
        Vec::new()
    };

    if let DocumentBody::Steps(steps) = &document.body {
        for (i, entry) in steps.iter().enumerate() {
            if let StepValue::Subworkflow { step_id: sub_id, subtree, .. } = &entry.value {
                let mut next_prefix = prefix.clone();
                next_prefix.push(step_name(&step_id.stem, i, &entry.key));
                namespaces.extend(inlineable_paths_inner(sub_id, subtree, false, next_prefix));
            }
        }
    }

    namespaces
}

/// Splices the subworkflow named by `path` into its parent. Operates on a
/// deep copy of `document` (per-call independence from a shared baseline);
/// returns the transformed `(StepId, Document, arity)` triple, where arity
/// is the number of steps the subworkflow contributed (0 when a backend
/// choice was made, since no sibling re-indexing is needed upstream).
pub fn inline_at(
    step_id: &StepId,
    document: &Document,
    path: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<(StepId, Document, usize), WicError> {
    if path.is_empty() {
        return Ok((step_id.clone(), document.clone(), 0));
    }

    let mut document = document.clone();

    if let DocumentBody::Backends(backends) = std::mem::take(&mut document.body) {
        if path.len() == 1 {
            let backend_body = backends.get(&path[0]).cloned().ok_or_else(|| WicError::StemMiss {
                namespace: document.meta.namespace(),
                stem: path[0].clone(),
                hint: None,
            })?;
            let steps = match backend_body.body {
                DocumentBody::Steps(s) => s,
                DocumentBody::Backends(_) => Vec::new(),
            };
            let new_doc = Document {
                body: DocumentBody::Steps(steps),
                inputs: Mapping::new(),
                meta: Meta::default(),
            };
            let new_id = StepId::new(path[0].clone(), step_id.namespace.clone());
            return Ok((new_id, new_doc, 0));
        }

        let doc_namespace = document.meta.namespace();
        let mut new_backends = IndexMap::new();
        for (name, body) in backends {
            let backend_id = StepId::new(name.clone(), doc_namespace.clone());
            let contains_target = match &body.body {
                DocumentBody::Steps(steps) => steps
                    .iter()
                    .enumerate()
                    .any(|(i, e)| step_name(&name, i, &e.key) == path[0]),
                DocumentBody::Backends(_) => false,
            };
            if contains_target {
                let (_, spliced, _arity) = inline_at(&backend_id, &body, path, diagnostics)?;
                new_backends.insert(name, spliced);
            } else {
                new_backends.insert(name, body);
            }
        }
        document.body = DocumentBody::Backends(new_backends);
        return Ok((step_id.clone(), document, 0));
    }

    let mut steps = match std::mem::take(&mut document.body) {
        DocumentBody::Steps(s) => s,
        DocumentBody::Backends(_) => unreachable!("just matched Steps above"),
    };

    let idx = steps
        .iter()
        .enumerate()
        .find_map(|(i, e)| (step_name(&step_id.stem, i, &e.key) == path[0]).then_some(i))
        .ok_or_else(|| WicError::StemMiss {
            namespace: document.meta.namespace(),
            stem: path[0].clone(),
            hint: None,
        })?;
    let step_key = steps[idx].key.clone();

    let (sub_step_id, subtree, parentargs) = match std::mem::replace(&mut steps[idx].value, StepValue::Empty) {
        StepValue::Subworkflow {
            step_id,
            subtree,
            parentargs,
        } => (step_id, *subtree, parentargs),
        other => {
            // Not a subworkflow step; put it back and report the mismatch.
            steps[idx].value = other;
            return Err(WicError::StemMiss {
                namespace: document.meta.namespace(),
                stem: path[0].clone(),
                hint: None,
            });
        }
    };

    if path.len() == 1 {
        let applied = apply_args(subtree, &parentargs, diagnostics, &step_key)?;
        let sub_steps = match applied.body {
            DocumentBody::Steps(s) => s,
            DocumentBody::Backends(_) => Vec::new(),
        };
        let arity = sub_steps.len();

        let mut tail = steps.split_off(idx);
        tail.remove(0); // the spliced-out subworkflow's own (now-empty) stub entry
        let mut new_steps = steps;
        new_steps.extend(sub_steps);
        new_steps.extend(tail);
        document.body = DocumentBody::Steps(new_steps);

        rewrite_meta_after_splice(&mut document.meta, idx, &step_key, arity);

        Ok((step_id.clone(), document, arity))
    } else {
        let (_, new_subtree, arity) = inline_at(&sub_step_id, &subtree, &path[1..], diagnostics)?;
        steps[idx].value = StepValue::Subworkflow {
            step_id: sub_step_id,
            subtree: Box::new(new_subtree),
            parentargs,
        };
        document.body = DocumentBody::Steps(steps);
        Ok((step_id.clone(), document, arity))
    }
}

/// Applies `~name` parameter substitution: for every formal parameter
/// declared in `subtree.inputs` that `parentargs.in` supplies a concrete
/// value for, every occurrence of the literal string `~name` in a step's
/// `in` mapping (or `parentargs.in` mapping, for a nested subworkflow step)
/// is replaced by that value. The `inputs` block is then removed. A
/// supplied parameter absent from `inputs` is a fatal [`WicError::UnknownFormalParam`];
/// a declared parameter never supplied is a non-fatal [`Warning::UnresolvedFormalParam`].
pub fn apply_args(
    mut subtree: Document,
    parentargs: &Mapping,
    diagnostics: &mut Diagnostics,
    subworkflow_name: &str,
) -> Result<Document, WicError> {
    let inputs_workflow = std::mem::take(&mut subtree.inputs);
    let provided_in = parentargs
        .get("in")
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default();

    for key in provided_in.keys() {
        let name = key.as_str().unwrap_or_default();
        if !inputs_workflow.contains_key(Value::String(name.to_string())) {
            return Err(WicError::UnknownFormalParam {
                name: name.to_string(),
                subworkflow: subworkflow_name.to_string(),
            });
        }
    }
    for key in inputs_workflow.keys() {
        let name = key.as_str().unwrap_or_default();
        if !provided_in.contains_key(Value::String(name.to_string())) {
            diagnostics.push(Warning::UnresolvedFormalParam {
                name: name.to_string(),
                subworkflow: subworkflow_name.to_string(),
            });
        }
    }

    if let DocumentBody::Steps(steps) = &mut subtree.body {
        for (argkey, argval) in provided_in.iter() {
            let argkey_str = argkey.as_str().unwrap_or_default();
            let marker = Value::String(format!("~{argkey_str}"));
            for entry in steps.iter_mut() {
                substitute_marker_in_step(entry, &marker, argval);
            }
        }
    }

    Ok(subtree)
}

fn substitute_marker_in_step(entry: &mut StepEntry, marker: &Value, argval: &Value) {
    let in_map = match &mut entry.value {
        StepValue::Args(m) => m.get_mut("in").and_then(Value::as_mapping_mut),
        StepValue::Subworkflow { parentargs, .. } => parentargs.get_mut("in").and_then(Value::as_mapping_mut),
        StepValue::Empty => None,
    };
    if let Some(in_map) = in_map {
        for v in in_map.values_mut() {
            if *v == *marker {
                *v = argval.clone();
            }
        }
    }
}

/// Rewrites per-step `meta.steps` entries after a splice of `arity` steps
/// at 0-based position `index0`: the spliced-in subworkflow's own per-step
/// directives are re-indexed by `+index0` and merged (as the losing side)
/// into the parent's directives for positions after the splice point,
/// which are themselves re-indexed by `arity - 1`. If no meta node covers
/// `index0` the meta is left unchanged; the splice of the document body
/// proceeds regardless (spec.md §4.6).
fn rewrite_meta_after_splice(meta: &mut Meta, index0: usize, step_key: &str, arity: usize) {
    let sub_entry = meta.step_entry(index0, step_key);
    let sub_steps = sub_entry
        .get("wic")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("steps"))
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default();
    let sub_steps_reindexed = reindex_meta_steps(&sub_steps, 1, index0 as isize);

    let mut parent_steps = meta.steps_map();
    parent_steps.remove(Value::String(meta_step_key(index0, step_key)));
    let parent_steps_reindexed = reindex_meta_steps(&parent_steps, index0 + 2, arity as isize - 1);

    let merged = merge_steps_maps(&sub_steps_reindexed, &parent_steps_reindexed);
    meta.set_steps_map(merged);
}

/// `sub` merged into `parent` with `parent`-wins semantics, recursing when
/// both sides hold a mapping at the same key. Falls back to keeping the
/// `parent` value whenever the two sides disagree on shape, since a
/// directive-reindex is never allowed to abort the splice it is part of.
fn merge_steps_maps(sub: &Mapping, parent: &Mapping) -> Mapping {
    crate::merge::merge_mapping_typesafe(sub, parent).unwrap_or_else(|_| parent.clone())
}
