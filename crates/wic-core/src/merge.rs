//! The type-safe deep merge at the heart of the Override Merger: two
//! mappings are merged key by key, recursing into nested mappings and
//! otherwise letting the parent win, but only between values of the same
//! shape. Mirrors `mergedeep.Strategy.TYPESAFE_REPLACE`. This one function
//! is reused at all three merge call sites in [`crate::inline`].

use serde_yaml::{Mapping, Value};
use wic_types::WicError;

use crate::document::{Document, DocumentBody, Meta, StepValue};
use crate::ident::meta_step_key;

/// Merges `parent` into `child`, recursing into shared mapping keys and
/// otherwise letting `parent`'s value replace `child`'s when both sides
/// agree on shape. Keys present in only one side pass through unchanged.
/// Fails if a shared leaf key holds values of different shapes (e.g. a
/// string on one side, a sequence on the other).
pub fn merge_mapping_typesafe(child: &Mapping, parent: &Mapping) -> Result<Mapping, WicError> {
    let mut out = child.clone();
    for (key, parent_value) in parent.iter() {
        match child.get(key) {
            Some(child_value) => {
                let merged = merge_value_typesafe(child_value, parent_value, key)?;
                out.insert(key.clone(), merged);
            }
            None => {
                out.insert(key.clone(), parent_value.clone());
            }
        }
    }
    Ok(out)
}

fn merge_value_typesafe(child: &Value, parent: &Value, key: &Value) -> Result<Value, WicError> {
    match (child, parent) {
        (Value::Mapping(c), Value::Mapping(p)) => Ok(Value::Mapping(merge_mapping_typesafe(c, p)?)),
        (c, p) => {
            if std::mem::discriminant(c) == std::mem::discriminant(p) {
                Ok(p.clone())
            } else {
                Err(WicError::MergeTypeMismatch {
                    key: key.as_str().unwrap_or("<key>").to_string(),
                })
            }
        }
    }
}

/// Propagates `parent` (the enclosing `meta.steps["(i, k)"]` entry, a
/// mapping that may itself carry a `wic` sub-key, or the empty mapping at
/// the root) into `document`, in place. Implements all three call sites of
/// spec.md §4.4:
///
/// 1. `document.meta` is merged with `parent`'s own `wic` sub-key, parent-wins.
/// 2. Each subworkflow step's `meta.steps["(i+1, k)"]` entry — read from the
///    *merged* meta — becomes the `parent` argument for the recursive call
///    into that step's `subtree`.
/// 3. Each tool step's per-step directive block (with its own `wic` sub-key
///    stripped, since compiler directives never flow into tool arguments) is
///    merged into the step's argument mapping, parent-wins.
///
/// Matches the source's own merge order: a `backends`-bearing document
/// recurses into each backend with the *original* `parent`, not the merged
/// meta computed in step 1 — preserved here as an open question (DESIGN.md).
pub fn merge_overrides(document: &mut Document, parent: &Mapping) -> Result<(), WicError> {
    let self_wrapped = wrap_wic(document.meta.to_value());
    let merged_wrapped = merge_mapping_typesafe(&self_wrapped, parent)?;
    let merged_meta = merged_wrapped
        .get("wic")
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default();
    document.meta = Meta::from_raw(merged_meta);

    if let DocumentBody::Backends(backends) = &mut document.body {
        for body in backends.values_mut() {
            merge_overrides(body, parent)?;
        }
        return Ok(());
    }

    let wic_steps = document.meta.steps_map();
    if let DocumentBody::Steps(steps) = &mut document.body {
        for (i, entry) in steps.iter_mut().enumerate() {
            let mkey = meta_step_key(i, &entry.key);
            let step_parent = wic_steps
                .get(Value::String(mkey.clone()))
                .and_then(Value::as_mapping)
                .cloned()
                .unwrap_or_default();

            match &mut entry.value {
                StepValue::Subworkflow { subtree, .. } => {
                    merge_overrides(subtree, &step_parent)?;
                }
                StepValue::Args(args) => {
                    let mut directive_args = step_parent.clone();
                    directive_args.remove("wic");
                    let merged = merge_mapping_typesafe(args, &directive_args)?;
                    if merged.contains_key("wic") {
                        return Err(WicError::MetaOnTool {
                            step: entry.key.clone(),
                        });
                    }
                    *args = merged;
                }
                StepValue::Empty => {
                    let mut directive_args = step_parent.clone();
                    directive_args.remove("wic");
                    if !directive_args.is_empty() {
                        entry.value = StepValue::Args(directive_args);
                    }
                }
            }
        }
    }

    Ok(())
}

fn wrap_wic(meta_value: Value) -> Mapping {
    let mut m = Mapping::new();
    m.insert(Value::String("wic".into()), meta_value);
    m
}
