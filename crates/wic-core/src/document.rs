//! The concrete data model: [`Document`], its two body shapes, and [`Meta`],
//! the typed wrapper around the raw `wic:` directive block that every
//! component in this crate reads and rewrites.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use wic_types::{StepId, WicError, GLOBAL_NAMESPACE};

use crate::ident::meta_step_key;

/// A workflow description: either a flat sequence of steps or a named set
/// of alternative backend bodies, plus its declared formal inputs and its
/// `wic:` directive block.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub body: DocumentBody,
    pub inputs: Mapping,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub enum DocumentBody {
    Steps(Vec<StepEntry>),
    Backends(IndexMap<String, Document>),
}

impl Default for DocumentBody {
    fn default() -> Self {
        DocumentBody::Steps(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct StepEntry {
    pub key: String,
    pub value: StepValue,
}

/// A step's own value. Before resolution only `Empty`/`Args` occur, since
/// whether a step-key names a tool or a subworkflow is undecidable without
/// a catalog lookup.
#[derive(Debug, Clone)]
pub enum StepValue {
    Empty,
    Args(Mapping),
    Subworkflow {
        step_id: StepId,
        subtree: Box<Document>,
        parentargs: Mapping,
    },
}

impl Document {
    /// Parses a document from its raw tree representation. Recognizes the
    /// three top-level keys `steps`, `inputs`, and `wic`; a `wic.backends`
    /// entry switches the body to [`DocumentBody::Backends`].
    pub fn from_value(value: &Value) -> Result<Self, WicError> {
        let map = value.as_mapping().ok_or_else(|| WicError::MergeTypeMismatch {
            key: "<document root>".to_string(),
        })?;

        let meta = Meta::from_value(map.get("wic"));
        let inputs = map
            .get("inputs")
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_default();

        if meta.has_backends() {
            let mut backends = IndexMap::new();
            for (name, body) in meta.backends_raw() {
                backends.insert(name, Document::from_value(&body)?);
            }
            return Ok(Document {
                body: DocumentBody::Backends(backends),
                inputs,
                meta,
            });
        }

        let mut steps = Vec::new();
        for entry in map.get("steps").and_then(Value::as_sequence).into_iter().flatten() {
            let entry_map = entry.as_mapping().ok_or_else(|| WicError::MergeTypeMismatch {
                key: "<step entry>".to_string(),
            })?;
            let (key_value, value) = entry_map
                .iter()
                .next()
                .ok_or_else(|| WicError::MergeTypeMismatch {
                    key: "<empty step entry>".to_string(),
                })?;
            let key = key_value
                .as_str()
                .ok_or_else(|| WicError::MergeTypeMismatch {
                    key: "<step key>".to_string(),
                })?
                .to_string();
            let step_value = match value {
                Value::Null => StepValue::Empty,
                Value::Mapping(m) => StepValue::Args(m.clone()),
                _ => {
                    return Err(WicError::MergeTypeMismatch {
                        key: key.clone(),
                    })
                }
            };
            steps.push(StepEntry { key, value: step_value });
        }

        Ok(Document {
            body: DocumentBody::Steps(steps),
            inputs,
            meta,
        })
    }

    /// Serializes back to the raw tree shape. For a `Subworkflow` step this
    /// emits exactly the two keys `subtree` and `parentargs` (never the
    /// internally-carried `step_id`).
    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        match &self.body {
            DocumentBody::Backends(backends) => {
                // Backends live inside the `wic` block by convention. Rebuild
                // that sub-key from the typed map rather than trusting
                // `meta.raw`, which may still hold the pre-resolution bodies.
                let mut wic_raw = self.meta.raw.clone();
                let mut backends_value = Mapping::new();
                for (name, doc) in backends {
                    backends_value.insert(Value::String(name.clone()), doc.to_value());
                }
                wic_raw.insert(Value::String("backends".into()), Value::Mapping(backends_value));
                map.insert(Value::String("wic".into()), Value::Mapping(wic_raw));
            }
            DocumentBody::Steps(_) => {
                if !self.meta.is_empty() {
                    map.insert(Value::String("wic".into()), self.meta.to_value());
                }
            }
        }
        if !self.inputs.is_empty() {
            map.insert(Value::String("inputs".into()), Value::Mapping(self.inputs.clone()));
        }
        match &self.body {
            DocumentBody::Backends(_) => {}
            DocumentBody::Steps(steps) => {
                let seq: Vec<Value> = steps
                    .iter()
                    .map(|entry| {
                        let mut m = Mapping::new();
                        let value = match &entry.value {
                            StepValue::Empty => Value::Null,
                            StepValue::Args(args) => Value::Mapping(args.clone()),
                            StepValue::Subworkflow { subtree, parentargs, .. } => {
                                let mut sv = Mapping::new();
                                sv.insert(Value::String("subtree".into()), subtree.to_value());
                                sv.insert(
                                    Value::String("parentargs".into()),
                                    Value::Mapping(parentargs.clone()),
                                );
                                Value::Mapping(sv)
                            }
                        };
                        m.insert(Value::String(entry.key.clone()), value);
                        Value::Mapping(m)
                    })
                    .collect();
                map.insert(Value::String("steps".into()), Value::Sequence(seq));
            }
        }
        Value::Mapping(map)
    }
}

/// The typed wrapper around a document's `wic:` directive block. Wraps a
/// raw [`Mapping`] rather than a fully-typed struct so that the generic
/// deep-merge machinery in [`crate::merge`] can operate on it without a
/// bespoke merge implementation per field.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub raw: Mapping,
}

impl Meta {
    pub fn from_value(value: Option<&Value>) -> Self {
        let raw = value.and_then(Value::as_mapping).cloned().unwrap_or_default();
        Meta { raw }
    }

    pub fn from_raw(raw: Mapping) -> Self {
        Meta { raw }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Mapping(self.raw.clone())
    }

    pub fn namespace(&self) -> String {
        self.raw
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or(GLOBAL_NAMESPACE)
            .to_string()
    }

    pub fn inlineable(&self) -> bool {
        self.raw
            .get("inlineable")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn has_backends(&self) -> bool {
        self.raw.get("backends").and_then(Value::as_mapping).is_some()
    }

    pub fn backends_raw(&self) -> Vec<(String, Value)> {
        self.raw
            .get("backends")
            .and_then(Value::as_mapping)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn steps_map(&self) -> Mapping {
        self.raw.get("steps").and_then(Value::as_mapping).cloned().unwrap_or_default()
    }

    /// Overwrites `meta.steps` in place. Used by the structural inliner
    /// after it has re-indexed per-step directives across a splice.
    pub fn set_steps_map(&mut self, steps: Mapping) {
        if steps.is_empty() {
            self.raw.remove("steps");
        } else {
            self.raw.insert(Value::String("steps".into()), Value::Mapping(steps));
        }
    }

    /// The per-step directive block for step `index0`/`step_key`, or an
    /// empty mapping if none was declared.
    pub fn step_entry(&self, index0: usize, step_key: &str) -> Mapping {
        let mkey = meta_step_key(index0, step_key);
        self.steps_map()
            .get(Value::String(mkey))
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Value {
        serde_yaml::from_str(src).expect("valid test fixture yaml")
    }

    #[test]
    fn parses_flat_steps_document() {
        let value = parse(
            r#"
steps:
  - echo.yml:
      message: hi
  - sub.yml: null
inputs:
  x:
    type: string
"#,
        );
        let doc = Document::from_value(&value).expect("parses");
        let steps = match &doc.body {
            DocumentBody::Steps(s) => s,
            DocumentBody::Backends(_) => panic!("expected steps body"),
        };
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].key, "echo.yml");
        assert!(matches!(steps[0].value, StepValue::Args(_)));
        assert!(matches!(steps[1].value, StepValue::Empty));
        assert!(doc.inputs.contains_key("x"));
    }

    #[test]
    fn parses_backends_document() {
        let value = parse(
            r#"
wic:
  backends:
    slurm:
      steps:
        - a.yml: null
    local:
      steps:
        - b.yml: null
"#,
        );
        let doc = Document::from_value(&value).expect("parses");
        match &doc.body {
            DocumentBody::Backends(backends) => {
                assert_eq!(backends.len(), 2);
                assert!(backends.contains_key("slurm"));
            }
            DocumentBody::Steps(_) => panic!("expected backends body"),
        }
    }

    #[test]
    fn subworkflow_step_serializes_to_exactly_two_keys() {
        let subtree = Document {
            body: DocumentBody::Steps(Vec::new()),
            inputs: Mapping::new(),
            meta: Meta::default(),
        };
        let doc = Document {
            body: DocumentBody::Steps(vec![StepEntry {
                key: "sub.yml".to_string(),
                value: StepValue::Subworkflow {
                    step_id: StepId::new("sub", "global"),
                    subtree: Box::new(subtree),
                    parentargs: Mapping::new(),
                },
            }]),
            inputs: Mapping::new(),
            meta: Meta::default(),
        };
        let rendered = doc.to_value();
        let steps = rendered.as_mapping().unwrap().get("steps").unwrap().as_sequence().unwrap();
        let entry = steps[0].as_mapping().unwrap();
        let inner = entry.get("sub.yml").unwrap().as_mapping().unwrap();
        let mut keys: Vec<&str> = inner.keys().map(|k| k.as_str().unwrap()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["parentargs", "subtree"]);
    }
}
