//! Types for the compiled graph that is the input/output of the
//! compiled-graph inliner (spec.md §4.7): a mapping from globally (pre-
//! inline: locally) unique step name to a node carrying its input
//! bindings, `run` reference, and optional scatter annotations, plus an
//! `outputs` mapping. A [`RoseTree`] pairs a compiled graph with one child
//! per subworkflow that was compiled into its own graph.

use indexmap::IndexMap;
use serde_yaml::Value;

/// A single step's input binding: either a bare string reference (possibly
/// a cross-step `a/b/port` reference) or a mapping carrying a `source`
/// field alongside other CWL-style keys (`valueFrom`, etc).
pub fn binding_source(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Mapping(m) => m.get("source").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Returns `value` with its source string rewritten to `new_source`:
/// a bare string is replaced outright, a `{source: ...}` mapping has just
/// its `source` field rewritten, and anything else is returned unchanged.
pub fn with_rewritten_source(value: &Value, new_source: String) -> Value {
    match value {
        Value::Mapping(m) => {
            let mut m = m.clone();
            m.insert(Value::String("source".into()), Value::String(new_source));
            Value::Mapping(m)
        }
        _ => Value::String(new_source),
    }
}

/// A compiled step node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStep {
    /// The step's `in` mapping: port name to binding.
    pub inputs: IndexMap<String, Value>,
    /// The tool or subworkflow artifact this step invokes.
    pub run: String,
    /// Scatter ports, if this step is a scatter step.
    pub scatter: Vec<String>,
    /// Only meaningful when `scatter` is non-empty.
    pub scatter_method: Option<String>,
}

/// A compiled graph output: the cross-step reference it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOutput {
    pub output_source: String,
}

/// A compiled graph: an insertion-ordered mapping of step name to
/// [`GraphStep`], plus an `outputs` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledGraph {
    pub steps: IndexMap<String, GraphStep>,
    pub outputs: IndexMap<String, GraphOutput>,
}

/// A node bearing a compiled graph plus one child per subworkflow that was
/// compiled into its own graph (in the order those subworkflow references
/// appeared in the source document). `namespaces` is the path that
/// identifies this node; only its last element is consulted when splicing
/// (spec.md §4.7: "only the last namespace component" is used, since
/// inlining proceeds recursively).
#[derive(Debug, Clone)]
pub struct RoseTree {
    pub namespaces: Vec<String>,
    pub graph: CompiledGraph,
    pub children: Vec<RoseTree>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_source_reads_string_and_mapping_forms() {
        assert_eq!(binding_source(&Value::String("a/b".into())), Some("a/b".to_string()));
        let mapping: Value = serde_yaml::from_str("source: a/b\nvalueFrom: foo\n").unwrap();
        assert_eq!(binding_source(&mapping), Some("a/b".to_string()));
    }

    #[test]
    fn with_rewritten_source_preserves_other_mapping_keys() {
        let mapping: Value = serde_yaml::from_str("source: a/b\nvalueFrom: foo\n").unwrap();
        let rewritten = with_rewritten_source(&mapping, "x/y".to_string());
        let m = rewritten.as_mapping().unwrap();
        assert_eq!(m.get("source").unwrap().as_str(), Some("x/y"));
        assert_eq!(m.get("valueFrom").unwrap().as_str(), Some("foo"));
    }
}
