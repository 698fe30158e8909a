//! Shared vocabulary for the workflow inference compiler front-end.
//!
//! This crate has no behavior of its own: it is the common ground between
//! `wic-core` (the AST transformation pipeline) and `wic` (the CLI driver),
//! the same role `github-actions-models` plays relative to `zizmor`'s audits.

use std::fmt;

/// A pair identifying a step in the catalog: its stem and the namespace it
/// was looked up under. Two `StepId`s are equal iff both components match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StepId {
    pub stem: String,
    pub namespace: String,
}

impl StepId {
    pub fn new(stem: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.stem)
    }
}

/// The default namespace used when a document's `meta.wic.namespace` is absent.
pub const GLOBAL_NAMESPACE: &str = "global";

/// An ordered path from the root document down to some descendant, expressed
/// as a sequence of canonical step names (see `wic_core::ident::step_name`).
/// The empty sequence denotes the root document itself.
pub type Namespaces = Vec<String>;

/// Errors that abort compilation. Each variant renders a single-line,
/// human-readable diagnostic; callers that need the full context (offending
/// step, namespace, path) can match on the variant's fields directly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WicError {
    /// The schema validator rejected a document.
    #[error("validation failed for `{stem}`; see validation_{stem}.txt for details")]
    ValidationFailed { stem: String },

    /// A step references a namespace absent from the catalog.
    #[error("namespace `{namespace}` not found while resolving `{stem}`")]
    NamespaceMiss { namespace: String, stem: String },

    /// A stem is absent in its namespace.
    #[error("`{stem}` not found in namespace `{namespace}`{hint}", hint = hint_suffix(.hint))]
    StemMiss {
        namespace: String,
        stem: String,
        hint: Option<String>,
    },

    /// A catalog-listed document path does not exist or has the wrong suffix.
    #[error("document `{path}` does not exist or is not a `.yml` file")]
    DocumentNotFound { path: String },

    /// Parent and child disagree on the type at a merge key.
    #[error("cannot merge `{key}`: parent and child disagree on type")]
    MergeTypeMismatch { key: String },

    /// Compiler directives (a `meta`/`wic` sub-key) were found inside a
    /// tool step's own argument mapping.
    #[error("step `{step}` is a tool call but carries a `meta` directive")]
    MetaOnTool { step: String },

    /// A parent supplied `in.<name>` to a subworkflow that does not declare
    /// `<name>` as a formal input.
    #[error("`{name}` is not a declared input of subworkflow `{subworkflow}`")]
    UnknownFormalParam { name: String, subworkflow: String },
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

/// Non-fatal conditions accumulated during compilation. Unlike [`WicError`],
/// these do not stop the pipeline; they are drained by the caller at the end
/// of a run, mirroring the way `zizmor`'s `FindingRegistry` separates hard
/// failures from accumulated findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The count of inlined compiled sub-graphs did not match the number of
    /// child rose-tree nodes.
    PartialInline { expected: usize, found: usize },
    /// A formal parameter was declared in `inputs` but never supplied by the
    /// parent's call-site arguments; edge inference is expected to recover it.
    UnresolvedFormalParam { name: String, subworkflow: String },
    /// An output whose name contains `output_all` was dropped during
    /// graph-level inlining, per policy.
    OutputAllDropped { name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PartialInline { expected, found } => write!(
                f,
                "expected to inline {expected} sub-graph(s), inlined {found}"
            ),
            Warning::UnresolvedFormalParam { name, subworkflow } => write!(
                f,
                "`{name}` is declared as an input of `{subworkflow}` but was never supplied"
            ),
            Warning::OutputAllDropped { name } => {
                write!(f, "dropped aggregate output `{name}`")
            }
        }
    }
}

/// Accumulates [`Warning`]s across a compilation run without interrupting it.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
