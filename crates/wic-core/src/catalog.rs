//! The catalog interface: the pipeline's one external collaborator for
//! "does this stem name a tool, or a document, and where does the latter
//! live." `wic-core` defines only the trait and a marker descriptor type;
//! a concrete filesystem-backed implementation lives in the `wic` CLI
//! crate, the way `wic-core` never performs I/O of its own.

use std::path::{Path, PathBuf};

use wic_types::WicError;

use crate::document::Document;

/// A tool recognized by the catalog. Carries no behavior here; the CLI's
/// concrete catalog is free to attach a CWL `CommandLineTool` descriptor,
/// a container image reference, or whatever else a real tool registry
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub stem: String,
}

/// External collaborator resolving step-keys to tools or subworkflow
/// documents. Implementations are expected to be cheap to call repeatedly
/// (an in-memory index built once at startup), since the resolver calls
/// into this trait once per step.
pub trait Catalog {
    /// Whether `namespace` is known to the catalog at all, independent of
    /// any particular stem within it. Used to distinguish "namespace never
    /// existed" from "namespace exists but this stem isn't in it."
    fn has_namespace(&self, namespace: &str) -> bool;

    /// Looks up `stem` as a tool, independent of namespace.
    fn lookup_tool(&self, stem: &str) -> Option<ToolDescriptor>;

    /// Resolves `(namespace, stem)` to the filesystem path of a subworkflow
    /// document, if one is registered.
    fn lookup_document_path(&self, namespace: &str, stem: &str) -> Option<PathBuf>;

    /// Loads and parses the document at `path`. Implementations should
    /// report I/O and parse failures as [`WicError::DocumentNotFound`].
    fn load_document(&self, path: &Path) -> Result<Document, WicError>;
}
