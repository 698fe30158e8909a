//! AST transformation pipeline for the workflow inference compiler
//! front-end: resolution, override merging, forest projection, structural
//! inlining, and compiled-graph splicing. No file I/O lives here; every
//! filesystem access is pushed behind the [`catalog::Catalog`] and
//! [`validator::Validator`] traits, which the `wic` CLI crate implements.

pub mod catalog;
pub mod document;
pub mod forest;
pub mod graph;
pub mod graph_inline;
pub mod ident;
pub mod inline;
pub mod merge;
pub mod resolve;
pub mod validator;

pub use catalog::{Catalog, ToolDescriptor};
pub use document::{Document, DocumentBody, Meta, StepEntry, StepValue};
pub use forest::{project_forest, Forest};
pub use graph::{binding_source, with_rewritten_source, CompiledGraph, GraphOutput, GraphStep, RoseTree};
pub use graph_inline::inline_compiled_graph;
pub use inline::{apply_args, inline_at, inlineable_paths};
pub use merge::{merge_mapping_typesafe, merge_overrides};
pub use resolve::resolve_document;
pub use validator::Validator;
