//! The validator interface: an optional external collaborator that checks
//! a document against a schema before the resolver trusts its shape.
//! `wic-core` defines only the trait; the CLI's `jsonschema`-backed
//! implementation lives in the `wic` crate.

use crate::document::Document;

/// Produces a boolean verdict (plus a human-readable reason on failure)
/// for a document. Validation happens once, on the raw document, before
/// resolution begins.
pub trait Validator {
    fn validate(&self, document: &Document) -> Result<(), String>;
}
