//! The CLI's [`Validator`] implementation: a `jsonschema`-backed validator
//! built once from a user-supplied schema file, the same way the teacher
//! builds its workflow/action validators with `jsonschema::validator_for`.

use camino::Utf8Path;
use jsonschema::Validator as JsonSchemaValidator;
use wic_core::{Document, Validator};

pub struct SchemaValidator {
    inner: JsonSchemaValidator,
}

impl SchemaValidator {
    pub fn from_path(path: &Utf8Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let schema: serde_json::Value = serde_json::from_str(&contents)?;
        let inner = jsonschema::validator_for(&schema)?;
        Ok(SchemaValidator { inner })
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, document: &Document) -> Result<(), String> {
        let value = document.to_value();
        let as_json: serde_json::Value =
            serde_json::to_value(&value).map_err(|err| err.to_string())?;

        self.inner.validate(&as_json).map_err(|err| err.to_string())
    }
}
