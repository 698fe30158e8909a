//! A filesystem-backed [`Catalog`]: walks a root directory once at
//! startup, grouping `.yml`/`.yaml` files by their immediate namespace
//! subdirectory and splitting them into tool descriptors and subworkflow
//! documents by their top-level `class:` key, then answers every lookup
//! from that in-memory index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use camino::Utf8Path;
use serde_yaml::Value;
use wic_core::{Catalog, Document, ToolDescriptor};
use wic_types::WicError;

pub struct FsCatalog {
    tools: HashMap<String, ToolDescriptor>,
    documents: HashMap<(String, String), PathBuf>,
    namespaces: std::collections::HashSet<String>,
}

impl FsCatalog {
    /// Walks `root`'s immediate subdirectories, each treated as a
    /// namespace, recursively indexing every `.yml`/`.yaml` file beneath
    /// it by filename stem.
    pub fn discover(root: &Utf8Path) -> Result<Self, WicError> {
        let mut tools = HashMap::new();
        let mut documents = HashMap::new();
        let mut namespaces = std::collections::HashSet::new();

        let entries = std::fs::read_dir(root).map_err(|_| WicError::DocumentNotFound {
            path: root.to_string(),
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(namespace) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            namespaces.insert(namespace.to_string());
            index_namespace(namespace, &path, &mut tools, &mut documents)?;
        }

        Ok(FsCatalog {
            tools,
            documents,
            namespaces,
        })
    }
}

fn index_namespace(
    namespace: &str,
    dir: &Path,
    tools: &mut HashMap<String, ToolDescriptor>,
    documents: &mut HashMap<(String, String), PathBuf>,
) -> Result<(), WicError> {
    for entry in std::fs::read_dir(dir)
        .map_err(|_| WicError::DocumentNotFound {
            path: dir.display().to_string(),
        })?
        .flatten()
    {
        let path = entry.path();
        if path.is_dir() {
            index_namespace(namespace, &path, tools, documents)?;
            continue;
        }

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        if !is_yaml {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        if is_command_line_tool(&path) {
            tools.insert(
                stem.to_string(),
                ToolDescriptor {
                    stem: stem.to_string(),
                },
            );
        } else {
            documents.insert((namespace.to_string(), stem.to_string()), path.clone());
        }
    }
    Ok(())
}

fn is_command_line_tool(path: &Path) -> bool {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return false;
    };
    let Ok(value) = serde_yaml::from_str::<Value>(&contents) else {
        return false;
    };
    value
        .as_mapping()
        .and_then(|m| m.get("class"))
        .and_then(Value::as_str)
        == Some("CommandLineTool")
}

impl Catalog for FsCatalog {
    fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    fn lookup_tool(&self, stem: &str) -> Option<ToolDescriptor> {
        self.tools.get(stem).cloned()
    }

    fn lookup_document_path(&self, namespace: &str, stem: &str) -> Option<PathBuf> {
        self.documents
            .get(&(namespace.to_string(), stem.to_string()))
            .cloned()
    }

    fn load_document(&self, path: &Path) -> Result<Document, WicError> {
        let contents = std::fs::read_to_string(path).map_err(|_| WicError::DocumentNotFound {
            path: path.display().to_string(),
        })?;
        let value: Value = serde_yaml::from_str(&contents).map_err(|_| WicError::DocumentNotFound {
            path: path.display().to_string(),
        })?;
        Document::from_value(&value)
    }
}
