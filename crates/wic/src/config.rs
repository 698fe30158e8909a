//! Configuration file loading: an optional `wic.yml`/`wic.yaml` that sets
//! defaults CLI flags can override. Candidate-filename discovery and the
//! outer/inner error split mirror the teacher's `zizmor.yml` loader.

use std::fs;

use camino::Utf8Path;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_CANDIDATES: &[&str] = &["wic.yml", "wic.yaml", ".wic.yml", ".wic.yaml"];

#[derive(Error, Debug)]
#[error("configuration error in {path}")]
pub struct ConfigError {
    path: String,
    #[source]
    pub source: ConfigErrorInner,
}

#[derive(Error, Debug)]
pub enum ConfigErrorInner {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration syntax")]
    Syntax(#[source] serde_yaml::Error),
}

/// Data model for `wic.yml`, matching exactly what the file may declare.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// The catalog root directory, if not given on the command line.
    pub catalog: Option<String>,
    /// The default namespace new documents resolve into.
    pub namespace: Option<String>,
    /// Whether to continue past schema-validation failures instead of
    /// aborting compilation.
    pub ignore_validation_errors: bool,
    /// Whether to run the structural inliner immediately after resolution,
    /// rather than requiring explicit `--inline` paths.
    pub eager_inline: bool,
}

impl Config {
    fn load(contents: &str) -> Result<Self, ConfigErrorInner> {
        serde_yaml::from_str(contents).map_err(ConfigErrorInner::Syntax)
    }

    /// Looks for a config file in `dir`, trying each candidate filename in
    /// turn. Returns `Ok(None)` if none is present.
    pub fn discover(dir: &Utf8Path) -> Result<Option<Self>, ConfigError> {
        for candidate in CONFIG_CANDIDATES {
            let path = dir.join(candidate);
            if path.is_file() {
                tracing::debug!("found config candidate at `{path}`");
                let contents = fs::read_to_string(&path).map_err(|err| ConfigError {
                    path: path.to_string(),
                    source: ConfigErrorInner::Io(err),
                })?;
                return Ok(Some(Self::load(&contents).map_err(|err| ConfigError {
                    path: path.to_string(),
                    source: err,
                })?));
            }
        }
        Ok(None)
    }

    /// Loads the config file named explicitly with `--config`, bypassing
    /// discovery.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigError {
            path: path.to_string(),
            source: ConfigErrorInner::Io(err),
        })?;
        Self::load(&contents).map_err(|err| ConfigError {
            path: path.to_string(),
            source: err,
        })
    }
}
