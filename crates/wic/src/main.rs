#![warn(clippy::all, clippy::dbg_macro)]

use std::process::ExitCode;

use anstream::eprintln;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use owo_colors::OwoColorize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use wic_core::{Catalog, Document, Validator};
use wic_types::{Diagnostics, StepId, WicError};

mod catalog_fs;
mod config;
mod output;
mod validator_jsonschema;

use catalog_fs::FsCatalog;
use config::Config;
use validator_jsonschema::SchemaValidator;

/// Compiles hierarchical workflow descriptions into flat, executable graphs.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve, merge, and (optionally) inline a root workflow document.
    Compile(CompileArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// The root workflow document to compile.
    root: Utf8PathBuf,

    /// The catalog root directory (one subdirectory per namespace).
    #[arg(long)]
    catalog: Option<Utf8PathBuf>,

    /// The namespace the root document resolves into.
    #[arg(long)]
    namespace: Option<String>,

    /// A JSON Schema file to validate each document against before
    /// resolving it. Skipped entirely if omitted.
    #[arg(long)]
    schema: Option<Utf8PathBuf>,

    /// Continue past schema-validation failures instead of aborting.
    #[arg(long)]
    ignore_validation_errors: bool,

    /// A `/`-delimited namespace path to splice inline. May be repeated;
    /// each is applied in turn against the resolved-and-merged document.
    #[arg(long = "inline")]
    inline: Vec<String>,

    /// The configuration file to load.
    #[arg(long, group = "conf")]
    config: Option<Utf8PathBuf>,

    /// Disable all configuration loading.
    #[arg(long, group = "conf")]
    no_config: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Wic(#[from] WicError),
    #[error("I/O error reading `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{path}` is not valid YAML")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn run(args: &CompileArgs) -> Result<ExitCode, Error> {
    let config = if args.no_config {
        None
    } else if let Some(path) = &args.config {
        Some(Config::from_path(path)?)
    } else {
        let dir = args.root.parent().map(Utf8PathBuf::from).unwrap_or_default();
        Config::discover(&dir)?
    }
    .unwrap_or_default();

    let catalog_dir = args
        .catalog
        .clone()
        .or_else(|| config.catalog.clone().map(Utf8PathBuf::from))
        .unwrap_or_else(|| Utf8PathBuf::from("."));
    let namespace = args
        .namespace
        .clone()
        .or_else(|| config.namespace.clone())
        .unwrap_or_else(|| wic_types::GLOBAL_NAMESPACE.to_string());
    let ignore_validation_errors = args.ignore_validation_errors || config.ignore_validation_errors;
    let eager_inline = config.eager_inline;

    let catalog = FsCatalog::discover(&catalog_dir)?;

    let validator = args
        .schema
        .as_ref()
        .map(|path| SchemaValidator::from_path(path))
        .transpose()?;
    let validator: Option<&dyn Validator> = validator.as_ref().map(|v| v as &dyn Validator);

    let contents = std::fs::read_to_string(&args.root).map_err(|source| Error::Io {
        path: args.root.to_string(),
        source,
    })?;
    let raw: Value = serde_yaml::from_str(&contents).map_err(|source| Error::Yaml {
        path: args.root.to_string(),
        source,
    })?;
    let document = Document::from_value(&raw)?;

    let root_stem = args
        .root
        .file_stem()
        .map(str::to_string)
        .unwrap_or_else(|| args.root.to_string());

    let mut diagnostics = Diagnostics::new();

    let resolve_result = wic_core::resolve_document(
        StepId::new(root_stem.clone(), namespace.clone()),
        document,
        &catalog as &dyn Catalog,
        if ignore_validation_errors { None } else { validator },
    );

    let (mut step_id, mut resolved) = resolve_result?;

    wic_core::merge_overrides(&mut resolved, &Mapping::new())?;

    if eager_inline {
        loop {
            let Some(path) = wic_core::inlineable_paths(&step_id, &resolved).into_iter().next() else {
                break;
            };
            let (new_id, inlined, _arity) =
                wic_core::inline_at(&step_id, &resolved, &path, &mut diagnostics)?;
            step_id = new_id;
            resolved = inlined;
        }
    } else {
        for path_arg in &args.inline {
            let path: Vec<String> = path_arg.split('/').map(str::to_string).collect();
            let (new_id, inlined, _arity) =
                wic_core::inline_at(&step_id, &resolved, &path, &mut diagnostics)?;
            step_id = new_id;
            resolved = inlined;
        }
    }

    output::render_document(&resolved)?;
    output::render_warnings(diagnostics.warnings());

    tracing::info!("compiled `{root_stem}` in namespace `{namespace}`");

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Command::Compile(args) = &cli.command;

    let filter = EnvFilter::builder()
        .with_default_directive(args.verbose.tracing_level_filter().into())
        .from_env()
        .expect("failed to parse RUST_LOG");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(filter)
        .init();

    match run(args) {
        Ok(exit) => exit,
        Err(err) => {
            eprintln!("{}: {err}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}
