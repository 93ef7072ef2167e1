//! # jsv-cli
//!
//! Command-line interface for the jsv JSON Schema validator.
//!
//! Loads schema and instance documents (JSON or YAML), compiles the schema,
//! validates and prints a report. Exit codes: 0 valid, 1 invalid, 2 when a
//! document cannot be loaded or the schema does not compile.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsv_ir::{walk, Traversal, Value};
use jsv_schema::{Compiler, CompilerConfig, DocumentRegistry, Draft, Schema};
use jsv_validation::formats;
use jsv_validation::{ValidationConfig, ValidationEngine, ValidationReporter};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsv")]
#[command(about = "JSON Schema validator CLI")]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON or YAML document against a schema
    Validate {
        /// Instance file path
        input: PathBuf,

        /// Schema file path
        #[arg(short, long)]
        schema: PathBuf,

        #[command(flatten)]
        compile: CompileArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Treat `format` keywords as annotations instead of assertions
        #[arg(long)]
        no_formats: bool,

        /// Maximum number of errors to print
        #[arg(long)]
        max_errors: Option<usize>,
    },

    /// Compile a schema and report whether it is well-formed
    CheckSchema {
        /// Schema file path
        schema: PathBuf,

        #[command(flatten)]
        compile: CompileArgs,
    },
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Extra schema document for `$ref` resolution, as URI=PATH
    #[arg(short = 'r', long = "ref", value_name = "URI=PATH")]
    refs: Vec<String>,

    /// Draft assumed when the schema has no `$schema` (4, 6 or 7)
    #[arg(short, long, value_parser = parse_draft)]
    draft: Option<Draft>,

    /// Maximum nesting of `$ref` expansions
    #[arg(long)]
    max_ref_depth: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Exit code when a document cannot be loaded or compiled
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Validate {
            input,
            schema,
            compile,
            format,
            no_formats,
            max_errors,
        } => {
            info!("Validating {} against {}", input.display(), schema.display());
            let schema = compile_schema(&load_schema(&schema)?, &compile)?;
            let instance = load_document(&input)
                .with_context(|| format!("Failed to load instance '{}'", input.display()))?;

            let engine =
                ValidationEngine::with_config(ValidationConfig::default().assert_formats(!no_formats));
            let result = engine.validate(&schema, &instance);

            let mut reporter = ValidationReporter::new();
            if let Some(limit) = max_errors {
                reporter = reporter.max_errors(limit);
            }
            let report = reporter.report(&result);
            match format {
                OutputFormat::Text => print!("{}", report.render_text()),
                OutputFormat::Json => println!(
                    "{}",
                    report.to_json().context("Failed to render report")?
                ),
            }

            Ok(if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::CheckSchema { schema, compile } => {
            info!("Checking schema {}", schema.display());
            let raw = load_schema(&schema)?;
            let compiled = compile_schema(&raw, &compile)?;
            for name in unknown_formats(&raw) {
                eprintln!("Warning: format '{name}' is not checked");
            }
            println!("Schema is valid ({})", compiled.draft());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_schema(path: &Path) -> Result<Value> {
    load_document(path).with_context(|| format!("Failed to load schema '{}'", path.display()))
}

fn compile_schema(raw: &Value, args: &CompileArgs) -> Result<Schema> {
    let registry = DocumentRegistry::new();
    for entry in &args.refs {
        let (uri, ref_path) = entry
            .split_once('=')
            .with_context(|| format!("Invalid --ref '{entry}', expected URI=PATH"))?;
        let document = load_document(Path::new(ref_path))
            .with_context(|| format!("Failed to load referenced schema '{ref_path}'"))?;
        registry.register(uri, document);
    }

    let mut config = CompilerConfig::default();
    if let Some(draft) = args.draft {
        config = config.default_draft(draft);
    }
    if let Some(depth) = args.max_ref_depth {
        config = config.max_ref_depth(depth);
    }
    debug!(refs = registry.len(), "Compiling schema");

    Compiler::with_config(config)
        .with_resolver(registry)
        .compile(raw)
        .context("Failed to compile schema")
}

/// Collects `format` names that validation passes without checking
#[derive(Default)]
struct UnknownFormats {
    names: BTreeSet<String>,
}

impl Traversal for UnknownFormats {
    fn visit(&mut self, value: &Value, _path: &[String]) {
        if let Some(name) = value.get("format").and_then(Value::as_str) {
            if !formats::is_known_format(name) {
                self.names.insert(name.to_string());
            }
        }
    }
}

fn unknown_formats(raw: &Value) -> BTreeSet<String> {
    let mut collector = UnknownFormats::default();
    walk(raw, &mut collector);
    collector.names
}

/// Read a JSON or YAML document, chosen by file extension
fn load_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).context("Failed to read file")?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&text).context("Invalid YAML")
    } else {
        serde_json::from_str(&text).context("Invalid JSON")
    }
}

fn parse_draft(name: &str) -> std::result::Result<Draft, String> {
    Draft::from_name(name).ok_or_else(|| format!("unknown draft '{name}', expected 4, 6 or 7"))
}
