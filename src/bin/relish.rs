//! Relish CLI
//!
//! Command-line interface for formatting validation failures into error envelopes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use relish::{
    load_failure, load_json, load_options, validate, Envelope, Options, PartialOptions, Relish,
    ValidateError, ValidationFailure,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relish")]
#[command(about = "Turn schema validation failures into friendly error reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a raw validation failure document into an error envelope
    Format {
        /// Failure file: { "source", "details": [...], "output": {...} }
        failure: PathBuf,

        /// Options file: { "stripQuotes": bool, "messages": {...} }
        #[arg(long)]
        options: Option<PathBuf>,

        /// Remove double quotes from messages (overrides the options file)
        #[arg(long)]
        strip_quotes: bool,

        /// Enclosing field path prepended to every error path
        #[arg(long)]
        parent: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a payload with the example jsonschema adapter and format any failure
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// JSON Schema file
        #[arg(long)]
        schema: PathBuf,

        /// Request part being validated (payload, query, headers, params)
        #[arg(long, default_value = "payload")]
        source: String,

        /// Options file: { "stripQuotes": bool, "messages": {...} }
        #[arg(long)]
        options: Option<PathBuf>,

        /// Remove double quotes from messages (overrides the options file)
        #[arg(long)]
        strip_quotes: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Format {
            failure,
            options,
            strip_quotes,
            parent,
            output,
            pretty,
        } => run_format(FormatArgs {
            failure,
            options,
            strip_quotes,
            parent,
            output,
            pretty,
        }),

        Commands::Validate {
            payload,
            schema,
            source,
            options,
            strip_quotes,
            pretty,
        } => run_validate(&payload, &schema, source, options.as_deref(), strip_quotes, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Build the configured formatter from an optional options file and flags.
fn build_relish(options_path: Option<&Path>, strip_quotes: bool) -> Result<Relish, u8> {
    let options = match options_path {
        Some(path) => load_options(path).map_err(|e| {
            eprintln!("Error loading options: {}", e);
            e.exit_code() as u8
        })?,
        None => Options::default(),
    };

    let relish = Relish::new(options);
    if strip_quotes {
        Ok(relish.options(PartialOptions::new().strip_quotes(true)))
    } else {
        Ok(relish)
    }
}

fn render(envelope: Envelope, pretty: bool) -> Result<String, u8> {
    let value = envelope.into_value();
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

struct FormatArgs {
    failure: PathBuf,
    options: Option<PathBuf>,
    strip_quotes: bool,
    parent: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_format(args: FormatArgs) -> Result<(), u8> {
    let FormatArgs {
        failure: failure_path,
        options,
        strip_quotes,
        parent,
        output,
        pretty,
    } = args;

    let relish = build_relish(options.as_deref(), strip_quotes)?;

    let mut failure = load_failure(&failure_path).map_err(|e| {
        eprintln!("Error loading failure: {}", e);
        e.exit_code() as u8
    })?;
    if parent.is_some() {
        failure.parent = parent;
    }

    let envelope = relish.fail_action(failure).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let json_output = render(envelope, pretty)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(
    payload_path: &Path,
    schema_path: &Path,
    source: String,
    options: Option<&Path>,
    strip_quotes: bool,
    pretty: bool,
) -> Result<(), u8> {
    let relish = build_relish(options, strip_quotes)?;

    let payload = load_json(payload_path).map_err(|e| {
        eprintln!("Error loading payload: {}", e);
        e.exit_code() as u8
    })?;
    let schema = load_json(schema_path).map_err(|e| {
        eprintln!("Error loading schema: {}", e);
        e.exit_code() as u8
    })?;

    match validate(&schema, &payload) {
        Ok(()) => {
            println!(r#"{{"valid":true}}"#);
            Ok(())
        }
        Err(ValidateError::Invalid { details }) => {
            let envelope = relish
                .fail_action(ValidationFailure::new(source, details))
                .map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?;
            println!("{}", render(envelope, pretty)?);
            Err(1)
        }
        Err(e @ ValidateError::InvalidSchema { .. }) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}
