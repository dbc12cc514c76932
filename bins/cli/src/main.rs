//! CLI binary entrypoint.

mod api_error;
mod commands;
mod error;
mod format;
mod logging;

use api_error::{ApiErrorDto, error_envelope_to_api_error};
use checkconf_config::{
    RuleRegistry, Settings, SettingsOverrides, build_registry, load_settings_std_env,
};
use checkconf_shared::ErrorEnvelope;
use clap::{Args, Parser, Subcommand};
use commands::{
    ValueInputArgs, run_check, run_definitions_schema, run_kinds, run_normalize, run_schema,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "checkconf",
    version,
    about = "Normalize and validate versioned check configurations",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    registry: RegistryArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that decide which kinds are registered.
#[derive(Debug, Args)]
struct RegistryArgs {
    /// Settings file (`.json` or `.toml`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Additional definitions file, registered after the settings' files. Repeatable.
    #[arg(long = "definitions", global = true)]
    definitions: Vec<PathBuf>,
    /// Do not register the built-in catalog.
    #[arg(long, global = true)]
    no_builtin: bool,
}

impl RegistryArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            include_builtin: self.no_builtin.then_some(false),
            definition_paths: self.definitions.clone(),
            log_level: None,
            log_format: None,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered configuration kinds.
    Kinds,
    /// Print the current schema of a kind.
    Schema {
        /// Registered kind, e.g. `active_checks:traceroute`.
        #[arg(long)]
        kind: String,
    },
    /// Normalize a persisted value and print the result.
    Normalize {
        #[command(flatten)]
        input: ValueInputArgs,
    },
    /// Validate a persisted value without printing it.
    Check {
        #[command(flatten)]
        input: ValueInputArgs,
    },
    /// Print the JSON Schema of definitions files.
    DefinitionsSchema,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    if matches!(cli.command, Commands::DefinitionsSchema) {
        return run_definitions_schema(mode);
    }

    let settings = match load_settings(&cli.registry) {
        Ok(settings) => settings,
        Err(error) => return Ok(envelope_output(mode, &error)),
    };
    logging::init_tracing(&settings.logging, mode.quiet);

    let registry = match build_registry(&settings) {
        Ok(registry) => registry,
        Err(error) => return Ok(envelope_output(mode, &error)),
    };
    dispatch(&cli.command, mode, &registry)
}

fn load_settings(args: &RegistryArgs) -> Result<Settings, ErrorEnvelope> {
    load_settings_std_env(args.settings.as_deref(), &args.overrides())
}

fn dispatch(
    command: &Commands,
    mode: OutputMode,
    registry: &RuleRegistry,
) -> Result<CliOutput, CliError> {
    match command {
        Commands::Kinds => run_kinds(mode, registry),
        Commands::Schema { kind } => run_schema(mode, registry, kind),
        Commands::Normalize { input } => run_normalize(mode, registry, input),
        Commands::Check { input } => run_check(mode, registry, input),
        Commands::DefinitionsSchema => run_definitions_schema(mode),
    }
}

/// Render a library error with the exit code it maps to.
pub(crate) fn envelope_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    format_error_output(mode, error, ExitCode::for_envelope(error))
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
    exit_code: ExitCode,
) -> CliOutput {
    let api_error = error_envelope_to_api_error(error);

    let stdout = if mode.is_ndjson() {
        format_ndjson_error(&api_error)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": api_error,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_api_error_text(&api_error)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

fn format_api_error_text(error: &ApiErrorDto) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code);
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(error.kind.as_str());
    out.push('\n');

    if let Some(meta) = error.meta.as_ref()
        && !meta.is_empty()
    {
        out.push_str("meta:\n");
        for (key, value) in meta {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

/// Pretty JSON followed by a newline.
pub(crate) fn pretty_json_line(value: &serde_json::Value) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

pub(crate) fn format_ndjson_summary(
    status: &str,
    command: &str,
    extra: Option<serde_json::Value>,
) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "command".to_string(),
        serde_json::Value::String(command.to_string()),
    );
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    let mut out = serde_json::to_string(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"command\":\"internal\"}".to_string()
    });
    out.push('\n');
    out
}

fn format_ndjson_error(error: &ApiErrorDto) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": "error",
        "error": error,
    });
    let mut out = serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}".to_string()
    });
    out.push('\n');
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
