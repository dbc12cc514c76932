//! Normalize and check command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, envelope_output, format_ndjson_summary, pretty_json_line};
use checkconf_config::{DocumentFormat, RuleRegistry, load_raw_config_from_path, parse_raw_config};
use checkconf_domain::{NormalizedConfig, RawConfig, mask_secrets};
use checkconf_shared::ErrorEnvelope;
use clap::{ArgGroup, Args, ValueEnum};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

/// Encoding of a value read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    const fn document_format(self) -> DocumentFormat {
        match self {
            Self::Json => DocumentFormat::Json,
            Self::Yaml => DocumentFormat::Yaml,
        }
    }
}

/// Where the persisted value comes from.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["input", "input_json", "stdin"])
))]
pub struct ValueInputArgs {
    /// Registered kind, e.g. `active_checks:bi_aggr`.
    #[arg(long)]
    pub kind: String,
    /// Read the value from a `.json`, `.yaml` or `.yml` file.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Inline JSON value.
    #[arg(long)]
    pub input_json: Option<String>,
    /// Read the value from stdin.
    #[arg(long)]
    pub stdin: bool,
    /// Encoding of the stdin value.
    #[arg(long, value_enum, default_value_t = InputFormat::Json, requires = "stdin")]
    pub stdin_format: InputFormat,
}

/// Run the normalize command.
pub fn run_normalize(
    mode: OutputMode,
    registry: &RuleRegistry,
    args: &ValueInputArgs,
) -> Result<CliOutput, CliError> {
    let config = match load_and_normalize(registry, args)? {
        Ok(config) => config,
        Err(error) => return Ok(envelope_output(mode, &error)),
    };
    let value = if mode.show_secrets {
        config.to_value()
    } else {
        match registry.resolve(&args.kind) {
            Ok(entry) => mask_secrets(&config, entry.schema()),
            Err(error) => return Ok(envelope_output(mode, &error)),
        }
    };
    let version = config.version();
    info!(kind = %args.kind, %version, "configuration normalized");

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "normalize",
            Some(json!({ "kind": args.kind, "version": version, "config": value })),
        )
    } else if mode.is_json() {
        pretty_json_line(&json!({
            "status": "ok",
            "kind": args.kind,
            "version": version,
            "config": value,
        }))?
    } else {
        format!(
            "status: ok\nkind: {}\nversion: {version}\nconfig:\n{}",
            args.kind,
            pretty_json_line(&value)?
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

/// Run the check command.
pub fn run_check(
    mode: OutputMode,
    registry: &RuleRegistry,
    args: &ValueInputArgs,
) -> Result<CliOutput, CliError> {
    let config = match load_and_normalize(registry, args)? {
        Ok(config) => config,
        Err(error) => return Ok(envelope_output(mode, &error)),
    };
    let version = config.version();
    info!(kind = %args.kind, %version, "configuration accepted");

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "check",
            Some(json!({ "kind": args.kind, "version": version })),
        )
    } else if mode.is_json() {
        pretty_json_line(&json!({
            "status": "ok",
            "kind": args.kind,
            "version": version,
        }))?
    } else {
        format!("status: ok\nkind: {}\nversion: {version}\n", args.kind)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

/// Outer error: the CLI itself failed. Inner error: the value was rejected.
fn load_and_normalize(
    registry: &RuleRegistry,
    args: &ValueInputArgs,
) -> Result<Result<NormalizedConfig, ErrorEnvelope>, CliError> {
    let raw = match read_raw(args)? {
        Ok(raw) => raw,
        Err(error) => return Ok(Err(error)),
    };
    Ok(registry.normalize(&args.kind, raw))
}

fn read_raw(args: &ValueInputArgs) -> Result<Result<RawConfig, ErrorEnvelope>, CliError> {
    if let Some(path) = &args.input {
        return Ok(load_raw_config_from_path(path));
    }
    if let Some(inline) = &args.input_json {
        return Ok(parse_raw_config(inline, DocumentFormat::Json));
    }
    if args.stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(parse_raw_config(&buf, args.stdin_format.document_format()));
    }
    Err(CliError::InvalidInput(
        "missing --input, --input-json or --stdin".to_string(),
    ))
}
