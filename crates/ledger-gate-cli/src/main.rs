// crates/ledger-gate-cli/src/main.rs
// ============================================================================
// Module: Ledger Gate CLI Entry Point
// Description: Command dispatcher for serving and invoking callables.
// Purpose: Provide a safe CLI for server, config, and client workflows.
// Dependencies: clap, ledger-gate-server, reqwest, serde_json, tokio
// ============================================================================

//! ## Overview
//! The Ledger Gate CLI runs the callable HTTP server, validates
//! configuration files, and invokes callables over HTTP as a client.
//! Security posture: payload files are untrusted and size-capped before
//! parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use ledger_gate_server::CallServer;
use ledger_gate_server::LedgerGateConfig;
use ledger_gate_server::config::AuditSinkType;
use ledger_gate_server::config::DocumentStoreType;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a payload file accepted by the client command.
const MAX_PAYLOAD_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "ledger-gate", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the callable HTTP server.
    Serve(ServeArgs),
    /// Validate a configuration file and print a summary.
    CheckConfig(CheckConfigArgs),
    /// Invoke a callable over HTTP and print the JSON response.
    Call(CallArgs),
}

/// Arguments for the serve command.
#[derive(Args, Debug)]
struct ServeArgs {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,
}

/// Arguments for the check-config command.
#[derive(Args, Debug)]
struct CheckConfigArgs {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,
}

/// Arguments for the call command.
#[derive(Args, Debug)]
struct CallArgs {
    /// Server base URL, e.g. `http://127.0.0.1:8080`.
    #[arg(long)]
    url: String,
    /// Callable function name.
    #[arg(long)]
    name: String,
    /// Path to the JSON payload file.
    #[arg(long)]
    payload: PathBuf,
    /// Bearer token for authentication.
    #[arg(long)]
    token: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure with a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing failure description.
    message: String,
}

impl CliError {
    /// Creates a CLI error from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.message),
    }
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Serve(args) => run_serve(&args),
        Command::CheckConfig(args) => run_check_config(&args),
        Command::Call(args) => run_call(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the callable HTTP server until it exits.
fn run_serve(args: &ServeArgs) -> CliResult<()> {
    let config = load_config(&args.config)?;
    let server = CallServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(format!("runtime init failed: {err}")))?;
    runtime
        .block_on(server.serve())
        .map_err(|err| CliError::new(format!("server failed: {err}")))
}

/// Validates a configuration file and prints a summary.
fn run_check_config(args: &CheckConfigArgs) -> CliResult<()> {
    let config = load_config(&args.config)?;
    let summary = config_summary(&config);
    write_stdout_line(&summary).map_err(|err| CliError::new(format!("stdout failed: {err}")))
}

/// Invokes a callable over HTTP and prints the JSON response.
fn run_call(args: &CallArgs) -> CliResult<()> {
    let payload = read_payload(&args.payload)?;
    let client = reqwest::blocking::Client::new();
    let url = format!("{}/v1/call/{}", args.url.trim_end_matches('/'), args.name);
    let mut request = client.post(url).json(&payload);
    if let Some(token) = args.token.as_deref() {
        request = request.bearer_auth(token);
    }
    let response =
        request.send().map_err(|err| CliError::new(format!("request failed: {err}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .map_err(|err| CliError::new(format!("invalid response body: {err}")))?;
    let rendered = serde_json::to_string_pretty(&body)
        .map_err(|err| CliError::new(format!("render failed: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(format!("stdout failed: {err}")))?;
    if !status.is_success() {
        return Err(CliError::new(format!("call failed with status {status}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates a configuration file.
fn load_config(path: &Path) -> CliResult<LedgerGateConfig> {
    let config = LedgerGateConfig::load(path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    config.validate().map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    Ok(config)
}

/// Formats the one-line config summary.
fn config_summary(config: &LedgerGateConfig) -> String {
    let store = match config.store.store_type {
        DocumentStoreType::Memory => "memory",
        DocumentStoreType::Sqlite => "sqlite",
    };
    let audit = match config.audit.sink {
        AuditSinkType::Stderr => "stderr",
        AuditSinkType::File => "file",
        AuditSinkType::None => "none",
    };
    let tokens = config.server.auth.as_ref().map_or(0, |auth| auth.tokens.len());
    format!(
        "config ok: bind={} store={store} audit={audit} auth_tokens={tokens}",
        config.server.bind
    )
}

/// Reads and parses a JSON payload file with a size cap.
fn read_payload(path: &Path) -> CliResult<Value> {
    let metadata = std::fs::metadata(path)
        .map_err(|err| CliError::new(format!("payload read failed: {err}")))?;
    if metadata.len() > MAX_PAYLOAD_BYTES {
        return Err(CliError::new("payload file exceeds size limit".to_string()));
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|err| CliError::new(format!("payload read failed: {err}")))?;
    serde_json::from_str(&contents)
        .map_err(|err| CliError::new(format!("payload is not valid json: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::config_summary;
    use super::load_config;
    use super::read_payload;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn summary_names_store_and_audit() {
        let file = config_file(
            r#"
            [server]
            bind = "127.0.0.1:8080"

            [[server.auth.tokens]]
            token = "secret-1"
            principal = "u1"
            "#,
        );
        let config = load_config(file.path()).unwrap();
        let summary = config_summary(&config);
        assert!(summary.contains("bind=127.0.0.1:8080"));
        assert!(summary.contains("store=memory"));
        assert!(summary.contains("auth_tokens=1"));
    }

    #[test]
    fn invalid_config_fails_load() {
        let file = config_file(
            r#"
            [server]
            bind = "not-an-address"
            "#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn payload_must_be_valid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(read_payload(file.path()).is_err());
    }

    #[test]
    fn payload_roundtrips_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "name": "Acme" }"#).unwrap();
        let payload = read_payload(file.path()).unwrap();
        assert_eq!(payload["name"], "Acme");
    }
}
