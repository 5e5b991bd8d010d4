mod logging;
mod report;
mod settings;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use charmbundle_core::{DecodeError, bundle_json_schema, parse_placement, read_bundle_file};
use clap::{Args, Parser, Subcommand};
use logging::{LoggingError, init_logging};
use report::{PlacementRow, VerifyReport, print_issues};
use settings::{LogFormat, OutputFormat, Settings, SettingsError, load_settings};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("failed to load {}: {source}", path.display())]
    Decode { path: PathBuf, source: DecodeError },
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "charmbundle", version, about = "Verify deployment bundles")]
struct Cli {
    /// Settings file (defaults to ./charmbundle.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log filter directive, e.g. `debug` or `charmbundle_core=trace`.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a bundle and check it for consistency.
    Verify(VerifyArgs),
    /// Parse unit placement directives.
    Placement(PlacementArgs),
    /// Print the JSON Schema of the bundle document.
    Schema,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Bundle file (YAML, or JSON with a `.json` extension).
    bundle: PathBuf,
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,
}

#[derive(Args, Debug)]
struct PlacementArgs {
    #[arg(required = true, value_name = "PLACEMENT")]
    placements: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(event = "run_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let Cli {
        config,
        log_level,
        log_format,
        command,
    } = cli;

    let mut settings = load_settings(config.as_deref())?;
    if let Some(level) = log_level {
        settings.logging.level = level;
    }
    if let Some(format) = log_format {
        settings.logging.format = format;
    }
    init_logging(&settings.logging)?;

    match command {
        Command::Verify(args) => run_verify(args, &settings),
        Command::Placement(args) => run_placement(args),
        Command::Schema => run_schema(),
    }
}

fn run_verify(args: VerifyArgs, settings: &Settings) -> Result<ExitCode, CliError> {
    let VerifyArgs { bundle, output } = args;
    let output = output.unwrap_or(settings.verify.output);

    tracing::info!(event = "verify_started", path = %bundle.display());
    let timer = Instant::now();

    let data = read_bundle_file(&bundle).map_err(|source| CliError::Decode {
        path: bundle.clone(),
        source,
    })?;
    let outcome = data.verify_with_defaults();

    let issues = outcome.as_ref().map_or_else(|err| err.len(), |_| 0);
    let status = if outcome.is_ok() { "valid" } else { "invalid" };
    tracing::info!(
        event = "verify_finished",
        status,
        issues,
        duration_ms = timer.elapsed().as_millis()
    );

    let bundle_name = bundle.display().to_string();
    match output {
        OutputFormat::Json => {
            let report = VerifyReport::new(&bundle_name, &outcome);
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
        OutputFormat::Text => match &outcome {
            Ok(()) => println!("bundle verified successfully"),
            Err(err) => {
                eprintln!("bundle verification failed: {bundle_name}");
                print_issues(&mut io::stderr().lock(), err.issues())?;
            }
        },
    }

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn run_placement(args: PlacementArgs) -> Result<ExitCode, CliError> {
    let mut failed = false;
    let mut stdout = io::stdout().lock();

    for placement in &args.placements {
        match parse_placement(placement) {
            Ok(parsed) => {
                tracing::debug!(
                    event = "placement_parsed",
                    placement = %placement,
                    parsed = %parsed
                );
                serde_json::to_writer(&mut stdout, &PlacementRow::new(placement, &parsed))?;
                writeln!(stdout)?;
            }
            Err(err) => {
                failed = true;
                eprintln!("error: {err}");
            }
        }
    }

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_schema() -> Result<ExitCode, CliError> {
    let schema = bundle_json_schema();
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
