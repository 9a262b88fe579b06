#![forbid(unsafe_code)]

//! `agent-signal`: run one configured agent and report its signals.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing::info;

use agent_signal::logging::{init_tracing, LogFormat};
use agent_signal::{monitor, AppError, MonitorOptions, Result, RunnerConfig};

#[derive(Debug, Parser)]
#[command(name = "agent-signal", about = "Run a coding agent and extract its signals", version, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["prompt", "prompt_file"])))]
struct Cli {
    /// Path to the TOML adapter configuration.
    #[arg(long)]
    config: PathBuf,

    /// Adapter name from the configuration.
    #[arg(long)]
    adapter: String,

    /// Prompt text.
    #[arg(long)]
    prompt: Option<String>,

    /// Read the prompt from a file.
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Working directory for the agent.
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Override the configured timeout (milliseconds, 0 = unbounded).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Do not echo agent output.
    #[arg(long)]
    quiet: bool,

    /// Print the run result as JSON when the agent exits.
    #[arg(long)]
    json: bool,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<ExitCode> {
    let config = RunnerConfig::load_from_path(&args.config)?;
    let adapter = config.adapter(&args.adapter)?;

    let prompt = match (args.prompt, &args.prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|err| AppError::Config(format!("cannot read prompt file: {err}")))?,
        (None, None) => return Err(AppError::Config("no prompt given".into())),
    };

    let mut run_options = config.run_options(prompt);
    if let Some(dir) = args.workdir {
        run_options = run_options.working_directory(dir);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        run_options = run_options.timeout_ms(timeout_ms);
    }

    let options = MonitorOptions::new(run_options)
        .echo_output(config.echo_output && !args.quiet)
        .on_any(|signal| {
            info!(
                signal = %signal.kind,
                attributes = ?signal.attributes,
                "agent signal"
            );
        });

    let result = monitor(adapter, options).await?;

    if args.json {
        let summary = serde_json::to_string_pretty(&result)
            .map_err(|err| AppError::Io(format!("failed to serialise run result: {err}")))?;
        println!("{summary}");
    }

    Ok(ExitCode::from(u8::try_from(result.exit_code).unwrap_or(u8::MAX)))
}
