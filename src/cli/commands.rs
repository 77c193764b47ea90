//! CLI command definitions for canvas-forge.
//!
//! Collects a business model canvas, runs the build → critique → optimize
//! chain with streamed output, and exports the results.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::collect::{collect_canvas, CanvasArgs};
use super::progress::print_events;
use crate::canvas::{CanvasField, CanvasInput};
use crate::chain::{ChainError, ChainResult, ChainRunner, SessionContext};
use crate::config::{persist_api_key, validate_api_key, AppConfig, ValidationOutcome};
use crate::export::CanvasExporter;
use crate::logging;

/// Business model canvas evaluator backed by the Groq API.
#[derive(Parser)]
#[command(name = "canvas-forge")]
#[command(about = "Evaluate and optimize a business model canvas with an LLM prompt chain")]
#[command(version)]
#[command(
    long_about = "canvas-forge turns the nine blocks of a business model canvas into an initial \
analysis, a critique of that analysis, and an optimized canvas.\n\n\
Example usage:\n  canvas-forge run --input canvas.json --export combined\n  \
canvas-forge validate-key"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Env file loaded at start-up and receiving validated keys.
    #[arg(long, env = "CANVAS_ENV_FILE", default_value = ".env", global = true)]
    pub dotenv: PathBuf,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the build → critique → optimize chain on a canvas.
    #[command(alias = "eval")]
    Run(RunArgs),

    /// Check a Groq API key and save it to the env file.
    ValidateKey(ValidateKeyArgs),

    /// Print the canvas description sent to the model.
    Describe(DescribeArgs),

    /// Validate a canvas JSON file and save it as a timestamped snapshot.
    Export(ExportArgs),

    /// Print a canvas JSON skeleton.
    Template(TemplateArgs),

    /// List the canvas fields with their questions and guidance.
    Fields,

    /// Print the activity log.
    Logs(LogsArgs),
}

/// What `run` writes to disk after the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportMode {
    /// Nothing.
    #[default]
    #[value(name = "none")]
    Off,
    /// The canvas JSON only.
    Json,
    /// The canvas JSON plus a report with the three analyses.
    Combined,
}

/// Arguments for `canvas-forge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub canvas: CanvasArgs,

    /// Export after the run.
    #[arg(short = 'e', long, value_enum, default_value_t = ExportMode::Off)]
    pub export: ExportMode,

    /// Export directory (overrides CANVAS_EXPORT_DIR).
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Groq API key (overrides GROQ_API_KEY).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model for the chain steps (overrides CANVAS_CHAIN_MODEL).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Print model output as received, without line-break formatting.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for `canvas-forge validate-key`.
#[derive(Parser, Debug)]
pub struct ValidateKeyArgs {
    /// Key to check; read from stdin when omitted.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model for the check request (overrides CANVAS_VALIDATION_MODEL).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Check the key without writing it to the env file.
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for `canvas-forge describe`.
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub canvas: CanvasArgs,
}

/// Arguments for `canvas-forge export`.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Canvas JSON file to export.
    pub input: PathBuf,

    /// Export directory (overrides CANVAS_EXPORT_DIR).
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for `canvas-forge template`.
#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Fill the fields with example answers.
    #[arg(long)]
    pub examples: bool,
}

/// Arguments for `canvas-forge logs`.
#[derive(Parser, Debug)]
pub struct LogsArgs {
    /// Only print the last N lines.
    #[arg(short = 'n', long)]
    pub tail: Option<usize>,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to read global flags before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments, load configuration from the environment and run.
///
/// Does not install logging; use `parse_cli()` and `run_with_cli()` for that.
pub async fn run() -> anyhow::Result<()> {
    let cli = parse_cli();
    let config = AppConfig::from_env()?;
    run_with_cli(cli, config).await
}

/// Run the CLI with parsed arguments and loaded configuration.
pub async fn run_with_cli(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let mut config = config;
    config.env_file = cli.dotenv;

    match cli.command {
        Commands::Run(args) => run_chain_command(args, config).await,
        Commands::ValidateKey(args) => run_validate_key_command(args, config).await,
        Commands::Describe(args) => run_describe_command(args),
        Commands::Export(args) => run_export_command(args, config).await,
        Commands::Template(args) => run_template_command(args),
        Commands::Fields => run_fields_command(),
        Commands::Logs(args) => run_logs_command(args, config).await,
    }
}

// ============================================================================
// Run
// ============================================================================

async fn run_chain_command(args: RunArgs, config: AppConfig) -> anyhow::Result<()> {
    let mut config = config;
    if let Some(key) = args.api_key {
        config = config.with_api_key(key);
    }
    if let Some(model) = args.model {
        config = config.with_chain_model(model);
    }
    if let Some(dir) = args.output_dir {
        config = config.with_export_dir(dir);
    }
    config.validate()?;

    let canvas = collect_canvas(&args.canvas)?;
    if canvas.is_blank() {
        warn!("Evaluating an empty canvas");
        println!("Note: every canvas field is empty; the model only sees the labels.");
    }

    let client = Arc::new(config.groq_client()?);
    let runner = ChainRunner::new(client, config.chain_settings());

    println!("\n🔬 Business Model Evaluation");
    println!("============================");
    println!("Model: {}", config.chain_model);
    println!("Fields filled: {}/{}", canvas.filled_count(), CanvasField::ALL.len());

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx, io::stdout(), !args.raw));

    let mut session = SessionContext::new();
    let outcome = runner.run_with_events(&mut session, &canvas, tx).await;
    printer.await??;

    if let Err(ChainError::Configuration(reason)) = &outcome {
        anyhow::bail!(
            "Evaluation not started: {}. Run `canvas-forge validate-key`, set GROQ_API_KEY, \
             or pass --api-key.",
            reason
        );
    }

    if let Err(e) = &outcome {
        error!("Evaluation failed: {}", e);
        eprintln!("\n❌ Evaluation failed: {}", e);
    }

    let exporter = CanvasExporter::new(&config.export_dir);
    let exported = export_results(&exporter, args.export, &canvas, &session).await;
    finish_run(outcome, exported)
}

async fn export_results(
    exporter: &CanvasExporter,
    mode: ExportMode,
    canvas: &CanvasInput,
    session: &SessionContext,
) -> anyhow::Result<()> {
    match mode {
        ExportMode::Off => {}
        ExportMode::Json => {
            let path = exporter.save_json(canvas).await?;
            println!("\n✓ Saved canvas to {}", path.display());
        }
        ExportMode::Combined => {
            let paths = exporter.save_combined(canvas, session).await?;
            println!("\n✓ Saved canvas to {}", paths.json.display());
            println!("✓ Saved report to {}", paths.report.display());
        }
    }
    Ok(())
}

/// Picks the error `run` exits with. A chain failure outranks a later
/// export failure, which is only reported.
fn finish_run(outcome: ChainResult<()>, exported: anyhow::Result<()>) -> anyhow::Result<()> {
    match (outcome, exported) {
        (Ok(()), exported) => exported,
        (Err(chain), Ok(())) => Err(chain.into()),
        (Err(chain), Err(export)) => {
            warn!("Export after the failed evaluation also failed: {:#}", export);
            eprintln!("⚠ Export failed: {:#}", export);
            Err(chain.into())
        }
    }
}

// ============================================================================
// Key validation
// ============================================================================

async fn run_validate_key_command(args: ValidateKeyArgs, config: AppConfig) -> anyhow::Result<()> {
    let api_key = match args.api_key {
        Some(key) => key,
        None => {
            print!("Groq API key: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    let api_key = api_key.trim().to_string();

    let mut config = config.with_api_key(api_key.clone());
    if let Some(model) = args.model {
        config.validation_model = model;
    }

    let client = config.groq_client()?;
    match validate_api_key(&client, &config.validation_model).await {
        ValidationOutcome::Valid => {
            println!("✓ API key is valid");
            if args.no_save {
                return Ok(());
            }
            persist_api_key(&config.env_file, &api_key).await?;
            println!("✓ Saved to {}", config.env_file.display());
            Ok(())
        }
        ValidationOutcome::Empty => anyhow::bail!("No API key given"),
        ValidationOutcome::Rejected(reason) => anyhow::bail!("Invalid API key: {}", reason),
    }
}

// ============================================================================
// Canvas utilities
// ============================================================================

fn run_describe_command(args: DescribeArgs) -> anyhow::Result<()> {
    let canvas = collect_canvas(&args.canvas)?;
    println!("{}", canvas.describe());
    Ok(())
}

async fn run_export_command(args: ExportArgs, config: AppConfig) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input.display(), e))?;

    let dir = args.output_dir.unwrap_or(config.export_dir);
    let path = CanvasExporter::new(dir).save_json_text(&json).await?;
    info!(source = %args.input.display(), "Exported canvas file");
    println!("✓ Saved canvas to {}", path.display());
    Ok(())
}

fn run_template_command(args: TemplateArgs) -> anyhow::Result<()> {
    let canvas = if args.examples {
        CanvasInput::with_examples()
    } else {
        CanvasInput::new()
    };
    println!("{}", canvas.to_json_pretty()?);
    Ok(())
}

fn run_fields_command() -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_fields(&mut out)?;
    Ok(())
}

fn write_fields(out: &mut impl Write) -> io::Result<()> {
    for (idx, field) in CanvasField::ALL.iter().enumerate() {
        writeln!(out, "{}. {} (--{})", idx + 1, field.label(), field.id().replace('_', "-"))?;
        writeln!(out, "   {}", field.question())?;
        for line in field.help().lines() {
            writeln!(out, "   {}", line.trim())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

async fn run_logs_command(args: LogsArgs, config: AppConfig) -> anyhow::Result<()> {
    let content = logging::read_log(&config.log_file).await?;
    if content.is_empty() {
        println!("No log entries in {}", config.log_file.display());
        return Ok(());
    }
    print!("{}", tail_lines(&content, args.tail));
    Ok(())
}

fn tail_lines(content: &str, tail: Option<usize>) -> String {
    match tail {
        Some(n) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(n);
            let mut out = lines[start..].join("\n");
            if !out.is_empty() {
                out.push('\n');
            }
            out
        }
        None => content.to_string(),
    }
}
