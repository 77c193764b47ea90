//! canvas-forge CLI entry point.
//!
//! Loads the env file, initializes logging and delegates to the CLI module.

use canvas_forge::config::AppConfig;
use canvas_forge::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = canvas_forge::cli::parse_cli();

    // Values already in the process environment win over the env file.
    let dotenv_result = dotenvy::from_path(&cli.dotenv);

    let config = AppConfig::from_env()?;

    let log_file = match logging::open_log_file(&config.log_file) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("warning: {}; logging to stderr only", e);
            None
        }
    };
    // Priority: RUST_LOG env var > --log-level CLI arg > default "info"
    logging::init(&cli.log_level, log_file)?;

    if let Err(e) = dotenv_result {
        if !e.not_found() {
            tracing::warn!("Failed to load {}: {}", cli.dotenv.display(), e);
        }
    }

    canvas_forge::cli::run_with_cli(cli, config).await
}
