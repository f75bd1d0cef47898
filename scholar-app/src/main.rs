use anyhow::Result;
use clap::Parser;
use scholar_common::observability::{LogConfig, LogFormat, init_logging};
use scholar_config::{ScholarConfig, ScholarConfigLoader};
use std::path::PathBuf;
use wiring::{build_desk, initial_session};
mod wiring;

const DEFAULT_CONFIG: &str = "scholar.yaml";

/// Search Google Scholar for a topic, pick a paper and study it with
/// generated notes, flashcards and a practice quiz.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML config file. Without it `./scholar.yaml` is used when present.
    #[arg(short, long, env = "SCHOLAR_CONFIG")]
    config: Option<PathBuf>,

    /// Topic to start with instead of `study.default_topic`.
    #[arg(short, long)]
    topic: Option<String>,

    /// Log encoding: text or json.
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Directory for the daily log file.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env is optional; API keys may also come from the config file
    dotenv::dotenv().ok();

    // 1) Load config (env wins)
    let loader = match &args.config {
        Some(path) => ScholarConfigLoader::new().with_file(path),
        None => ScholarConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let cfg: ScholarConfig = loader.load()?;

    // 2) Logging goes to file only; the TUI owns the terminal
    let log_path = init_logging(LogConfig {
        app_name: "scholar",
        log_dir: args.log_dir.clone().or_else(|| cfg.logging.dir.clone()),
        emit_stderr: false,
        format: match args.log_format {
            Some(format) => format,
            None => cfg.logging.log_format()?,
        },
        default_filter: cfg
            .logging
            .filter
            .clone()
            .unwrap_or_else(|| "info".to_string()),
    })?;
    tracing::info!(log = %log_path.display(), "app.start");

    // 3) Wire clients into the desk and run
    let desk = build_desk(&cfg)?;
    let state = initial_session(&cfg, args.topic)?;
    let result = scholar_tui::run(desk, state).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "app.failed");
    }
    result
}
