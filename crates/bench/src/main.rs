//! PGN to FEN benchmark runner
//!
//! Asks a model to convert each truncated PGN into a FEN, scores the answer
//! against the replayed position and appends the result to a JSONL log.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use pgn2fen_bench::config::BenchConfig;
use pgn2fen_bench::experiment_log::ExperimentLog;
use pgn2fen_bench::provider::{self, Provider};
use pgn2fen_bench::runner::{self, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "run-benchmark", about = "Run PGN to FEN benchmark experiments.")]
struct Args {
    /// Provider name (google, openai, deepseek).
    #[arg(long, default_value = "google")]
    provider: Provider,

    /// Model name.
    #[arg(long, default_value = "gemini-2.5-pro-preview-03-25")]
    model: String,

    /// Thinking budget for the model (Gemini 2.5 only).
    #[arg(long)]
    thinking_budget: Option<u32>,

    /// Reprocess PGN files even if they were processed before.
    #[arg(long)]
    reprocess_pgns: bool,

    /// Start index for PGN files.
    #[arg(long, default_value_t = 0)]
    start_index: usize,

    /// End index for PGN files.
    #[arg(long, default_value_t = 1000)]
    end_index: usize,

    /// Print results to console.
    #[arg(long)]
    print_to_console: bool,

    /// Extract FEN from raw LLM output.
    #[arg(long)]
    extract_fen: bool,

    /// Maximum number of concurrent model calls.
    #[arg(long, env = "MAX_WORKERS", default_value_t = 5)]
    max_workers: usize,

    /// Directory containing PGN files, relative to the project root.
    #[arg(long, default_value = "data/WorldCup/truncated")]
    pgn_dir: PathBuf,

    /// Output JSONL file, relative to the project root.
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for API keys
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = BenchConfig::load()?;

    let pgn_dir = config.project_root.join(&args.pgn_dir);
    let log_path = match &args.output_file {
        Some(path) => config.project_root.join(path),
        None => runner::default_log_path(
            &config.project_root,
            args.provider,
            &args.model,
            args.thinking_budget,
        ),
    };

    let files = runner::pgn_paths(
        &pgn_dir,
        &log_path,
        args.start_index,
        args.end_index,
        args.reprocess_pgns,
    )?;
    println!("{} PGN files to process", files.len());

    let model = provider::connect(args.provider, &args.model, args.thinking_budget, &config)?;
    let log = Arc::new(ExperimentLog::open(&log_path).await?);
    info!(log = %log.path().display(), "Appending results");

    let options = RunOptions {
        print_to_console: args.print_to_console,
        extract_fen: args.extract_fen,
        max_workers: args.max_workers,
    };
    let summary =
        runner::run_experiment(files, model, Some(log), &options, &config.project_root).await?;

    info!(
        completed = summary.completed,
        failed = summary.failed,
        "Benchmark run finished"
    );
    Ok(())
}
