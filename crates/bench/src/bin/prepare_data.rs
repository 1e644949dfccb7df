//! Prepare benchmark data by splitting and truncating PGN files.
//!
//! Usage: cargo run --release --bin prepare-data -- [--pgn-dir data/WorldCup]

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use pgn2fen_bench::config::BenchConfig;
use pgn2fen_bench::dataset::{
    generate_truncated_pgns, reset_dir, split_pgn_dir, HEADERS_TO_DELETE,
};

#[derive(Parser, Debug)]
#[command(name = "prepare-data", about = "Split and truncate PGN files for the benchmark.")]
struct Args {
    /// Directory with the source PGN collections, relative to the project root.
    #[arg(long, default_value = "data/WorldCup")]
    pgn_dir: PathBuf,

    /// Longest truncation, in halfmoves.
    #[arg(long, default_value_t = 100)]
    max_halfmoves: usize,

    /// Truncated games written per halfmove count.
    #[arg(long, default_value_t = 10)]
    target_per_halfmove: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = BenchConfig::load()?;

    let pgn_dir = config.project_root.join(&args.pgn_dir);
    let split_dir = pgn_dir.join("split");
    let truncated_dir = pgn_dir.join("truncated");

    reset_dir(&split_dir)?;
    reset_dir(&truncated_dir)?;

    let games = split_pgn_dir(&pgn_dir, &split_dir)?;
    if games.is_empty() {
        anyhow::bail!("No PGN files found in {}", pgn_dir.display());
    }
    info!(games = games.len(), "Split games");

    let written = generate_truncated_pgns(
        &games,
        &truncated_dir,
        &HEADERS_TO_DELETE,
        args.max_halfmoves,
        args.target_per_halfmove,
    )?;
    println!("Wrote {written} truncated games to {}", truncated_dir.display());
    Ok(())
}
