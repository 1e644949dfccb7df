//! Analyse PGN to FEN benchmark logs.
//!
//! `summary` prints per-range accuracy for one log; `table` compares several
//! logs and writes Markdown and CSV tables to `results/`.

use std::fs;

use anyhow::Context;
use clap::{Parser, Subcommand};

use fen_core::record::load_experiments;
use fen_core::stats::{VerdictField, ANALYSIS_RANGES, TABLE_STRATA};
use pgn2fen_bench::config::BenchConfig;
use pgn2fen_bench::report::{format_analysis, results_table, to_csv, to_markdown};

#[derive(Parser, Debug)]
#[command(name = "analyse-logs", about = "Analyse PGN to FEN benchmark logs.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-range accuracy of a single model log.
    Summary {
        /// Name of the log in model_logs/ (without extension).
        #[arg(long)]
        input_file: String,

        /// Optional file in results/ to write the summary to.
        #[arg(long)]
        output_file: Option<String>,

        /// Print results to the console.
        #[arg(long)]
        print_to_console: bool,
    },
    /// Accuracy table across several model logs.
    Table {
        /// Names of logs in model_logs/ (without extension).
        #[arg(long, num_args = 1.., required = true)]
        input_files: Vec<String>,

        /// Evaluation columns, e.g. "full correctness" "piece placement".
        #[arg(long, num_args = 1.., default_values = ["full correctness", "piece placement"])]
        evaluation_cols: Vec<String>,

        /// Suffix appended to output file names.
        #[arg(long, default_value = "all")]
        output_suffix: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let config = BenchConfig::load()?;
    let logs_dir = config.project_root.join("model_logs");
    let results_dir = config.project_root.join("results");

    match Cli::parse().command {
        Command::Summary {
            input_file,
            output_file,
            print_to_console,
        } => {
            let path = logs_dir.join(format!("{input_file}.jsonl"));
            let records = load_experiments(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let text = format_analysis(&input_file, &records, &ANALYSIS_RANGES);

            if print_to_console {
                println!("{text}");
            }
            if let Some(output_file) = output_file {
                fs::create_dir_all(&results_dir)?;
                fs::write(results_dir.join(output_file), text)?;
            }
        }
        Command::Table {
            input_files,
            evaluation_cols,
            output_suffix,
        } => {
            let logs = input_files
                .iter()
                .map(|name| {
                    let path = logs_dir.join(format!("{name}.jsonl"));
                    load_experiments(&path).with_context(|| format!("reading {}", path.display()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            fs::create_dir_all(&results_dir)?;
            for column in &evaluation_cols {
                let field = VerdictField::from_name(column)
                    .with_context(|| format!("unknown evaluation column {column:?}"))?;
                let rows = results_table(&logs, field, &TABLE_STRATA);

                let stem = format!("{}_{output_suffix}", field.key());
                let markdown = to_markdown(&rows, &TABLE_STRATA);
                fs::write(results_dir.join(format!("{stem}.md")), &markdown)?;
                fs::write(results_dir.join(format!("{stem}.csv")), to_csv(&rows, &TABLE_STRATA))?;

                println!("{column}\n{markdown}");
            }
        }
    }

    Ok(())
}
