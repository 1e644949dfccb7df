//! Benchmark runner: one model call per PGN file, bounded concurrency.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use fen_core::pgn::final_position;
use fen_core::record::load_experiments;
use fen_core::validate::extract_encoding;
use fen_core::{evaluate, ExperimentRecord, GameInfo, ModelInfo};

use crate::error::BenchError;
use crate::experiment_log::ExperimentLog;
use crate::provider::{FenModel, Provider};

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Print each record summary to stdout
    pub print_to_console: bool,
    /// Look for a FEN inside prose answers instead of requiring a bare FEN
    pub extract_fen: bool,
    /// Concurrent model calls
    pub max_workers: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Log file used when none is given: `model_logs/<provider>_<model>[_think<N>].jsonl`.
pub fn default_log_path(
    project_root: &Path,
    provider: Provider,
    model: &str,
    thinking_budget: Option<u32>,
) -> PathBuf {
    let think = thinking_budget
        .map(|b| format!("_think{b}"))
        .unwrap_or_default();
    project_root
        .join("model_logs")
        .join(format!("{provider}_{model}{think}.jsonl"))
}

/// Sorted `*.pgn` files in `pgn_dir`, sliced to `[start, end)`.
///
/// Unless `reprocess` is set, files already present in `log_path` are skipped.
pub fn pgn_paths(
    pgn_dir: &Path,
    log_path: &Path,
    start: usize,
    end: usize,
    reprocess: bool,
) -> Result<Vec<PathBuf>, BenchError> {
    let pattern = pgn_dir.join("*.pgn");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|p| p.ok())
        .collect();
    files.sort();

    let end = end.min(files.len());
    let start = start.min(end);
    let mut files = files[start..end].to_vec();

    if !reprocess && log_path.exists() {
        let previous = load_experiments(log_path)?;
        let before = files.len();
        files.retain(|file| {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            !previous
                .iter()
                .any(|r| r.game_info.input_pgn_file.ends_with(&name))
        });
        info!(skipped = before - files.len(), "Skipping already processed PGN files");
    }

    Ok(files)
}

/// Run one model on one PGN file and evaluate its answer.
pub async fn process_single_pgn(
    pgn_file: &Path,
    model: &dyn FenModel,
    extract_fen: bool,
    project_root: &Path,
) -> Result<ExperimentRecord, BenchError> {
    let pgn_text = tokio::fs::read_to_string(pgn_file).await?;
    let truth = final_position(&pgn_text)?;

    let llm_raw_text = model
        .generate(&pgn_text)
        .await
        .map_err(|e| BenchError::Invocation {
            provider: model.provider().to_string(),
            model: model.model().to_string(),
            file: pgn_file.display().to_string(),
            source: Box::new(e),
        })?;

    let llm_fen = extract_encoding(&llm_raw_text, extract_fen);
    let evaluation = evaluate(&truth.fen, llm_fen.as_deref());

    let input_pgn_file = pgn_file
        .strip_prefix(project_root)
        .unwrap_or(pgn_file)
        .display()
        .to_string();

    Ok(ExperimentRecord {
        game_info: GameInfo {
            datetime: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%d %H:%M:%S%.6f")
                .to_string(),
            input_pgn_file,
            input_fen: truth.fen,
            number_of_halfmoves: truth.halfmoves,
        },
        model_info: ModelInfo {
            provider: model.provider().to_string(),
            model: model.model().to_string(),
            llm_raw_text,
            llm_fen,
        },
        evaluation,
    })
}

/// Process `files` with at most `options.max_workers` calls in flight.
///
/// A file that fails is logged and counted; it does not stop the others.
pub async fn run_experiment(
    files: Vec<PathBuf>,
    model: Arc<dyn FenModel>,
    log: Option<Arc<ExperimentLog>>,
    options: &RunOptions,
    project_root: &Path,
) -> Result<RunSummary, BenchError> {
    let total = files.len();
    let semaphore = Arc::new(Semaphore::new(options.max_workers.max(1)));
    let mut handles = Vec::with_capacity(total);

    info!(
        total,
        provider = %model.provider(),
        model = model.model(),
        max_workers = options.max_workers,
        "Starting benchmark run"
    );

    for pgn_file in files {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BenchError::Config(format!("worker pool closed: {e}")))?;
        let model = model.clone();
        let log = log.clone();
        let project_root = project_root.to_path_buf();
        let options = options.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit; // Hold until done
            let record =
                process_single_pgn(&pgn_file, model.as_ref(), options.extract_fen, &project_root)
                    .await?;

            if options.print_to_console {
                println!("{record}\n");
            }
            if let Some(log) = log {
                log.append(&record).await?;
            }
            Ok::<_, BenchError>(record)
        }));
    }

    let mut summary = RunSummary::default();
    for handle in handles {
        match handle.await {
            Ok(Ok(record)) => {
                summary.completed += 1;
                info!(
                    file = %record.game_info.input_pgn_file,
                    correct = record.evaluation.full_correctness,
                    done = summary.completed,
                    total,
                    "Processed PGN"
                );
            }
            Ok(Err(e)) => {
                summary.failed += 1;
                error!(error = %e, "PGN processing failed");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(error = %e, "Worker task aborted");
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedModel {
        answer: Option<String>,
    }

    #[async_trait]
    impl FenModel for FixedModel {
        fn provider(&self) -> Provider {
            Provider::OpenAi
        }

        fn model(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _pgn_text: &str) -> Result<String, BenchError> {
            self.answer.clone().ok_or_else(|| BenchError::Api {
                provider: "openai".to_string(),
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_default_log_path() {
        let root = Path::new("/bench");
        assert_eq!(
            default_log_path(root, Provider::Google, "gemini-2.5-pro", Some(512)),
            PathBuf::from("/bench/model_logs/google_gemini-2.5-pro_think512.jsonl")
        );
        assert_eq!(
            default_log_path(root, Provider::OpenAi, "o3", None),
            PathBuf::from("/bench/model_logs/openai_o3.jsonl")
        );
    }

    #[tokio::test]
    async fn test_process_single_pgn_extracts_from_prose() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let pgn = root.join("halfmoves0001_001.pgn");
        std::fs::write(&pgn, "[Event \"?\"]\n\n1. e4 *\n").unwrap();

        let model = FixedModel {
            answer: Some(
                "Sure: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string(),
            ),
        };
        let record = process_single_pgn(&pgn, &model, true, root).await.unwrap();

        assert_eq!(record.game_info.input_pgn_file, "halfmoves0001_001.pgn");
        assert_eq!(record.game_info.number_of_halfmoves, 1);
        assert_eq!(
            record.model_info.llm_fen.as_deref(),
            Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
        );
        assert!(record.evaluation.full_correctness);

        let record = process_single_pgn(&pgn, &model, false, root).await.unwrap();
        assert_eq!(record.model_info.llm_fen, None);
        assert!(!record.evaluation.piece_placement);

    }

    #[tokio::test]
    async fn test_process_single_pgn_wraps_provider_errors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let pgn = root.join("game.pgn");
        std::fs::write(&pgn, "1. d4 *\n").unwrap();

        let err = process_single_pgn(&pgn, &FixedModel { answer: None }, false, root)
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Invocation { .. }));
        assert!(err.to_string().starts_with("Error calling openai_fixed for "));

    }

    #[tokio::test]
    async fn test_run_experiment_logs_and_skips_processed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let pgn_dir = root.join("truncated");
        std::fs::create_dir_all(&pgn_dir).unwrap();
        for (idx, moves) in ["1. e4 *", "1. e4 e5 *", "1. e4 e5 2. Qh5 *"].iter().enumerate() {
            std::fs::write(pgn_dir.join(format!("g{idx}.pgn")), moves).unwrap();
        }
        std::fs::write(pgn_dir.join("broken.pgn"), "1. e5 *").unwrap();

        let log_path = root.join("model_logs").join("openai_fixed.jsonl");
        let files = pgn_paths(&pgn_dir, &log_path, 0, 1000, false).unwrap();
        assert_eq!(files.len(), 4);

        let log = Arc::new(ExperimentLog::open(&log_path).await.unwrap());
        let model: Arc<dyn FenModel> = Arc::new(FixedModel {
            answer: Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string()),
        });
        let options = RunOptions {
            print_to_console: false,
            extract_fen: false,
            max_workers: 2,
        };

        let summary = run_experiment(files, model, Some(log), &options, root)
            .await
            .unwrap();
        assert_eq!(summary, RunSummary { completed: 3, failed: 1 });

        let records = load_experiments(&log_path).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.evaluation.full_correctness));

        let remaining = pgn_paths(&pgn_dir, &log_path, 0, 1000, false).unwrap();
        assert_eq!(remaining, vec![pgn_dir.join("broken.pgn")]);
        assert_eq!(pgn_paths(&pgn_dir, &log_path, 0, 1000, true).unwrap().len(), 4);
        assert_eq!(pgn_paths(&pgn_dir, &log_path, 1, 3, true).unwrap().len(), 2);

    }
}
