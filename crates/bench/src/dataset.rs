//! Benchmark dataset preparation: split PGN collections and truncate games.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use fen_core::pgn::{split_games, truncate_game};

use crate::error::BenchError;

/// Headers removed from truncated games.
pub const HEADERS_TO_DELETE: [&str; 9] = [
    "WhiteTitle",
    "BlackTitle",
    "ECO",
    "Opening",
    "Variation",
    "WhiteFideId",
    "BlackFideId",
    "EventDate",
    "EventType",
];

/// Remove `dir` if present and create it empty.
pub fn reset_dir(dir: &Path) -> Result<(), BenchError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn pgn_files(dir: &Path) -> Result<Vec<PathBuf>, BenchError> {
    let pattern = dir.join("*.pgn");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|p| p.ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Split one multi-game file into `<stem>_<n>.pgn` files in `output_dir`.
pub fn split_pgn_file(input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, BenchError> {
    let contents = fs::read_to_string(input)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut written = Vec::new();
    for (idx, game) in split_games(&contents).iter().enumerate() {
        let path = output_dir.join(format!("{stem}_{}.pgn", idx + 1));
        fs::write(&path, game)?;
        written.push(path);
    }
    Ok(written)
}

/// Split every `*.pgn` in `pgn_dir` into single-game files under `output_dir`.
pub fn split_pgn_dir(pgn_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, BenchError> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    for file in pgn_files(pgn_dir)? {
        let games = split_pgn_file(&file, output_dir)?;
        info!(file = %file.display(), games = games.len(), "Split PGN file");
        written.extend(games);
    }
    written.sort();
    Ok(written)
}

/// Write `target_per_halfmove` truncated games for every length `1..=max_halfmoves`.
///
/// Games are drawn round-robin from `input_files`; games that are too short
/// are skipped. A length is abandoned once a full pass over the inputs yields
/// nothing. Returns the number of files written.
pub fn generate_truncated_pgns(
    input_files: &[PathBuf],
    truncated_dir: &Path,
    headers_to_delete: &[&str],
    max_halfmoves: usize,
    target_per_halfmove: usize,
) -> Result<usize, BenchError> {
    if input_files.is_empty() {
        return Err(BenchError::Config("no PGN files to truncate".to_string()));
    }
    fs::create_dir_all(truncated_dir)?;

    let mut total = 0;
    for halfmoves in 1..=max_halfmoves {
        let mut generated = 0;
        let mut input_idx = 0;
        let mut misses = 0;

        while generated < target_per_halfmove {
            if misses >= input_files.len() {
                warn!(halfmoves, generated, "Not enough long games, moving on");
                break;
            }

            let pgn_path = &input_files[input_idx % input_files.len()];
            input_idx += 1;

            let pgn = fs::read_to_string(pgn_path)?;
            let truncated = match truncate_game(&pgn, halfmoves, headers_to_delete) {
                Ok(Some(game)) => game,
                Ok(None) => {
                    misses += 1;
                    continue;
                }
                Err(e) => {
                    warn!(file = %pgn_path.display(), error = %e, "Skipping unreadable game");
                    misses += 1;
                    continue;
                }
            };
            misses = 0;

            let name = format!("halfmoves{halfmoves:04}_{:03}.pgn", generated + 1);
            fs::write(truncated_dir.join(name), truncated)?;
            generated += 1;
        }
        total += generated;
    }

    info!(total, dir = %truncated_dir.display(), "Generated truncated PGNs");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use fen_core::pgn::final_position;

    use super::*;

    #[test]
    fn test_split_and_truncate() {
        let root = tempfile::tempdir().unwrap();
        let pgn_dir = root.path().join("WorldCup");
        fs::create_dir_all(&pgn_dir).unwrap();
        fs::write(
            pgn_dir.join("round1.pgn"),
            "[Event \"R1\"]\n[ECO \"B00\"]\n[Result \"1-0\"]\n\n1. e4 d5 2. exd5 1-0\n\n\
             [Event \"R1\"]\n[Result \"0-1\"]\n\n1. d4 0-1\n",
        )
        .unwrap();

        let split_dir = pgn_dir.join("split");
        let truncated_dir = pgn_dir.join("truncated");
        reset_dir(&split_dir).unwrap();
        reset_dir(&truncated_dir).unwrap();

        let games = split_pgn_dir(&pgn_dir, &split_dir).unwrap();
        assert_eq!(
            games,
            vec![split_dir.join("round1_1.pgn"), split_dir.join("round1_2.pgn")]
        );

        let written =
            generate_truncated_pgns(&games, &truncated_dir, &HEADERS_TO_DELETE, 3, 2).unwrap();
        // Two games reach one halfmove; only the first reaches two and three.
        assert_eq!(written, 2 + 2 + 2);

        let first = fs::read_to_string(truncated_dir.join("halfmoves0001_002.pgn")).unwrap();
        assert!(first.contains("[Result \"*\"]"));
        assert!(first.contains("1. d4 *"));

        let third = fs::read_to_string(truncated_dir.join("halfmoves0003_001.pgn")).unwrap();
        assert!(!third.contains("ECO"));
        assert_eq!(final_position(&third).unwrap().halfmoves, 3);
    }

    #[test]
    fn test_gives_up_without_long_games() {
        let root = tempfile::tempdir().unwrap();
        let game = root.path().join("short.pgn");
        fs::write(&game, "1. e4 *\n").unwrap();

        let written =
            generate_truncated_pgns(&[game], &root.path().join("out"), &[], 2, 3).unwrap();
        assert_eq!(written, 3);
    }
}
