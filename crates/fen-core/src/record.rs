//! Experiment records and their JSONL log format.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoding::ComparisonVerdict;
use crate::error::FenError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub datetime: String,
    pub input_pgn_file: String,
    pub input_fen: String,
    pub number_of_halfmoves: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ModelInfoRepr")]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
    pub llm_raw_text: String,
    pub llm_fen: Option<String>,
}

/// On-disk shape of [`ModelInfo`]; older logs lack `llm_raw_text`.
#[derive(Deserialize)]
struct ModelInfoRepr {
    provider: String,
    model: String,
    #[serde(default)]
    llm_raw_text: Option<String>,
    llm_fen: Option<String>,
}

impl From<ModelInfoRepr> for ModelInfo {
    fn from(repr: ModelInfoRepr) -> Self {
        let llm_raw_text = repr
            .llm_raw_text
            .or_else(|| repr.llm_fen.clone())
            .unwrap_or_default();
        Self {
            provider: repr.provider,
            model: repr.model,
            llm_raw_text,
            llm_fen: repr.llm_fen,
        }
    }
}

/// One model invocation on one game, as written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub game_info: GameInfo,
    #[serde(rename = "llm_info")]
    pub model_info: ModelInfo,
    pub evaluation: ComparisonVerdict,
}

impl ExperimentRecord {
    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for ExperimentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results for {}:", self.game_info.input_pgn_file)?;
        writeln!(f, "    Original FEN : {}", self.game_info.input_fen)?;
        writeln!(
            f,
            "    LLM FEN      : {}",
            self.model_info.llm_fen.as_deref().unwrap_or("None")
        )?;
        let verdict = self.evaluation.to_string();
        let mut lines = verdict.lines().peekable();
        while let Some(line) = lines.next() {
            write!(f, "    {line}")?;
            if lines.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Read records from a JSONL stream, skipping blank lines.
pub fn read_experiments<R: BufRead>(reader: R) -> Result<Vec<ExperimentRecord>, FenError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| FenError::Record {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load all records from a JSONL log file.
pub fn load_experiments(path: impl AsRef<Path>) -> Result<Vec<ExperimentRecord>, FenError> {
    let file = File::open(path)?;
    read_experiments(BufReader::new(file))
}
