//! Error types for FEN parsing, comparison and record decoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FenError {
    /// Token count or trailing integer fields are unusable.
    #[error("Format error: {0}")]
    Format(String),

    /// A caller handed over a malformed ground truth.
    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("PGN error: {0}")]
    Pgn(String),

    #[error("Invalid experiment record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
