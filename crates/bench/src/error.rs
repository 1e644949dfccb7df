//! Benchmark harness error types

use thiserror::Error;

use fen_core::FenError;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Rate limited by {provider} after {attempts} attempts")]
    RateLimited { provider: String, attempts: u32 },

    #[error("{provider} API error: HTTP {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {provider}: {detail}")]
    Response { provider: String, detail: String },

    #[error("Error calling {provider}_{model} for {file}: {source}")]
    Invocation {
        provider: String,
        model: String,
        file: String,
        #[source]
        source: Box<BenchError>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FEN error: {0}")]
    Fen(#[from] FenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::PatternError),
}
