//! Harness configuration from environment variables

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::BenchError;
use crate::provider::Provider;

#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Directory that data paths and logged PGN paths are relative to
    pub project_root: PathBuf,

    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,

    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub deepseek_base_url: String,

    /// Per-request timeout for model calls
    pub request_timeout_secs: u64,

    /// Attempts before giving up on a rate-limited request
    pub max_attempts: u32,
}

impl BenchConfig {
    /// Load configuration from environment variables.
    /// Call `dotenvy::dotenv()` first to pick up a local `.env`.
    pub fn load() -> Result<Self, BenchError> {
        let project_root = match env::var("PGN2FEN_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => env::current_dir()?,
        };
        info!(project_root = %project_root.display(), "Resolved project root");

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);

        let max_attempts = env::var("MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(6);

        Ok(Self {
            project_root,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            deepseek_api_key: env::var("DEEPSEEK_API_KEY").ok(),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            deepseek_base_url: env::var("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com/v1".to_string()),
            request_timeout_secs,
            max_attempts,
        })
    }

    /// API key for `provider`, failing if it is not configured.
    pub fn api_key(&self, provider: Provider) -> Result<String, BenchError> {
        let (key, var) = match provider {
            Provider::Google => (&self.gemini_api_key, "GEMINI_API_KEY"),
            Provider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            Provider::DeepSeek => (&self.deepseek_api_key, "DEEPSEEK_API_KEY"),
        };
        key.clone()
            .ok_or_else(|| BenchError::Config(format!("{var} not set")))
    }

    /// Base URL of the API serving `provider`.
    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Google => &self.gemini_base_url,
            Provider::OpenAi => &self.openai_base_url,
            Provider::DeepSeek => &self.deepseek_base_url,
        }
    }
}
