//! Model provider clients.
//!
//! Each provider turns a PGN into the model's raw text answer. Rate-limited
//! requests are retried with exponential backoff; everything else is returned
//! to the caller as an error.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::future::retry;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::BenchConfig;
use crate::error::BenchError;

pub const PROMPT_TEMPLATE: &str = r#"## Task
Your task is to convert the provided PGN representation of a chess game into a FEN string.

## Instructions
1. Read the provided PGN text carefully.
2. Convert the PGN text into a FEN string.
3. Do not include any additional text, explanations, or backticks in your response. ONLY return the FEN string.
4. Do not use code to convert the PGN to FEN. Use your own knowledge and understanding of chess to perform the conversion.

For example, if the PGN text represented the starting position of a chess game, you would return the following and nothing else:
rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1

## Input
{pgn_text}"#;

/// OpenAI models served on the cheaper flex tier.
const OPENAI_FLEX_MODELS: [&str; 4] = ["o3", "o3-2025-04-16", "o4-mini", "o4-mini-2025-04-16"];

const TEMPERATURE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    OpenAi,
    DeepSeek,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "openai" => Ok(Provider::OpenAi),
            "deepseek" => Ok(Provider::DeepSeek),
            other => Err(BenchError::UnsupportedProvider(other.to_string())),
        }
    }
}

pub fn build_prompt(pgn_text: &str) -> String {
    PROMPT_TEMPLATE.replace("{pgn_text}", pgn_text)
}

/// A model that can be asked to convert a PGN into a FEN.
#[async_trait]
pub trait FenModel: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    /// Ask the model for a FEN and return its raw text answer.
    async fn generate(&self, pgn_text: &str) -> Result<String, BenchError>;
}

/// Build the client for `provider` serving `model`.
pub fn connect(
    provider: Provider,
    model: &str,
    thinking_budget: Option<u32>,
    config: &BenchConfig,
) -> Result<Arc<dyn FenModel>, BenchError> {
    let http = Client::builder()
        .user_agent("pgn2fen-bench/0.1")
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    let api_key = config.api_key(provider)?;
    let base_url = config.base_url(provider).trim_end_matches('/').to_string();

    let client: Arc<dyn FenModel> = match provider {
        Provider::Google => Arc::new(GeminiClient {
            http,
            api_key,
            base_url,
            model: model.to_string(),
            thinking_budget,
            max_attempts: config.max_attempts,
        }),
        Provider::OpenAi | Provider::DeepSeek => Arc::new(ChatCompletionsClient {
            http,
            provider,
            api_key,
            base_url,
            model: model.to_string(),
            max_attempts: config.max_attempts,
        }),
    };
    Ok(client)
}

/// Retry policy for rate-limited requests: jittered exponential delays
/// starting at 1s. Retries are bounded by attempt count, not elapsed time.
pub fn rate_limit_policy() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_secs(1))
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_secs(120))
        .with_max_elapsed_time(None)
        .build()
}

/// Run `op` until it succeeds, retrying only `BenchError::RateLimited`.
///
/// Gives up after `max_attempts` calls; any other error is returned at once.
pub async fn retry_rate_limited<T, Op, Fut>(
    provider: Provider,
    max_attempts: u32,
    policy: ExponentialBackoff,
    mut op: Op,
) -> Result<T, BenchError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BenchError>>,
{
    let calls = AtomicU32::new(0);

    retry(policy, || {
        let attempt = calls.fetch_add(1, Ordering::Relaxed) + 1;
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(BenchError::RateLimited { .. }) => {
                    let err = BenchError::RateLimited {
                        provider: provider.to_string(),
                        attempts: attempt,
                    };
                    if attempt < max_attempts {
                        warn!(%provider, attempt, "Rate limited, backing off");
                        Err(backoff::Error::transient(err))
                    } else {
                        Err(backoff::Error::permanent(err))
                    }
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}

/// Send a request, retrying on HTTP 429 per [`rate_limit_policy`].
async fn send_with_backoff<F>(
    provider: Provider,
    max_attempts: u32,
    build: F,
) -> Result<Value, BenchError>
where
    F: Fn() -> RequestBuilder,
{
    let build = &build;

    retry_rate_limited(provider, max_attempts, rate_limit_policy(), || async move {
        let resp = build().send().await?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BenchError::RateLimited {
                provider: provider.to_string(),
                attempts: 0,
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BenchError::Api {
                provider: provider.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok::<_, BenchError>(resp.json::<Value>().await?)
    })
    .await
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    thinking_budget: Option<u32>,
    max_attempts: u32,
}

/// Request body for Gemini. The thinking budget only applies to 2.5 models.
pub fn gemini_request(model: &str, prompt: &str, thinking_budget: Option<u32>) -> Value {
    let mut generation_config = json!({ "temperature": TEMPERATURE });
    if let Some(budget) = thinking_budget.filter(|_| model.contains("2.5")) {
        generation_config["thinkingConfig"] = json!({ "thinkingBudget": budget });
    }
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": generation_config,
    })
}

/// Concatenated answer text of the first Gemini candidate, thoughts excluded.
pub fn gemini_text(response: &Value) -> Result<String, BenchError> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| BenchError::Response {
            provider: Provider::Google.to_string(),
            detail: format!("no candidate parts in {response}"),
        })?;

    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Ok(text.trim().to_string())
}

#[async_trait]
impl FenModel for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, pgn_text: &str) -> Result<String, BenchError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = gemini_request(&self.model, &build_prompt(pgn_text), self.thinking_budget);

        let response = send_with_backoff(Provider::Google, self.max_attempts, || {
            self.http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;
        gemini_text(&response)
    }
}

/// OpenAI-compatible chat completions client, used for OpenAI and DeepSeek.
pub struct ChatCompletionsClient {
    http: Client,
    provider: Provider,
    api_key: String,
    base_url: String,
    model: String,
    max_attempts: u32,
}

pub fn chat_completions_request(model: &str, prompt: &str) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": TEMPERATURE,
    });
    if OPENAI_FLEX_MODELS.contains(&model) {
        body["service_tier"] = json!("flex");
    }
    body
}

pub fn chat_completions_text(provider: Provider, response: &Value) -> Result<String, BenchError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BenchError::Response {
            provider: provider.to_string(),
            detail: format!("no message content in {response}"),
        })
}

#[async_trait]
impl FenModel for ChatCompletionsClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, pgn_text: &str) -> Result<String, BenchError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = chat_completions_request(&self.model, &build_prompt(pgn_text));

        let response = send_with_backoff(self.provider, self.max_attempts, || {
            self.http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;
        chat_completions_text(self.provider, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("GOOGLE".parse::<Provider>().unwrap(), Provider::Google);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("DeepSeek".parse::<Provider>().unwrap(), Provider::DeepSeek);
        assert!(matches!(
            "huggingface".parse::<Provider>(),
            Err(BenchError::UnsupportedProvider(_))
        ));
        assert_eq!(Provider::DeepSeek.to_string(), "deepseek");
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("1. e4 *");
        assert!(prompt.starts_with("## Task"));
        assert!(prompt.ends_with("## Input\n1. e4 *"));
        assert!(!prompt.contains("{pgn_text}"));
    }

    #[test]
    fn test_gemini_thinking_budget_only_for_2_5() {
        let body = gemini_request("gemini-2.5-flash-preview-04-17", "p", Some(1024));
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 1024);
        assert_eq!(body["generationConfig"]["temperature"], 1.0);

        let body = gemini_request("gemini-2.0-flash-001", "p", Some(1024));
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
    }

    #[test]
    fn test_gemini_text_skips_thoughts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "thinking about it", "thought": true },
                { "text": "  8/8/8/8/8/8/8/8 w - - 0 1\n" }
            ]}}]
        });
        assert_eq!(gemini_text(&response).unwrap(), "8/8/8/8/8/8/8/8 w - - 0 1");
        assert!(gemini_text(&json!({ "candidates": [] })).is_err());
    }

    #[test]
    fn test_chat_completions_flex_tier() {
        let body = chat_completions_request("o3", "p");
        assert_eq!(body["service_tier"], "flex");
        let body = chat_completions_request("gpt-4.1-mini-2025-04-14", "p");
        assert!(body.get("service_tier").is_none());
        assert_eq!(body["messages"][0]["content"], "p");
    }

    fn quick_policy() -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(1))
            .with_max_interval(Duration::from_millis(5))
            .with_max_elapsed_time(None)
            .build()
    }

    fn rate_limited() -> BenchError {
        BenchError::RateLimited {
            provider: "google".to_string(),
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_rate_limits() {
        let calls = AtomicU32::new(0);
        let result = retry_rate_limited(Provider::Google, 6, quick_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(rate_limited())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_rate_limited(Provider::OpenAi, 4, quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        match result {
            Err(BenchError::RateLimited { provider, attempts }) => {
                assert_eq!(provider, "openai");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_other_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_rate_limited(Provider::DeepSeek, 6, quick_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(BenchError::Api {
                    provider: "deepseek".to_string(),
                    status: 500,
                    body: "boom".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(BenchError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chat_completions_text() {
        let response = json!({ "choices": [{ "message": { "content": "answer" } }] });
        assert_eq!(chat_completions_text(Provider::OpenAi, &response).unwrap(), "answer");
        assert!(chat_completions_text(Provider::DeepSeek, &json!({})).is_err());
    }
}
