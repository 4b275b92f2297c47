use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::prompt::{SYSTEM_PROMPT, build_match_prompt};
use super::{FitScorer, ScoreCard, ScoringError};
use crate::{Idea, MentorProfile};

const MAX_ERROR_BODY_LEN: usize = 512;

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRuntimeConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl Default for LlmRuntimeConfig {
    fn default() -> Self {
        let (model, endpoint) = provider_defaults("gateway");
        Self {
            provider: "gateway".into(),
            model,
            endpoint,
            api_key: String::new(),
            timeout_secs: 30,
            temperature: None,
        }
    }
}

fn provider_defaults(provider: &str) -> (String, String) {
    match provider.to_ascii_lowercase().as_str() {
        "openai" => (
            "gpt-4o-mini".into(),
            "https://api.openai.com/v1/chat/completions".into(),
        ),
        "openrouter" => (
            "google/gemini-2.5-flash".into(),
            "https://openrouter.ai/api/v1/chat/completions".into(),
        ),
        "mistral" => (
            "mistral-large-latest".into(),
            "https://api.mistral.ai/v1/chat/completions".into(),
        ),
        _ => (
            "google/gemini-2.5-flash".into(),
            "https://ai.gateway.lovable.dev/v1/chat/completions".into(),
        ),
    }
}

/// Set and not just whitespace.
fn non_blank_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn provider_api_key(provider: &str) -> Option<String> {
    let key = match provider.to_ascii_lowercase().as_str() {
        "openai" => "OPENAI_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        "mistral" => "MISTRAL_API_KEY",
        _ => "LOVABLE_API_KEY",
    };
    non_blank_var(key)
}

impl LlmRuntimeConfig {
    pub fn from_env() -> Self {
        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        }

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gateway".into());
        let (default_model, default_endpoint) = provider_defaults(&provider);
        let api_key = non_blank_var("LLM_API_KEY")
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        Self {
            provider,
            model: std::env::var("LLM_MODEL").unwrap_or(default_model),
            endpoint: std::env::var("LLM_ENDPOINT").unwrap_or(default_endpoint),
            api_key,
            timeout_secs: parse_u64("LLM_TIMEOUT_SECONDS", 30),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|raw| raw.parse::<f32>().ok()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_LEN {
        let mut cut = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Scores candidates through a chat-completions endpoint, one request per pair.
pub struct ChatCompletionScorer {
    client: Client,
    config: LlmRuntimeConfig,
}

impl ChatCompletionScorer {
    pub fn new(config: LlmRuntimeConfig) -> Result<Self, ScoringError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmRuntimeConfig {
        &self.config
    }
}

#[async_trait]
impl FitScorer for ChatCompletionScorer {
    fn name(&self) -> &'static str {
        "chat_completions"
    }

    #[instrument(skip_all, fields(mentor_id = %mentor.user_id, model = %self.config.model))]
    async fn score(&self, idea: &Idea, mentor: &MentorProfile) -> Result<ScoreCard, ScoringError> {
        let prompt = build_match_prompt(idea, mentor);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| ScoringError::Malformed(err.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScoringError::Malformed("completion carried no message content".into()))?;

        debug!(content_len = content.len(), "received scoring completion");
        ScoreCard::parse(&content)
    }
}
