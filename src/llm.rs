//! LLM client that asks for grammar pointers on German text
//!
//! Supports Claude (Anthropic) and OpenAI APIs. The model answers with a JSON
//! array of `{"Satz", "Satzteil", "Fehler"}` records which are parsed into
//! [`AnnotationRow`]s.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, Credential};
use crate::error::CheckError;
use crate::grouper::AnnotationRow;

/// Something that turns a prompt into completion text
pub trait CompletionModel {
    fn complete(
        &self,
        prompt: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<String, CheckError>> + Send;
}

/// LLM client for making API requests
pub struct LlmClient {
    client: Client,
    config: Config,
}

// Claude API types
#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageResponse,
}

#[derive(Deserialize)]
struct OpenAiMessageResponse {
    content: String,
}

// One record of the model's answer
#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "Satz", default)]
    sentence: Option<Value>,
    #[serde(rename = "Satzteil", default)]
    substring: Option<Value>,
    #[serde(rename = "Fehler", default)]
    category: Option<Value>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if LLM integration is available
    pub fn is_available(&self) -> bool {
        self.config.is_llm_enabled()
    }

    /// Call Claude API
    async fn call_claude(&self, prompt: &str, credential: &Credential) -> Result<String, CheckError> {
        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        let request = ClaudeRequest {
            model: self.config.get_model(),
            max_tokens: self.config.llm.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", base_url))
            .header("x-api-key", credential.api_key())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckError::Api {
                provider: "Claude",
                status,
                body,
            });
        }

        let claude_response: ClaudeResponse = response.json().await?;
        claude_response
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or(CheckError::EmptyResponse("Claude"))
    }

    /// Call OpenAI API
    async fn call_openai(&self, prompt: &str, credential: &Credential) -> Result<String, CheckError> {
        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let request = OpenAiRequest {
            model: self.config.get_model(),
            max_tokens: self.config.llm.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", base_url))
            .header("Authorization", format!("Bearer {}", credential.api_key()))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckError::Api {
                provider: "OpenAI",
                status,
                body,
            });
        }

        let openai_response: OpenAiResponse = response.json().await?;
        openai_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(CheckError::EmptyResponse("OpenAI"))
    }
}

impl CompletionModel for LlmClient {
    async fn complete(&self, prompt: &str, credential: &Credential) -> Result<String, CheckError> {
        tracing::debug!(
            "Requesting completion from {} ({} chars)",
            self.config.llm.provider,
            prompt.chars().count()
        );

        match self.config.llm.provider.as_str() {
            "claude" => self.call_claude(prompt, credential).await,
            "openai" => self.call_openai(prompt, credential).await,
            "none" => Err(CheckError::NotConfigured("no provider selected".to_string())),
            other => Err(CheckError::NotConfigured(format!("unknown provider: {}", other))),
        }
    }
}

/// Build the prompt for checking `text`
pub fn build_prompt(template: &str, text: &str) -> String {
    format!("{} Text to check: {}", template, text)
}

/// Parse the model's answer into annotation rows.
///
/// Missing or `null` fields read as empty strings. Records where every field
/// is missing or `null` are dropped.
pub fn parse_annotations(response: &str) -> Result<Vec<AnnotationRow>, CheckError> {
    let json_str = extract_json_array(response).ok_or_else(|| CheckError::InvalidResponse {
        reason: "no JSON array found".to_string(),
    })?;

    let records: Vec<RawRecord> =
        serde_json::from_str(json_str).map_err(|e| CheckError::InvalidResponse {
            reason: e.to_string(),
        })?;

    let total = records.len();
    let rows: Vec<AnnotationRow> = records
        .into_iter()
        .filter(|r| !(is_missing(&r.sentence) && is_missing(&r.substring) && is_missing(&r.category)))
        .map(|r| {
            AnnotationRow::new(
                field_text(r.sentence),
                field_text(r.substring),
                &field_text(r.category),
            )
        })
        .collect();

    if rows.len() < total {
        tracing::debug!("Dropped {} empty records", total - rows.len());
    }

    Ok(rows)
}

fn is_missing(value: &Option<Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn field_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

/// Extract a JSON array from a possibly wrapped response
fn extract_json_array(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    // Try to find JSON in code blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return Some(trimmed[json_start..json_start + end].trim());
        }
    }

    // Try to find any JSON array
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    (start < end).then(|| &trimmed[start..=end])
}
