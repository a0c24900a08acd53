//! LLM backend trait and concrete implementations.
//!
//! Two wire formats cover every provider: OpenAI-style chat completions
//! (OpenAI itself, Ollama and compatible servers) and the Anthropic
//! Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),
}

impl LlmError {
    /// Whether another backend might succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Unavailable(_) | LlmError::EmptyCompletion(_) => true,
            LlmError::ApiError { status, .. } => *status == 429 || *status >= 500,
            LlmError::Serde(_) => false,
        }
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, ..Default::default() }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── OpenAI wire helpers ──────────────────────────────────────────────────────

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;

fn openai_chat_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    serde_json::json!({
        "model":       req.model.as_deref().unwrap_or(default_model),
        "messages":    req.messages,
        "max_tokens":  req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "temperature": req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    })
}

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> Result<LlmResponse, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();
    if content.is_empty() {
        return Err(LlmError::EmptyCompletion(fallback_model.to_string()));
    }
    Ok(LlmResponse {
        content,
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    })
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

// ── Chat completions (Ollama, OpenAI, compatible) ───────────────────────────

const OPENAI_URL: &str = "https://api.openai.com";

/// Any endpoint speaking `POST {base}/v1/chat/completions`.
pub struct ChatCompletionsBackend {
    endpoint: String,
    pub model: String,
    api_key: Option<String>,
    local: bool,
    client: reqwest::Client,
}

impl ChatCompletionsBackend {
    fn build(base_url: &str, model: String, api_key: Option<String>, local: bool) -> Self {
        Self {
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            model,
            api_key,
            local,
            client: reqwest::Client::new(),
        }
    }

    /// A local Ollama server.
    pub fn ollama(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::build(&base_url.into(), model.into(), None, true)
    }

    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::build(OPENAI_URL, model.into(), Some(api_key.into()), false)
    }

    /// LMStudio, vLLM, OpenRouter, Groq and the like.
    pub fn compatible(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self::build(&base_url.into(), model.into(), api_key, false)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmBackend for ChatCompletionsBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut builder = self.client.post(&self.endpoint).json(&openai_chat_body(&req, &self.model));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = match builder.send().await {
            Ok(resp) => resp,
            // A local server that is not running is reported as unavailable.
            Err(e) if self.local && e.is_connect() => {
                return Err(LlmError::Unavailable(format!("{}: {}", self.endpoint, e)));
            }
            Err(e) => return Err(e.into()),
        };
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { self.local }
}

// ── Anthropic ──────────────────────────────────────────────────────────────

pub struct AnthropicBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), model: model.into(), client: reqwest::Client::new() }
    }

    /// Messages API body: all system messages are folded into `system`.
    fn body(&self, req: &LlmRequest) -> serde_json::Value {
        let system = req.messages.iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    messages,
            "max_tokens":  req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system);
        }
        body
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = self.body(&req);
        let resp = self.client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let json = check_response_status(resp).await?;

        let content = json["content"]
            .as_array()
            .map(|blocks| {
                blocks.iter()
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LlmError::EmptyCompletion(self.model.clone()));
        }

        Ok(LlmResponse {
            content,
            model: json["model"].as_str().unwrap_or(&self.model).to_string(),
            prompt_tokens:     json["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ollama_is_local() {
        let b = ChatCompletionsBackend::ollama("http://localhost:11434/", "llama3:8b");
        assert!(b.is_local());
        assert_eq!(b.model_id(), "llama3:8b");
        assert_eq!(b.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_remote_backends_are_not_local() {
        let openai = ChatCompletionsBackend::openai("sk-test", "gpt-4o-mini");
        assert!(!openai.is_local());
        assert_eq!(openai.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert!(!AnthropicBackend::new("sk-ant-test", "claude-sonnet-4-5").is_local());
        assert!(!ChatCompletionsBackend::compatible("http://localhost:1234", "local", None).is_local());
    }

    #[test]
    fn test_openai_body_uses_request_model_override() {
        let req = LlmRequest {
            messages: vec![Message::user("hi")],
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        let body = openai_chat_body(&req, "gpt-4o-mini");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_parse_openai_response() {
        let json = serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Aspirin inhibits COX-1."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 6}
        });
        let resp = parse_openai_response(&json, "fallback").unwrap();
        assert_eq!(resp.content, "Aspirin inhibits COX-1.");
        assert_eq!(resp.prompt_tokens, 12);
    }

    #[test]
    fn test_empty_choice_is_an_error() {
        let json = serde_json::json!({"choices": []});
        let err = parse_openai_response(&json, "m").unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion(_)));
    }

    #[test]
    fn test_anthropic_body_folds_system_messages() {
        let b = AnthropicBackend::new("k", "claude-sonnet-4-5");
        let req = LlmRequest::new(vec![
            Message::system("extract"),
            Message::user("dock aspirin on PTGS1"),
            Message::system("data"),
        ]);
        let body = b.body(&req);
        assert_eq!(body["system"], "extract\n\ndata");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::ApiError { status: 503, message: String::new() }.is_retryable());
        assert!(LlmError::ApiError { status: 429, message: String::new() }.is_retryable());
        assert!(!LlmError::ApiError { status: 401, message: String::new() }.is_retryable());
    }
}
