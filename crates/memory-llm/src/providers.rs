use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::capability::{ChatCapability, ChatUsage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct OpenAiStyleResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    prompt_tokens_details: Option<PromptTokensDetails>,
}

#[derive(Debug, Deserialize, Default)]
struct PromptTokensDetails {
    #[serde(default)]
    cached_tokens: u64,
}

/// xAI (Grok) chat completions. OpenAI-compatible wire format, grounded in
/// the extractor's `call_xai`: bearer auth, 60s timeout, JSON body.
#[derive(Debug, Clone)]
pub struct XaiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl XaiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatCapability for XaiClient {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<(String, ChatUsage)> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .client
            .post("https://api.x.ai/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAiStyleResponse>()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| ChatUsage {
                prompt_tokens: u.prompt_tokens,
                cached_tokens: u
                    .prompt_tokens_details
                    .map(|d| d.cached_tokens)
                    .unwrap_or_default(),
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok((content, usage))
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    candidates: Vec<GoogleCandidate>,
    #[serde(default)]
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GoogleUsage>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Debug, Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Debug, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct GoogleUsage {
    #[serde(default)]
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u64,
    #[serde(default)]
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u64,
}

/// Gemini `generateContent`. A single system+user turn, no tool calling.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GoogleClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatCapability for GoogleClient {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<(String, ChatUsage)> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "system_instruction": {"parts": [{"text": system}]},
            "contents": [{"role": "user", "parts": [{"text": user}]}],
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleResponse>()
            .await?;

        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        let usage = response
            .usage_metadata
            .map(|u| ChatUsage {
                prompt_tokens: u.prompt_token_count,
                cached_tokens: 0,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok((content, usage))
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatCapability for AnthropicClient {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<(String, ChatUsage)> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1024,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<AnthropicResponse>()
            .await?;

        let content = response
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| ChatUsage {
                prompt_tokens: u.input_tokens,
                cached_tokens: 0,
                completion_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        Ok((content, usage))
    }
}

/// Selects one of the three chat providers at startup. The Extractor
/// consumes only `ChatCapability`, never this enum.
#[derive(Debug, Clone)]
pub enum Provider {
    Xai(XaiClient),
    Google(GoogleClient),
    Anthropic(AnthropicClient),
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Xai(_) => "xai",
            Provider::Google(_) => "google",
            Provider::Anthropic(_) => "anthropic",
        }
    }
}

#[async_trait]
impl ChatCapability for Provider {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<(String, ChatUsage)> {
        match self {
            Provider::Xai(c) => c.chat(system, user).await,
            Provider::Google(c) => c.chat(system, user).await,
            Provider::Anthropic(c) => c.chat(system, user).await,
        }
    }
}
