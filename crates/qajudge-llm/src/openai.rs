//! OpenAI Chat Completions API integration.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qajudge_core::error::{ModelError, QaError, Result};
use qajudge_core::message::{Message, UsageMetadata};
use qajudge_core::model::{CallOptions, ChatModel, ChatResult, ResponseFormat};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ---------------------------------------------------------------------------
// OpenAI Chat Completions API request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
pub struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<OpenAIJsonSchema>,
}

#[derive(Debug, Serialize)]
pub struct OpenAIJsonSchema {
    pub name: String,
    pub schema: serde_json::Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIError {
    pub error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIErrorDetail {
    pub message: String,
}

// ---------------------------------------------------------------------------
// OpenAIChatModel
// ---------------------------------------------------------------------------

/// Endpoint settings for [`OpenAIChatModel`].
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAIConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct OpenAIChatModel {
    api_key: String,
    model_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAIChatModel {
    pub fn new(api_key: String, model_id: String) -> Result<Self> {
        Self::with_config(api_key, model_id, OpenAIConfig::default())
    }

    pub fn with_config(api_key: String, model_id: String, config: OpenAIConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                QaError::Model(ModelError::ApiRequest(format!(
                    "failed to create HTTP client: {e}"
                )))
            })?;
        let endpoint = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        Ok(Self {
            api_key,
            model_id,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_request(&self, messages: &[Message], options: &CallOptions) -> OpenAIRequest {
        let api_messages = messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role().into(),
                content: msg.content().into(),
            })
            .collect();

        let response_format = match &options.response_format {
            Some(ResponseFormat::JsonSchema {
                name,
                schema,
                strict,
            }) => Some(OpenAIResponseFormat {
                format_type: "json_schema".into(),
                json_schema: Some(OpenAIJsonSchema {
                    name: name.clone(),
                    schema: schema.clone(),
                    strict: *strict,
                }),
            }),
            Some(ResponseFormat::Text) | None => None,
        };

        OpenAIRequest {
            model: self.model_id.clone(),
            messages: api_messages,
            temperature: options.temperature,
            n: options.candidate_count.filter(|n| *n > 1),
            max_tokens: options.max_tokens,
            response_format,
        }
    }
}

fn transport_error(e: reqwest::Error) -> QaError {
    if e.is_timeout() {
        QaError::Model(ModelError::Timeout(e.to_string()))
    } else {
        QaError::Model(ModelError::ApiRequest(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn generate(&self, messages: &[Message], options: &CallOptions) -> Result<ChatResult> {
        let request_body = self.build_request(messages, options);
        debug!(model = %self.model_id, messages = messages.len(), "chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read response body".into());
            let error_msg = serde_json::from_str::<OpenAIError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(QaError::Model(match status.as_u16() {
                401 => ModelError::Auth(error_msg),
                429 => ModelError::RateLimited { retry_after_secs },
                code => ModelError::Http {
                    status: code,
                    message: error_msg,
                },
            }));
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| QaError::Model(ModelError::InvalidResponse(e.to_string())))?;

        Ok(into_chat_result(api_response))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

/// One completion per choice, in order. A choice without text (refusal,
/// null content) becomes an empty string so it is still counted.
pub fn into_chat_result(response: OpenAIResponse) -> ChatResult {
    let completions = response
        .choices
        .into_iter()
        .map(|c| c.message.content.unwrap_or_default())
        .collect();

    let usage = response.usage.map(|u| UsageMetadata {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    ChatResult { completions, usage }
}
