use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, UsageMetadata};

fn default_true() -> bool {
    true
}

/// Desired response format for structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text (default, equivalent to omitting the field).
    Text,
    /// Force JSON output conforming to a schema.
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        /// OpenAI strict mode (default true).
        #[serde(default = "default_true")]
        strict: bool,
    },
}

/// Options controlling a ChatModel invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Sampling temperature (0.0 - 2.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Number of completions to request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Structured output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Result of a chat model generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    /// Text of every returned choice, in the order the provider sent them.
    pub completions: Vec<String>,

    /// Token usage metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
}

impl ChatResult {
    pub fn new(completions: Vec<String>) -> Self {
        Self {
            completions,
            usage: None,
        }
    }

    /// First completion with non-blank content.
    pub fn first_non_empty(&self) -> Option<&str> {
        self.completions
            .iter()
            .map(String::as_str)
            .find(|c| !c.trim().is_empty())
    }
}

/// Trait for chat language models.
///
/// Implementations handle API communication, request formatting,
/// and response parsing for a specific model endpoint. Transport and
/// HTTP failures surface as [`crate::error::ModelError`].
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate one or more completions for the given messages.
    async fn generate(&self, messages: &[Message], options: &CallOptions) -> Result<ChatResult>;

    /// Return the model name/identifier.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<M: ChatModel + ?Sized> ChatModel for std::sync::Arc<M> {
    async fn generate(&self, messages: &[Message], options: &CallOptions) -> Result<ChatResult> {
        (**self).generate(messages, options).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
