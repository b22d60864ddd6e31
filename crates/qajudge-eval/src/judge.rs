use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use qajudge_core::error::{JudgmentError, Result};
use qajudge_core::message::Message;
use qajudge_core::model::{CallOptions, ChatModel, ResponseFormat};

/// JSON field carrying the verdict in structured mode.
pub const VERDICT_FIELD: &str = "answer_satisfies_criteria";

/// How the judge asks for, and reads back, its verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JudgeMode {
    /// Constrain output to `{"answer_satisfies_criteria": bool}`.
    #[default]
    Structured,
    /// Plain completion starting with True/False (or Yes/No).
    FreeText,
}

#[derive(Deserialize)]
struct StructuredVerdict {
    answer_satisfies_criteria: bool,
}

/// Renders a boolean verdict on whether an answer meets a criterion.
///
/// Every call uses temperature 0, a single candidate, and no system
/// instruction, independent of how the answers themselves were generated.
pub struct Judge {
    model: Arc<dyn ChatModel>,
    mode: JudgeMode,
}

impl Judge {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            mode: JudgeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: JudgeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> JudgeMode {
        self.mode
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    fn call_options(&self) -> CallOptions {
        let response_format = match self.mode {
            JudgeMode::Structured => Some(ResponseFormat::JsonSchema {
                name: "evaluation".into(),
                schema: json!({
                    "type": "object",
                    "properties": {
                        VERDICT_FIELD: {"type": "boolean"}
                    },
                    "required": [VERDICT_FIELD],
                    "additionalProperties": false
                }),
                strict: true,
            }),
            JudgeMode::FreeText => None,
        };
        CallOptions {
            temperature: Some(0.0),
            candidate_count: Some(1),
            max_tokens: None,
            response_format,
        }
    }

    pub async fn judge(&self, question: &str, answer: &str, criterion: &str) -> Result<bool> {
        let prompt = judge_prompt(question, answer, criterion);
        let messages = [Message::user(prompt)];

        let result = self.model.generate(&messages, &self.call_options()).await?;
        let text = result.first_non_empty().ok_or(JudgmentError::Empty)?;

        let verdict = match self.mode {
            JudgeMode::Structured => parse_structured(text)?,
            JudgeMode::FreeText => parse_free_text(text)?,
        };
        debug!(criterion, verdict, "judged answer");
        Ok(verdict)
    }
}

/// The evaluation prompt. The answer is fenced so its content reads as data.
pub fn judge_prompt(question: &str, answer: &str, criterion: &str) -> String {
    format!(
        "First, read the following question and answer pair:\n\n\
         Question: {question}\n\n\
         Answer:\n\
         '''\n\
         {answer}\n\
         '''\n\n\
         Considering the response above, answer the following question with \"True\" or \"False\":\n\
         {criterion}\n"
    )
}

fn parse_structured(text: &str) -> std::result::Result<bool, JudgmentError> {
    serde_json::from_str::<StructuredVerdict>(text.trim())
        .map(|v| v.answer_satisfies_criteria)
        .map_err(|_| JudgmentError::Unparseable(text.to_string()))
}

fn parse_free_text(text: &str) -> std::result::Result<bool, JudgmentError> {
    let first = text
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphabetic()))
        .unwrap_or_default();
    match first.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(JudgmentError::Unparseable(text.to_string())),
    }
}
