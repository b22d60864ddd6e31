use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::model::CallOptions;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Parameters for the primary (answer-producing) generation call.
///
/// Recorded verbatim in the run metadata so a report can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub system: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: 0.0,
            system: None,
        }
    }
}

impl GenerationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Messages for asking `question`, system instruction first when set.
    pub fn messages_for(&self, question: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(question));
        messages
    }

    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}
