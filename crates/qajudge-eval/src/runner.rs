use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::info;

use qajudge_core::config::GenerationConfig;
use qajudge_core::error::{ModelError, QaError, Result};
use qajudge_core::model::{CallOptions, ChatModel};

use crate::dataset::{QaEntry, QuestionSet};
use crate::evaluator::{AnswerEvaluation, Evaluator};
use crate::report::{RunMetadata, RunReport};

/// Everything recorded for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResult {
    pub question: String,
    pub human: Vec<AnswerEvaluation>,
    pub llm: Vec<AnswerEvaluation>,
    /// Wall-clock time of the answer-generation call.
    #[serde(with = "runtime_format")]
    pub runtime: Duration,
}

/// `H:MM:SS.ffffff`, the layout used in historical reports.
pub mod runtime_format {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(runtime: &Duration) -> String {
        let secs = runtime.as_secs();
        format!(
            "{}:{:02}:{:02}.{:06}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            runtime.subsec_micros()
        )
    }

    pub fn parse(text: &str) -> Option<Duration> {
        let mut parts = text.splitn(3, ':');
        let hours: u64 = parts.next()?.parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let seconds = parts.next()?;
        let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, "0"));
        let whole: u64 = whole.parse().ok()?;
        if minutes >= 60 || whole >= 60 || frac.is_empty() || frac.len() > 9 {
            return None;
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let nanos: u32 = format!("{frac:0<9}").parse().ok()?;
        let secs = hours
            .checked_mul(3600)?
            .checked_add(minutes * 60 + whole)?;
        Some(Duration::new(secs, nanos))
    }

    pub fn serialize<S: Serializer>(runtime: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(runtime))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid runtime {text:?}")))
    }
}

/// Poses each question to the model and judges human and model answers.
pub struct QaRunner {
    model: Arc<dyn ChatModel>,
    evaluator: Evaluator,
    config: GenerationConfig,
    candidate_count: u32,
    concurrency: usize,
}

impl QaRunner {
    pub fn new(model: Arc<dyn ChatModel>, evaluator: Evaluator, config: GenerationConfig) -> Self {
        Self {
            model,
            evaluator,
            config,
            candidate_count: 1,
            concurrency: 1,
        }
    }

    /// Number of model answers requested per question.
    pub fn with_candidate_count(mut self, count: u32) -> Self {
        self.candidate_count = count.max(1);
        self
    }

    /// Maximum questions processed at once. Output order is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn call_options(&self) -> CallOptions {
        CallOptions {
            candidate_count: Some(self.candidate_count),
            ..self.config.call_options()
        }
    }

    /// Run every question; the first failure aborts the run.
    pub async fn run(&self, questions: &QuestionSet) -> Result<Vec<QaResult>> {
        stream::iter(questions.entries.iter().map(|entry| self.run_one(entry)))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Run, score, and bundle the results with `metadata`.
    pub async fn run_report(&self, questions: &QuestionSet, metadata: RunMetadata) -> Result<RunReport> {
        let results = self.run(questions).await?;
        Ok(RunReport::new(metadata, results))
    }

    pub async fn run_one(&self, entry: &QaEntry) -> Result<QaResult> {
        let question = entry.question.as_str();
        info!("Q: {question}");

        let human = self
            .evaluator
            .evaluate_all(question, &entry.answers, &entry.criteria)
            .await?;

        let messages = self.config.messages_for(question);
        let start = Instant::now();
        let generated = self.model.generate(&messages, &self.call_options()).await?;
        let runtime = start.elapsed();

        if generated.completions.is_empty() {
            return Err(QaError::Model(ModelError::InvalidResponse(format!(
                "no answer returned for question {question:?}"
            ))));
        }
        for answer in &generated.completions {
            info!("A: {answer}");
        }

        let llm = self
            .evaluator
            .evaluate_all(question, &generated.completions, &entry.criteria)
            .await?;

        Ok(QaResult {
            question: entry.question.clone(),
            human,
            llm,
            runtime,
        })
    }
}
