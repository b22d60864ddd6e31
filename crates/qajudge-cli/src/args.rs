use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use qajudge_core::config::{DEFAULT_MODEL, GenerationConfig};
use qajudge_eval::judge::JudgeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JudgeModeArg {
    /// JSON-schema constrained verdicts
    Structured,
    /// Parse a leading True/False from plain text
    FreeText,
}

impl From<JudgeModeArg> for JudgeMode {
    fn from(arg: JudgeModeArg) -> Self {
        match arg {
            JudgeModeArg::Structured => JudgeMode::Structured,
            JudgeModeArg::FreeText => JudgeMode::FreeText,
        }
    }
}

/// Ask a model every question, then judge human and model answers against yes/no criteria.
#[derive(Debug, Parser)]
#[command(name = "qajudge", version, about)]
pub struct Cli {
    /// Model that answers the questions
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature for answers
    #[arg(long, default_value_t = 0.0)]
    pub temperature: f64,

    /// Optional system instruction for answers
    #[arg(long)]
    pub system: Option<String>,

    /// Questions, reference answers and criteria (YAML)
    #[arg(long, default_value = "q-and-a.yaml")]
    pub questions: PathBuf,

    /// YAML file holding the API key under `key`
    #[arg(long, default_value = "credentials.yaml")]
    pub credentials: PathBuf,

    /// Directory receiving the report
    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Chat-completions base URL
    #[arg(long, env = "QAJUDGE_BASE_URL", default_value = qajudge_llm::openai::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used as judge; judging always runs at temperature 0
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub judge_model: String,

    #[arg(long, value_enum, default_value_t = JudgeModeArg::Structured)]
    pub judge_mode: JudgeModeArg,

    /// Model answers requested per question
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub candidates: u32,

    /// Questions in flight at once; judge calls share a separate pool of the same size
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Extra attempts for transient upstream failures
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,
}

impl Cli {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            system: self.system.clone(),
        }
    }
}
