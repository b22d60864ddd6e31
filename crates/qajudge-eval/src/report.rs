use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qajudge_core::config::GenerationConfig;
use qajudge_core::error::Result;

use crate::runner::QaResult;
use crate::scorer::{ScoreSummary, score};

/// Provenance of a run. Not used for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub config: GenerationConfig,
    /// Local start time, ISO-8601 with microseconds.
    pub datetime: String,
    /// Short revision of the working tree, empty outside a git checkout.
    pub git_hash: String,
}

impl RunMetadata {
    pub fn new(config: GenerationConfig, datetime: impl Into<String>, git_hash: impl Into<String>) -> Self {
        Self {
            config,
            datetime: datetime.into(),
            git_hash: git_hash.into(),
        }
    }

    /// Stamp the current time and revision.
    pub fn capture(config: GenerationConfig) -> Self {
        let datetime = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        Self::new(config, datetime, git_revision())
    }

    pub fn output_file_name(&self) -> String {
        output_file_name(&self.datetime)
    }
}

/// `git rev-parse --short HEAD`, or an empty string when unavailable.
pub fn git_revision() -> String {
    match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        Ok(out) => {
            debug!(status = %out.status, "git rev-parse failed");
            String::new()
        }
        Err(e) => {
            debug!(error = %e, "git not available");
            String::new()
        }
    }
}

/// File name for a run started at `datetime`: sub-seconds dropped, colons replaced.
pub fn output_file_name(datetime: &str) -> String {
    let stem = datetime.split('.').next().unwrap_or_default();
    format!("{}.yaml", stem.replace(':', "-"))
}

/// The document written at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub scores: ScoreSummary,
    pub q_and_a: Vec<QaResult>,
}

impl RunReport {
    /// Score `results` and bundle them with their metadata.
    pub fn new(metadata: RunMetadata, q_and_a: Vec<QaResult>) -> Self {
        let scores = score(&q_and_a);
        Self {
            metadata,
            scores,
            q_and_a,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the report into `dir` and return its path.
    ///
    /// The file only appears at its final path once fully written.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let yaml = self.to_yaml()?;
        let path = dir.join(self.metadata.output_file_name());
        let partial = path.with_extension("yaml.partial");
        let written = std::fs::write(&partial, yaml).and_then(|()| std::fs::rename(&partial, &path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        info!(path = %path.display(), human = %self.scores.human, llm = %self.scores.llm, "wrote report");
        Ok(path)
    }
}
