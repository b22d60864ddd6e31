use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::evaluator::AnswerEvaluation;
use crate::runner::QaResult;

/// Who wrote the answers being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Human,
    Llm,
}

impl AnswerSource {
    pub const ALL: [AnswerSource; 2] = [AnswerSource::Human, AnswerSource::Llm];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Human => "human",
            AnswerSource::Llm => "llm",
        }
    }
}

/// Count of verdicts matching expectation, out of all verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    fn add(&mut self, evaluations: &[AnswerEvaluation]) {
        for verdict in evaluations.iter().flat_map(|e| &e.verdicts) {
            self.total += 1;
            if verdict.is_correct() {
                self.correct += 1;
            }
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct, self.total)
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let (correct, total) = text
            .split_once('/')
            .ok_or_else(|| D::Error::custom(format!("expected \"c / t\", got {text:?}")))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<usize>()
                .map_err(|e| D::Error::custom(format!("bad count in {text:?}: {e}")))
        };
        Ok(Tally::new(parse(correct)?, parse(total)?))
    }
}

/// Per-source tallies for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub human: Tally,
    pub llm: Tally,
}

impl ScoreSummary {
    pub fn get(&self, source: AnswerSource) -> Tally {
        match source {
            AnswerSource::Human => self.human,
            AnswerSource::Llm => self.llm,
        }
    }
}

/// Fold every verdict in `results` into one tally per source.
pub fn score(results: &[QaResult]) -> ScoreSummary {
    let mut summary = ScoreSummary::default();
    for result in results {
        summary.human.add(&result.human);
        summary.llm.add(&result.llm);
    }
    summary
}
