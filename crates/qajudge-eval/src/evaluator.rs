use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};

use qajudge_core::error::{QaError, Result};

use crate::dataset::CriteriaSet;
use crate::judge::Judge;

/// Outcome of judging one answer against one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub criterion: String,
    pub expected: bool,
    pub actual: bool,
}

impl Verdict {
    pub fn new(criterion: impl Into<String>, expected: bool, actual: bool) -> Self {
        Self {
            criterion: criterion.into(),
            expected,
            actual,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.expected == self.actual
    }
}

/// All verdicts for a single answer.
///
/// Records are kept positionally, so two textually identical answers
/// each get their own entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub answer: String,
    #[serde(rename = "evaluations")]
    pub verdicts: Vec<Verdict>,
}

/// Judges answers against a question's criteria.
pub struct Evaluator {
    judge: Judge,
    concurrency: usize,
}

impl Evaluator {
    pub fn new(judge: Judge) -> Self {
        Self {
            judge,
            concurrency: 1,
        }
    }

    /// Maximum judge calls in flight for one answer.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    /// Judge `answer` against every criterion.
    ///
    /// Verdicts come back true-expected first, then false-expected, each in
    /// input order. Any judge failure fails the whole answer.
    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        criteria: &CriteriaSet,
    ) -> Result<Vec<Verdict>> {
        stream::iter(criteria.iter().map(|(criterion, expected)| async move {
            let actual = self.judge.judge(question, answer, criterion).await?;
            Ok::<_, QaError>(Verdict::new(criterion, expected, actual))
        }))
        .buffered(self.concurrency)
        .try_collect()
        .await
    }

    pub async fn evaluate_all(
        &self,
        question: &str,
        answers: &[String],
        criteria: &CriteriaSet,
    ) -> Result<Vec<AnswerEvaluation>> {
        let mut evaluations = Vec::with_capacity(answers.len());
        for answer in answers {
            let verdicts = self.evaluate(question, answer, criteria).await?;
            evaluations.push(AnswerEvaluation {
                answer: answer.clone(),
                verdicts,
            });
        }
        Ok(evaluations)
    }
}
