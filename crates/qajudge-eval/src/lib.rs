pub mod dataset;
pub mod evaluator;
pub mod judge;
pub mod report;
pub mod runner;
pub mod scorer;

pub mod prelude {
    pub use crate::dataset::{CriteriaSet, QaEntry, QuestionSet};
    pub use crate::evaluator::{AnswerEvaluation, Evaluator, Verdict};
    pub use crate::judge::{Judge, JudgeMode};
    pub use crate::report::{RunMetadata, RunReport};
    pub use crate::runner::{QaResult, QaRunner};
    pub use crate::scorer::{AnswerSource, ScoreSummary, Tally, score};
}
