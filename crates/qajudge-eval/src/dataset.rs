use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use qajudge_core::error::{ConfigError, Result};

/// Criteria for one question, split by the verdict a correct answer earns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct CriteriaSet {
    /// Statements a correct answer satisfies.
    pub expect_true: Vec<String>,
    /// Statements a correct answer does not satisfy.
    pub expect_false: Vec<String>,
}

impl CriteriaSet {
    pub fn new(expect_true: Vec<String>, expect_false: Vec<String>) -> Self {
        Self {
            expect_true,
            expect_false,
        }
    }

    /// Criteria paired with their expected verdict: true-expected first, then false-expected.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.expect_true
            .iter()
            .map(|c| (c.as_str(), true))
            .chain(self.expect_false.iter().map(|c| (c.as_str(), false)))
    }

    pub fn len(&self) -> usize {
        self.expect_true.len() + self.expect_false.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn criteria_key(key: &Value) -> std::result::Result<bool, String> {
    match key {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(format!("unexpected criteria key {s:?}, expected true or false")),
        },
        other => Err(format!("unexpected criteria key {other:?}, expected true or false")),
    }
}

impl TryFrom<Mapping> for CriteriaSet {
    type Error = String;

    fn try_from(map: Mapping) -> std::result::Result<Self, Self::Error> {
        let mut expect_true = None;
        let mut expect_false = None;
        for (key, value) in map {
            let expected = criteria_key(&key)?;
            let criteria: Vec<String> = match value {
                Value::Null => Vec::new(),
                other => serde_yaml::from_value(other)
                    .map_err(|e| format!("criteria for {expected} must be a list of strings: {e}"))?,
            };
            let slot = if expected {
                &mut expect_true
            } else {
                &mut expect_false
            };
            if slot.replace(criteria).is_some() {
                return Err(format!("duplicate criteria key {expected}"));
            }
        }
        Ok(Self {
            expect_true: expect_true.ok_or("missing criteria list for true")?,
            expect_false: expect_false.ok_or("missing criteria list for false")?,
        })
    }
}

impl From<CriteriaSet> for Mapping {
    fn from(criteria: CriteriaSet) -> Self {
        let list = |items: Vec<String>| Value::Sequence(items.into_iter().map(Value::String).collect());
        let mut map = Mapping::new();
        map.insert(Value::Bool(true), list(criteria.expect_true));
        map.insert(Value::Bool(false), list(criteria.expect_false));
        map
    }
}

/// One question with its reference answers and judging criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    #[serde(rename = "Q", alias = "question")]
    pub question: String,
    /// Human-authored reference answers.
    #[serde(rename = "A", alias = "answers", default)]
    pub answers: Vec<String>,
    #[serde(rename = "evaluations", alias = "criteria")]
    pub criteria: CriteriaSet,
}

/// The questions posed in one run, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet {
    pub entries: Vec<QaEntry>,
}

impl QuestionSet {
    pub fn new(entries: Vec<QaEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Dataset(e.to_string()).into())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Dataset(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qajudge_core::error::QaError;

    const SAMPLE: &str = r#"
- Q: What does epsilon control in differential privacy?
  A:
    - The privacy loss budget.
    - How much noise is added, roughly.
  evaluations:
    True:
      - Does the answer mention privacy loss or a budget?
    False:
      - Does the answer claim epsilon is a sample size?
- Q: Is DP a property of a dataset?
  A: []
  evaluations:
    true: []
    false: []
"#;

    #[test]
    fn load_sample() {
        let qs = QuestionSet::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(qs.len(), 2);
        let first = &qs.entries[0];
        assert_eq!(
            first.question,
            "What does epsilon control in differential privacy?"
        );
        assert_eq!(first.answers.len(), 2);
        assert_eq!(
            first.criteria.expect_true,
            vec!["Does the answer mention privacy loss or a budget?"]
        );
        assert_eq!(
            first.criteria.expect_false,
            vec!["Does the answer claim epsilon is a sample size?"]
        );
        assert!(qs.entries[1].criteria.is_empty());
        assert!(qs.entries[1].answers.is_empty());
    }

    #[test]
    fn criteria_iter_order() {
        let criteria = CriteriaSet::new(
            vec!["t1".into(), "t2".into()],
            vec!["f1".into(), "f2".into()],
        );
        let order: Vec<_> = criteria.iter().collect();
        assert_eq!(
            order,
            vec![("t1", true), ("t2", true), ("f1", false), ("f2", false)]
        );
        assert_eq!(criteria.len(), 4);
    }

    #[test]
    fn missing_false_list_is_rejected() {
        let yaml = "- Q: q\n  A: [a]\n  evaluations:\n    true: [c]\n";
        let err = QuestionSet::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, QaError::Config(ConfigError::Dataset(_))));
        assert!(err.to_string().contains("missing criteria list for false"));
    }

    #[test]
    fn missing_evaluations_is_rejected() {
        let yaml = "- Q: q\n  A: [a]\n";
        let err = QuestionSet::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, QaError::Config(ConfigError::Dataset(_))));
    }

    #[test]
    fn unknown_criteria_key_is_rejected() {
        let yaml = "- Q: q\n  evaluations:\n    true: []\n    false: []\n    maybe: []\n";
        let err = QuestionSet::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn null_list_counts_as_empty() {
        let yaml = "- Q: q\n  evaluations:\n    true:\n    false: [x]\n";
        let qs = QuestionSet::from_yaml_str(yaml).unwrap();
        assert!(qs.entries[0].criteria.expect_true.is_empty());
        assert_eq!(qs.entries[0].criteria.expect_false, vec!["x"]);
    }

    #[test]
    fn long_form_aliases() {
        let yaml = "- question: q\n  answers: [a]\n  criteria:\n    true: [c]\n    false: []\n";
        let qs = QuestionSet::from_yaml_str(yaml).unwrap();
        assert_eq!(qs.entries[0].question, "q");
        assert_eq!(qs.entries[0].answers, vec!["a"]);
    }

    #[test]
    fn yaml_roundtrip() {
        let qs = QuestionSet::from_yaml_str(SAMPLE).unwrap();
        let yaml = qs.to_yaml().unwrap();
        assert!(yaml.contains("Q: "));
        assert!(yaml.contains("evaluations:"));
        assert_eq!(QuestionSet::from_yaml_str(&yaml).unwrap(), qs);
    }

    #[test]
    fn load_missing_file() {
        let err = QuestionSet::load("/nonexistent/q-and-a.yaml").unwrap_err();
        assert!(matches!(err, QaError::Config(ConfigError::Dataset(_))));
    }
}
