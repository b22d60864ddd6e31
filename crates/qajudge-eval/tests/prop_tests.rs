use std::time::Duration;

use proptest::prelude::*;

use qajudge_eval::prelude::*;

fn arb_verdict() -> impl Strategy<Value = Verdict> {
    ("[a-z ]{1,20}", prop::bool::ANY, prop::bool::ANY)
        .prop_map(|(criterion, expected, actual)| Verdict::new(criterion, expected, actual))
}

fn arb_answer() -> impl Strategy<Value = AnswerEvaluation> {
    ("[a-zA-Z ]{0,30}", prop::collection::vec(arb_verdict(), 0..6))
        .prop_map(|(answer, verdicts)| AnswerEvaluation { answer, verdicts })
}

fn arb_result() -> impl Strategy<Value = QaResult> {
    (
        "[a-zA-Z ?]{1,30}",
        prop::collection::vec(arb_answer(), 0..4),
        prop::collection::vec(arb_answer(), 0..4),
        0u64..10_000_000,
    )
        .prop_map(|(question, human, llm, micros)| QaResult {
            question,
            human,
            llm,
            runtime: Duration::from_micros(micros),
        })
}

fn count(answers: &[AnswerEvaluation]) -> (usize, usize) {
    let flat: Vec<&Verdict> = answers.iter().flat_map(|a| &a.verdicts).collect();
    let correct = flat.iter().filter(|v| v.expected == v.actual).count();
    (correct, flat.len())
}

proptest! {
    /// Scoring the same results twice gives the same summary.
    #[test]
    fn scoring_is_idempotent(results in prop::collection::vec(arb_result(), 0..5)) {
        prop_assert_eq!(score(&results), score(&results));
    }

    /// Tallies equal a direct count over the flattened verdicts.
    #[test]
    fn tally_matches_flattened_count(results in prop::collection::vec(arb_result(), 0..5)) {
        let summary = score(&results);
        for source in AnswerSource::ALL {
            let (correct, total) = results
                .iter()
                .map(|r| match source {
                    AnswerSource::Human => count(&r.human),
                    AnswerSource::Llm => count(&r.llm),
                })
                .fold((0, 0), |(c, t), (dc, dt)| (c + dc, t + dt));
            let tally = summary.get(source);
            prop_assert_eq!(tally, Tally::new(correct, total));
            prop_assert!(tally.correct <= tally.total);
            prop_assert_eq!(tally.to_string(), format!("{correct} / {total}"));
        }
    }

    /// Splitting results across two runs and adding the tallies matches scoring them together.
    #[test]
    fn scoring_is_additive(
        first in prop::collection::vec(arb_result(), 0..4),
        second in prop::collection::vec(arb_result(), 0..4),
    ) {
        let a = score(&first);
        let b = score(&second);
        let all: Vec<QaResult> = first.iter().chain(second.iter()).cloned().collect();
        let combined = score(&all);
        prop_assert_eq!(combined.human.total, a.human.total + b.human.total);
        prop_assert_eq!(combined.llm.correct, a.llm.correct + b.llm.correct);
    }

    /// Criteria iterate true-expected first, each group in input order.
    #[test]
    fn criteria_order(
        t in prop::collection::vec("[a-z]{1,10}", 0..6),
        f in prop::collection::vec("[a-z]{1,10}", 0..6),
    ) {
        let criteria = CriteriaSet::new(t.clone(), f.clone());
        let seen: Vec<(String, bool)> = criteria.iter().map(|(c, e)| (c.to_string(), e)).collect();
        let expected: Vec<(String, bool)> = t
            .into_iter()
            .map(|c| (c, true))
            .chain(f.into_iter().map(|c| (c, false)))
            .collect();
        prop_assert_eq!(seen, expected);
    }
}
