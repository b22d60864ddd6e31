mod args;
mod credentials;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use qajudge_core::prelude::*;
use qajudge_eval::prelude::*;
use qajudge_llm::limit::ConcurrencyLimitedChatModel;
use qajudge_llm::openai::{OpenAIChatModel, OpenAIConfig};
use qajudge_llm::retry::{RetryPolicy, RetryingChatModel};

use crate::args::Cli;
use crate::credentials::Credentials;

fn chat_model(cli: &Cli, api_key: &str, model_id: &str) -> Result<Arc<dyn ChatModel>> {
    let config = OpenAIConfig::default()
        .with_base_url(&cli.base_url)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let model = OpenAIChatModel::with_config(api_key.to_string(), model_id.to_string(), config)?;
    let model: Arc<dyn ChatModel> = Arc::new(RetryingChatModel::new(model, RetryPolicy::new(cli.max_retries)));
    Ok(model)
}

/// Questions run `--concurrency` at a time, and every judge call, whichever
/// question or answer it belongs to, shares one pool of the same size.
fn build_runner(cli: &Cli, model: Arc<dyn ChatModel>, judge_model: Arc<dyn ChatModel>) -> QaRunner {
    let concurrency = usize::from(cli.concurrency);
    let judge_model: Arc<dyn ChatModel> =
        Arc::new(ConcurrencyLimitedChatModel::new(judge_model, concurrency));
    let judge = Judge::new(judge_model).with_mode(cli.judge_mode.into());
    let evaluator = Evaluator::new(judge).with_concurrency(concurrency);
    QaRunner::new(model, evaluator, cli.generation_config())
        .with_candidate_count(cli.candidates)
        .with_concurrency(concurrency)
}

async fn run(cli: Cli) -> Result<()> {
    let questions = QuestionSet::load(&cli.questions)?;
    let creds = Credentials::load(&cli.credentials)?;
    let config = cli.generation_config();

    info!(
        questions = questions.len(),
        model = %config.model,
        judge = %cli.judge_model,
        "starting run"
    );

    let runner = build_runner(
        &cli,
        chat_model(&cli, &creds.key, &config.model)?,
        chat_model(&cli, &creds.key, &cli.judge_model)?,
    );

    let metadata = RunMetadata::capture(config);
    let report = runner.run_report(&questions, metadata).await?;
    let path = report.write_to_dir(&cli.output_dir)?;

    println!("human: {}", report.scores.human);
    println!("llm: {}", report.scores.llm);
    println!("{}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "qajudge=info".into()))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "run failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct Answerer;

    #[async_trait]
    impl ChatModel for Answerer {
        async fn generate(&self, _messages: &[Message], _options: &CallOptions) -> Result<ChatResult> {
            Ok(ChatResult::new(vec!["an answer".into()]))
        }

        fn model_name(&self) -> &str {
            "answerer"
        }
    }

    #[derive(Default)]
    struct CountingJudge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for CountingJudge {
        async fn generate(&self, _messages: &[Message], _options: &CallOptions) -> Result<ChatResult> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResult::new(vec![r#"{"answer_satisfies_criteria": true}"#.into()]))
        }

        fn model_name(&self) -> &str {
            "counting-judge"
        }
    }

    fn questions(count: usize, criteria: usize) -> QuestionSet {
        let criteria: Vec<String> = (0..criteria).map(|i| format!("criterion {i}?")).collect();
        QuestionSet::new(
            (0..count)
                .map(|i| QaEntry {
                    question: format!("question {i}"),
                    answers: vec!["a human answer".into()],
                    criteria: CriteriaSet::new(criteria.clone(), vec![]),
                })
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn judge_calls_in_flight_stay_within_concurrency() {
        let cli = Cli::try_parse_from(["qajudge", "--concurrency", "4"]).unwrap();
        let judge = Arc::new(CountingJudge::default());
        let runner = build_runner(&cli, Arc::new(Answerer), judge.clone());

        let results = runner.run(&questions(8, 8)).await.unwrap();

        assert_eq!(results.len(), 8);
        // 8 questions x (1 human + 1 model answer) x 8 criteria
        assert_eq!(judge.calls.load(Ordering::SeqCst), 128);
        assert!(judge.peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(score(&results).llm.to_string(), "64 / 64");
    }

    #[tokio::test(start_paused = true)]
    async fn default_concurrency_judges_one_at_a_time() {
        let cli = Cli::try_parse_from(["qajudge"]).unwrap();
        let judge = Arc::new(CountingJudge::default());
        let runner = build_runner(&cli, Arc::new(Answerer), judge.clone());

        runner.run(&questions(3, 4)).await.unwrap();

        assert_eq!(judge.peak.load(Ordering::SeqCst), 1);
    }
}
