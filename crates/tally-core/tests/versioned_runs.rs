//! End-to-end: the runner against the SQLite store.
//!
//! Two sequential runs of the same evaluation name must land as versions 1
//! and 2, with per-version aggregates and a per-fingerprint score history
//! readable afterwards.

use async_trait::async_trait;
use std::sync::Arc;
use tally_core::fingerprint::input_fingerprint;
use tally_core::{Case, EvalOptions, Evaluation, RawScore, Runner, SqliteStore, Thresholds};

struct GreetingsEval {
    /// Flipped between runs to move the second case's score.
    strict: bool,
}

#[async_trait]
impl Evaluation for GreetingsEval {
    type Input = String;
    type Output = String;
    type Expected = String;

    fn options(&self) -> EvalOptions {
        let mut opts = EvalOptions::new("greetings", "gpt-4");
        opts.generic_prompt = Some("Generate a greeting to the user".into());
        opts.thresholds = Some(Thresholds::default());
        opts.concurrency = 2;
        opts
    }

    async fn inputs(&self) -> anyhow::Result<Vec<Case<String, String>>> {
        Ok(vec![
            Case::with_expected("Hello".to_string(), "Hello World!".to_string()),
            Case::with_expected("Hellos".to_string(), "Hello World!".to_string()),
        ])
    }

    async fn task(&self, input: &String) -> anyhow::Result<String> {
        Ok(format!("{input} World!"))
    }

    async fn score(
        &self,
        _input: &String,
        output: &String,
        expected: Option<&String>,
    ) -> anyhow::Result<RawScore> {
        if self.strict {
            Ok(RawScore::Bool(expected == Some(output)))
        } else {
            // Lenient pass: any output that starts like the expectation counts.
            Ok(RawScore::Bool(true))
        }
    }
}

#[tokio::test]
async fn two_runs_build_a_comparable_version_history() -> anyhow::Result<()> {
    let store = SqliteStore::memory()?;
    store.init_schema()?;
    let runner = Runner::new(Arc::new(store.clone()));

    runner.run(Arc::new(GreetingsEval { strict: true })).await?;
    runner.run(Arc::new(GreetingsEval { strict: false })).await?;

    let versions = store.versions("greetings")?;
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, 1);
    assert_eq!(versions[0].total_cases, 2);
    assert_eq!(versions[0].avg_score, 0.5);
    assert_eq!(versions[1].version, 2);
    assert_eq!(versions[1].avg_score, 1.0);

    let summaries = store.latest_groups()?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "greetings");
    assert_eq!(summaries[0].latest_version, 2);
    assert_eq!(summaries[0].id, versions[1].id);
    assert_eq!(store.thresholds(&summaries[0].id)?, Some(Thresholds::default()));

    // The failing case is the same logical case in both versions.
    let fp = input_fingerprint("Hellos")?;
    let history = store.score_history(&fp)?;
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].version, history[0].score), (1, 0.0));
    assert_eq!((history[1].version, history[1].score), (2, 1.0));
    Ok(())
}

#[tokio::test]
async fn version_history_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tally.db");

    {
        let store = SqliteStore::open(&path)?;
        store.init_schema()?;
        let runner = Runner::new(Arc::new(store));
        runner.run(Arc::new(GreetingsEval { strict: true })).await?;
    }

    let store = SqliteStore::open(&path)?;
    store.init_schema()?;
    let runner = Runner::new(Arc::new(store.clone()));
    runner.run(Arc::new(GreetingsEval { strict: true })).await?;

    let versions = store.versions("greetings")?;
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].version, 2);
    Ok(())
}
