use crate::model::Thresholds;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One unit of evaluation work: an input and, optionally, the output the
/// task is expected to produce for it.
#[derive(Debug, Clone)]
pub struct Case<I, E> {
    pub input: I,
    pub expected: Option<E>,
}

impl<I, E> Case<I, E> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            expected: None,
        }
    }

    pub fn with_expected(input: I, expected: E) -> Self {
        Self {
            input,
            expected: Some(expected),
        }
    }
}

/// Per-run options: evaluation identity, display labels, and the
/// concurrency/rate policy. Both knobs are fixed configuration, not adaptive.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Identifies the evaluation family across versions.
    pub name: String,
    /// Free-text model label, stored verbatim and never interpreted.
    pub model: String,
    pub generic_prompt: Option<String>,
    pub thresholds: Option<Thresholds>,
    /// Max cases in flight at once. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Minimum spacing between successive case dispatches.
    pub delay: Duration,
}

impl EvalOptions {
    /// Sequential defaults: `concurrency = 1`, no dispatch delay.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            generic_prompt: None,
            thresholds: None,
            concurrency: 1,
            delay: Duration::ZERO,
        }
    }
}

/// A named sub-score inside a [`RawScore::Breakdown`]. Persisted verbatim as
/// a JSON array in the record's `formatted_score` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub name: String,
    pub output: String,
    pub expected: String,
    pub score: f64,
}

/// The three shapes a scorer may return.
#[derive(Debug, Clone, PartialEq)]
pub enum RawScore {
    /// Pass/fail; normalizes to 1.0 / 0.0.
    Bool(bool),
    /// Used as-is.
    Number(f64),
    /// A total plus named sub-scores for callers that want a breakdown.
    Breakdown { total: f64, items: Vec<ScoreItem> },
}

impl RawScore {
    /// Collapses to the numeric score plus the optional breakdown items.
    pub fn normalize(self) -> (f64, Option<Vec<ScoreItem>>) {
        match self {
            RawScore::Bool(true) => (1.0, None),
            RawScore::Bool(false) => (0.0, None),
            RawScore::Number(n) => (n, None),
            RawScore::Breakdown { total, items } => (total, Some(items)),
        }
    }
}

impl From<bool> for RawScore {
    fn from(v: bool) -> Self {
        RawScore::Bool(v)
    }
}

impl From<f64> for RawScore {
    fn from(v: f64) -> Self {
        RawScore::Number(v)
    }
}

/// A caller-defined evaluation: where the cases come from, the task under
/// test, and how its output is graded.
///
/// All payload types must serialize; records persist them as JSON and the
/// input's serialization is what gets fingerprinted.
#[async_trait]
pub trait Evaluation: Send + Sync + 'static {
    type Input: Serialize + Send + Sync + 'static;
    type Output: Serialize + Send + Sync + 'static;
    type Expected: Serialize + Send + Sync + 'static;

    fn options(&self) -> EvalOptions;

    /// Materializes the case list. Called exactly once per run, before the
    /// group row is created; cases produced after this point are not picked up.
    async fn inputs(&self) -> anyhow::Result<Vec<Case<Self::Input, Self::Expected>>>;

    /// The unit of work under evaluation. A record's duration is measured
    /// around this call only; scorer time is excluded.
    async fn task(&self, input: &Self::Input) -> anyhow::Result<Self::Output>;

    /// Grades one output against its expectation.
    async fn score(
        &self,
        input: &Self::Input,
        output: &Self::Output,
        expected: Option<&Self::Expected>,
    ) -> anyhow::Result<RawScore>;

    /// Optional display rendering of an input. `None` means no formatted
    /// representation is stored, not an empty string.
    fn format_input(&self, _input: &Self::Input) -> Option<String> {
        None
    }

    fn format_output(&self, _output: &Self::Output) -> Option<String> {
        None
    }
}
