use serde::{Deserialize, Serialize};

/// Score cut points on whatever scale the scorer emits. Stored with the
/// group; the engine never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub good_score: f64,
    pub average_score: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            good_score: 80.0,
            average_score: 60.0,
        }
    }
}

/// Group row as handed to the store. The store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub model: String,
    /// Strictly increasing per name, starting at 1. Assigned by the runner as
    /// max-version-read + 1; uniqueness under concurrent runs of the same
    /// name is a store concern.
    pub version: i64,
    pub generic_prompt: Option<String>,
    pub thresholds: Option<Thresholds>,
}

/// Record row for one completed case. Written once, immediately after the
/// case's scorer finishes; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// JSON serialization of the case input.
    pub input: String,
    /// JSON serialization of the task output.
    pub output: String,
    /// JSON serialization of the expectation, when the case carried one.
    pub expected: Option<String>,
    pub formatted_input: Option<String>,
    pub formatted_output: Option<String>,
    pub score: f64,
    /// JSON array of [`ScoreItem`](crate::eval_api::ScoreItem)s, present only
    /// when the scorer returned a breakdown.
    pub formatted_score: Option<String>,
    /// Wall-clock milliseconds around the task call only.
    pub duration_ms: u64,
    /// Lowercase hex SHA-256 of `input`; correlates the same logical case
    /// across versions.
    pub input_fingerprint: String,
    pub eval_group_id: String,
}

/// Latest run of one evaluation name, aggregated over its records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub model: String,
    pub latest_version: i64,
    pub total_cases: i64,
    pub avg_score: f64,
    pub last_run_at: String,
}

/// One entry in a name's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRow {
    pub id: String,
    pub version: i64,
    pub model: String,
    pub avg_score: f64,
    pub total_cases: i64,
    pub total_duration_ms: f64,
    pub created_at: String,
}

/// One point in a case's score history across versions, keyed by its input
/// fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePoint {
    pub version: i64,
    pub score: f64,
    pub duration_ms: f64,
    pub created_at: String,
}
