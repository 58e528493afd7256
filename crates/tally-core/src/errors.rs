use thiserror::Error;

/// Storage collaborator failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store rejected the call: {0}")]
    Rejected(String),
}

/// Everything [`Runner::run`](crate::engine::Runner::run) can fail with.
///
/// Task, scorer, and input-source failures carry the caller's error as the
/// source. The first error observed wins; cases already in flight drain
/// before it is returned, and none are retried.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("input source failed: {0}")]
    Inputs(#[source] anyhow::Error),
    #[error("task failed: {0}")]
    Task(#[source] anyhow::Error),
    #[error("scorer failed: {0}")]
    Scorer(#[source] anyhow::Error),
    #[error("could not serialize case payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("worker pool unavailable: {0}")]
    Pool(#[from] tokio::sync::AcquireError),
    #[error("case worker aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}
