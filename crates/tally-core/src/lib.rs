//! Versioned evaluation runner.
//!
//! Define an [`Evaluation`] (a case source, a task, a scorer), hand it to a
//! [`Runner`], and every case is executed under a bounded-concurrency pool,
//! scored, fingerprinted, and persisted through an [`EvalStore`]. Runs of the
//! same evaluation name get strictly increasing version numbers so results
//! can be compared run-over-run.

pub mod engine;
pub mod errors;
pub mod eval_api;
pub mod fingerprint;
pub mod model;
pub mod storage;

pub use engine::Runner;
pub use errors::{RunError, StoreError};
pub use eval_api::{Case, EvalOptions, Evaluation, RawScore, ScoreItem};
pub use model::Thresholds;
pub use storage::{EvalStore, MemoryStore, SqliteStore};
