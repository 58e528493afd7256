use crate::errors::RunError;
use crate::eval_api::{Case, Evaluation};
use crate::fingerprint::input_fingerprint;
use crate::model::{NewGroup, NewRecord};
use crate::storage::EvalStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Executes one [`Evaluation`] end-to-end: version negotiation, group
/// creation, bounded-concurrency case execution, and the final total-duration
/// report. Every case that starts either persists a record or surfaces its
/// error from [`Runner::run`].
pub struct Runner {
    store: Arc<dyn EvalStore>,
}

impl Runner {
    pub fn new(store: Arc<dyn EvalStore>) -> Self {
        Self { store }
    }

    /// Runs the evaluation once, creating a new group at the next version of
    /// its name.
    ///
    /// Inputs are materialized before the group row is created, so a failing
    /// input source never leaves an empty group behind. The first task,
    /// scorer, or persistence error stops further dispatches; cases already
    /// in flight drain (and persist their records) before that error is
    /// returned. The group's total duration is reported either way.
    ///
    /// Completion and persistence order among cases is unconstrained; the
    /// only ordering guarantees are that the group exists before any case
    /// runs and that all cases have drained before the duration report.
    pub async fn run<E: Evaluation>(&self, eval: Arc<E>) -> Result<(), RunError> {
        let opts = eval.options();

        let cases = eval.inputs().await.map_err(RunError::Inputs)?;

        let max_version = self.store.max_version(&opts.name).await?;
        let version = max_version.unwrap_or(0) + 1;

        let run_started = Instant::now();
        let group_id = self
            .store
            .create_group(NewGroup {
                name: opts.name.clone(),
                model: opts.model.clone(),
                version,
                generic_prompt: opts.generic_prompt.clone(),
                thresholds: opts.thresholds,
            })
            .await?;

        debug!(name = %opts.name, version, cases = cases.len(), "running eval group");

        let concurrency = opts.concurrency.max(1);
        let sem = Arc::new(Semaphore::new(concurrency));
        let failed = Arc::new(AtomicBool::new(false));
        let mut join_set = JoinSet::new();

        let total = cases.len();
        for (index, case) in cases.into_iter().enumerate() {
            // First error stops new dispatches; workers in flight drain below.
            if failed.load(Ordering::SeqCst) {
                break;
            }
            if index > 0 && !opts.delay.is_zero() {
                tokio::time::sleep(opts.delay).await;
            }
            let permit = sem.clone().acquire_owned().await?;

            let store = Arc::clone(&self.store);
            let eval = Arc::clone(&eval);
            let group_id = group_id.clone();
            let name = opts.name.clone();
            let failed = Arc::clone(&failed);
            join_set.spawn(async move {
                let _permit = permit;
                // The permit may have been freed by a failing case; re-check
                // so a doomed run does not keep starting work.
                if failed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                // Trips the flag on error AND on a panic in user code; the
                // guard drops (and stores) before the permit is released.
                let mut guard = FailGuard {
                    failed,
                    armed: true,
                };
                debug!(name = %name, case = index, total, "running case");
                let res = run_case(store.as_ref(), eval.as_ref(), case, &group_id).await;
                if res.is_ok() {
                    guard.armed = false;
                    debug!(name = %name, case = index, total, "finished case");
                }
                res
            });
        }

        let mut first_error: Option<RunError> = None;
        while let Some(joined) = join_set.join_next().await {
            let res = joined.unwrap_or_else(|e| Err(RunError::Join(e)));
            if let Err(e) = res {
                warn!(name = %opts.name, error = %e, "case failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        let total_duration_ms = run_started.elapsed().as_millis() as u64;
        self.store
            .update_group_duration(&group_id, total_duration_ms)
            .await?;
        debug!(name = %opts.name, version, total_duration_ms, "finished eval group");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Marks the run as failed unless disarmed. Lives inside the worker so that
/// a panicking task/scorer stops further dispatches the same way an `Err`
/// does.
struct FailGuard {
    failed: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for FailGuard {
    fn drop(&mut self) {
        if self.armed {
            self.failed.store(true, Ordering::SeqCst);
        }
    }
}

/// The per-case pipeline: task, scorer, normalization, fingerprint, persist.
async fn run_case<E: Evaluation>(
    store: &dyn EvalStore,
    eval: &E,
    case: Case<E::Input, E::Expected>,
    group_id: &str,
) -> Result<(), RunError> {
    let task_started = Instant::now();
    let output = eval.task(&case.input).await.map_err(RunError::Task)?;
    let duration_ms = task_started.elapsed().as_millis() as u64;

    let raw = eval
        .score(&case.input, &output, case.expected.as_ref())
        .await
        .map_err(RunError::Scorer)?;
    let (score, items) = raw.normalize();
    let formatted_score = items.map(|i| serde_json::to_string(&i)).transpose()?;

    let record = NewRecord {
        input_fingerprint: input_fingerprint(&case.input)?,
        input: serde_json::to_string(&case.input)?,
        output: serde_json::to_string(&output)?,
        expected: case
            .expected
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
        formatted_input: eval.format_input(&case.input),
        formatted_output: eval.format_output(&output),
        score,
        formatted_score,
        duration_ms,
        eval_group_id: group_id.to_string(),
    };
    store.save_record(record).await?;
    Ok(())
}
