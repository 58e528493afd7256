use super::{now_rfc3339, EvalStore};
use crate::errors::StoreError;
use crate::model::{GroupSummary, NewGroup, NewRecord, ScorePoint, Thresholds, VersionRow};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// SQLite-backed store. Writes are row inserts under a connection mutex, so
/// concurrent workers serialize at the connection without interleaving.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Idempotent; safe to call on an existing database.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Thresholds stored for a group, if the run supplied any.
    pub fn thresholds(&self, group_id: &str) -> Result<Option<Thresholds>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT good_score, average_score FROM eval_group_threshold WHERE id = ?1",
                params![group_id],
                |r| {
                    Ok(Thresholds {
                        good_score: r.get(0)?,
                        average_score: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Latest run per evaluation name, most recent first, with per-group
    /// aggregates over its records.
    pub fn latest_groups(&self) -> Result<Vec<GroupSummary>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT g.id, g.name, g.model, g.version, g.created_at,
                    COUNT(e.id), COALESCE(AVG(e.score), 0)
             FROM eval_groups g
             LEFT JOIN evals e ON e.eval_group_id = g.id
             WHERE g.version = (SELECT MAX(version) FROM eval_groups WHERE name = g.name)
             GROUP BY g.id, g.name, g.model, g.version, g.created_at
             ORDER BY g.created_at DESC",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(GroupSummary {
                id: r.get(0)?,
                name: r.get(1)?,
                model: r.get(2)?,
                latest_version: r.get(3)?,
                last_run_at: r.get(4)?,
                total_cases: r.get(5)?,
                avg_score: r.get(6)?,
            })
        })?;
        collect(rows)
    }

    /// Full version history for one evaluation name, oldest first.
    pub fn versions(&self, name: &str) -> Result<Vec<VersionRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT g.id, g.version, g.model, COALESCE(AVG(e.score), 0),
                    COUNT(e.id), g.duration, g.created_at
             FROM eval_groups g
             LEFT JOIN evals e ON e.eval_group_id = g.id
             WHERE g.name = ?1
             GROUP BY g.id, g.version, g.model, g.duration, g.created_at
             ORDER BY g.version ASC",
        )?;
        let rows = stmt.query_map(params![name], |r| {
            Ok(VersionRow {
                id: r.get(0)?,
                version: r.get(1)?,
                model: r.get(2)?,
                avg_score: r.get(3)?,
                total_cases: r.get(4)?,
                total_duration_ms: r.get(5)?,
                created_at: r.get(6)?,
            })
        })?;
        collect(rows)
    }

    /// Score of the same logical case across versions, matched by input
    /// fingerprint, oldest version first.
    pub fn score_history(&self, fingerprint: &str) -> Result<Vec<ScorePoint>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT g.version, e.score, e.duration, e.created_at
             FROM evals e
             JOIN eval_groups g ON g.id = e.eval_group_id
             WHERE e.input_finger_print = ?1
             ORDER BY g.version ASC",
        )?;
        let rows = stmt.query_map(params![fingerprint], |r| {
            Ok(ScorePoint {
                version: r.get(0)?,
                score: r.get(1)?,
                duration_ms: r.get(2)?,
                created_at: r.get(3)?,
            })
        })?;
        collect(rows)
    }
}

fn collect<T>(
    rows: impl Iterator<Item = Result<T, rusqlite::Error>>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

#[async_trait]
impl EvalStore for SqliteStore {
    async fn max_version(&self, name: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(version) FROM eval_groups WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(max)
    }

    async fn create_group(&self, group: NewGroup) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO eval_groups(id, name, model, generic_prompt, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, group.name, group.model, group.generic_prompt, group.version, now],
        )?;
        if let Some(t) = group.thresholds {
            conn.execute(
                "INSERT INTO eval_group_threshold(id, good_score, average_score, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id, t.good_score, t.average_score, now],
            )?;
        }
        Ok(id)
    }

    async fn save_record(&self, record: NewRecord) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO evals(id, input, output, expected, formatted_input, formatted_output,
                               score, formatted_score, duration, input_finger_print,
                               eval_group_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                id,
                record.input,
                record.output,
                record.expected,
                record.formatted_input,
                record.formatted_output,
                record.score,
                record.formatted_score,
                record.duration_ms as f64,
                record.input_fingerprint,
                record.eval_group_id,
                now
            ],
        )?;
        Ok(())
    }

    async fn update_group_duration(
        &self,
        group_id: &str,
        total_duration_ms: u64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE eval_groups SET duration = ?1, updated_at = ?2 WHERE id = ?3",
            params![total_duration_ms as f64, now_rfc3339(), group_id],
        )?;
        if updated == 0 {
            return Err(StoreError::Rejected(format!("unknown group id {group_id}")));
        }
        Ok(())
    }
}
