use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::{BlockLevel, ErrorRecord, InterceptAction, InterceptLog};
use crate::{json_col, json_text, Store};

impl Store {
    /// Idempotent by `error_id` (the content hash): a repeat occurrence bumps
    /// `occurrence_count` and `last_occurred_at` instead of inserting a new
    /// row. Returns the row id, used to log the originating intercept.
    pub async fn record_error(
        &self,
        error_id: &str,
        error_type: &str,
        error_scene: &str,
        error_pattern: &serde_json::Value,
        error_message: &str,
        solution: Option<&str>,
        solution_confidence: f64,
        block_level: BlockLevel,
        auto_fix: bool,
        occurred_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64> {
        let existing = sqlx::query("SELECT id FROM error_records WHERE error_id = ?")
            .bind(error_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = existing {
            let id: i64 = row.get("id");
            sqlx::query(
                "UPDATE error_records SET occurrence_count = occurrence_count + 1,
                    last_occurred_at = ?, solution = COALESCE(?, solution),
                    solution_confidence = MAX(solution_confidence, ?)
                 WHERE id = ?",
            )
            .bind(occurred_at)
            .bind(solution)
            .bind(solution_confidence)
            .bind(id)
            .execute(&self.pool)
            .await?;
            return Ok(id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO error_records
                (error_id, error_type, error_scene, error_pattern, error_message, solution,
                 solution_confidence, block_level, auto_fix, occurrence_count, blocked_count,
                 last_occurred_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?)
            "#,
        )
        .bind(error_id)
        .bind(error_type)
        .bind(error_scene)
        .bind(json_text(error_pattern))
        .bind(error_message)
        .bind(solution)
        .bind(solution_confidence)
        .bind(block_level.as_str())
        .bind(auto_fix)
        .bind(occurred_at)
        .bind(occurred_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_error_record(&self, id: i64) -> Result<Option<ErrorRecord>> {
        let row = sqlx::query(
            "SELECT id, error_id, error_type, error_scene, error_pattern, error_message,
                    solution, solution_confidence, block_level, auto_fix, occurrence_count,
                    blocked_count, last_occurred_at, created_at
             FROM error_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(error_record_from_row).transpose()
    }

    pub async fn require_error_record(&self, id: i64) -> Result<ErrorRecord> {
        self.get_error_record(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("error record {id}")))
    }

    /// Lookup by the content-hash `error_id` rather than row id, used to
    /// tell a fresh `record_error` call from a repeat occurrence.
    pub async fn get_error_record_by_error_id(&self, error_id: &str) -> Result<Option<ErrorRecord>> {
        let row = sqlx::query(
            "SELECT id, error_id, error_type, error_scene, error_pattern, error_message,
                    solution, solution_confidence, block_level, auto_fix, occurrence_count,
                    blocked_count, last_occurred_at, created_at
             FROM error_records WHERE error_id = ?",
        )
        .bind(error_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(error_record_from_row).transpose()
    }

    /// Candidate set for `check_operation`'s confidence matching: all known
    /// records for an error type (and, when the scene narrows further, the
    /// matching scene too).
    pub async fn error_records_by_type(
        &self,
        error_type: &str,
        error_scene: Option<&str>,
    ) -> Result<Vec<ErrorRecord>> {
        let mut sql = String::from(
            "SELECT id, error_id, error_type, error_scene, error_pattern, error_message,
                    solution, solution_confidence, block_level, auto_fix, occurrence_count,
                    blocked_count, last_occurred_at, created_at
             FROM error_records WHERE error_type = ?",
        );
        if error_scene.is_some() {
            sql.push_str(" AND error_scene = ?");
        }
        let mut q = sqlx::query(&sql).bind(error_type);
        if let Some(scene) = error_scene {
            q = q.bind(scene);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(error_record_from_row).collect()
    }

    /// Every known error record, for `error_firewall_stats`'s aggregate pass.
    pub async fn all_error_records(&self) -> Result<Vec<ErrorRecord>> {
        let rows = sqlx::query(
            "SELECT id, error_id, error_type, error_scene, error_pattern, error_message,
                    solution, solution_confidence, block_level, auto_fix, occurrence_count,
                    blocked_count, last_occurred_at, created_at
             FROM error_records",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(error_record_from_row).collect()
    }

    pub async fn increment_blocked_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE error_records SET blocked_count = blocked_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_intercept_log(&self, log: &InterceptLog) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO intercept_logs
                (error_record_id, intercept_type, intercept_action, operation_type,
                 operation_params, match_confidence, session_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.error_record_id)
        .bind(&log.intercept_type)
        .bind(log.intercept_action.as_str())
        .bind(&log.operation_type)
        .bind(json_text(&log.operation_params))
        .bind(log.match_confidence)
        .bind(&log.session_id)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn recent_intercepts(&self, limit: i64) -> Result<Vec<InterceptLog>> {
        let rows = sqlx::query(
            "SELECT id, error_record_id, intercept_type, intercept_action, operation_type,
                    operation_params, match_confidence, session_id, created_at
             FROM intercept_logs ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(intercept_from_row).collect()
    }

    /// `(total_intercepts, blocked_intercepts)` for `error_firewall_stats`'s
    /// block rate.
    pub async fn intercept_totals(&self) -> Result<(i64, i64)> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    SUM(CASE WHEN intercept_action = 'blocked' THEN 1 ELSE 0 END) AS blocked
             FROM intercept_logs",
        )
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = row.get("total");
        let blocked: Option<i64> = row.get("blocked");
        Ok((total, blocked.unwrap_or(0)))
    }

    pub async fn intercept_counts_by_type(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT intercept_type, COUNT(*) AS n FROM intercept_logs
             GROUP BY intercept_type ORDER BY n DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("intercept_type"), r.get::<i64, _>("n")))
            .collect())
    }
}

fn error_record_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ErrorRecord> {
    let block_level_str: String = row.get("block_level");
    let pattern_raw: String = row.get("error_pattern");
    Ok(ErrorRecord {
        id: row.get("id"),
        error_id: row.get("error_id"),
        error_type: row.get("error_type"),
        error_scene: row.get("error_scene"),
        error_pattern: json_col("error_pattern", &pattern_raw)?,
        error_message: row.get("error_message"),
        solution: row.get("solution"),
        solution_confidence: row.get("solution_confidence"),
        block_level: BlockLevel::parse(&block_level_str).unwrap_or(BlockLevel::Warning),
        auto_fix: row.get::<i64, _>("auto_fix") != 0,
        occurrence_count: row.get("occurrence_count"),
        blocked_count: row.get("blocked_count"),
        last_occurred_at: row.get("last_occurred_at"),
        created_at: row.get("created_at"),
    })
}

fn intercept_from_row(row: sqlx::sqlite::SqliteRow) -> Result<InterceptLog> {
    let action_str: String = row.get("intercept_action");
    let params_raw: String = row.get("operation_params");
    Ok(InterceptLog {
        id: row.get("id"),
        error_record_id: row.get("error_record_id"),
        intercept_type: row.get("intercept_type"),
        intercept_action: InterceptAction::parse(&action_str).unwrap_or(InterceptAction::Allowed),
        operation_type: row.get("operation_type"),
        operation_params: json_col("operation_params", &params_raw)?,
        match_confidence: row.get("match_confidence"),
        session_id: row.get("session_id"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeat_error_increments_occurrence_count() {
        let store = Store::open("sqlite::memory:").await.unwrap();
        let now = chrono::Utc::now();
        let pattern = serde_json::json!({"exception": "TypeError"});

        let id1 = store
            .record_error(
                "hash1",
                "TypeError",
                "runtime",
                &pattern,
                "boom",
                None,
                0.0,
                BlockLevel::Warning,
                false,
                now,
            )
            .await
            .unwrap();
        let id2 = store
            .record_error(
                "hash1",
                "TypeError",
                "runtime",
                &pattern,
                "boom",
                None,
                0.0,
                BlockLevel::Warning,
                false,
                now,
            )
            .await
            .unwrap();

        assert_eq!(id1, id2);
        let rec = store.require_error_record(id1).await.unwrap();
        assert_eq!(rec.occurrence_count, 2);
    }
}
