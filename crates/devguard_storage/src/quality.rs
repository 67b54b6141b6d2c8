use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::{DebtSnapshot, IssueStatus, QualityIssue, Severity};
use crate::{json_col, json_text, Store};

impl Store {
    /// Upsert-by-fingerprint: an `open` issue already recorded for the same
    /// `(issue_type, entity_id, file_path, line_number)` is refreshed in
    /// place (new `detected_at`, new metadata) rather than duplicated, since
    /// detectors re-run on every `analyze_codebase` pass.
    pub async fn record_quality_issue(&self, issue: &QualityIssue) -> Result<()> {
        let existing = sqlx::query(
            "SELECT issue_id FROM quality_issues
             WHERE project_id = ? AND issue_type = ? AND status = 'open'
               AND entity_id IS ? AND file_path IS ? AND line_number IS ?",
        )
        .bind(&issue.project_id)
        .bind(&issue.issue_type)
        .bind(&issue.entity_id)
        .bind(&issue.file_path)
        .bind(issue.line_number)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            let issue_id: String = row.get("issue_id");
            sqlx::query(
                "UPDATE quality_issues SET severity = ?, title = ?, description = ?,
                    suggestion = ?, metadata = ?, detected_at = ? WHERE issue_id = ?",
            )
            .bind(issue.severity.as_str())
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(&issue.suggestion)
            .bind(json_text(&issue.metadata))
            .bind(issue.detected_at)
            .bind(&issue_id)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO quality_issues
                (issue_id, project_id, issue_type, severity, entity_id, file_path,
                 line_number, title, description, suggestion, metadata, status,
                 detected_at, resolved_at, resolved_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(&issue.issue_id)
        .bind(&issue.project_id)
        .bind(&issue.issue_type)
        .bind(issue.severity.as_str())
        .bind(&issue.entity_id)
        .bind(&issue.file_path)
        .bind(issue.line_number)
        .bind(&issue.title)
        .bind(&issue.description)
        .bind(&issue.suggestion)
        .bind(json_text(&issue.metadata))
        .bind(issue.status.as_str())
        .bind(issue.detected_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_quality_issue(&self, issue_id: &str) -> Result<Option<QualityIssue>> {
        let row = sqlx::query(
            "SELECT issue_id, project_id, issue_type, severity, entity_id, file_path,
                    line_number, title, description, suggestion, metadata, status,
                    detected_at, resolved_at, resolved_by
             FROM quality_issues WHERE issue_id = ?",
        )
        .bind(issue_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(issue_from_row).transpose()
    }

    pub async fn require_quality_issue(&self, issue_id: &str) -> Result<QualityIssue> {
        self.get_quality_issue(issue_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("quality issue {issue_id}")))
    }

    pub async fn set_issue_status(
        &self,
        issue_id: &str,
        status: IssueStatus,
        resolved_at: Option<chrono::DateTime<chrono::Utc>>,
        resolved_by: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE quality_issues SET status = ?, resolved_at = ?, resolved_by = ?
             WHERE issue_id = ?",
        )
        .bind(status.as_str())
        .bind(resolved_at)
        .bind(resolved_by)
        .bind(issue_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_quality_issues(
        &self,
        project_id: &str,
        status: Option<IssueStatus>,
        severity: Option<Severity>,
        issue_type: Option<&str>,
    ) -> Result<Vec<QualityIssue>> {
        let mut sql = String::from(
            "SELECT issue_id, project_id, issue_type, severity, entity_id, file_path,
                    line_number, title, description, suggestion, metadata, status,
                    detected_at, resolved_at, resolved_by
             FROM quality_issues WHERE project_id = ?",
        );
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if severity.is_some() {
            sql.push_str(" AND severity = ?");
        }
        if issue_type.is_some() {
            sql.push_str(" AND issue_type = ?");
        }
        sql.push_str(" ORDER BY detected_at DESC");

        let mut q = sqlx::query(&sql).bind(project_id);
        if let Some(s) = status {
            q = q.bind(s.as_str());
        }
        if let Some(s) = severity {
            q = q.bind(s.as_str());
        }
        if let Some(t) = issue_type {
            q = q.bind(t);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(issue_from_row).collect()
    }

    /// File paths ranked by summed open-issue severity weight (critical=4,
    /// high=2, medium=1, low=0.5), each paired with its top-3 issue titles
    /// by the same weight, for `identify_debt_hotspots`.
    pub async fn hotspot_files(&self, project_id: &str, limit: i64) -> Result<Vec<(String, f64, Vec<String>)>> {
        let rows = sqlx::query(
            "SELECT file_path,
                    SUM(CASE severity
                        WHEN 'critical' THEN 4.0
                        WHEN 'high' THEN 2.0
                        WHEN 'medium' THEN 1.0
                        ELSE 0.5 END) AS score
             FROM quality_issues
             WHERE project_id = ? AND status = 'open' AND file_path IS NOT NULL
             GROUP BY file_path ORDER BY score DESC LIMIT ?",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut hotspots = Vec::with_capacity(rows.len());
        for row in rows {
            let file_path: String = row.get("file_path");
            let score: f64 = row.get("score");
            let top_issues = self.top_issue_titles(project_id, &file_path, 3).await?;
            hotspots.push((file_path, score, top_issues));
        }
        Ok(hotspots)
    }

    async fn top_issue_titles(&self, project_id: &str, file_path: &str, limit: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT title FROM quality_issues
             WHERE project_id = ? AND status = 'open' AND file_path = ?
             ORDER BY CASE severity
                WHEN 'critical' THEN 4.0
                WHEN 'high' THEN 2.0
                WHEN 'medium' THEN 1.0
                ELSE 0.5 END DESC, detected_at DESC
             LIMIT ?",
        )
        .bind(project_id)
        .bind(file_path)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("title")).collect())
    }

    pub async fn insert_debt_snapshot(&self, snap: &DebtSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO debt_snapshots
                (snapshot_id, project_id, overall_score, code_quality_score,
                 test_coverage_score, docs_coverage_score, dependency_health_score,
                 todo_debt_score, critical_count, high_count, medium_count, low_count,
                 estimated_days_to_fix, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snap.snapshot_id)
        .bind(&snap.project_id)
        .bind(snap.overall_score)
        .bind(snap.code_quality_score)
        .bind(snap.test_coverage_score)
        .bind(snap.docs_coverage_score)
        .bind(snap.dependency_health_score)
        .bind(snap.todo_debt_score)
        .bind(snap.critical_count)
        .bind(snap.high_count)
        .bind(snap.medium_count)
        .bind(snap.low_count)
        .bind(snap.estimated_days_to_fix)
        .bind(snap.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn latest_debt_snapshot(&self, project_id: &str) -> Result<Option<DebtSnapshot>> {
        let row = sqlx::query(
            "SELECT snapshot_id, project_id, overall_score, code_quality_score,
                    test_coverage_score, docs_coverage_score, dependency_health_score,
                    todo_debt_score, critical_count, high_count, medium_count, low_count,
                    estimated_days_to_fix, created_at
             FROM debt_snapshots WHERE project_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(snapshot_from_row))
    }

    /// Up to `limit` snapshots, oldest first, for `get_quality_trends`.
    pub async fn debt_snapshot_history(
        &self,
        project_id: &str,
        limit: i64,
    ) -> Result<Vec<DebtSnapshot>> {
        let rows = sqlx::query(
            "SELECT snapshot_id, project_id, overall_score, code_quality_score,
                    test_coverage_score, docs_coverage_score, dependency_health_score,
                    todo_debt_score, critical_count, high_count, medium_count, low_count,
                    estimated_days_to_fix, created_at
             FROM debt_snapshots WHERE project_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let mut snapshots: Vec<_> = rows.into_iter().map(snapshot_from_row).collect();
        snapshots.reverse();
        Ok(snapshots)
    }
}

fn issue_from_row(row: sqlx::sqlite::SqliteRow) -> Result<QualityIssue> {
    let severity_str: String = row.get("severity");
    let status_str: String = row.get("status");
    let metadata_raw: String = row.get("metadata");
    Ok(QualityIssue {
        issue_id: row.get("issue_id"),
        project_id: row.get("project_id"),
        issue_type: row.get("issue_type"),
        severity: Severity::parse(&severity_str).unwrap_or(Severity::Low),
        entity_id: row.get("entity_id"),
        file_path: row.get("file_path"),
        line_number: row.get("line_number"),
        title: row.get("title"),
        description: row.get("description"),
        suggestion: row.get("suggestion"),
        metadata: json_col("metadata", &metadata_raw)?,
        status: IssueStatus::parse(&status_str).unwrap_or(IssueStatus::Open),
        detected_at: row.get("detected_at"),
        resolved_at: row.get("resolved_at"),
        resolved_by: row.get("resolved_by"),
    })
}

fn snapshot_from_row(row: sqlx::sqlite::SqliteRow) -> DebtSnapshot {
    DebtSnapshot {
        snapshot_id: row.get("snapshot_id"),
        project_id: row.get("project_id"),
        overall_score: row.get("overall_score"),
        code_quality_score: row.get("code_quality_score"),
        test_coverage_score: row.get("test_coverage_score"),
        docs_coverage_score: row.get("docs_coverage_score"),
        dependency_health_score: row.get("dependency_health_score"),
        todo_debt_score: row.get("todo_debt_score"),
        critical_count: row.get("critical_count"),
        high_count: row.get("high_count"),
        medium_count: row.get("medium_count"),
        low_count: row.get("low_count"),
        estimated_days_to_fix: row.get("estimated_days_to_fix"),
        created_at: row.get("created_at"),
    }
}
