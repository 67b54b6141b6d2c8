use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::{Decision, DecisionStatus};
use crate::{json_col, json_text, Store};

impl Store {
    pub async fn insert_decision(&self, d: &Decision) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions
                (decision_id, project_id, session_id, category, title, description,
                 reasoning, alternatives, trade_offs, impact_scope, status,
                 superseded_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&d.decision_id)
        .bind(&d.project_id)
        .bind(&d.session_id)
        .bind(&d.category)
        .bind(&d.title)
        .bind(&d.description)
        .bind(&d.reasoning)
        .bind(json_text(&d.alternatives))
        .bind(json_text(&d.trade_offs))
        .bind(&d.impact_scope)
        .bind(d.status.as_str())
        .bind(&d.superseded_by)
        .bind(d.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_decision(&self, decision_id: &str) -> Result<Option<Decision>> {
        let row = sqlx::query(
            "SELECT decision_id, project_id, session_id, category, title, description,
                    reasoning, alternatives, trade_offs, impact_scope, status,
                    superseded_by, created_at
             FROM decisions WHERE decision_id = ?",
        )
        .bind(decision_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(decision_from_row).transpose()
    }

    /// Marks `decision_id` superseded by `new_id`. Callers must have already
    /// verified this does not create a cycle in the supersession chain
    /// (`devguard_context::decisions::check_supersession_cycle`).
    pub async fn supersede_decision(&self, decision_id: &str, new_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE decisions SET status = 'superseded', superseded_by = ? WHERE decision_id = ?",
        )
        .bind(new_id)
        .bind(decision_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn revert_decision(&self, decision_id: &str) -> Result<()> {
        sqlx::query("UPDATE decisions SET status = 'reverted' WHERE decision_id = ?")
            .bind(decision_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_decisions(
        &self,
        project_id: &str,
        category: Option<&str>,
        status: Option<DecisionStatus>,
    ) -> Result<Vec<Decision>> {
        let mut sql = String::from(
            "SELECT decision_id, project_id, session_id, category, title, description,
                    reasoning, alternatives, trade_offs, impact_scope, status,
                    superseded_by, created_at
             FROM decisions WHERE project_id = ?",
        );
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query(&sql).bind(project_id);
        if let Some(c) = category {
            q = q.bind(c);
        }
        if let Some(s) = status {
            q = q.bind(s.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(decision_from_row).collect()
    }

    pub async fn require_decision(&self, decision_id: &str) -> Result<Decision> {
        self.get_decision(decision_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("decision {decision_id}")))
    }
}

fn decision_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Decision> {
    let status_str: String = row.get("status");
    let alternatives_raw: String = row.get("alternatives");
    let trade_offs_raw: String = row.get("trade_offs");
    Ok(Decision {
        decision_id: row.get("decision_id"),
        project_id: row.get("project_id"),
        session_id: row.get("session_id"),
        category: row.get("category"),
        title: row.get("title"),
        description: row.get("description"),
        reasoning: row.get("reasoning"),
        alternatives: json_col("alternatives", &alternatives_raw)?,
        trade_offs: json_col("trade_offs", &trade_offs_raw)?,
        impact_scope: row.get("impact_scope"),
        status: DecisionStatus::parse(&status_str).unwrap_or(DecisionStatus::Active),
        superseded_by: row.get("superseded_by"),
        created_at: row.get("created_at"),
    })
}
