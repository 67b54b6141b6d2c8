use sqlx::Row;

use crate::error::Result;
use crate::types::{CodeEntity, CodeRelation, EntityKind, RelationKind};
use crate::{json_col, json_text, Store};

impl Store {
    pub async fn insert_entity(&self, e: &CodeEntity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO code_entities
                (entity_id, project_id, kind, name, qualified_name, file_path,
                 line_start, line_end, signature, docstring, parent_id, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(entity_id) DO UPDATE SET
                name = excluded.name,
                qualified_name = excluded.qualified_name,
                file_path = excluded.file_path,
                line_start = excluded.line_start,
                line_end = excluded.line_end,
                signature = excluded.signature,
                docstring = excluded.docstring,
                parent_id = excluded.parent_id,
                metadata = excluded.metadata
            "#,
        )
        .bind(&e.entity_id)
        .bind(&e.project_id)
        .bind(e.kind.as_str())
        .bind(&e.name)
        .bind(&e.qualified_name)
        .bind(&e.file_path)
        .bind(e.line_start)
        .bind(e.line_end)
        .bind(&e.signature)
        .bind(&e.docstring)
        .bind(&e.parent_id)
        .bind(json_text(&e.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_entity(&self, entity_id: &str) -> Result<Option<CodeEntity>> {
        let row = sqlx::query(
            "SELECT entity_id, project_id, kind, name, qualified_name, file_path, line_start,
                    line_end, signature, docstring, parent_id, metadata
             FROM code_entities WHERE entity_id = ?",
        )
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(entity_from_row).transpose()
    }

    /// Every entity in a project, optionally narrowed to one file and/or kind.
    pub async fn list_entities(
        &self,
        project_id: &str,
        file_path: Option<&str>,
        kind: Option<EntityKind>,
    ) -> Result<Vec<CodeEntity>> {
        let mut sql = String::from(
            "SELECT entity_id, project_id, kind, name, qualified_name, file_path, line_start,
                    line_end, signature, docstring, parent_id, metadata
             FROM code_entities WHERE project_id = ?",
        );
        if file_path.is_some() {
            sql.push_str(" AND file_path = ?");
        }
        if kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        sql.push_str(" ORDER BY file_path, line_start");

        let mut q = sqlx::query(&sql).bind(project_id);
        if let Some(f) = file_path {
            q = q.bind(f);
        }
        if let Some(k) = kind {
            q = q.bind(k.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(entity_from_row).collect()
    }

    /// Substring match on `name` or `qualified_name`, used by `find_entity`
    /// and `search_code_pattern`.
    pub async fn find_entities_by_name(
        &self,
        project_id: &str,
        pattern: &str,
    ) -> Result<Vec<CodeEntity>> {
        let like = format!("%{pattern}%");
        let rows = sqlx::query(
            "SELECT entity_id, project_id, kind, name, qualified_name, file_path, line_start,
                    line_end, signature, docstring, parent_id, metadata
             FROM code_entities
             WHERE project_id = ? AND (name LIKE ? OR qualified_name LIKE ?)
             ORDER BY file_path, line_start",
        )
        .bind(project_id)
        .bind(&like)
        .bind(&like)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(entity_from_row).collect()
    }

    pub async fn delete_entities_for_file(&self, project_id: &str, file_path: &str) -> Result<()> {
        sqlx::query("DELETE FROM code_entities WHERE project_id = ? AND file_path = ?")
            .bind(project_id)
            .bind(file_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_relation(&self, r: &CodeRelation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO code_relations
                (relation_id, project_id, source_id, target_id, kind, file_path, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(relation_id) DO UPDATE SET
                target_id = excluded.target_id,
                metadata = excluded.metadata
            "#,
        )
        .bind(&r.relation_id)
        .bind(&r.project_id)
        .bind(&r.source_id)
        .bind(&r.target_id)
        .bind(r.kind.as_str())
        .bind(&r.file_path)
        .bind(json_text(&r.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Second-pass resolution: point a relation at a now-known entity id
    /// instead of leaving `target_id` unresolved.
    pub async fn resolve_relation_target(&self, relation_id: &str, target_id: &str) -> Result<()> {
        sqlx::query("UPDATE code_relations SET target_id = ? WHERE relation_id = ?")
            .bind(target_id)
            .bind(relation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn relations_from(&self, project_id: &str, source_id: &str) -> Result<Vec<CodeRelation>> {
        let rows = sqlx::query(
            "SELECT relation_id, project_id, source_id, target_id, kind, file_path, metadata
             FROM code_relations WHERE project_id = ? AND source_id = ?",
        )
        .bind(project_id)
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(relation_from_row).collect()
    }

    pub async fn relations_to(&self, project_id: &str, target_id: &str) -> Result<Vec<CodeRelation>> {
        let rows = sqlx::query(
            "SELECT relation_id, project_id, source_id, target_id, kind, file_path, metadata
             FROM code_relations WHERE project_id = ? AND target_id = ?",
        )
        .bind(project_id)
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(relation_from_row).collect()
    }

    pub async fn relations_of_kind(
        &self,
        project_id: &str,
        kind: RelationKind,
    ) -> Result<Vec<CodeRelation>> {
        let rows = sqlx::query(
            "SELECT relation_id, project_id, source_id, target_id, kind, file_path, metadata
             FROM code_relations WHERE project_id = ? AND kind = ?",
        )
        .bind(project_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(relation_from_row).collect()
    }

    pub async fn all_relations(&self, project_id: &str) -> Result<Vec<CodeRelation>> {
        let rows = sqlx::query(
            "SELECT relation_id, project_id, source_id, target_id, kind, file_path, metadata
             FROM code_relations WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(relation_from_row).collect()
    }

    pub async fn delete_relations_for_file(&self, project_id: &str, file_path: &str) -> Result<()> {
        sqlx::query("DELETE FROM code_relations WHERE project_id = ? AND file_path = ?")
            .bind(project_id)
            .bind(file_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_entities(&self, project_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM code_entities WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Every distinct `file_path` with at least one entity in this project,
    /// used to prune files deleted from disk since the last analysis.
    pub async fn distinct_entity_file_paths(&self, project_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT file_path FROM code_entities WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("file_path")).collect())
    }
}

fn entity_from_row(row: sqlx::sqlite::SqliteRow) -> Result<CodeEntity> {
    let kind_str: String = row.get("kind");
    let metadata_raw: String = row.get("metadata");
    Ok(CodeEntity {
        entity_id: row.get("entity_id"),
        project_id: row.get("project_id"),
        kind: EntityKind::parse(&kind_str)
            .unwrap_or(EntityKind::Function),
        name: row.get("name"),
        qualified_name: row.get("qualified_name"),
        file_path: row.get("file_path"),
        line_start: row.get("line_start"),
        line_end: row.get("line_end"),
        signature: row.get("signature"),
        docstring: row.get("docstring"),
        parent_id: row.get("parent_id"),
        metadata: json_col("metadata", &metadata_raw)?,
    })
}

fn relation_from_row(row: sqlx::sqlite::SqliteRow) -> Result<CodeRelation> {
    let kind_str: String = row.get("kind");
    let metadata_raw: String = row.get("metadata");
    Ok(CodeRelation {
        relation_id: row.get("relation_id"),
        project_id: row.get("project_id"),
        source_id: row.get("source_id"),
        target_id: row.get("target_id"),
        kind: RelationKind::parse(&kind_str).unwrap_or(RelationKind::References),
        file_path: row.get("file_path"),
        metadata: json_col("metadata", &metadata_raw)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Project;
    use chrono::Utc;

    async fn store_with_project() -> Store {
        let store = Store::open("sqlite::memory:").await.unwrap();
        store
            .upsert_project(&Project {
                project_id: "p1".into(),
                name: "demo".into(),
                path: "/src".into(),
                language: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn insert_then_resolve_relation_target() {
        let store = store_with_project().await;
        store
            .insert_relation(&CodeRelation {
                relation_id: "r1".into(),
                project_id: "p1".into(),
                source_id: "e1".into(),
                target_id: None,
                kind: RelationKind::Calls,
                file_path: Some("a.py".into()),
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();

        store.resolve_relation_target("r1", "e2").await.unwrap();
        let rels = store.relations_from("p1", "e1").await.unwrap();
        assert_eq!(rels[0].target_id.as_deref(), Some("e2"));
    }

    #[tokio::test]
    async fn find_entities_by_name_matches_substring() {
        let store = store_with_project().await;
        store
            .insert_entity(&CodeEntity {
                entity_id: "e1".into(),
                project_id: "p1".into(),
                kind: EntityKind::Function,
                name: "compute_debt_score".into(),
                qualified_name: "quality.compute_debt_score".into(),
                file_path: "quality.py".into(),
                line_start: 10,
                line_end: Some(20),
                signature: None,
                docstring: None,
                parent_id: None,
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();

        let found = store.find_entities_by_name("p1", "debt_score").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
