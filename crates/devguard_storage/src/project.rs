use chrono::Utc;
use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::Project;
use crate::Store;

impl Store {
    /// Insert the project if `project_id` is new, otherwise update its
    /// mutable fields (`name`, `path`, `language`). `created_at` is preserved
    /// across re-registration of an already-known project.
    pub async fn upsert_project(&self, project: &Project) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (project_id, name, path, language, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(project_id) DO UPDATE SET
                name = excluded.name,
                path = excluded.path,
                language = excluded.language
            "#,
        )
        .bind(&project.project_id)
        .bind(&project.name)
        .bind(&project.path)
        .bind(&project.language)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT project_id, name, path, language, created_at FROM projects WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(project_from_row))
    }

    pub async fn require_project(&self, project_id: &str) -> Result<Project> {
        self.get_project(project_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("project {project_id}")))
    }

    pub async fn find_project_by_path(&self, path: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT project_id, name, path, language, created_at FROM projects WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(project_from_row))
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT project_id, name, path, language, created_at FROM projects ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(project_from_row).collect())
    }

    /// Deletes the project and, via `ON DELETE CASCADE`, every entity,
    /// relation, session, decision, note and todo rooted at it.
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE project_id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn project_from_row(row: sqlx::sqlite::SqliteRow) -> Project {
    Project {
        project_id: row.get("project_id"),
        name: row.get("name"),
        path: row.get("path"),
        language: row.get("language"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Store {
        Store::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn upsert_then_update_preserves_created_at() {
        let store = store().await;
        let created = Utc::now();
        let p = Project {
            project_id: "p1".into(),
            name: "demo".into(),
            path: "/src/demo".into(),
            language: Some("python".into()),
            created_at: created,
        };
        store.upsert_project(&p).await.unwrap();

        let mut updated = p.clone();
        updated.name = "demo-renamed".into();
        store.upsert_project(&updated).await.unwrap();

        let loaded = store.require_project("p1").await.unwrap();
        assert_eq!(loaded.name, "demo-renamed");
        assert_eq!(loaded.created_at.timestamp(), created.timestamp());
    }

    #[tokio::test]
    async fn delete_project_cascades_to_entities() {
        let store = store().await;
        let p = Project {
            project_id: "p1".into(),
            name: "demo".into(),
            path: "/src/demo".into(),
            language: None,
            created_at: Utc::now(),
        };
        store.upsert_project(&p).await.unwrap();

        store
            .insert_entity(&crate::types::CodeEntity {
                entity_id: "e1".into(),
                project_id: "p1".into(),
                kind: crate::types::EntityKind::Function,
                name: "foo".into(),
                qualified_name: "mod.foo".into(),
                file_path: "mod.py".into(),
                line_start: 1,
                line_end: Some(3),
                signature: None,
                docstring: None,
                parent_id: None,
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();

        store.delete_project("p1").await.unwrap();
        assert!(store.get_entity("e1").await.unwrap().is_none());
    }
}
