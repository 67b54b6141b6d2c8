//! Multi-language code analyzer.
//!
//! Discovers source files under a project root, extracts entities
//! (modules/classes/functions/methods) and relations (calls/imports/
//! inherits/contains) per file, then resolves cross-file references in a
//! second pass once every file's entities are known.

pub mod analyze;
pub mod discovery;
pub mod ids;
pub mod js_ts;
pub mod model;
pub mod python;

pub use analyze::{analyze_codebase, AnalysisSummary};

#[cfg(test)]
mod tests {
    use super::*;
    use devguard_storage::types::{Project, RelationKind};
    use devguard_storage::Store;
    use std::io::Write;

    #[tokio::test]
    async fn analyzes_a_small_python_project_and_resolves_calls() {
        let dir = tempdir();
        std::fs::write(
            dir.join("util.py"),
            "def helper():\n    return 1\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("main.py"),
            "def run():\n    helper()\n",
        )
        .unwrap();

        let store = Store::open("sqlite::memory:").await.unwrap();
        store
            .upsert_project(&Project {
                project_id: "p1".into(),
                name: "demo".into(),
                path: dir.to_string_lossy().to_string(),
                language: Some("python".into()),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let summary = analyze_codebase(&store, "p1", &dir).await.unwrap();
        assert_eq!(summary.files_analyzed, 2);
        assert!(summary.entities_found >= 2);

        let calls = store
            .relations_of_kind("p1", RelationKind::Calls)
            .await
            .unwrap();
        assert!(calls.iter().any(|r| r.target_id.is_some()));

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("devguard_analyzer_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::io::stdout().flush();
        dir
    }
}
