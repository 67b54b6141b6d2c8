use chrono::Utc;
use devguard_storage::types::BlockLevel;
use devguard_storage::Store;
use serde_json::Value;

use crate::error::Result;
use crate::fingerprint::error_id;

pub struct RecordedError {
    pub error_id: String,
    pub record_row_id: i64,
    pub is_new: bool,
}

#[allow(clippy::too_many_arguments)]
pub async fn record_error(
    store: &Store,
    error_type: &str,
    error_scene: &str,
    error_pattern: &Value,
    error_message: &str,
    solution: Option<&str>,
    solution_confidence: f64,
    block_level: BlockLevel,
    auto_fix: bool,
) -> Result<RecordedError> {
    let fingerprint = error_id(error_type, error_pattern);
    let is_new = store.get_error_record_by_error_id(&fingerprint).await?.is_none();

    let row_id = store
        .record_error(
            &fingerprint,
            error_type,
            error_scene,
            error_pattern,
            error_message,
            solution,
            solution_confidence,
            block_level,
            auto_fix,
            Utc::now(),
        )
        .await?;

    Ok(RecordedError {
        error_id: fingerprint,
        record_row_id: row_id,
        is_new,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn first_occurrence_is_new_second_is_not() {
        let store = Store::open("sqlite::memory:").await.unwrap();
        let pattern = json!({"exception": "TypeError"});

        let first = record_error(
            &store,
            "runtime",
            "unhandled TypeError",
            &pattern,
            "boom",
            None,
            0.0,
            BlockLevel::Warning,
            false,
        )
        .await
        .unwrap();
        assert!(first.is_new);

        let second = record_error(
            &store,
            "runtime",
            "unhandled TypeError",
            &pattern,
            "boom again",
            None,
            0.0,
            BlockLevel::Warning,
            false,
        )
        .await
        .unwrap();
        assert!(!second.is_new);
        assert_eq!(first.record_row_id, second.record_row_id);
    }
}
