//! Operation interception: "the same mistake only gets made once".
//!
//! `check_operation` matches the current operation's parameters against every
//! recorded error of the same type, scoring each by fractional key overlap,
//! and blocks/warns based on the best match's `block_level`.

use devguard_storage::types::{BlockLevel, ErrorRecord, InterceptAction, InterceptLog};
use devguard_storage::Store;
use serde_json::Value;

use crate::error::Result;

const MATCH_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchedError {
    pub error_id: String,
    pub error_type: String,
    pub error_scene: String,
    pub match_confidence: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    pub should_block: bool,
    pub should_warn: bool,
    pub matched_error: Option<MatchedError>,
    pub solution: Option<String>,
    pub solution_confidence: f64,
    pub auto_fix_available: bool,
}

impl CheckResult {
    fn safe() -> Self {
        Self {
            should_block: false,
            should_warn: false,
            matched_error: None,
            solution: None,
            solution_confidence: 0.0,
            auto_fix_available: false,
        }
    }
}

/// Fraction of `stored_pattern`'s keys present in `operation_params` with a
/// matching value (1.0 for an exact match, 0.8 for a case-insensitive
/// string match), `0.0` if `stored_pattern` is empty.
fn match_confidence(operation_params: &Value, stored_pattern: &Value) -> f64 {
    let Some(stored) = stored_pattern.as_object() else {
        return 0.0;
    };
    if stored.is_empty() {
        return 0.0;
    }
    let operation = operation_params.as_object();

    let mut matched = 0.0;
    for (key, value) in stored {
        let Some(candidate) = operation.and_then(|o| o.get(key)) else {
            continue;
        };
        if candidate == value {
            matched += 1.0;
        } else if values_match_case_insensitive(candidate, value) {
            matched += 0.8;
        }
    }
    matched / stored.len() as f64
}

fn values_match_case_insensitive(a: &Value, b: &Value) -> bool {
    let as_lower = |v: &Value| match v {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    };
    as_lower(a) == as_lower(b)
}

pub async fn check_operation(
    store: &Store,
    operation_type: &str,
    operation_params: &Value,
    session_id: Option<&str>,
) -> Result<CheckResult> {
    let candidates = store.error_records_by_type(operation_type, None).await?;

    let mut best: Option<(ErrorRecord, f64)> = None;
    for record in candidates {
        if record.block_level == BlockLevel::None {
            continue;
        }
        let confidence = match_confidence(operation_params, &record.error_pattern);
        if confidence <= MATCH_THRESHOLD {
            continue;
        }
        let replace = match &best {
            None => true,
            Some((current, current_conf)) => {
                confidence > *current_conf
                    || (confidence == *current_conf && record.last_occurred_at > current.last_occurred_at)
            }
        };
        if replace {
            best = Some((record, confidence));
        }
    }

    let Some((record, confidence)) = best else {
        return Ok(CheckResult::safe());
    };

    let should_block = record.block_level == BlockLevel::Block;
    let should_warn = record.block_level == BlockLevel::Warning;
    let action = if should_block {
        InterceptAction::Blocked
    } else if should_warn {
        InterceptAction::Warned
    } else {
        InterceptAction::Allowed
    };

    let log_id = store
        .insert_intercept_log(&InterceptLog {
            id: 0,
            error_record_id: record.id,
            intercept_type: "before".to_string(),
            intercept_action: action,
            operation_type: operation_type.to_string(),
            operation_params: operation_params.clone(),
            match_confidence: confidence,
            session_id: session_id.map(|s| s.to_string()),
            created_at: chrono::Utc::now(),
        })
        .await?;
    let _ = log_id;

    if should_block {
        store.increment_blocked_count(record.id).await?;
    }

    Ok(CheckResult {
        should_block,
        should_warn,
        matched_error: Some(MatchedError {
            error_id: record.error_id,
            error_type: record.error_type,
            error_scene: record.error_scene,
            match_confidence: confidence,
        }),
        solution: record.solution,
        solution_confidence: record.solution_confidence,
        auto_fix_available: record.auto_fix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_match_scores_one() {
        let stored = json!({"exception": "TypeError", "module": "npm"});
        let op = json!({"exception": "TypeError", "module": "npm"});
        assert_eq!(match_confidence(&op, &stored), 1.0);
    }

    #[test]
    fn case_insensitive_match_scores_point_eight() {
        let stored = json!({"exception": "TypeError"});
        let op = json!({"exception": "typeerror"});
        assert_eq!(match_confidence(&op, &stored), 0.8);
    }

    #[test]
    fn missing_keys_do_not_count() {
        let stored = json!({"exception": "TypeError", "module": "npm"});
        let op = json!({"exception": "TypeError"});
        assert_eq!(match_confidence(&op, &stored), 0.5);
    }
}
