use devguard_storage::Store;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TypeBreakdown {
    pub error_type: String,
    pub count: i64,
    pub blocks: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentIntercept {
    pub error_scene: String,
    pub action: String,
    pub confidence: f64,
    pub solution: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct FirewallStats {
    pub total_errors: i64,
    pub total_occurrences: i64,
    pub total_blocks: i64,
    pub avg_confidence: f64,
    pub blocking_errors: i64,
    pub auto_fixable: i64,
    pub block_rate: f64,
    pub by_type: Vec<TypeBreakdown>,
    pub recent_intercepts: Vec<RecentIntercept>,
}

pub async fn error_firewall_stats(store: &Store) -> anyhow::Result<FirewallStats> {
    let records = store.all_error_records().await?;
    let total_errors = records.len() as i64;
    let total_occurrences: i64 = records.iter().map(|r| r.occurrence_count).sum();
    let total_blocks: i64 = records.iter().map(|r| r.blocked_count).sum();
    let avg_confidence = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.solution_confidence).sum::<f64>() / records.len() as f64
    };
    let blocking_errors = records
        .iter()
        .filter(|r| r.block_level == devguard_storage::types::BlockLevel::Block)
        .count() as i64;
    let auto_fixable = records.iter().filter(|r| r.auto_fix).count() as i64;
    let block_rate = if total_occurrences > 0 {
        total_blocks as f64 / total_occurrences as f64 * 100.0
    } else {
        0.0
    };

    let mut by_type_agg: std::collections::HashMap<String, (i64, i64)> = std::collections::HashMap::new();
    for r in &records {
        let entry = by_type_agg.entry(r.error_type.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += r.blocked_count;
    }
    let mut by_type: Vec<TypeBreakdown> = by_type_agg
        .into_iter()
        .map(|(error_type, (count, blocks))| TypeBreakdown {
            error_type,
            count,
            blocks,
        })
        .collect();
    by_type.sort_by(|a, b| b.count.cmp(&a.count));
    by_type.truncate(10);

    let mut by_error_id_row = std::collections::HashMap::new();
    for r in &records {
        by_error_id_row.insert(r.id, r);
    }
    let recent_intercepts = store
        .recent_intercepts(10)
        .await?
        .into_iter()
        .filter_map(|log| {
            let record = by_error_id_row.get(&log.error_record_id)?;
            Some(RecentIntercept {
                error_scene: record.error_scene.clone(),
                action: log.intercept_action.as_str().to_string(),
                confidence: log.match_confidence,
                solution: record.solution.clone(),
                created_at: log.created_at,
            })
        })
        .collect();

    Ok(FirewallStats {
        total_errors,
        total_occurrences,
        total_blocks,
        avg_confidence,
        blocking_errors,
        auto_fixable,
        block_rate,
        by_type,
        recent_intercepts,
    })
}
