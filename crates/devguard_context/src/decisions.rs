use chrono::Utc;
use devguard_storage::types::{Decision, DecisionStatus};
use devguard_storage::Store;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ContextError, Result};

#[allow(clippy::too_many_arguments)]
pub async fn record_design_decision(
    store: &Store,
    project_id: &str,
    session_id: Option<&str>,
    category: &str,
    title: &str,
    description: Option<&str>,
    reasoning: &str,
    alternatives: Vec<String>,
    trade_offs: Value,
    impact_scope: Option<&str>,
    supersedes: Option<&str>,
) -> Result<Decision> {
    let decision_id = Uuid::new_v4().to_string();

    if let Some(old_id) = supersedes {
        check_supersession_cycle(store, old_id, &decision_id).await?;
    }

    let decision = Decision {
        decision_id: decision_id.clone(),
        project_id: project_id.to_string(),
        session_id: session_id.map(str::to_string),
        category: category.to_string(),
        title: title.to_string(),
        description: description.map(str::to_string),
        reasoning: reasoning.to_string(),
        alternatives,
        trade_offs,
        impact_scope: impact_scope.map(str::to_string),
        status: DecisionStatus::Active,
        superseded_by: None,
        created_at: Utc::now(),
    };
    store.insert_decision(&decision).await?;

    if let Some(old_id) = supersedes {
        store.supersede_decision(old_id, &decision_id).await?;
    }

    Ok(decision)
}

/// Walks `superseded_by` starting at `new_id`; if it ever reaches `old_id`,
/// setting `old_id.superseded_by = new_id` would close a loop (`old_id` is
/// already, transitively, superseded by something downstream of `new_id`).
/// `new_id` not existing yet (the create-and-supersede-in-one-call path) is
/// not a cycle: a decision that doesn't exist yet can't already be part of
/// any chain.
async fn check_supersession_cycle(store: &Store, old_id: &str, new_id: &str) -> Result<()> {
    let mut current = new_id.to_string();
    let mut seen = std::collections::HashSet::new();
    loop {
        if current == old_id {
            return Err(ContextError::SupersessionCycle(
                new_id.to_string(),
                old_id.to_string(),
            ));
        }
        if !seen.insert(current.clone()) {
            break; // already-corrupt chain elsewhere; don't loop forever
        }
        let Some(decision) = store.get_decision(&current).await? else {
            break;
        };
        match decision.superseded_by {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(())
}

/// Marks an already-recorded decision as superseded by another
/// already-recorded decision, without minting a new one. Complements
/// `record_design_decision`'s `supersedes` parameter, which supersedes as
/// part of creating a new decision.
pub async fn supersede(store: &Store, old_id: &str, new_id: &str) -> Result<Decision> {
    store.require_decision(old_id).await?;
    store.require_decision(new_id).await?;
    check_supersession_cycle(store, old_id, new_id).await?;

    store.supersede_decision(old_id, new_id).await?;
    Ok(store.require_decision(old_id).await?)
}

pub async fn list_decisions(
    store: &Store,
    project_id: &str,
    category: Option<&str>,
    status: Option<DecisionStatus>,
) -> Result<Vec<Decision>> {
    Ok(store.list_decisions(project_id, category, status).await?)
}
