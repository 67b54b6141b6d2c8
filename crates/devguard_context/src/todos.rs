use chrono::Utc;
use devguard_storage::types::{Todo, TodoStatus};
use devguard_storage::Store;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::error::{ContextError, Result};

#[allow(clippy::too_many_arguments)]
pub async fn create_todo(
    store: &Store,
    project_id: &str,
    session_id: Option<&str>,
    title: &str,
    description: Option<&str>,
    category: &str,
    priority: i64,
    estimated_difficulty: i64,
    estimated_hours: Option<f64>,
    depends_on: Vec<String>,
) -> Result<Todo> {
    let all = store.all_todos(project_id).await?;
    let known: HashSet<&str> = all.iter().map(|t| t.todo_id.as_str()).collect();
    for dep in &depends_on {
        if !known.contains(dep.as_str()) {
            return Err(ContextError::UnknownDependency(
                "<new>".to_string(),
                dep.clone(),
            ));
        }
    }

    let new_id = Uuid::new_v4().to_string();
    for dep in &depends_on {
        if reaches(&all, dep, &new_id) {
            return Err(ContextError::DependencyCycle(new_id, dep.clone()));
        }
    }

    let todo = Todo {
        todo_id: new_id,
        project_id: project_id.to_string(),
        session_id: session_id.map(str::to_string),
        title: title.to_string(),
        description: description.map(str::to_string),
        category: category.to_string(),
        priority: priority.clamp(1, 5),
        estimated_difficulty: estimated_difficulty.clamp(1, 5),
        estimated_hours,
        status: TodoStatus::Pending,
        progress: 0,
        depends_on,
        completed_at: None,
        completion_note: None,
        created_at: Utc::now(),
    };
    store.insert_todo(&todo).await?;
    Ok(todo)
}

/// BFS over `depends_on` edges: true if `target` is reachable from `start`,
/// i.e. adding an edge `target -> start` would close a cycle.
fn reaches(all: &[Todo], start: &str, target: &str) -> bool {
    let mut queue = VecDeque::from([start.to_string()]);
    let mut seen = HashSet::new();
    while let Some(id) = queue.pop_front() {
        if id == target {
            return true;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        if let Some(t) = all.iter().find(|t| t.todo_id == id) {
            for dep in &t.depends_on {
                queue.push_back(dep.clone());
            }
        }
    }
    false
}

pub async fn update_todo_status(
    store: &Store,
    todo_id: &str,
    status: TodoStatus,
    progress: i64,
    completion_note: Option<&str>,
) -> Result<Todo> {
    let completed_at = matches!(status, TodoStatus::Completed).then(Utc::now);
    store
        .update_todo_status(
            todo_id,
            status,
            progress.clamp(0, 100),
            completed_at,
            completion_note,
        )
        .await?;
    Ok(store.require_todo(todo_id).await?)
}

pub async fn list_todos(
    store: &Store,
    project_id: &str,
    status: Option<TodoStatus>,
    category: Option<&str>,
) -> Result<Vec<Todo>> {
    Ok(store.list_todos(project_id, status, category).await?)
}

/// Todos that list `todo_id` in their own `depends_on` — the reverse edge
/// the schema doesn't store directly.
pub async fn blocked_by(store: &Store, project_id: &str, todo_id: &str) -> Result<Vec<Todo>> {
    let all = store.all_todos(project_id).await?;
    Ok(all
        .into_iter()
        .filter(|t| t.depends_on.iter().any(|d| d == todo_id))
        .collect())
}

/// Highest-priority pending todo with every dependency already completed;
/// ties broken by earliest `created_at`.
pub async fn get_next_todo(store: &Store, project_id: &str) -> Result<Option<Todo>> {
    let all = store.all_todos(project_id).await?;
    let completed: HashSet<&str> = all
        .iter()
        .filter(|t| t.status == TodoStatus::Completed)
        .map(|t| t.todo_id.as_str())
        .collect();

    let mut ready: Vec<&Todo> = all
        .iter()
        .filter(|t| t.status == TodoStatus::Pending)
        .filter(|t| t.depends_on.iter().all(|d| completed.contains(d.as_str())))
        .collect();

    ready.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    Ok(ready.into_iter().next().cloned())
}
