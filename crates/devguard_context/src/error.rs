#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Storage(#[from] devguard_storage::StorageError),

    #[error("todo {0} depends on unknown todo {1}")]
    UnknownDependency(String, String),

    #[error("adding dependency {0} -> {1} would create a cycle")]
    DependencyCycle(String, String),

    #[error("decision {0} cannot supersede {1}: would create a supersession cycle")]
    SupersessionCycle(String, String),

    #[error("session {0} is already closed")]
    SessionAlreadyClosed(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
