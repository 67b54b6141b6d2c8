use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirewallError {
    #[error(transparent)]
    Storage(#[from] devguard_storage::error::StorageError),
}

pub type Result<T> = std::result::Result<T, FirewallError>;
