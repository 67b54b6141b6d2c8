//! Global connection cap, semaphore-backed.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::AdmissionError;

#[derive(Clone)]
pub struct ConnectionGuard {
    semaphore: Arc<Semaphore>,
}

impl ConnectionGuard {
    pub fn new(max_connections: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_connections)),
        }
    }

    /// Holds the permit for the lifetime of one request; drop releases the slot.
    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit, AdmissionError> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| AdmissionError::Overloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_rejected_until_a_permit_is_released() {
        let guard = ConnectionGuard::new(1);
        let first = guard.try_acquire().unwrap();
        assert!(guard.try_acquire().is_err());
        drop(first);
        assert!(guard.try_acquire().is_ok());
    }
}
