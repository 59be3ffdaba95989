use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// In-memory table of background batches still running, keyed by request id.
#[derive(Debug, Clone, Default)]
pub struct BatchRegistry {
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new batch and hand back its id and cancellation token.
    pub fn start(&self) -> (Uuid, CancellationToken) {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        self.lock().insert(id, token.clone());
        (id, token)
    }

    /// Signal a running batch to stop. False if the id is unknown or already finished.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.lock().get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn finish(&self, id: Uuid) {
        self.lock().remove(&id);
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_trips_the_token() {
        let registry = BatchRegistry::new();
        let (id, token) = registry.start();

        assert!(registry.is_running(id));
        assert!(registry.cancel(id));
        assert!(token.is_cancelled());
    }

    #[test]
    fn finished_batches_are_forgotten() {
        let registry = BatchRegistry::new();
        let (id, _) = registry.start();
        registry.finish(id);

        assert!(registry.is_empty());
        assert!(!registry.cancel(id));
        assert!(!registry.cancel(Uuid::new_v4()));
    }
}
