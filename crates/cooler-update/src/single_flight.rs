//! Per-component exclusion for reconciliation passes

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// One async lock per component id.
///
/// Holding the guard returned by [`ComponentLocks::acquire`] gives exclusive
/// use of that component's archive path and scratch directory.
#[derive(Debug, Default)]
pub struct ComponentLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ComponentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, component_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(component_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to a component
    pub async fn acquire(&self, component_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(component_id);
        if let Ok(guard) = lock.clone().try_lock_owned() {
            return guard;
        }
        debug!("Waiting for in-flight pass of {}", component_id);
        lock.lock_owned().await
    }

    /// Whether a pass currently holds the component
    pub fn is_busy(&self, component_id: &str) -> bool {
        self.lock_for(component_id).try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_component_is_exclusive() {
        let locks = Arc::new(ComponentLocks::new());
        let guard = locks.acquire("skin.auramod").await;
        assert!(locks.is_busy("skin.auramod"));

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("skin.auramod").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_busy("skin.auramod"));
    }

    #[tokio::test]
    async fn test_different_components_do_not_block() {
        let locks = ComponentLocks::new();
        let _skin = locks.acquire("skin.auramod").await;
        let _plugin = locks.acquire("plugin.video.netflix").await;
        assert!(locks.is_busy("plugin.video.netflix"));
    }
}
