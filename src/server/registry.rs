use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Live sessions of one server.
///
/// Every session task owns a [`SessionGuard`] that removes its entry when the
/// task's future is dropped, whether it returned, panicked or was aborted.
/// Handles are never awaited by the task they belong to; the server only
/// waits for the map to become empty.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// `None` while the handle is still being recorded.
    live: Mutex<HashMap<u64, Option<JoinHandle<()>>>>,
    drained: Notify,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, HashMap<u64, Option<JoinHandle<()>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns `session` and records it under `id`.
    ///
    /// The entry is reserved before the spawn and the lock is not held across
    /// it: tokio may drop the future inline (runtime shutting down), which
    /// runs the guard.
    pub fn spawn<F>(self: &Arc<Self>, id: u64, session: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.live().insert(id, None);

        let guard = SessionGuard {
            registry: Arc::clone(self),
            id,
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            session.await;
        });

        // Already gone if the session finished first.
        if let Some(slot) = self.live().get_mut(&id) {
            *slot = Some(handle);
        }
    }

    fn deregister(&self, id: u64) {
        let mut live = self.live();
        live.remove(&id);
        if live.is_empty() {
            self.drained.notify_waiters();
        }
    }

    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves once no session is registered.
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// Deregisters one session when dropped.
struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: u64,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sessions_deregister_themselves() {
        let registry = Arc::new(SessionRegistry::new());

        for id in 0..4 {
            registry.spawn(id, async move {
                tokio::time::sleep(Duration::from_millis(10 * id)).await;
            });
        }

        tokio::time::timeout(Duration::from_secs(5), registry.wait_drained())
            .await
            .expect("registry did not drain");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panicking_session_is_deregistered() {
        let registry = Arc::new(SessionRegistry::new());

        registry.spawn(1, async {
            tokio::task::yield_now().await;
            panic!("session blew up");
        });
        registry.spawn(2, async {});

        tokio::time::timeout(Duration::from_secs(5), registry.wait_drained())
            .await
            .expect("registry did not drain after a panic");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_registry_is_already_drained() {
        let registry = SessionRegistry::new();
        registry.wait_drained().await;
    }
}
