use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A mutex that allows locking based on a key (an artifact name).
/// Sessions on different files never wait on each other; two sessions on the
/// same file run one after the other.
#[derive(Debug, Clone)]
pub struct KeyedMutex {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquires the lock for the given key.
    /// The lock is released when the returned guard is dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        // The map shard lock is released above, before we await.
        mutex.lock_owned().await
    }

    /// Removes locks that are not currently held or awaited by any task.
    pub fn cleanup(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Default for KeyedMutex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedMutex::new();
        let guard = locks.lock("a.bin").await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("a.bin")).await;
        assert!(blocked.is_err());
        drop(guard);
        let free = tokio::time::timeout(Duration::from_millis(200), locks.lock("a.bin")).await;
        assert!(free.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedMutex::new();
        let _a = locks.lock("a.bin").await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock("b.bin")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = KeyedMutex::new();
        let guard = locks.lock("a.bin").await;

        let contender = locks.clone();
        let handle = tokio::spawn(async move {
            let _g = contender.lock("a.bin").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should acquire the lock")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_keeps_held_locks() {
        let locks = KeyedMutex::new();
        let held = locks.lock("held").await;
        drop(locks.lock("released").await);
        assert_eq!(locks.len(), 2);

        locks.cleanup();
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.cleanup();
        assert_eq!(locks.len(), 0);
    }
}
