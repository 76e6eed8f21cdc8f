//! store::pool
//!
//! Bounded pool of units of work over a shared graph store.
//!
//! # Architecture
//!
//! Every catalog operation acquires one [`Session`] before talking to the
//! store. The pool admits at most `max_connections` sessions at once;
//! further callers wait up to the acquisition timeout and then fail.
//!
//! # Invariants
//!
//! - A session holds exactly one permit for its whole lifetime
//! - The permit is released on drop (RAII), on every exit path
//! - Nothing is queued beyond the semaphore's own waiters
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use msm::store::{GraphStore, MemoryStore, SessionPool};
//!
//! # tokio_test::block_on(async {
//! let pool = SessionPool::new(Arc::new(MemoryStore::new()), 2, Duration::from_millis(50));
//!
//! let session = pool.acquire().await.unwrap();
//! session.ping().await.unwrap();
//! assert_eq!(pool.available(), 1);
//!
//! drop(session);
//! assert_eq!(pool.available(), 2);
//! # });
//! ```

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::traits::GraphStore;

/// Errors from session acquisition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Every session stayed busy for the whole acquisition timeout.
    #[error("timed out after {0:?} waiting for a store session")]
    AcquireTimeout(Duration),

    /// The pool was closed.
    #[error("session pool is closed")]
    Closed,
}

/// Shared pool handing out [`Session`]s.
///
/// Cloning is cheap; clones share the same permits and store.
#[derive(Clone)]
pub struct SessionPool {
    store: Arc<dyn GraphStore>,
    permits: Arc<Semaphore>,
    max_connections: usize,
    acquire_timeout: Duration,
}

impl std::fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("store", &self.store.name())
            .field("max_connections", &self.max_connections)
            .field("available", &self.permits.available_permits())
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl SessionPool {
    /// Create a pool over `store`.
    ///
    /// `max_connections` is clamped to at least one.
    pub fn new(store: Arc<dyn GraphStore>, max_connections: usize, acquire_timeout: Duration) -> Self {
        let max_connections = max_connections.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            acquire_timeout,
        }
    }

    /// Acquire a session, waiting up to the acquisition timeout.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AcquireTimeout`] if no session frees up in time
    /// - [`PoolError::Closed`] if the pool was closed
    pub async fn acquire(&self) -> Result<Session, PoolError> {
        let acquired =
            tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned()).await;

        match acquired {
            Ok(Ok(permit)) => {
                tracing::trace!(
                    available = self.permits.available_permits(),
                    "session acquired"
                );
                Ok(Session {
                    store: Arc::clone(&self.store),
                    _permit: permit,
                })
            }
            Ok(Err(_)) => Err(PoolError::Closed),
            Err(_) => {
                tracing::warn!(timeout = ?self.acquire_timeout, "session acquisition timed out");
                Err(PoolError::AcquireTimeout(self.acquire_timeout))
            }
        }
    }

    /// Stop handing out sessions. Waiters fail with [`PoolError::Closed`].
    pub fn close(&self) {
        self.permits.close();
    }

    /// Sessions that could be acquired right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Configured upper bound on concurrent sessions.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Name of the underlying store.
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

/// One unit of work against the store.
///
/// Dereferences to the store. The permit goes back to the pool when the
/// session is dropped.
pub struct Session {
    store: Arc<dyn GraphStore>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for Session {
    type Target = dyn GraphStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn pool(max: usize, timeout_ms: u64) -> SessionPool {
        SessionPool::new(
            Arc::new(MemoryStore::new()),
            max,
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn acquire_and_release() {
        let pool = pool(2, 50);
        assert_eq!(pool.available(), 2);

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn exhausted_pool_times_out() {
        let pool = pool(1, 20);
        let _held = pool.acquire().await.unwrap();

        let err = pool.acquire().await.unwrap_err();
        assert_eq!(err, PoolError::AcquireTimeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn waiter_gets_released_session() {
        let pool = pool(1, 1_000);
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn closed_pool_rejects() {
        let pool = pool(1, 50);
        pool.close();
        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::Closed);
    }

    #[test]
    fn zero_connections_clamped() {
        assert_eq!(pool(0, 10).max_connections(), 1);
    }

    #[tokio::test]
    async fn session_reaches_store() {
        let pool = pool(1, 50);
        let session = pool.acquire().await.unwrap();
        assert_eq!(session.name(), "memory");
        session.ping().await.unwrap();
    }
}
