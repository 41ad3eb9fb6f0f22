//! Session guard
//!
//! A `DriveSession` owns the only live connection handle in the process for
//! as long as it is begun: `begin()` takes a shared mutual-exclusion lock,
//! then acquires credentials and builds the handle; `end()` drops the handle
//! and then the lock, in that order. Writes from one logical run are never
//! interleaved with those of a concurrent run, which is the whole point of the lock
//! given the destructive delete path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::auth::CredentialSource;

use super::api::{DriveApi, DriveHub};
use super::retry::RetryPolicy;
use super::types::DriveError;

/// Cloneable handle to the process-wide session lock. Sessions constructed
/// from clones of the same `SessionLock` serialize against each other.
#[derive(Clone, Default)]
pub struct SessionLock(Arc<Mutex<()>>);

impl SessionLock {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.0).lock_owned().await
    }
}

/// Builds the connection handle once the lock is held. The production
/// implementation is [`HttpConnect`]; tests script their own.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn DriveApi>, DriveError>;
}

/// Connects to the Drive API with a token from a [`CredentialSource`].
pub struct HttpConnect {
    credentials: Arc<dyn CredentialSource>,
    retry: RetryPolicy,
}

impl HttpConnect {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Connect for HttpConnect {
    async fn connect(&self) -> Result<Arc<dyn DriveApi>, DriveError> {
        let token = self.credentials.access_token().await?;
        Ok(Arc::new(DriveHub::new(token).with_retry(self.retry.clone())))
    }
}

/// Exclusive drive session. See the module docs for the lifecycle.
pub struct DriveSession {
    lock: SessionLock,
    connector: Arc<dyn Connect>,
    guard: Option<OwnedMutexGuard<()>>,
    handle: Option<Arc<dyn DriveApi>>,
}

impl DriveSession {
    /// A session with its own private lock.
    pub fn new(connector: Arc<dyn Connect>) -> Self {
        Self::with_lock(connector, SessionLock::new())
    }

    /// A session sharing `lock` with other sessions; only one of them can be
    /// live at a time.
    pub fn with_lock(connector: Arc<dyn Connect>, lock: SessionLock) -> Self {
        Self {
            lock,
            connector,
            guard: None,
            handle: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Block until the session lock is acquired, then establish the
    /// connection handle. If credential acquisition or connection fails, the
    /// lock is released before the error propagates; it is never left held
    /// without a live handle.
    pub async fn begin(&mut self) -> Result<(), DriveError> {
        let guard = self.lock.acquire().await;
        info!("acquired drive session lock");
        match self.connector.connect().await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.guard = Some(guard);
                Ok(())
            }
            Err(err) => {
                drop(guard);
                info!("released drive session lock after failed connect");
                Err(err)
            }
        }
    }

    /// Release the connection handle, then the lock. Safe to call at any
    /// point, including before `begin()` or twice in a row.
    pub fn end(&mut self) {
        if self.handle.take().is_some() {
            info!("released drive connection");
        }
        if self.guard.take().is_some() {
            info!("released drive session lock");
        }
    }

    /// The live handle, or the no-session signal every operation fails fast
    /// with when called out of order.
    pub(crate) fn api(&self) -> Result<Arc<dyn DriveApi>, DriveError> {
        match &self.handle {
            Some(api) => Ok(Arc::clone(api)),
            None => {
                warn!("no session");
                Err(DriveError::NoSession)
            }
        }
    }
}

impl Drop for DriveSession {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::testutil::{FailConnect, FakeConnect, FakeDrive};
    use std::time::Duration;
    use tokio::time::timeout;

    fn fake_connector() -> Arc<dyn Connect> {
        Arc::new(FakeConnect::new(Arc::new(FakeDrive::default())))
    }

    #[tokio::test]
    async fn test_begin_then_end_lifecycle() {
        let mut session = DriveSession::new(fake_connector());
        assert!(!session.is_live());
        session.begin().await.unwrap();
        assert!(session.is_live());
        session.end();
        assert!(!session.is_live());
    }

    #[tokio::test]
    async fn test_end_is_idempotent_and_safe_without_begin() {
        let mut session = DriveSession::new(fake_connector());
        session.end();
        session.end();
        session.begin().await.unwrap();
        session.end();
        session.end();
        assert!(!session.is_live());
    }

    #[tokio::test]
    async fn test_second_begin_blocks_until_first_end() {
        let lock = SessionLock::new();
        let mut first = DriveSession::with_lock(fake_connector(), lock.clone());
        let mut second = DriveSession::with_lock(fake_connector(), lock.clone());

        first.begin().await.unwrap();

        // the second session must stay pending, not error or proceed
        let pending = timeout(Duration::from_millis(50), second.begin()).await;
        assert!(pending.is_err(), "second begin should block while first is live");

        first.end();
        timeout(Duration::from_secs(1), second.begin())
            .await
            .expect("second begin should resume after first end")
            .unwrap();
        assert!(second.is_live());
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_lock_unacquired() {
        let lock = SessionLock::new();
        let mut broken = DriveSession::with_lock(Arc::new(FailConnect), lock.clone());
        let err = broken.begin().await.unwrap_err();
        assert!(matches!(err, DriveError::Credentials(_)));
        assert!(!broken.is_live());

        // the lock must be free for the next session
        let mut healthy = DriveSession::with_lock(fake_connector(), lock);
        timeout(Duration::from_millis(200), healthy.begin())
            .await
            .expect("lock should be free after failed begin")
            .unwrap();
    }

    #[tokio::test]
    async fn test_drop_releases_the_lock() {
        let lock = SessionLock::new();
        {
            let mut held = DriveSession::with_lock(fake_connector(), lock.clone());
            held.begin().await.unwrap();
        }
        let mut next = DriveSession::with_lock(fake_connector(), lock);
        timeout(Duration::from_millis(200), next.begin())
            .await
            .expect("lock should be free after drop")
            .unwrap();
    }
}
