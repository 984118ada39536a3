//! In-memory session registry.
//!
//! Each session sits behind its own async mutex. Handlers hold the lock for the
//! whole upload or action, so at most one request mutates a session's counter
//! at a time. Sessions are never shared between users and never persisted.
//!
//! Reads go through a [`SessionSnapshot`] republished every time a
//! [`SessionGuard`] is dropped, so they never queue behind the mutex.

use super::metrics;
use crate::models::{Session, SessionId, SessionSnapshot};
use chrono::Utc;
use dashmap::DashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Shared reference to one session and its last published snapshot.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    published: Arc<RwLock<SessionSnapshot>>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        let published = Arc::new(RwLock::new(session.snapshot()));
        Self {
            session: Arc::new(Mutex::new(session)),
            published,
        }
    }

    /// Wait for exclusive access.
    pub async fn lock(&self) -> SessionGuard {
        let guard = self.session.clone().lock_owned().await;
        SessionGuard {
            guard,
            published: self.published.clone(),
        }
    }

    /// Exclusive access, or `None` if another request holds the session.
    pub fn try_lock(&self) -> Option<SessionGuard> {
        let guard = self.session.clone().try_lock_owned().ok()?;
        Some(SessionGuard {
            guard,
            published: self.published.clone(),
        })
    }

    /// State as of the last released lock. Never waits.
    pub fn snapshot(&self) -> SessionSnapshot {
        match self.published.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Exclusive access to a session. Dropping it publishes a fresh snapshot.
pub struct SessionGuard {
    guard: OwnedMutexGuard<Session>,
    published: Arc<RwLock<SessionSnapshot>>,
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.guard
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let snapshot = self.guard.snapshot();
        match self.published.write() {
            Ok(mut published) => *published = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh, empty session and return its handle.
    pub fn create(&self, quota: u32) -> (SessionId, SessionHandle) {
        let session = Session::new(quota);
        let id = session.id;
        let handle = SessionHandle::new(session);
        self.sessions.insert(id, handle.clone());
        metrics::set_sessions_active(self.sessions.len());
        (id, handle)
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Dispose of a session. Returns false if it did not exist.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        metrics::set_sessions_active(self.sessions.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`.
    ///
    /// Sessions whose lock is currently held are busy and therefore kept.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, handle| match handle.session.try_lock() {
            Ok(session) => !session.is_idle(now, max_idle),
            Err(_) => true,
        });

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.sessions.len(), "Swept idle sessions");
            metrics::set_sessions_active(self.sessions.len());
        }
        removed
    }

    /// Run [`sweep_idle`](Self::sweep_idle) every `every` until the task is aborted.
    pub fn spawn_sweeper(&self, max_idle: Duration, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                store.sweep_idle(max_idle);
            }
        })
    }
}
