//! Per-user sessions keyed by the session cookie
//!
//! Sessions expire after sitting idle, and the store holds a bounded number
//! of them.

use fotoreg_core::Session;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "fotoreg_session";

/// Default upper bound on open sessions
pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;

/// Default idle time after which a session is dropped
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(2 * 60 * 60);

/// Shared handle to one user's session
///
/// The async mutex makes each user action run to completion before the next
/// one on the same session starts.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by cookie id
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Cache<Uuid, SessionHandle>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Store with the default bounds
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE)
    }

    /// Store holding at most `max_sessions`, each dropped after `idle`
    /// without a request
    #[must_use]
    pub fn with_limits(max_sessions: u64, idle: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Session for `cookie`, creating a fresh one for unknown, expired or
    /// missing ids
    pub fn get_or_create(&self, cookie: Option<&str>) -> (Uuid, SessionHandle) {
        if let Some(id) = cookie.and_then(|c| Uuid::parse_str(c).ok()) {
            if let Some(handle) = self.inner.get(&id) {
                return (id, handle);
            }
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new()));
        self.inner.insert(id, handle.clone());
        tracing::debug!(%id, "Opened session");
        (id, handle)
    }

    /// Number of open sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        usize::try_from(self.inner.entry_count()).unwrap_or(usize::MAX)
    }

    /// True when no session is open
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
