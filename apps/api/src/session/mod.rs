//! Per-session state: the access flag and the analysis counter.
//!
//! Sessions live in memory only. A request without a live session cookie gets
//! a pending id; the session is stored the first time a handler writes to it
//! and ends after `ttl` of inactivity.

pub mod gate;
pub mod handlers;
pub mod quota;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "memoire_session";
/// Expired sessions are dropped at most this often.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// State owned by one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub usage_count: u32,
}

/// Identifier of the session resolved for the current request.
/// Inserted into request extensions by [`session_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn fresh(now: Instant) -> Self {
        Self {
            session: Session::default(),
            last_seen: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) >= ttl
    }
}

struct Inner {
    sessions: HashMap<Uuid, Entry>,
    last_sweep: Instant,
}

/// In-memory session table shared by all handlers.
///
/// Holds at most `max_sessions` entries; when full, expired sessions are
/// dropped first, then the least recently seen one.
/// The lock is only held for the duration of a closure and never across an await.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                sessions: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live session for `candidate`, or a pending id that is only
    /// stored once [`SessionStore::with_session`] writes to it.
    /// The boolean is true when the id is new.
    pub fn resolve(&self, candidate: Option<Uuid>) -> (SessionId, bool) {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut inner = self.lock();

        if now.duration_since(inner.last_sweep) >= SWEEP_INTERVAL {
            inner.sessions.retain(|_, entry| !entry.is_expired(now, ttl));
            inner.last_sweep = now;
        }

        if let Some(id) = candidate {
            match inner.sessions.get(&id).map(|entry| entry.is_expired(now, ttl)) {
                Some(false) => {
                    if let Some(entry) = inner.sessions.get_mut(&id) {
                        entry.last_seen = now;
                    }
                    return (SessionId(id), false);
                }
                Some(true) => {
                    inner.sessions.remove(&id);
                }
                None => {}
            }
        }

        (SessionId(Uuid::new_v4()), true)
    }

    /// Runs `f` against the session, storing it first if it is pending and
    /// resetting it if it has ended.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut inner = self.lock();

        if !inner.sessions.contains_key(&id.0) {
            self.make_room(&mut inner, now);
            debug!(session = %id.0, "session started");
        }

        let entry = inner
            .sessions
            .entry(id.0)
            .or_insert_with(|| Entry::fresh(now));
        if entry.is_expired(now, ttl) {
            entry.session = Session::default();
        }
        entry.last_seen = now;
        f(&mut entry.session)
    }

    /// Current state of the session without storing anything.
    /// Pending or ended sessions read as a fresh one.
    pub fn snapshot(&self, id: SessionId) -> Session {
        let now = Instant::now();
        self.lock()
            .sessions
            .get(&id.0)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .map(|entry| entry.session.clone())
            .unwrap_or_default()
    }

    /// True when the session has been stored and has not ended.
    pub fn contains(&self, id: SessionId) -> bool {
        let now = Instant::now();
        self.lock()
            .sessions
            .get(&id.0)
            .is_some_and(|entry| !entry.is_expired(now, self.ttl))
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.lock().sessions.len()
    }

    fn make_room(&self, inner: &mut Inner, now: Instant) {
        if inner.sessions.len() < self.max_sessions {
            return;
        }

        let ttl = self.ttl;
        inner.sessions.retain(|_, entry| !entry.is_expired(now, ttl));
        inner.last_sweep = now;

        while inner.sessions.len() >= self.max_sessions {
            let oldest = inner
                .sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    inner.sessions.remove(&id);
                    warn!(session = %id, "session table full, evicting least recently seen session");
                }
                None => break,
            }
        }
    }
}

/// Reads the session id from the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: SessionId) -> HeaderValue {
    // A hyphenated uuid is always a valid header value.
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        id.0
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("memoire_session=; Path=/"))
}

/// Resolves the session for the request and issues a cookie once a new
/// session has actually been stored.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let candidate = session_id_from_headers(request.headers());
    let (id, is_new) = state.sessions.resolve(candidate);
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if is_new && state.sessions.contains(id) {
        response
            .headers_mut()
            .append(header::SET_COOKIE, session_cookie(id));
    }
    response
}
