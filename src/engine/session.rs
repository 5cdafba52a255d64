//! Per-session comment state and the registry that owns it.
//!
//! The [`SessionRegistry`] maps session ids to sessions. Each session sits
//! behind its own async mutex so one request at a time can run
//! prune → generate → commit on it, while different sessions proceed in
//! parallel. Idle sessions are evicted lazily: every checkout first sweeps
//! anything untouched for longer than the TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use super::locate::contains;
use super::types::Comment;

/// Comment state for one writing session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: String,
    comments: Vec<Comment>,
    last_text: String,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The last text a generation chain ran against.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Drop comments whose phrase no longer occurs in `text`. Returns how many were removed.
    pub fn prune(&mut self, text: &str) -> usize {
        let before = self.comments.len();
        self.comments.retain(|c| contains(text, &c.phrase));
        let pruned = before - self.comments.len();
        if pruned > 0 {
            debug!(session_id = %self.id, pruned, "pruned comments missing from text");
        }
        pruned
    }

    /// Append an accepted comment. Callers validate first.
    pub fn commit(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Replace the committed list wholesale.
    pub fn replace_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }

    pub fn set_last_text(&mut self, text: &str) {
        self.last_text.clear();
        self.last_text.push_str(text);
    }
}

struct Entry {
    session: Arc<tokio::sync::Mutex<Session>>,
    last_access: Instant,
}

impl Entry {
    /// Whether a request currently holds this session.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }
}

/// Session id → session, with lazy TTL eviction.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the map lock cannot leave an entry half-written.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sweep expired sessions, then fetch or create `id` and refresh its access time.
    ///
    /// Lock the returned session for the duration of a request.
    pub fn checkout(&self, id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let now = Instant::now();
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, now, self.ttl);

        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = %id, "new session");
            Entry {
                session: Arc::new(tokio::sync::Mutex::new(Session::new(id))),
                last_access: now,
            }
        });
        entry.last_access = now;
        Arc::clone(&entry.session)
    }

    /// Evict every idle session past the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, Instant::now(), self.ttl)
    }

    fn sweep_locked(sessions: &mut HashMap<String, Entry>, now: Instant, ttl: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.in_use() || now.duration_since(entry.last_access) <= ttl;
            if !keep {
                info!(session_id = %id, "evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Forget a session immediately. Returns `true` if it existed.
    pub fn reset(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
