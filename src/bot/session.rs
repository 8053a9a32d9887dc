//! Per-user navigation state and the keyed session store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::debug;

use crate::gopher::{GopherItem, GopherUrl, Listing};

/// One entry of the view stack: a fetched resource plus the page the user
/// was looking at.
#[derive(Debug, Clone)]
pub struct ViewFrame {
    pub url: GopherUrl,
    pub listing: Listing,
    pub page_index: usize,
}

/// Navigation state for a single remote node.
///
/// The implied states are: **Empty** (`current` is `None`), **Viewing-Menu**
/// / **Viewing-File** (by `Listing` variant), and **Awaiting-Search-Terms**
/// (`pending_search_item` is set).
///
/// `history` holds the frames left behind by navigation, including `None`
/// for the initial Empty state, so `b` after the first `u` restores a blank
/// session. Sessions are never persisted; a restart forgets everything.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub current: Option<ViewFrame>,
    pub history: Vec<Option<ViewFrame>>,
    /// Set when the user selected a search item and we are waiting for
    /// `s <terms>`. Cleared by the next search or any navigation command.
    pub pending_search_item: Option<GopherItem>,
    pub created: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: String) -> Self {
        let now = Utc::now();
        Session {
            user_id,
            current: None,
            history: Vec::new(),
            pending_search_item: None,
            created: now,
            last_activity: now,
        }
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout_minutes`.
    pub fn is_inactive(&self, timeout_minutes: i64) -> bool {
        Utc::now() - self.last_activity > chrono::Duration::minutes(timeout_minutes)
    }
}

/// Keyed store of sessions with per-user mutual exclusion.
///
/// The outer mutex only guards map insert/lookup and is never held across
/// an await. Each session sits behind its own `tokio::sync::Mutex`; whoever
/// processes a user's command holds that lock for the whole command,
/// including the fetch and the paced send, which serializes all mutation of
/// one user's state without blocking anyone else.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session handle for a user, creating a blank one lazily.
    pub fn get_or_create(&self, user_id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut map = self.inner.lock().expect("session map poisoned");
        map.entry(user_id.to_string())
            .or_insert_with(|| {
                debug!("creating session for {}", crate::logutil::escape_log(user_id));
                Arc::new(tokio::sync::Mutex::new(Session::new(user_id.to_string())))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("session map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle for longer than `timeout_minutes`. Sessions whose
    /// lock is currently held (a command in flight) are left alone and
    /// picked up on a later sweep. Returns how many were evicted.
    pub fn evict_idle(&self, timeout_minutes: i64) -> usize {
        if timeout_minutes <= 0 {
            return 0;
        }
        let mut map = self.inner.lock().expect("session map poisoned");
        let before = map.len();
        map.retain(|user_id, entry| match entry.try_lock() {
            Ok(session) => {
                let keep = !session.is_inactive(timeout_minutes);
                if !keep {
                    debug!("evicting idle session for {}", crate::logutil::escape_log(user_id));
                }
                keep
            }
            Err(_) => true,
        });
        before - map.len()
    }
}
