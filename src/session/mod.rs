//! In-memory session storage
//!
//! Sessions cache analysis results per client so repeated requests skip the
//! YouTube API. A session expires a fixed time after creation; expired
//! sessions are invisible to readers and are removed by periodic sweeps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::metrics;
use crate::utils::round_to;

/// Fixed per-session overhead used in memory estimates
const SESSION_OVERHEAD_BYTES: usize = 100;

// ============================================================================
// Session
// ============================================================================

/// One client session and its cached values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_accessed: now,
            data: BTreeMap::new(),
        }
    }

    fn expires_at(&self, timeout: Duration) -> DateTime<Utc> {
        self.created_at + timeout
    }

    fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at(timeout) < now
    }

    fn estimated_bytes(&self) -> usize {
        SESSION_OVERHEAD_BYTES
            + self
                .data
                .iter()
                .map(|(k, v)| k.len() + v.to_string().len())
                .sum::<usize>()
    }
}

/// Session metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub data_keys: Vec<String>,
    pub data_count: usize,
}

/// Store-wide counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub expired_sessions: usize,
    pub total_sessions: usize,
    pub total_data_items: usize,
    pub memory_usage_mb: f64,
}

// ============================================================================
// Store
// ============================================================================

/// Thread-safe session store shared by request handlers
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    last_sweep: Arc<Mutex<DateTime<Utc>>>,
    timeout: Duration,
    sweep_interval: Duration,
}

impl SessionStore {
    pub fn new(timeout: std::time::Duration, sweep_interval: std::time::Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            last_sweep: Arc::new(Mutex::new(Utc::now())),
            timeout: Duration::from_std(timeout).unwrap_or(Duration::hours(1)),
            sweep_interval: Duration::from_std(sweep_interval).unwrap_or(Duration::minutes(5)),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            std::time::Duration::from_secs(config.timeout_secs),
            std::time::Duration::from_secs(config.sweep_interval_secs),
        )
    }

    /// Session lifetime
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a session and return its id
    ///
    /// Also sweeps expired sessions when the last sweep is older than the
    /// sweep interval.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.sessions.write().await.insert(id.clone(), Session::new(now));
        tracing::debug!(session_id = %id, "Session created");

        let due = {
            let mut last = self.last_sweep.lock().await;
            if now - *last >= self.sweep_interval {
                *last = now;
                true
            } else {
                false
            }
        };
        if due {
            self.sweep_expired().await;
        }

        id
    }

    /// Store a value, creating the session if it is unknown or expired
    pub async fn store_data(&self, session_id: &str, key: &str, value: Value) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let fresh = match sessions.get(session_id) {
            Some(s) => !s.is_expired(self.timeout, now),
            None => false,
        };
        if !fresh {
            sessions.insert(session_id.to_string(), Session::new(now));
        }

        if let Some(session) = sessions.get_mut(session_id) {
            session.last_accessed = now;
            session.data.insert(key.to_string(), value);
        }
    }

    /// Serialize and store a value
    pub async fn store<T: Serialize>(&self, session_id: &str, key: &str, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.store_data(session_id, key, value).await;
        Ok(())
    }

    /// Fetch one value from a live session
    pub async fn get_data(&self, session_id: &str, key: &str) -> Option<Value> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| !s.is_expired(self.timeout, now))?;
        session.last_accessed = now;
        let value = session.data.get(key).cloned();
        metrics::record_cache_lookup(value.is_some());
        value
    }

    /// Snapshot of every value in a live session
    pub async fn get_all_data(&self, session_id: &str) -> Option<BTreeMap<String, Value>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| !s.is_expired(self.timeout, now))?;
        session.last_accessed = now;
        Some(session.data.clone())
    }

    /// Remove one key; false when the session or key is missing
    pub async fn delete_data(&self, session_id: &str, key: &str) -> bool {
        let now = Utc::now();
        self.sessions
            .write()
            .await
            .get_mut(session_id)
            .filter(|s| !s.is_expired(self.timeout, now))
            .is_some_and(|s| s.data.remove(key).is_some())
    }

    /// Drop all values but keep the session
    pub async fn clear_session(&self, session_id: &str) -> bool {
        let now = Utc::now();
        match self
            .sessions
            .write()
            .await
            .get_mut(session_id)
            .filter(|s| !s.is_expired(self.timeout, now))
        {
            Some(session) => {
                session.data.clear();
                true
            }
            None => false,
        }
    }

    pub async fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::debug!(session_id, "Session deleted");
        }
        removed
    }

    pub async fn session_exists(&self, session_id: &str) -> bool {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .get(session_id)
            .is_some_and(|s| !s.is_expired(self.timeout, now))
    }

    pub async fn session_info(&self, session_id: &str) -> Option<SessionInfo> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .filter(|s| !s.is_expired(self.timeout, now))?;
        Some(SessionInfo {
            session_id: session_id.to_string(),
            created_at: session.created_at,
            last_accessed: session.last_accessed,
            expires_at: session.expires_at(self.timeout),
            data_keys: session.data.keys().cloned().collect(),
            data_count: session.data.len(),
        })
    }

    /// Ids of all live sessions, sorted
    pub async fn list_sessions(&self) -> Vec<String> {
        let now = Utc::now();
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, s)| !s.is_expired(self.timeout, now))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of live sessions
    pub async fn active_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_expired(self.timeout, now))
            .count()
    }

    pub async fn stats(&self) -> SessionStats {
        let now = Utc::now();
        let sessions = self.sessions.read().await;

        let mut active = 0;
        let mut expired = 0;
        let mut items = 0;
        let mut bytes = 0;
        for session in sessions.values() {
            bytes += session.estimated_bytes();
            if session.is_expired(self.timeout, now) {
                expired += 1;
            } else {
                active += 1;
                items += session.data.len();
            }
        }

        SessionStats {
            active_sessions: active,
            expired_sessions: expired,
            total_sessions: sessions.len(),
            total_data_items: items,
            memory_usage_mb: round_to(bytes as f64 / (1024.0 * 1024.0), 4),
        }
    }

    /// Remove expired sessions, returning how many were dropped
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.timeout, now));
        let removed = before - sessions.len();

        metrics::set_active_sessions(sessions.len());
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Swept expired sessions");
        }
        removed
    }

    /// Drop every session
    pub async fn clear_all(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        metrics::set_active_sessions(0);
        tracing::info!(count, "Cleared all sessions");
    }

    #[cfg(test)]
    async fn backdate(&self, session_id: &str, by: Duration) {
        if let Some(s) = self.sessions.write().await.get_mut(session_id) {
            s.created_at -= by;
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().session)
    }
}
