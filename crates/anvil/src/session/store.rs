//! Session Store
//!
//! Trait and DashMap-backed implementation.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{Session, SessionRef};
use crate::types::protocol::Implementation;

/// Session store trait for pluggable storage backends.
pub trait SessionStore: Send + Sync {
    /// Get an existing session or create a new one.
    ///
    /// A hint that names an unknown session creates it under that id;
    /// no hint generates a fresh UUID.
    fn get_or_create(&self, id_hint: Option<&str>) -> String;

    fn get(&self, id: &str) -> Option<SessionRef<'_>>;

    fn touch(&self, id: &str);

    fn set_initialized(&self, id: &str, client_info: Implementation);

    /// Remove sessions idle longer than `max_idle`. Returns how many were removed.
    fn cleanup(&self, max_idle: Duration) -> usize;

    fn remove(&self, id: &str);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store using DashMap.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id_hint: Option<&str>) -> String {
        let id = id_hint
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let is_new = !self.sessions.contains_key(&id);
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));

        if is_new {
            tracing::info!(mcp.session_id = %id, "Created new session");
        } else {
            tracing::debug!(mcp.session_id = %id, "Resumed existing session");
        }

        id
    }

    fn get(&self, id: &str) -> Option<SessionRef<'_>> {
        self.sessions.get(id)
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.touch();
        }
    }

    fn set_initialized(&self, id: &str, client_info: Implementation) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            tracing::info!(
                session_id = %id,
                client_name = %client_info.name,
                client_version = %client_info.version,
                "Session initialized"
            );
            session.set_initialized(client_info);
        }
    }

    fn cleanup(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_duration() <= max_idle);
        let removed = before.saturating_sub(self.sessions.len());

        if removed > 0 {
            tracing::info!(
                removed = removed,
                remaining = self.sessions.len(),
                "Session cleanup completed"
            );
        }

        removed
    }

    fn remove(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            tracing::info!(session_id = %id, "Session removed");
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Spawn a background task that periodically cleans up stale sessions.
pub fn spawn_cleanup_task(
    store: Arc<dyn SessionStore>,
    interval: Duration,
    max_idle: Duration,
    cancel: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Session cleanup task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    store.cleanup(max_idle);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let store = InMemorySessionStore::new();
        let id = store.get_or_create(None);
        assert!(!id.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_with_hint() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get_or_create(Some("stdio")), "stdio");
        assert_eq!(store.get_or_create(Some("stdio")), "stdio");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_initialize() {
        let store = InMemorySessionStore::new();
        let id = store.get_or_create(None);
        assert!(!store.get(&id).unwrap().initialized);

        store.set_initialized(&id, Implementation::new("inspector", "1.0"));

        let session = store.get(&id).unwrap();
        assert!(session.initialized);
        assert_eq!(session.client_info.as_ref().unwrap().name, "inspector");
    }

    #[test]
    fn test_cleanup() {
        let store = InMemorySessionStore::new();
        store.get_or_create(None);

        assert_eq!(store.cleanup(Duration::from_secs(3600)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup(Duration::ZERO), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_task_stops_on_cancel() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let cancel = tokio_util::sync::CancellationToken::new();
        let handle = spawn_cleanup_task(
            store,
            Duration::from_millis(10),
            Duration::from_secs(60),
            cancel.clone(),
        );

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cleanup task should stop")
            .unwrap();
    }
}
