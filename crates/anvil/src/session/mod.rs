//! Session Management
//!
//! Tracks MCP sessions for the lifetime of a transport connection. The
//! stdio transport has exactly one session; Streamable HTTP keys sessions
//! by the `Mcp-Session-Id` header.

mod store;

pub use store::{spawn_cleanup_task, InMemorySessionStore, SessionStore};

use std::time::{Duration, Instant};

use crate::types::protocol::Implementation;

/// A reference to a session (from DashMap).
pub type SessionRef<'a> = dashmap::mapref::one::Ref<'a, String, Session>;

/// An MCP session.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: Instant,
    pub last_seen: Instant,
    /// Client implementation info (set after initialize).
    pub client_info: Option<Implementation>,
    pub initialized: bool,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_seen: now,
            client_info: None,
            initialized: false,
        }
    }

    /// Time since last activity.
    pub fn idle_duration(&self) -> Duration {
        self.last_seen.elapsed()
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn set_initialized(&mut self, client_info: Implementation) {
        self.initialized = true;
        self.client_info = Some(client_info);
        self.touch();
    }
}
