use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A logged-in player, identified by an opaque token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub auth_token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Auth tokens → sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token for `username`. A user may hold several.
    pub fn create_session(&mut self, username: &str) -> Session {
        let session = Session {
            auth_token: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .insert(session.auth_token.clone(), session.clone());
        session
    }

    pub fn get_session(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    /// Remove a token; returns whether it existed.
    pub fn delete_session(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
