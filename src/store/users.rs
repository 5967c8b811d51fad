use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::StoreError;

/// A registered account. Only the bcrypt hash of the password is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Usernames → accounts.
#[derive(Debug, Default)]
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Usernames are unique.
    pub fn create_user(&mut self, user: User) -> Result<(), StoreError> {
        if self.users.contains_key(&user.username) {
            return Err(StoreError::UserExists(user.username));
        }
        self.users.insert(user.username.clone(), user);
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
