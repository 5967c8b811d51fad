//! In-memory persistence for accounts, games and player sessions.
//!
//! The stores are plain synchronous structs; the application state wraps
//! each in a `tokio::sync::RwLock`, which is what serialises mutation.

pub mod games;
pub mod sessions;
pub mod users;

pub use games::{GameRecord, GameStore};
pub use sessions::{Session, SessionStore};
pub use users::{User, UserStore};

/// Errors raised by the stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("game not found: {0}")]
    GameNotFound(u32),

    #[error("user already exists: {0}")]
    UserExists(String),
}
