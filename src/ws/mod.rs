//! WebSocket module: live game sessions.
//!
//! - [`messages`]: Typed command/event envelopes.
//! - [`manager`]: Per-game connection tracking and broadcast.
//! - [`handler`]: Axum WebSocket upgrade handler and command dispatch.

pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::{announce_move, ws_handler};
pub use manager::WsManager;
pub use messages::{WsCommand, WsEvent};
