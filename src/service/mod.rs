//! Sessions, seats and turn-taking on top of the engine.

pub mod games;
pub mod types;

pub use games::GameService;
pub use types::*;
