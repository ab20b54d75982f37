//! # skirmish-session
//!
//! Server-side bookkeeping: which usernames are logged in, which games
//! exist, who is seated where, and the authoritative move log of every
//! running game.

pub mod error;
pub mod manager;
pub mod session;
pub mod users;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{GameId, GameSession};
pub use users::UserRegistry;
