//! Session state for one interactive chat
//!
//! A session is an in-memory transcript plus the opaque identifier that
//! correlates its turns into one remote conversation context. Nothing here
//! touches disk; the transcript lives exactly as long as the process.

pub mod store;

pub use store::{ChatTurn, SessionState, TurnRole, GREETING};
