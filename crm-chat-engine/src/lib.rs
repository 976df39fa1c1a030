//! Chat engine for crm-chat
//!
//! The engine is the explicit event loop of the front-end: it receives one
//! discrete [`UserAction`], applies it to the owned [`SessionState`], drives
//! the remote agent client, and hands back a [`RenderModel`] for whatever
//! presentation layer sits on top. State transition and presentation never
//! mix.
//!
//! [`SessionState`]: crm_chat_core::session::SessionState
//! [`UserAction`]: event::UserAction
//! [`RenderModel`]: event::RenderModel

pub mod engine;
pub mod event;

pub use engine::{clipboard_payload, ChatEngine};
pub use event::{Notice, RenderModel, UserAction};
