//! Remote agent invocation for crm-chat
//!
//! This crate wraps the single remote call the front-end makes: send a user
//! message plus a session identifier to the managed agent service and get
//! back the finalized response text and an optional diagnostic trace.

pub mod base;
pub mod http;

pub use base::{
    AgentClient, AgentReply, ClientError, ClientResult, ReplyEvent, ReplyEventStream,
};
pub use http::HttpAgentClient;
