//! Base trait for agent clients

use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// Error type for remote agent invocations
#[derive(Error, Debug)]
pub enum ClientError {
    /// The network call could not complete
    #[error("agent service unreachable: {0}")]
    RemoteUnavailable(#[from] reqwest::Error),

    /// The service returned an application-level failure
    #[error("agent service error: {0}")]
    RemoteError(String),

    /// The session identifier is unknown to the remote side.
    /// Callers should allocate a new session and retry once.
    #[error("unknown remote session: {0}")]
    InvalidSession(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

pub type ReplyEventStream = Pin<Box<dyn Stream<Item = ClientResult<ReplyEvent>> + Send>>;

/// Finalized response from the remote agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentReply {
    /// Response text
    pub text: String,
    /// Diagnostic trace produced by the service while answering, if any
    #[serde(default)]
    pub trace: Option<String>,
}

/// Streaming event emitted while a reply is being produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplyEvent {
    /// Incremental response text
    TextDelta(String),
    /// Incremental diagnostic trace
    TraceDelta(String),
    /// Final completed reply
    Completed(AgentReply),
}

/// Trait for agent clients
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send a message to the remote agent within the given session and wait
    /// for the finalized reply.
    async fn invoke(&self, session_id: &str, message: &str) -> ClientResult<AgentReply>;

    /// Streaming variant of [`invoke`].
    ///
    /// Default behavior falls back to the blocking call and emits the reply
    /// as a single delta.
    ///
    /// [`invoke`]: AgentClient::invoke
    async fn invoke_stream(
        &self,
        session_id: &str,
        message: &str,
    ) -> ClientResult<ReplyEventStream> {
        let reply = self.invoke(session_id, message).await?;

        let mut events = Vec::new();
        if !reply.text.is_empty() {
            events.push(Ok(ReplyEvent::TextDelta(reply.text.clone())));
        }
        if let Some(trace) = reply.trace.clone() {
            events.push(Ok(ReplyEvent::TraceDelta(trace)));
        }
        events.push(Ok(ReplyEvent::Completed(reply)));

        Ok(Box::pin(stream::iter(events)))
    }
}
