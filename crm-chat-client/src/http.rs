//! HTTP client for the managed agent runtime

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use async_trait::async_trait;
use futures::StreamExt;

use crate::base::{AgentClient, AgentReply, ClientError, ClientResult, ReplyEvent, ReplyEventStream};
use crm_chat_core::config::EnvironmentConfig;

/// Error code the service uses for a session it no longer recognizes
const SESSION_NOT_FOUND: &str = "session_not_found";

/// Invocation request body
#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    message: &'a str,
}

/// One server-sent event payload of the invocation stream.
///
/// The reply arrives in two parts over a single response: completion text in
/// `chunk` events and the diagnostic trace in `trace` events.
#[derive(Debug, Default, Deserialize)]
struct InvokeEvent {
    #[serde(default)]
    chunk: Option<EventPart>,
    #[serde(default)]
    trace: Option<EventPart>,
}

#[derive(Debug, Deserialize)]
struct EventPart {
    #[serde(default)]
    text: String,
}

/// Application-level failure body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Client for the managed agent runtime endpoint
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
    agent_id: String,
    api_key: Option<String>,
}

impl HttpAgentClient {
    /// Create a new client
    pub fn new(
        endpoint: impl Into<String>,
        agent_id: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .http1_only() // Force HTTP/1.1 to avoid issues with some local servers
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent_id: agent_id.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Create a client from a configured deployment environment
    pub fn from_environment(env: &EnvironmentConfig) -> Self {
        Self::new(
            env.endpoint.clone(),
            env.agent_id.clone(),
            Some(env.api_key.clone()),
            Duration::from_secs(env.request_timeout_secs),
        )
    }

    fn invoke_url(&self, session_id: &str) -> String {
        format!(
            "{}/agents/{}/sessions/{}/invoke",
            self.endpoint, self.agent_id, session_id
        )
    }

    fn apply_headers(&self, mut req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }
        req_builder.header("Accept", "text/event-stream")
    }

    async fn error_from_response(
        session_id: &str,
        response: reqwest::Response,
    ) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| String::new());

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if parsed.error.code == SESSION_NOT_FOUND => {
                ClientError::InvalidSession(session_id.to_string())
            }
            Ok(parsed) => {
                ClientError::RemoteError(format!("HTTP {}: {}", status, parsed.error.message))
            }
            Err(_) if body.trim().is_empty() => ClientError::RemoteError(format!("HTTP {}", status)),
            Err(_) => ClientError::RemoteError(format!("HTTP {}: {}", status, body.trim())),
        }
    }

    fn finalize_reply(text: String, trace: String) -> AgentReply {
        AgentReply {
            text,
            trace: if trace.is_empty() { None } else { Some(trace) },
        }
    }

    fn parse_sse_events(buffer: &mut String) -> Vec<String> {
        let mut events = Vec::new();
        while let Some(pos) = buffer.find("\n\n") {
            let raw = buffer[..pos].to_string();
            buffer.drain(..pos + 2);

            let mut data_lines = Vec::new();
            for line in raw.lines() {
                if let Some(rest) = line.strip_prefix("data:") {
                    data_lines.push(rest.trim().to_string());
                }
            }

            if !data_lines.is_empty() {
                events.push(data_lines.join("\n"));
            }
        }
        events
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(&self, session_id: &str, message: &str) -> ClientResult<AgentReply> {
        let mut stream = self.invoke_stream(session_id, message).await?;

        while let Some(event) = stream.next().await {
            if let ReplyEvent::Completed(reply) = event? {
                return Ok(reply);
            }
        }

        Err(ClientError::RemoteError(
            "stream ended without a completed reply".to_string(),
        ))
    }

    async fn invoke_stream(
        &self,
        session_id: &str,
        message: &str,
    ) -> ClientResult<ReplyEventStream> {
        let url = self.invoke_url(session_id);
        debug!("Invoking agent {} (session {})", self.agent_id, session_id);

        let req_builder = self
            .apply_headers(self.client.post(&url))
            .json(&InvokeRequest { message });
        let response = req_builder.send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(session_id, response).await);
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut response = response;
            let mut buffer = String::new();
            let mut text = String::new();
            let mut trace = String::new();

            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => break,
                    Err(err) => {
                        let _ = tx.send(Err(ClientError::RemoteUnavailable(err)));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                for payload in Self::parse_sse_events(&mut buffer) {
                    if payload == "[DONE]" {
                        let reply = Self::finalize_reply(text.clone(), trace.clone());
                        let _ = tx.send(Ok(ReplyEvent::Completed(reply)));
                        return;
                    }

                    let parsed = match serde_json::from_str::<InvokeEvent>(&payload) {
                        Ok(event) => event,
                        Err(err) => {
                            let _ = tx.send(Err(ClientError::RemoteError(format!(
                                "malformed stream payload: {}",
                                err
                            ))));
                            return;
                        }
                    };

                    if let Some(part) = parsed.chunk {
                        if !part.text.is_empty() {
                            text.push_str(&part.text);
                            let _ = tx.send(Ok(ReplyEvent::TextDelta(part.text)));
                        }
                    }
                    if let Some(part) = parsed.trace {
                        if !part.text.is_empty() {
                            trace.push_str(&part.text);
                            let _ = tx.send(Ok(ReplyEvent::TraceDelta(part.text)));
                        }
                    }
                }
            }

            let reply = Self::finalize_reply(text, trace);
            let _ = tx.send(Ok(ReplyEvent::Completed(reply)));
        });

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(endpoint: &str) -> HttpAgentClient {
        HttpAgentClient::new(endpoint, "crm-agent", None, Duration::from_secs(5))
    }

    #[test]
    fn test_parse_sse_events() {
        let mut buffer =
            "data: {\"a\":1}\n\ndata: {\"b\":2}\n\ndata: [DONE]\n\ntrailing".to_string();
        let events = HttpAgentClient::parse_sse_events(&mut buffer);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], "{\"a\":1}");
        assert_eq!(events[1], "{\"b\":2}");
        assert_eq!(events[2], "[DONE]");
        assert_eq!(buffer, "trailing");
    }

    #[test]
    fn test_invoke_url_strips_trailing_slash() {
        let client = test_client("https://agents.example.com/");
        assert_eq!(
            client.invoke_url("sess-1"),
            "https://agents.example.com/agents/crm-agent/sessions/sess-1/invoke"
        );
    }

    #[tokio::test]
    async fn test_invoke_assembles_chunks_and_trace() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/agents/crm-agent/sessions/sess-1/invoke")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"chunk\":{\"text\":\"$5\"}}\n\n",
                "data: {\"chunk\":{\"text\":\"00\"}}\n\n",
                "data: {\"trace\":{\"text\":\"trace-abc\"}}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;

        let client = test_client(&server.url());
        let reply = client
            .invoke("sess-1", "What is customer X's balance?")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.text, "$500");
        assert_eq!(reply.trace.as_deref(), Some("trace-abc"));
    }

    #[tokio::test]
    async fn test_invoke_without_trace_leaves_trace_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/agents/crm-agent/sessions/sess-1/invoke")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"chunk\":{\"text\":\"Hello\"}}\n\ndata: [DONE]\n\n")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let reply = client.invoke("sess-1", "hi").await.unwrap();

        assert_eq!(reply.text, "Hello");
        assert!(reply.trace.is_none());
    }

    #[tokio::test]
    async fn test_session_not_found_maps_to_invalid_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/agents/crm-agent/sessions/sess-gone/invoke")
            .with_status(404)
            .with_body(
                r#"{"error":{"code":"session_not_found","message":"session sess-gone expired"}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.invoke("sess-gone", "hi").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn test_application_failure_maps_to_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/agents/crm-agent/sessions/sess-1/invoke")
            .with_status(500)
            .with_body(r#"{"error":{"code":"internal","message":"agent execution failed"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.invoke("sess-1", "hi").await.unwrap_err();

        match err {
            ClientError::RemoteError(message) => {
                assert!(message.contains("agent execution failed"));
            }
            other => panic!("expected RemoteError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_remote_unavailable() {
        let client = test_client("http://127.0.0.1:1");
        let err = client.invoke("sess-1", "hi").await.unwrap_err();

        assert!(matches!(err, ClientError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invoke_stream_emits_deltas_then_completion() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/agents/crm-agent/sessions/sess-1/invoke")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"chunk\":{\"text\":\"a\"}}\n\n",
                "data: {\"chunk\":{\"text\":\"b\"}}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;

        let client = test_client(&server.url());
        let mut stream = client.invoke_stream("sess-1", "hi").await.unwrap();

        let mut deltas = String::new();
        let mut completed = None;
        while let Some(event) = stream.next().await {
            match event.unwrap() {
                ReplyEvent::TextDelta(text) => deltas.push_str(&text),
                ReplyEvent::TraceDelta(_) => {}
                ReplyEvent::Completed(reply) => completed = Some(reply),
            }
        }

        assert_eq!(deltas, "ab");
        assert_eq!(completed.unwrap().text, "ab");
    }
}
