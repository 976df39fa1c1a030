//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting shown as the first assistant turn of every fresh transcript.
pub const GREETING: &str = "Hi, I am a Customer Relation Manager. How can I help you?";

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Assistant,
    Human,
}

/// One message exchanged in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Turn author
    pub role: TurnRole,
    /// Message text
    pub text: String,
    /// Diagnostic trace returned alongside an assistant reply, if any.
    /// Stored, never rendered inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Turn timestamp
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a human turn
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Human,
            text: text.into(),
            trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a diagnostic trace
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// The state of one interactive chat session
///
/// An explicit value owned by whoever drives the conversation; there is no
/// ambient global. The transcript is append-only except for [`reset`].
///
/// [`reset`]: SessionState::reset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Ordered transcript of turns
    transcript: Vec<ChatTurn>,
    /// Opaque identifier correlating turns into one remote conversation,
    /// absent until the first invocation needs one.
    remote_session_id: Option<String>,
}

impl SessionState {
    /// Create an empty session with no remote handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the transcript with the greeting turn if it is empty; idempotent.
    pub fn initialize(&mut self) {
        if self.transcript.is_empty() {
            self.transcript.push(ChatTurn::assistant(GREETING));
        }
    }

    /// Append a turn to the transcript.
    ///
    /// Human turns must carry non-empty text; everything else is stored
    /// verbatim.
    pub fn append_turn(&mut self, turn: ChatTurn) -> crate::Result<()> {
        if turn.role == TurnRole::Human && turn.text.trim().is_empty() {
            return Err(crate::Error::Validation(
                "human turns must carry non-empty text".to_string(),
            ));
        }
        self.transcript.push(turn);
        Ok(())
    }

    /// Clear the transcript and discard the remote session handle.
    ///
    /// The next invocation allocates a fresh remote session.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.remote_session_id = None;
    }

    /// Return the remote session id, allocating one if absent
    pub fn ensure_remote_session(&mut self) -> &str {
        self.remote_session_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
    }

    /// Discard the current remote session id and allocate a fresh one.
    ///
    /// Used when the remote side no longer recognizes the handle.
    pub fn rotate_remote_session(&mut self) -> &str {
        self.remote_session_id.insert(Uuid::new_v4().to_string())
    }

    /// The ordered transcript
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// The current remote session id, if one has been allocated
    pub fn remote_session_id(&self) -> Option<&str> {
        self.remote_session_id.as_deref()
    }

    /// The most recent assistant turn, if any
    pub fn last_assistant_turn(&self) -> Option<&ChatTurn> {
        self.transcript
            .iter()
            .rev()
            .find(|turn| turn.role == TurnRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_seeds_greeting() {
        let mut state = SessionState::new();
        state.initialize();

        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript()[0].role, TurnRole::Assistant);
        assert_eq!(state.transcript()[0].text, GREETING);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut state = SessionState::new();
        state.initialize();
        state.initialize();

        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn test_append_preserves_order_and_text() {
        let mut state = SessionState::new();
        state.initialize();
        state
            .append_turn(ChatTurn::human("What is customer X's balance?"))
            .unwrap();
        state
            .append_turn(ChatTurn::assistant("$500").with_trace("trace-abc"))
            .unwrap();

        let transcript = state.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, TurnRole::Human);
        assert_eq!(transcript[1].text, "What is customer X's balance?");
        assert_eq!(transcript[2].role, TurnRole::Assistant);
        assert_eq!(transcript[2].text, "$500");
        assert_eq!(transcript[2].trace.as_deref(), Some("trace-abc"));
    }

    #[test]
    fn test_transcript_length_is_one_plus_appends() {
        let mut state = SessionState::new();
        state.initialize();
        for i in 0..40 {
            state
                .append_turn(ChatTurn::human(format!("Message {}", i)))
                .unwrap();
        }

        assert_eq!(state.transcript().len(), 41);
    }

    #[test]
    fn test_append_rejects_empty_human_turn() {
        let mut state = SessionState::new();
        state.initialize();

        assert!(state.append_turn(ChatTurn::human("   ")).is_err());
        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn test_reset_clears_transcript_and_session() {
        let mut state = SessionState::new();
        state.initialize();
        state.append_turn(ChatTurn::human("Hello")).unwrap();
        let before = state.ensure_remote_session().to_string();

        state.reset();
        assert!(state.transcript().is_empty());
        assert!(state.remote_session_id().is_none());

        state.initialize();
        assert_eq!(state.transcript().len(), 1);
        assert_ne!(state.ensure_remote_session(), before);
    }

    #[test]
    fn test_ensure_remote_session_is_stable() {
        let mut state = SessionState::new();
        let first = state.ensure_remote_session().to_string();
        let second = state.ensure_remote_session().to_string();

        assert_eq!(first, second);
    }

    #[test]
    fn test_rotate_remote_session_allocates_fresh_id() {
        let mut state = SessionState::new();
        let first = state.ensure_remote_session().to_string();
        let rotated = state.rotate_remote_session().to_string();

        assert_ne!(first, rotated);
        assert_eq!(state.remote_session_id(), Some(rotated.as_str()));
    }
}
