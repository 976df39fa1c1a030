//! The chat engine: applies user actions to session state

use std::sync::Arc;

use tracing::{debug, warn};

use crm_chat_client::{AgentClient, ClientError};
use crm_chat_core::session::{ChatTurn, SessionState, TurnRole};

use crate::event::{Notice, RenderModel, UserAction};

/// Clipboard payload for a reply.
///
/// Single quotes and newlines are stripped before the text reaches the
/// clipboard device, matching what the copy affordance hands over.
pub fn clipboard_payload(text: &str) -> String {
    text.replace('\'', "").replace('\n', "")
}

/// Drives one chat conversation against a remote agent
pub struct ChatEngine {
    client: Arc<dyn AgentClient>,
    state: SessionState,
}

impl ChatEngine {
    /// Create an engine with a freshly initialized session
    pub fn new(client: Arc<dyn AgentClient>) -> Self {
        let mut state = SessionState::new();
        state.initialize();
        Self { client, state }
    }

    /// The session state, for full redraws
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one user action and produce what changed.
    ///
    /// Never fails: remote errors are surfaced into the transcript as
    /// assistant turns.
    pub async fn apply(&mut self, action: UserAction) -> RenderModel {
        match action {
            UserAction::Submit(text) => self.submit(text).await,
            UserAction::ClearSession => self.clear_session(),
            UserAction::CopyLastReply => self.copy_last_reply(),
            UserAction::ShowLastTrace => self.show_last_trace(),
        }
    }

    async fn submit(&mut self, text: String) -> RenderModel {
        let message = text.trim().to_string();
        let mut appended = Vec::new();

        if !self.record(ChatTurn::human(&message), &mut appended) {
            return RenderModel::with_notice(Notice::EmptyInput);
        }

        let session_id = self.state.ensure_remote_session().to_string();
        debug!("Submitting message on session {}", session_id);

        let outcome = match self.client.invoke(&session_id, &message).await {
            Err(ClientError::InvalidSession(_)) => {
                // The remote no longer knows this session: allocate a fresh
                // one and retry exactly once with the same message.
                warn!("Session {} rejected by the remote side, retrying", session_id);
                let fresh = self.state.rotate_remote_session().to_string();
                self.client.invoke(&fresh, &message).await
            }
            outcome => outcome,
        };

        match outcome {
            Ok(reply) => {
                let mut turn = ChatTurn::assistant(reply.text);
                if let Some(trace) = reply.trace {
                    turn = turn.with_trace(trace);
                }
                self.record(turn, &mut appended);
            }
            Err(err) => {
                warn!("Agent invocation failed: {}", err);
                self.record(
                    ChatTurn::assistant(format!("Sorry, the agent request failed: {}", err)),
                    &mut appended,
                );
            }
        }

        RenderModel {
            appended,
            notice: None,
        }
    }

    fn clear_session(&mut self) -> RenderModel {
        debug!("Clearing session");
        self.state.reset();
        self.state.initialize();

        RenderModel {
            appended: self.state.transcript().to_vec(),
            notice: Some(Notice::SessionCleared),
        }
    }

    fn copy_last_reply(&self) -> RenderModel {
        match self.last_reply() {
            Some(turn) => RenderModel::with_notice(Notice::CopyPayload(clipboard_payload(&turn.text))),
            None => RenderModel::with_notice(Notice::NothingToCopy),
        }
    }

    fn show_last_trace(&self) -> RenderModel {
        match self.last_reply() {
            Some(turn) => match &turn.trace {
                Some(trace) => RenderModel::with_notice(Notice::Trace(trace.clone())),
                None => RenderModel::with_notice(Notice::NoTrace),
            },
            None => RenderModel::with_notice(Notice::NoTrace),
        }
    }

    /// The most recent assistant turn that is an actual reply, i.e. not the
    /// greeting at the head of the transcript.
    fn last_reply(&self) -> Option<&ChatTurn> {
        self.state
            .transcript()
            .iter()
            .enumerate()
            .rev()
            .find(|(index, turn)| *index > 0 && turn.role == TurnRole::Assistant)
            .map(|(_, turn)| turn)
    }

    fn record(&mut self, turn: ChatTurn, appended: &mut Vec<ChatTurn>) -> bool {
        match self.state.append_turn(turn.clone()) {
            Ok(()) => {
                appended.push(turn);
                true
            }
            Err(_) => false,
        }
    }
}
