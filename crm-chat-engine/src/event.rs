//! User actions and the render model they produce

use crm_chat_core::session::ChatTurn;

/// One discrete action taken by the user
#[derive(Debug, Clone)]
pub enum UserAction {
    /// Send a message to the agent
    Submit(String),
    /// Drop the transcript and the remote session, starting fresh
    ClearSession,
    /// Produce a clipboard payload for the most recent reply
    CopyLastReply,
    /// Reveal the diagnostic trace stored with the most recent reply
    ShowLastTrace,
}

/// Side information for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The transcript was cleared back to the greeting
    SessionCleared,
    /// Text ready to be placed on the system clipboard
    CopyPayload(String),
    /// There is no reply to copy yet
    NothingToCopy,
    /// Diagnostic trace of the most recent reply
    Trace(String),
    /// The most recent reply carries no trace
    NoTrace,
    /// The submitted input was empty after trimming
    EmptyInput,
}

/// What one action changed, ready to render
#[derive(Debug, Clone, Default)]
pub struct RenderModel {
    /// Turns appended to the transcript by this action, in order
    pub appended: Vec<ChatTurn>,
    /// Side information, if any
    pub notice: Option<Notice>,
}

impl RenderModel {
    pub(crate) fn with_notice(notice: Notice) -> Self {
        Self {
            appended: Vec::new(),
            notice: Some(notice),
        }
    }
}
