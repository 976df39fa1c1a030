//! System clipboard access

use anyhow::{anyhow, Result};

/// Cross-platform clipboard abstraction backed by `arboard`.
///
/// Creation is deferred until the first copy so headless terminals can still
/// chat; failures surface per call and the caller falls back to printing.
pub struct Clipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard {
    /// Creates a clipboard handle without touching the clipboard device yet.
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Writes text to the system clipboard.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match &mut self.inner {
            Some(clipboard) => clipboard,
            None => {
                let created = arboard::Clipboard::new()
                    .map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
                self.inner.insert(created)
            }
        };

        clipboard
            .set_text(text.to_owned())
            .map_err(|e| anyhow!("clipboard write failed: {}", e))
    }
}
