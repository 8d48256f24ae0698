use tracing::debug;

use crate::{ChannelHandle, ChatError, ChatService};

pub use dom5_config::DEFAULT_HISTORY_WINDOW;

/// Uses the channel's own recent messages as the record of what was already
/// announced.
///
/// Only the last `window` messages are visible.  An announcement that has
/// scrolled further back than that is forgotten, and the same turn would be
/// posted again if the watcher restarts while it is still current.
#[derive(Debug, Clone, Copy)]
pub struct HistoryDeduplicator {
    window: usize,
}

impl Default for HistoryDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl HistoryDeduplicator {
    /// A zero window means "unset" and falls back to the default, matching
    /// `AppConfig::history_window`.
    pub fn new(window: usize) -> Self {
        let window = match window {
            0 => DEFAULT_HISTORY_WINDOW,
            n => n,
        };
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether `canonical` appears verbatim among the most recent messages.
    pub async fn already_announced<C>(
        &self,
        chat: &C,
        channel: &ChannelHandle,
        canonical: &str,
    ) -> Result<bool, ChatError>
    where
        C: ChatService + ?Sized,
    {
        let history = chat.history(channel, self.window).await?;
        let found = history
            .iter()
            .take(self.window)
            .any(|message| message == canonical);
        debug!(
            channel = channel.id,
            fetched = history.len(),
            window = self.window,
            found,
            "history checked"
        );
        Ok(found)
    }
}
