use async_trait::async_trait;

use crate::ChatError;

/// A resolved target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: u64,
    pub name: Option<String>,
}

/// The slice of a chat service the announcer depends on.
///
/// The dispatcher owns its implementation exclusively for the life of the
/// process and calls [`close`](ChatService::close) exactly once, whatever way
/// the run ends.
#[async_trait]
pub trait ChatService: Send {
    /// Authenticate with a bot credential.
    async fn login(&mut self, token: &str) -> Result<(), ChatError>;

    async fn fetch_channel(&self, channel_id: u64) -> Result<ChannelHandle, ChatError>;

    /// Text of up to `limit` most recent messages, newest first.
    async fn history(&self, channel: &ChannelHandle, limit: usize)
    -> Result<Vec<String>, ChatError>;

    async fn send(&self, channel: &ChannelHandle, text: &str) -> Result<(), ChatError>;

    /// Release the session.  Must not fail; implementations log instead.
    async fn close(&mut self);
}
