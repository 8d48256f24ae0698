//! In-memory chat service for unit tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{ChannelHandle, ChatError, ChatService};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    /// Newest first, like a real channel listing.
    pub history: Vec<String>,
    pub sent: Vec<String>,
    pub history_limits: Vec<usize>,
    pub token: Option<String>,
    pub logins: Vec<String>,
    pub close_calls: usize,
    pub fail_login: bool,
    pub fail_channel: bool,
    pub fail_history: bool,
    pub fail_send: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeChat {
    state: Arc<Mutex<FakeState>>,
}

impl FakeChat {
    pub fn with_history<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chat = Self::default();
        chat.state().history = messages.into_iter().map(Into::into).collect();
        chat
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ChatService for FakeChat {
    async fn login(&mut self, token: &str) -> Result<(), ChatError> {
        let mut state = self.state();
        if state.fail_login {
            return Err(ChatError::Api {
                status: 401,
                message: "401: Unauthorized".to_string(),
            });
        }
        state.logins.push(token.to_string());
        state.token = Some(token.to_string());
        Ok(())
    }

    async fn fetch_channel(&self, channel_id: u64) -> Result<ChannelHandle, ChatError> {
        let state = self.state();
        if state.token.is_none() {
            return Err(ChatError::NotLoggedIn);
        }
        if state.fail_channel {
            return Err(ChatError::Api {
                status: 404,
                message: "Unknown Channel".to_string(),
            });
        }
        Ok(ChannelHandle {
            id: channel_id,
            name: Some("turns".to_string()),
        })
    }

    async fn history(
        &self,
        _channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        let mut state = self.state();
        if state.fail_history {
            return Err(ChatError::Transport("connection reset".to_string()));
        }
        state.history_limits.push(limit);
        Ok(state.history.iter().take(limit).cloned().collect())
    }

    async fn send(&self, _channel: &ChannelHandle, text: &str) -> Result<(), ChatError> {
        let mut state = self.state();
        if state.fail_send {
            return Err(ChatError::Api {
                status: 403,
                message: "Missing Permissions".to_string(),
            });
        }
        state.sent.push(text.to_string());
        state.history.insert(0, text.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        let mut state = self.state();
        state.close_calls += 1;
        state.token = None;
    }
}
