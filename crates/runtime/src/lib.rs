//! Turn announcement pipeline for a Dominions 5 status page.
//!
//! The pipeline polls the status page for modification-time changes, pulls a
//! [`TurnEvent`] out of the page title, and posts it to a chat channel unless
//! the channel's recent history already contains it.

mod chat;
mod dedup;
mod dispatcher;
mod error;
mod turn;
mod watcher;

#[cfg(test)]
mod testing;

pub use chat::{ChannelHandle, ChatService};
pub use dedup::{DEFAULT_HISTORY_WINDOW, HistoryDeduplicator};
pub use dispatcher::{AnnounceOutcome, DispatchSettings, Dispatcher};
pub use error::{ChatError, DispatchError, WatchError};
pub use turn::{EventExtractor, StatusPageExtractor, TurnEvent, parse_title};
pub use watcher::{ChangeWatcher, DEFAULT_POLL_INTERVAL, Snapshot};
