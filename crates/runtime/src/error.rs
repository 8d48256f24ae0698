use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to observe the status page.  Always fatal for the watcher stream.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot read modification time of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by a [`ChatService`](crate::ChatService) implementation.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat session is not logged in")]
    NotLoggedIn,
    #[error("chat service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("chat transport error: {0}")]
    Transport(String),
    #[error("unexpected chat service response: {0}")]
    InvalidResponse(String),
}

/// Terminal error of the dispatch loop.  Parse absence never shows up here;
/// anything that does ends the process.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error(transparent)]
    Chat(#[from] ChatError),
}
