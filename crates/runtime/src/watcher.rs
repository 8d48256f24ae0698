use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use futures::Stream;
use futures::stream;
use tracing::{debug, trace};

use crate::WatchError;

pub const DEFAULT_POLL_INTERVAL: Duration =
    Duration::from_secs(dom5_config::DEFAULT_POLL_INTERVAL_SECS);

/// Artifact content captured at one detected change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    pub modified: SystemTime,
}

/// Polls a file's modification time on a fixed interval.
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    path: PathBuf,
    interval: Duration,
}

impl ChangeWatcher {
    pub fn new(path: impl AsRef<Path>, interval: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Endless stream of snapshots, one per observed modification-time change.
    ///
    /// Every cycle sleeps for the interval first, then compares the current
    /// modification time against the previous cycle's.  There is no baseline
    /// before the first cycle, so the first observed state is always yielded.
    /// Intermediate states written between two polls are never seen.
    ///
    /// Content that is not valid UTF-8 is decoded lossily.  The first I/O
    /// error is yielded and ends the stream.
    pub fn snapshots(self) -> impl Stream<Item = Result<Snapshot, WatchError>> {
        stream::try_unfold((self, None), |(watcher, mut last_modified)| async move {
            loop {
                tokio::time::sleep(watcher.interval).await;

                let modified = watcher.modified().await?;
                if last_modified == Some(modified) {
                    trace!(path = %watcher.path.display(), "status page unchanged");
                    continue;
                }
                last_modified = Some(modified);

                let bytes = tokio::fs::read(&watcher.path)
                    .await
                    .map_err(|source| WatchError::Read {
                        path: watcher.path.clone(),
                        source,
                    })?;
                // The server does not promise UTF-8.  Undecodable bytes are
                // malformed content for the extractor, not a read failure.
                let content = String::from_utf8_lossy(&bytes).into_owned();
                debug!(
                    path = %watcher.path.display(),
                    bytes = content.len(),
                    "status page changed"
                );

                let snapshot = Snapshot { content, modified };
                return Ok::<_, WatchError>(Some((snapshot, (watcher, last_modified))));
            }
        })
    }

    async fn modified(&self) -> Result<SystemTime, WatchError> {
        let metadata_error = |source| WatchError::Metadata {
            path: self.path.clone(),
            source,
        };
        tokio::fs::metadata(&self.path)
            .await
            .map_err(metadata_error)?
            .modified()
            .map_err(metadata_error)
    }
}
