use std::future::Future;
use std::path::PathBuf;
use std::pin::pin;
use std::time::Duration;

use dom5_config::AppConfig;
use futures::{Stream, TryStreamExt};
use tracing::{debug, info, warn};

use crate::{
    ChangeWatcher, ChannelHandle, ChatService, DispatchError, EventExtractor,
    HistoryDeduplicator, Snapshot, StatusPageExtractor, TurnEvent, WatchError,
};

/// Everything the dispatcher needs to know about its one artifact and its one
/// channel.
#[derive(Clone)]
pub struct DispatchSettings {
    pub status_file: PathBuf,
    pub token: String,
    pub channel_id: u64,
    pub poll_interval: Duration,
    pub history_window: usize,
}

impl DispatchSettings {
    pub fn new(
        status_file: impl Into<PathBuf>,
        token: impl Into<String>,
        channel_id: u64,
        config: &AppConfig,
    ) -> Self {
        Self {
            status_file: status_file.into(),
            token: token.into(),
            channel_id,
            poll_interval: config.poll_interval(),
            history_window: config.history_window(),
        }
    }
}

// The token stays out of logs and panic messages.
impl std::fmt::Debug for DispatchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchSettings")
            .field("status_file", &self.status_file)
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("poll_interval", &self.poll_interval)
            .field("history_window", &self.history_window)
            .finish()
    }
}

/// What happened to one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// The page carried no recognisable turn title.
    NoEvent,
    /// The turn was found in the channel's recent history; nothing sent.
    AlreadyAnnounced(TurnEvent),
    Announced(TurnEvent),
}

/// Owns the chat session and drives watch → extract → dedup → send.
pub struct Dispatcher<C, E = StatusPageExtractor> {
    chat: C,
    extractor: E,
    dedup: HistoryDeduplicator,
    settings: DispatchSettings,
}

impl<C> Dispatcher<C>
where
    C: ChatService,
{
    pub fn new(chat: C, settings: DispatchSettings) -> Self {
        Self {
            chat,
            extractor: StatusPageExtractor,
            dedup: HistoryDeduplicator::new(settings.history_window),
            settings,
        }
    }
}

impl<C, E> Dispatcher<C, E>
where
    C: ChatService,
    E: EventExtractor,
{
    /// Swap the title matcher without touching the rest of the pipeline.
    pub fn with_extractor<X: EventExtractor>(self, extractor: X) -> Dispatcher<C, X> {
        Dispatcher {
            chat: self.chat,
            extractor,
            dedup: self.dedup,
            settings: self.settings,
        }
    }

    /// Run against the configured status file until an error or until
    /// `shutdown` resolves.
    pub async fn run<S>(self, shutdown: S) -> Result<(), DispatchError>
    where
        S: Future<Output = ()>,
    {
        let watcher = ChangeWatcher::new(&self.settings.status_file, self.settings.poll_interval);
        info!(
            path = %watcher.path().display(),
            interval_secs = self.settings.poll_interval.as_secs_f64(),
            "watching status page"
        );
        self.run_with(watcher.snapshots(), shutdown).await
    }

    /// Same as [`run`](Self::run) with an arbitrary snapshot source.
    ///
    /// The session is closed on every way out: login or channel failure,
    /// watcher or chat error, shutdown, or the source running dry.
    pub async fn run_with<St, S>(mut self, snapshots: St, shutdown: S) -> Result<(), DispatchError>
    where
        St: Stream<Item = Result<Snapshot, WatchError>>,
        S: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.connect_and_serve(snapshots) => result,
            () = shutdown => {
                info!("shutdown requested");
                Ok(())
            }
        };

        self.chat.close().await;
        info!("chat session closed");

        if let Err(err) = &outcome {
            warn!(error = %err, "dispatcher stopped");
        }
        outcome
    }

    async fn connect_and_serve<St>(&mut self, snapshots: St) -> Result<(), DispatchError>
    where
        St: Stream<Item = Result<Snapshot, WatchError>>,
    {
        self.chat.login(&self.settings.token).await?;
        let channel = self.chat.fetch_channel(self.settings.channel_id).await?;
        info!(
            channel = channel.id,
            name = channel.name.as_deref().unwrap_or("<unnamed>"),
            "connected to channel"
        );
        self.serve(&channel, snapshots).await
    }

    /// Handle snapshots strictly in the order the source yields them.
    pub async fn serve<St>(&self, channel: &ChannelHandle, snapshots: St) -> Result<(), DispatchError>
    where
        St: Stream<Item = Result<Snapshot, WatchError>>,
    {
        let mut snapshots = pin!(snapshots);
        while let Some(snapshot) = snapshots.try_next().await? {
            self.handle_snapshot(channel, &snapshot).await?;
        }
        debug!("snapshot source ended");
        Ok(())
    }

    /// One poll cycle's dispatch decision.
    pub async fn handle_snapshot(
        &self,
        channel: &ChannelHandle,
        snapshot: &Snapshot,
    ) -> Result<AnnounceOutcome, DispatchError> {
        let Some(event) = self.extractor.extract(&snapshot.content) else {
            debug!("no turn title in status page");
            return Ok(AnnounceOutcome::NoEvent);
        };

        let text = event.canonical();
        if self
            .dedup
            .already_announced(&self.chat, channel, &text)
            .await?
        {
            info!(
                game = %event.name,
                turn = event.turn_number,
                "turn already announced; skipping"
            );
            return Ok(AnnounceOutcome::AlreadyAnnounced(event));
        }

        self.chat.send(channel, &text).await?;
        info!(game = %event.name, turn = event.turn_number, "turn announced");
        Ok(AnnounceOutcome::Announced(event))
    }
}
