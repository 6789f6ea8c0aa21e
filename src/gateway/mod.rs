//! Gateway — the supervisor between the IRC session, the command handlers,
//! the batch buffer and the deletion scheduler.
//!
//! Events are handled one at a time on the caller's task. Command handlers,
//! batch flushes and the scheduler run on a shared [`TaskTracker`] so that
//! shutdown can give them a bounded grace period.

mod batcher;
mod pipeline;
mod scheduler;


use crate::commands::CommandContext;
use batcher::MessageBatcher;
use hearsay_core::{
    config::{BotConfig, Config},
    line::invite_channel,
    message::SessionEvent,
    traits::ChatSession,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

const QUIT_MESSAGE: &str = "Signing off.";

/// Why a session ended. Exactly one of these per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Local cancellation; the bot left politely.
    Shutdown,
    /// The peer closed the connection.
    Disconnected,
}

/// The central supervisor for one chat-network session.
pub struct Gateway {
    pub(super) session: Arc<dyn ChatSession>,
    pub(super) commands: Arc<CommandContext>,
    pub(super) batcher: MessageBatcher,
    pub(super) pool_size: usize,
    pub(super) bot: BotConfig,
    pub(super) grace_period: Duration,
    pub(super) tracker: TaskTracker,
    pub(super) cancel: CancellationToken,
    scheduler_started: bool,
}

impl Gateway {
    pub fn new(
        config: &Config,
        session: Arc<dyn ChatSession>,
        commands: Arc<CommandContext>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            commands,
            batcher: MessageBatcher::new(config.storage.message_pool_size),
            pool_size: config.storage.message_pool_size,
            bot: config.bot.clone(),
            grace_period: Duration::from_secs(config.scheduler.grace_period_secs),
            tracker: TaskTracker::new(),
            cancel,
            scheduler_started: false,
        }
    }

    /// Run the event loop until cancellation or a peer disconnect.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> SessionEnd {
        info!(
            "hearsay gateway running | server: {}:{} | channel: {} | prefix: {}",
            self.bot.server, self.bot.port, self.bot.channel, self.bot.prefix
        );

        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("received shutdown signal");
                    self.shutdown().await;
                    return SessionEnd::Shutdown;
                }
                event = events.recv() => match event {
                    Some(SessionEvent::Connected) => self.on_connected().await,
                    Some(SessionEvent::Privmsg(raw)) => {
                        self.on_privmsg(&raw).await;
                    }
                    Some(SessionEvent::Invite(raw)) => self.on_invite(&raw).await,
                    Some(SessionEvent::Disconnected) | None => {
                        warn!("disconnected by peer");
                        self.cancel.cancel();
                        self.flush_remaining();
                        self.wait_for_tasks(Instant::now() + self.grace_period).await;
                        return SessionEnd::Disconnected;
                    }
                },
            }
        }
    }

    /// Join, set mode, go away, and start the deletion scheduler once.
    pub(super) async fn on_connected(&mut self) {
        let channel = self.bot.channel.clone();
        if let Err(e) = self.session.join(&channel).await {
            warn!("failed to join {channel}: {e}");
        }
        if !self.bot.mode.is_empty() {
            if let Err(e) = self.session.set_mode(&self.bot.nick, &self.bot.mode).await {
                warn!("failed to set mode {}: {e}", self.bot.mode);
            }
        }
        let away = format!("{}help for command list.", self.bot.prefix);
        if let Err(e) = self.session.announce_away(&away).await {
            warn!("failed to set away message: {e}");
        }
        info!("joined {channel}");

        if self.scheduler_started {
            return;
        }
        self.scheduler_started = true;
        info!("starting deletion scheduler");
        self.tracker.spawn(Self::deletion_loop(
            self.commands.store.clone(),
            self.commands.consent.clone(),
            self.session.clone(),
            self.cancel.clone(),
        ));
    }

    /// Best-effort join of an invited channel.
    pub(super) async fn on_invite(&self, raw: &str) {
        let Some(channel) = invite_channel(raw) else {
            warn!("unparseable INVITE: {raw}");
            return;
        };
        match self.session.join(&channel).await {
            Ok(()) => info!("joined channel {channel} on invite"),
            Err(e) => warn!("failed to join {channel} on invite: {e}"),
        }
    }

    /// Hand a partially filled buffer to a flush task.
    fn flush_remaining(&mut self) {
        if let Some(batch) = self.batcher.take() {
            info!("flushing {} buffered messages", batch.len());
            self.spawn_flush(batch);
        }
    }

    /// Flush, say goodbye and drain tasks, all within one grace period.
    async fn shutdown(&mut self) {
        let deadline = Instant::now() + self.grace_period;
        self.flush_remaining();
        match timeout_at(deadline, self.session.leave(QUIT_MESSAGE)).await {
            Ok(Ok(())) => info!("sent QUIT"),
            Ok(Err(e)) => warn!("failed to leave cleanly: {e}"),
            Err(_) => warn!("QUIT not acknowledged within {:?}", self.grace_period),
        }
        self.wait_for_tasks(deadline).await;
    }

    /// Stop accepting tasks and wait until `deadline` for the rest.
    async fn wait_for_tasks(&self, deadline: Instant) {
        self.tracker.close();
        if timeout_at(deadline, self.tracker.wait()).await.is_err() {
            warn!(
                "{} tasks still running after {:?}; exiting anyway",
                self.tracker.len(),
                self.grace_period
            );
        }
    }
}
