//! Incoming text: command classification, dispatch and chat capture.

use super::Gateway;
use crate::commands::{self, Command};
use chrono::Utc;
use hearsay_core::message::ChatMessage;
use tracing::{debug, error, info, warn};

/// What a line of text is, relative to the command prefix.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Classified {
    /// Prefixed text: the word right after the prefix and the remaining words.
    Command { name: String, args: Vec<String> },
    Chat,
}

/// Split prefixed text into a command name and arguments.
///
/// The name is everything between the prefix and the first whitespace, so a
/// bare prefix yields an empty name.
pub(super) fn classify(text: &str, prefix: &str) -> Classified {
    let Some(rest) = text.strip_prefix(prefix) else {
        return Classified::Chat;
    };
    let (name, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Classified::Command {
        name: name.to_string(),
        args: tail.split_whitespace().map(String::from).collect(),
    }
}

/// How the event path handled one `PRIVMSG`.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Dispatch {
    /// A handler task was started.
    Spawned(Command),
    /// Unregistered command; answered inline.
    Unknown,
    /// Captured into the batch buffer.
    Buffered,
    /// Captured and filled the buffer; a flush of this many messages was started.
    Flushed(usize),
    /// Unparseable line, or chat from a handle that is not opted in.
    Ignored,
}

impl Gateway {
    /// Handle one raw `PRIVMSG` line. Never blocks on a handler or a flush.
    pub(super) async fn on_privmsg(&mut self, raw: &str) -> Dispatch {
        let Some(message) = ChatMessage::from_privmsg(raw, Utc::now()) else {
            debug!("unparseable PRIVMSG: {raw}");
            return Dispatch::Ignored;
        };

        match classify(&message.content, &self.bot.prefix) {
            Classified::Command { name, args } => {
                let target = message.reply_target().to_string();
                info!("received command {name} from {}", message.identity);
                match Command::from_name(&name) {
                    Some(cmd) => {
                        self.spawn_command(cmd, message.identity, target, args);
                        Dispatch::Spawned(cmd)
                    }
                    None => {
                        self.reply(&target, &format!("No such command: {name}"))
                            .await;
                        Dispatch::Unknown
                    }
                }
            }
            Classified::Chat => {
                if !self.commands.consent.is_eligible(&message.identity) {
                    return Dispatch::Ignored;
                }
                match self.batcher.push(message) {
                    Some(batch) => {
                        let count = batch.len();
                        self.spawn_flush(batch);
                        Dispatch::Flushed(count)
                    }
                    None => Dispatch::Buffered,
                }
            }
        }
    }

    fn spawn_command(&self, cmd: Command, sender: String, target: String, args: Vec<String>) {
        let ctx = self.commands.clone();
        let session = self.session.clone();
        self.tracker.spawn(async move {
            let reply = commands::handle(cmd, &ctx, &sender, &args).await;
            if reply.is_empty() {
                return;
            }
            if let Err(e) = session.send_private(&target, &reply).await {
                warn!("failed to reply to {sender} in {target}: {e}");
            }
        });
    }

    /// Persist a detached batch on its own task.
    pub(super) fn spawn_flush(&self, batch: Vec<ChatMessage>) {
        let store = self.commands.store.clone();
        let capacity = self.pool_size;
        self.tracker.spawn(async move {
            match store.submit_messages(&batch).await {
                Ok(stored) if stored < batch.len() => info!(
                    "wrote {stored}/{capacity} messages to the database ({} no longer eligible)",
                    batch.len() - stored
                ),
                Ok(stored) => info!("wrote {stored}/{capacity} messages to the database"),
                Err(e) => error!("failed to submit {} messages: {e}", batch.len()),
            }
        });
    }

    pub(super) async fn reply(&self, target: &str, text: &str) {
        if let Err(e) = self.session.send_private(target, text).await {
            warn!("failed to send to {target}: {e}");
        }
    }
}
