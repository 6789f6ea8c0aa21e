use crate::line::{is_channel_name, IrcLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat line received from the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender handle (nickname).
    pub identity: String,
    /// Message text.
    pub content: String,
    /// Target the message was sent to: a channel, or the bot's own nick for private messages.
    pub channel: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(identity: &str, content: &str, channel: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            identity: identity.to_string(),
            content: content.to_string(),
            channel: channel.to_string(),
            timestamp,
        }
    }

    /// Build a message from a raw `PRIVMSG` line.
    ///
    /// Returns `None` when the line is not a `PRIVMSG` or lacks a sender or body.
    pub fn from_privmsg(raw: &str, timestamp: DateTime<Utc>) -> Option<Self> {
        let line = IrcLine::parse(raw)?;
        if line.command != "PRIVMSG" || line.params.len() < 2 {
            return None;
        }
        let identity = line.nick()?;
        Some(Self::new(
            identity,
            &line.params[line.params.len() - 1],
            &line.params[0],
            timestamp,
        ))
    }

    /// Where a reply to this message should go.
    ///
    /// Channel messages are answered in the channel; private messages are
    /// answered to the sender.
    pub fn reply_target(&self) -> &str {
        if is_channel_name(&self.channel) {
            &self.channel
        } else {
            &self.identity
        }
    }
}

/// An event delivered by the chat-network session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Registration completed; the session accepts commands.
    Connected,
    /// A `PRIVMSG` line, unparsed.
    Privmsg(String),
    /// An `INVITE` line, unparsed.
    Invite(String),
    /// The peer closed the connection.
    Disconnected,
}
