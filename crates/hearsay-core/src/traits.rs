use crate::error::HearsayError;
use async_trait::async_trait;

/// Outgoing side of a chat-network session.
///
/// The IRC session implements this; the supervisor, command tasks and the
/// deletion scheduler share it behind an `Arc`.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Join a channel.
    async fn join(&self, channel: &str) -> Result<(), HearsayError>;

    /// Send a message to a channel or a nick.
    async fn send_private(&self, target: &str, text: &str) -> Result<(), HearsayError>;

    /// Set a mode on a target (usually the bot's own nick).
    async fn set_mode(&self, target: &str, mode: &str) -> Result<(), HearsayError>;

    /// Mark the bot as away with the given message.
    async fn announce_away(&self, text: &str) -> Result<(), HearsayError>;

    /// Leave the network with a reason and close the session.
    async fn leave(&self, reason: &str) -> Result<(), HearsayError>;
}
