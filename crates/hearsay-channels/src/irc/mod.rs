//! IRC session over TCP, optionally wrapped in TLS.
//!
//! One reader task turns server lines into [`SessionEvent`]s and answers
//! `PING`. One writer task drains a queue of outgoing lines, so every
//! [`ChatSession`] call is just a queue push.

mod connection;
mod io;
pub(crate) mod send;


use async_trait::async_trait;
use hearsay_core::{config::BotConfig, error::HearsayError, message::SessionEvent, traits::ChatSession};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Item queued for the writer task.
#[derive(Debug)]
pub(crate) enum Outgoing {
    Line(String),
    /// Flush, shut the write half down, then acknowledge.
    Close(oneshot::Sender<()>),
}

/// Handle to a running IRC session. Cheap to share behind an `Arc`.
pub struct IrcSession {
    outgoing: mpsc::Sender<Outgoing>,
}

impl IrcSession {
    /// Connect to the configured server and register.
    ///
    /// Returns the session handle and the stream of events it produces.
    pub async fn connect(
        config: &BotConfig,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>), HearsayError> {
        let transport = connection::open(config).await?;
        info!(
            "IRC connected to {}:{} (tls: {})",
            config.server, config.port, config.tls
        );
        Ok(Self::start(
            transport,
            &config.nick,
            &config.user,
            &config.realname,
        ))
    }

    /// Run a session over an already-open stream. Must be called inside a tokio runtime.
    pub fn start<S>(
        stream: S,
        nick: &str,
        user: &str,
        realname: &str,
    ) -> (Self, mpsc::Receiver<SessionEvent>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (out_tx, out_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::channel(64);

        let registration = vec![
            format!("NICK {}", send::clean(nick)),
            format!("USER {} 0 * :{}", send::clean(user), send::clean(realname)),
        ];

        tokio::spawn(io::write_loop(writer, registration, out_rx));
        tokio::spawn(io::read_loop(
            reader,
            out_tx.clone(),
            event_tx,
            send::clean(nick),
        ));

        (Self { outgoing: out_tx }, event_rx)
    }

    async fn queue(&self, line: String) -> Result<(), HearsayError> {
        self.outgoing
            .send(Outgoing::Line(line))
            .await
            .map_err(|_| HearsayError::Channel("irc session is closed".into()))
    }
}

#[async_trait]
impl ChatSession for IrcSession {
    async fn join(&self, channel: &str) -> Result<(), HearsayError> {
        self.queue(format!("JOIN {}", send::clean(channel))).await
    }

    async fn send_private(&self, target: &str, text: &str) -> Result<(), HearsayError> {
        for line in send::privmsg_lines(target, text) {
            self.queue(line).await?;
        }
        Ok(())
    }

    async fn set_mode(&self, target: &str, mode: &str) -> Result<(), HearsayError> {
        self.queue(format!("MODE {} {}", send::clean(target), send::clean(mode)))
            .await
    }

    async fn announce_away(&self, text: &str) -> Result<(), HearsayError> {
        self.queue(format!("AWAY :{}", send::clean(text))).await
    }

    async fn leave(&self, reason: &str) -> Result<(), HearsayError> {
        self.queue(format!("QUIT :{}", send::clean(reason))).await?;

        let (ack_tx, ack_rx) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Close(ack_tx))
            .await
            .map_err(|_| HearsayError::Channel("irc session is closed".into()))?;
        // The writer drops the ack if it dies first; either way the session is gone.
        let _ = ack_rx.await;
        info!("IRC session closed");
        Ok(())
    }
}
