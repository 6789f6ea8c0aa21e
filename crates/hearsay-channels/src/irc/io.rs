//! Reader and writer tasks of a session.

use super::Outgoing;
use hearsay_core::{line::IrcLine, message::SessionEvent};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Read server lines until EOF, then report `Disconnected`.
pub(super) async fn read_loop<R>(
    reader: R,
    outgoing: mpsc::Sender<Outgoing>,
    events: mpsc::Sender<SessionEvent>,
    mut nick: String,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(512);
    let mut registered = false;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                info!("IRC connection closed by peer");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("IRC read error: {e}");
                break;
            }
        }

        // Servers relay whatever bytes clients send; keep the line even if it is not UTF-8.
        let decoded = String::from_utf8_lossy(&buf);
        let raw = decoded.trim_end_matches(['\r', '\n']);
        let Some(line) = IrcLine::parse(raw) else {
            continue;
        };

        let event = match line.command.as_str() {
            "PING" => {
                let token = line.trailing().unwrap_or_default();
                if outgoing
                    .send(Outgoing::Line(format!("PONG :{token}")))
                    .await
                    .is_err()
                {
                    debug!("IRC writer gone, cannot answer PING");
                }
                None
            }
            "001" => {
                registered = true;
                info!("IRC registration complete as {nick}");
                Some(SessionEvent::Connected)
            }
            // ERR_NICKNAMEINUSE before registration: retry with a suffix.
            "433" if !registered => {
                nick.push('_');
                warn!("nick in use, retrying as {nick}");
                let _ = outgoing.send(Outgoing::Line(format!("NICK {nick}"))).await;
                None
            }
            "PRIVMSG" => Some(SessionEvent::Privmsg(raw.to_string())),
            "INVITE" => Some(SessionEvent::Invite(raw.to_string())),
            "ERROR" => {
                warn!("IRC server error: {}", line.trailing().unwrap_or_default());
                None
            }
            _ => None,
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                debug!("session event receiver dropped, stopping reader");
                return;
            }
        }
    }

    let _ = events.send(SessionEvent::Disconnected).await;
}

/// Write the registration lines, then every queued line, in order.
pub(super) async fn write_loop<W>(
    mut writer: W,
    registration: Vec<String>,
    mut queue: mpsc::Receiver<Outgoing>,
) where
    W: AsyncWrite + Unpin,
{
    for line in &registration {
        if let Err(e) = write_line(&mut writer, line).await {
            warn!("IRC registration write failed: {e}");
            return;
        }
    }

    while let Some(item) = queue.recv().await {
        match item {
            Outgoing::Line(line) => {
                if let Err(e) = write_line(&mut writer, &line).await {
                    warn!("IRC write failed: {e}");
                    return;
                }
            }
            Outgoing::Close(ack) => {
                if let Err(e) = writer.shutdown().await {
                    debug!("IRC shutdown: {e}");
                }
                let _ = ack.send(());
                return;
            }
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    debug!("-> {line}");
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}
