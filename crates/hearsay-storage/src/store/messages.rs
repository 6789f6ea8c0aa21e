//! Batched message capture, quota counts and IRC log import.

use super::identities::TIME_FORMAT;
use super::Store;
use chrono::NaiveDateTime;
use hearsay_core::{error::HearsayError, message::ChatMessage};

/// Outcome of a log import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    /// Lines from handles that are unknown or opted out.
    pub ineligible: usize,
    pub malformed: usize,
}

impl Store {
    /// Persist a batch of messages in a single transaction.
    ///
    /// Only messages whose sender is opted in when the batch commits are
    /// stored; the rest are dropped, so a flush that races a purge or an
    /// opt-out never brings data back. Returns the number stored. Any
    /// failure rolls the whole batch back.
    pub async fn submit_messages(&self, messages: &[ChatMessage]) -> Result<usize, HearsayError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HearsayError::Storage(format!("batch begin failed: {e}")))?;

        let mut stored = 0;
        for message in messages {
            let time = message.timestamp.format(TIME_FORMAT).to_string();

            let res = sqlx::query(
                "INSERT INTO messages (nick, channel, message, time) \
                 SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM users WHERE nick = ? AND opt = 1)",
            )
            .bind(&message.identity)
            .bind(&message.channel)
            .bind(message.content.trim())
            .bind(&time)
            .bind(&message.identity)
            .execute(&mut *tx)
            .await
            .map_err(|e| HearsayError::Storage(format!("message insert failed: {e}")))?;
            stored += res.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| HearsayError::Storage(format!("batch commit failed: {e}")))?;
        Ok(stored)
    }

    /// Number of stored messages for a handle.
    pub async fn message_count(&self, nick: &str) -> Result<i64, HearsayError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE nick = ?")
            .bind(nick)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("message count failed: {e}")))?;
        Ok(count)
    }

    /// Number of handles with at least `message_quota` stored messages.
    pub async fn people_meeting_quota(&self, message_quota: i64) -> Result<i64, HearsayError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM \
             (SELECT nick FROM messages GROUP BY nick HAVING COUNT(*) >= ?)",
        )
        .bind(message_quota)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("quota count failed: {e}")))?;
        Ok(count)
    }

    /// Import an IRC log (`Mon DD HH:MM:SS nick message` per line) in one transaction.
    ///
    /// Only opted-in handles are imported and exact duplicates are skipped.
    pub async fn import_log(
        &self,
        content: &str,
        channel: &str,
        year: i32,
    ) -> Result<ImportSummary, HearsayError> {
        let mut summary = ImportSummary::default();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HearsayError::Storage(format!("import begin failed: {e}")))?;

        for line in content.lines() {
            let Some((time, nick, message)) = parse_log_line(line, year) else {
                summary.malformed += 1;
                continue;
            };

            let duplicate: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM messages WHERE nick = ? AND message = ? LIMIT 1")
                    .bind(nick)
                    .bind(message)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| HearsayError::Storage(format!("duplicate check failed: {e}")))?;
            if duplicate.is_some() {
                summary.duplicates += 1;
                continue;
            }

            let eligible: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM users WHERE nick = ? AND opt = 1 LIMIT 1")
                    .bind(nick)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| HearsayError::Storage(format!("consent check failed: {e}")))?;
            if eligible.is_none() {
                summary.ineligible += 1;
                continue;
            }

            sqlx::query("INSERT INTO messages (nick, channel, message, time) VALUES (?, ?, ?, ?)")
                .bind(nick)
                .bind(channel)
                .bind(message)
                .bind(time.format(TIME_FORMAT).to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| HearsayError::Storage(format!("import insert failed: {e}")))?;
            summary.imported += 1;
        }

        tx.commit()
            .await
            .map_err(|e| HearsayError::Storage(format!("import commit failed: {e}")))?;

        tracing::info!(
            "log import into {channel}: {} imported, {} duplicates, {} ineligible, {} malformed",
            summary.imported,
            summary.duplicates,
            summary.ineligible,
            summary.malformed
        );
        Ok(summary)
    }
}

/// Split a log line into its timestamp, nick and message.
///
/// Log lines carry no year, so the caller supplies one.
pub fn parse_log_line(line: &str, year: i32) -> Option<(NaiveDateTime, &str, &str)> {
    let mut parts = line.splitn(5, ' ');
    let (month, day, clock, nick, message) = (
        parts.next()?,
        parts.next()?,
        parts.next()?,
        parts.next()?,
        parts.next()?,
    );
    if nick.is_empty() || message.trim().is_empty() {
        return None;
    }
    let time = NaiveDateTime::parse_from_str(
        &format!("{month} {day} {clock} {year}"),
        "%b %d %H:%M:%S %Y",
    )
    .ok()?;
    Some((time, nick, message.trim()))
}
