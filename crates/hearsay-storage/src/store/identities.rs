//! Identity rows: consent flags, scheduled deletions, and the daily purge.

use super::Store;
use chrono::{DateTime, NaiveDate, Utc};
use hearsay_core::error::HearsayError;

/// Storage format for scheduled deletion dates.
pub(super) const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for timestamps, matching SQLite's `datetime()`.
pub(super) const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of a `forget` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled,
    AlreadyScheduled,
    NotFound,
}

impl Store {
    /// Persisted consent flag for a handle, or `None` if the handle is unknown.
    pub async fn opt_status(&self, nick: &str) -> Result<Option<bool>, HearsayError> {
        let row: Option<(bool,)> = sqlx::query_as("SELECT opt FROM users WHERE nick = ?")
            .bind(nick)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("opt status query failed: {e}")))?;
        Ok(row.map(|(opt,)| opt))
    }

    /// Opt a handle in, registering it if it has never been seen.
    pub async fn opt_in(&self, nick: &str, now: DateTime<Utc>) -> Result<(), HearsayError> {
        sqlx::query(
            "INSERT INTO users (nick, registered, opt, deletion) VALUES (?, ?, 1, NULL) \
             ON CONFLICT(nick) DO UPDATE SET opt = 1",
        )
        .bind(nick)
        .bind(now.format(TIME_FORMAT).to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("opt in failed: {e}")))?;
        Ok(())
    }

    /// Opt a handle out. Returns `false` if the handle is unknown.
    pub async fn opt_out(&self, nick: &str) -> Result<bool, HearsayError> {
        let res = sqlx::query("UPDATE users SET opt = 0 WHERE nick = ?")
            .bind(nick)
            .execute(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("opt out failed: {e}")))?;
        Ok(res.rows_affected() > 0)
    }

    /// All handles whose persisted consent flag is set.
    pub async fn eligible_handles(&self) -> Result<Vec<String>, HearsayError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT nick FROM users WHERE opt = 1")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("eligible handles query failed: {e}")))?;
        Ok(rows.into_iter().map(|(nick,)| nick).collect())
    }

    /// Schedule a handle's data for deletion on `date`.
    pub async fn schedule_deletion(
        &self,
        nick: &str,
        date: NaiveDate,
    ) -> Result<ScheduleOutcome, HearsayError> {
        let current: Option<(Option<String>,)> =
            sqlx::query_as("SELECT deletion FROM users WHERE nick = ?")
                .bind(nick)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("deletion query failed: {e}")))?;

        match current {
            None => return Ok(ScheduleOutcome::NotFound),
            Some((Some(_),)) => return Ok(ScheduleOutcome::AlreadyScheduled),
            Some((None,)) => {}
        }

        let res = sqlx::query("UPDATE users SET deletion = ? WHERE nick = ? AND deletion IS NULL")
            .bind(date.format(DATE_FORMAT).to_string())
            .bind(nick)
            .execute(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("schedule deletion failed: {e}")))?;

        // A concurrent `forget` may have won between the read and the update.
        if res.rows_affected() == 0 {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }
        Ok(ScheduleOutcome::Scheduled)
    }

    /// Cancel a scheduled deletion. Returns `false` if nothing was scheduled.
    pub async fn cancel_deletion(&self, nick: &str) -> Result<bool, HearsayError> {
        let res = sqlx::query(
            "UPDATE users SET deletion = NULL WHERE nick = ? AND deletion IS NOT NULL",
        )
        .bind(nick)
        .execute(&self.pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("cancel deletion failed: {e}")))?;
        Ok(res.rows_affected() > 0)
    }

    /// Scheduled deletion date for a handle, if any.
    pub async fn deletion_date(&self, nick: &str) -> Result<Option<NaiveDate>, HearsayError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT deletion FROM users WHERE nick = ?")
                .bind(nick)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("deletion query failed: {e}")))?;

        match row {
            Some((Some(raw),)) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map(Some)
                .map_err(|e| HearsayError::Storage(format!("bad deletion date {raw}: {e}"))),
            _ => Ok(None),
        }
    }

    /// Delete every identity scheduled for exactly `today`, cascading to its
    /// messages and profiles. Returns the purged handles.
    ///
    /// Earlier dates are never considered.
    pub async fn purge_scheduled(&self, today: NaiveDate) -> Result<Vec<String>, HearsayError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HearsayError::Storage(format!("purge begin failed: {e}")))?;

        let due: Vec<(String,)> = sqlx::query_as("SELECT nick FROM users WHERE deletion = ?")
            .bind(today.format(DATE_FORMAT).to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| HearsayError::Storage(format!("purge query failed: {e}")))?;

        let mut purged = Vec::with_capacity(due.len());
        for (nick,) in due {
            sqlx::query("DELETE FROM users WHERE nick = ?")
                .bind(&nick)
                .execute(&mut *tx)
                .await
                .map_err(|e| HearsayError::Storage(format!("purge of {nick} failed: {e}")))?;
            purged.push(nick);
        }

        tx.commit()
            .await
            .map_err(|e| HearsayError::Storage(format!("purge commit failed: {e}")))?;

        Ok(purged)
    }
}
