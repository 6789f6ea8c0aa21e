//! Named attribution profiles: excerpts collected by a handle for later attribution.

use super::Store;
use hearsay_core::error::HearsayError;

/// Separator between excerpts in a profile's message list.
pub const PROFILE_DELIMITER: &str = "/:MSG/";

/// Result of [`Store::create_profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCreation {
    Created,
    /// The handle already owns the maximum number of profiles.
    LimitReached,
    /// The handle already owns a profile with this name.
    Duplicate,
}

impl Store {
    /// Number of profiles owned by a handle.
    pub async fn profile_count(&self, nick: &str) -> Result<i64, HearsayError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE nick = ?")
            .bind(nick)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("profile count failed: {e}")))?;
        Ok(count)
    }

    pub async fn profile_exists(&self, nick: &str, name: &str) -> Result<bool, HearsayError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE nick = ? AND name = ?")
                .bind(nick)
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("profile lookup failed: {e}")))?;
        Ok(count > 0)
    }

    /// Profiles of a handle with their excerpt counts, oldest first.
    pub async fn list_profiles(&self, nick: &str) -> Result<Vec<(String, usize)>, HearsayError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, messages FROM profiles WHERE nick = ? ORDER BY id")
                .bind(nick)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("profile list failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(name, messages)| (name, excerpt_count(&messages)))
            .collect())
    }

    /// Create an empty profile unless the handle already owns `max_profiles`
    /// profiles or one with the same name.
    ///
    /// The limit check and the insert are one statement, so concurrent
    /// creates for the same handle cannot overshoot the limit.
    pub async fn create_profile(
        &self,
        nick: &str,
        name: &str,
        max_profiles: i64,
    ) -> Result<ProfileCreation, HearsayError> {
        let res = sqlx::query(
            "INSERT OR IGNORE INTO profiles (nick, name, messages) \
             SELECT ?, ?, '' WHERE (SELECT COUNT(*) FROM profiles WHERE nick = ?) < ?",
        )
        .bind(nick)
        .bind(name)
        .bind(nick)
        .bind(max_profiles)
        .execute(&self.pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("create profile failed: {e}")))?;

        if res.rows_affected() > 0 {
            return Ok(ProfileCreation::Created);
        }
        if self.profile_count(nick).await? >= max_profiles {
            Ok(ProfileCreation::LimitReached)
        } else {
            Ok(ProfileCreation::Duplicate)
        }
    }

    /// Delete a profile. Returns `false` if it did not exist.
    pub async fn destroy_profile(&self, nick: &str, name: &str) -> Result<bool, HearsayError> {
        let res = sqlx::query("DELETE FROM profiles WHERE nick = ? AND name = ?")
            .bind(nick)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("destroy profile failed: {e}")))?;
        Ok(res.rows_affected() > 0)
    }

    /// Append an excerpt to a profile. Returns `false` if the profile does not exist.
    pub async fn append_to_profile(
        &self,
        nick: &str,
        name: &str,
        excerpt: &str,
    ) -> Result<bool, HearsayError> {
        let res = sqlx::query(
            "UPDATE profiles SET messages = messages || ? || ? WHERE nick = ? AND name = ?",
        )
        .bind(PROFILE_DELIMITER)
        .bind(excerpt)
        .bind(nick)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("append to profile failed: {e}")))?;
        Ok(res.rows_affected() > 0)
    }

    /// Raw delimited excerpt list of a profile, or `None` if it does not exist.
    pub async fn profile_messages(
        &self,
        nick: &str,
        name: &str,
    ) -> Result<Option<String>, HearsayError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT messages FROM profiles WHERE nick = ? AND name = ?")
                .bind(nick)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("profile messages failed: {e}")))?;
        Ok(row.map(|(messages,)| messages))
    }
}

/// Excerpts in a delimited list. Every excerpt is preceded by the delimiter.
fn excerpt_count(messages: &str) -> usize {
    messages.matches(PROFILE_DELIMITER).count()
}
