//! Daily deletion of identities whose retention window has run out.

use super::Gateway;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use hearsay_core::traits::ChatSession;
use hearsay_storage::{ConsentCache, Store};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub(super) const PURGE_NOTICE: &str = "Your data has been successfully purged";

/// The next UTC day boundary strictly after `now`.
pub(super) fn next_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    (now.date_naive() + Days::new(1))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

impl Gateway {
    /// Background task: wait for midnight, purge, repeat.
    ///
    /// Only deletions dated exactly "today" are purged; days missed while the
    /// bot was down are not caught up. Cancellation wins over a ready timer.
    pub(super) async fn deletion_loop(
        store: Store,
        consent: ConsentCache,
        session: Arc<dyn ChatSession>,
        cancel: CancellationToken,
    ) {
        loop {
            let now = Utc::now();
            let boundary = next_midnight(now);
            let wait = (boundary - now).to_std().unwrap_or_default();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("deletion scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            Self::run_deletion_cycle(&store, &consent, session.as_ref(), boundary.date_naive())
                .await;
        }
    }

    /// One purge: delete today's identities, drop them from the consent
    /// cache and notify each one. Returns the purged handles.
    pub(super) async fn run_deletion_cycle(
        store: &Store,
        consent: &ConsentCache,
        session: &dyn ChatSession,
        today: NaiveDate,
    ) -> Vec<String> {
        let purged = match store.purge_scheduled(today).await {
            Ok(purged) => purged,
            Err(e) => {
                error!("deletion cycle for {today} failed: {e}");
                return Vec::new();
            }
        };

        for nick in &purged {
            consent.record_opt_out(nick);
        }
        if !purged.is_empty() {
            info!("purged {} identities: {}", purged.len(), purged.join(", "));
        }

        // Unreachable handles are not retried.
        for nick in &purged {
            if let Err(e) = session.send_private(nick, PURGE_NOTICE).await {
                warn!("failed to notify {nick} of purge: {e}");
            }
        }
        purged
    }
}
