//! Consent and retention: opt, forget, unforget.

use super::CommandContext;
use chrono::{Days, Utc};
use hearsay_storage::store::ScheduleOutcome;
use tracing::{error, info};

const NOT_FOUND: &str = "Your nick was not found in the database";

/// `opt`: report or change the sender's consent flag.
///
/// The persisted flag is written first; the cache follows only once the write
/// has committed.
pub(super) async fn handle_opt(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if args.is_empty() {
        return match ctx.store.opt_status(sender).await {
            Ok(Some(true)) => "You are currently opted in.".to_string(),
            Ok(Some(false)) => "You are currently opted out.".to_string(),
            Ok(None) => NOT_FOUND.to_string(),
            Err(e) => {
                error!("opt status for {sender}: {e}");
                "Something went wrong".to_string()
            }
        };
    }

    match args {
        [choice] if choice == "in" => match ctx.store.opt_in(sender, Utc::now()).await {
            Ok(()) => {
                ctx.consent.record_opt_in(sender);
                info!("{sender} opted in");
                "You have successfully opted in.".to_string()
            }
            Err(e) => {
                error!("opt in for {sender}: {e}");
                "Something went wrong".to_string()
            }
        },
        [choice] if choice == "out" => match ctx.store.opt_out(sender).await {
            Ok(true) => {
                ctx.consent.record_opt_out(sender);
                info!("{sender} opted out");
                "You have successfully opted out.".to_string()
            }
            Ok(false) => NOT_FOUND.to_string(),
            Err(e) => {
                error!("opt out for {sender}: {e}");
                "Something went wrong".to_string()
            }
        },
        _ => format!(
            "Improper argument(s). See {}help opt for usage.",
            ctx.settings.prefix
        ),
    }
}

/// `forget`: schedule the sender's data for deletion.
pub(super) async fn handle_forget(ctx: &CommandContext, sender: &str) -> String {
    let days = ctx.settings.deletion_days;
    let Some(date) = Utc::now().date_naive().checked_add_days(Days::new(u64::from(days))) else {
        return "The requested action was met with an error".to_string();
    };

    match ctx.store.schedule_deletion(sender, date).await {
        Ok(ScheduleOutcome::Scheduled) => {
            info!("{sender} scheduled for deletion on {date}");
            format!(
                "Your data is scheduled for deletion and will complete in {days} {}. \
                 To cancel this request, type {}unforget",
                if days == 1 { "day" } else { "days" },
                ctx.settings.prefix
            )
        }
        Ok(ScheduleOutcome::AlreadyScheduled) => {
            "Your data is already scheduled for deletion".to_string()
        }
        Ok(ScheduleOutcome::NotFound) => NOT_FOUND.to_string(),
        Err(e) => {
            error!("schedule deletion for {sender}: {e}");
            "The requested action was met with an error".to_string()
        }
    }
}

/// `unforget`: cancel a scheduled deletion.
pub(super) async fn handle_unforget(ctx: &CommandContext, sender: &str) -> String {
    match ctx.store.cancel_deletion(sender).await {
        Ok(true) => {
            info!("{sender} cancelled their deletion");
            "You have successfully cancelled your deletion request.".to_string()
        }
        Ok(false) => {
            "You have no deletion scheduled or were not found in the database.".to_string()
        }
        Err(e) => {
            error!("cancel deletion for {sender}: {e}");
            "The requested action was met with an error.".to_string()
        }
    }
}
