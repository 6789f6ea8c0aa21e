//! `retrain`: refit the attribution model, at most once per cooldown.

use super::{CommandContext, CommandSettings};
use clap::Parser;
use hearsay_inference::RetrainParams;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Process-wide rate limit on retrains.
pub struct RetrainCooldown {
    period: Duration,
    last: Mutex<Option<Instant>>,
}

impl RetrainCooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last: Mutex::new(None),
        }
    }

    /// Claim the next retrain slot. Returns `false` while the cooldown is running.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(at) if now.saturating_duration_since(at) < self.period => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// The cooldown as shown to users ("2 hours", "90 minutes").
    pub fn describe(&self) -> String {
        let mins = self.period.as_secs() / 60;
        match (mins / 60, mins % 60) {
            (1, 0) => "hour".to_string(),
            (hours, 0) if hours > 1 => format!("{hours} hours"),
            _ if mins == 1 => "minute".to_string(),
            _ => format!("{mins} minutes"),
        }
    }
}

pub(super) async fn handle_retrain(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }
    if let Some(rejection) = ctx.require_people_quota().await {
        return rejection;
    }

    let params = match parse_args(args, &ctx.settings) {
        Ok(params) => params,
        Err(e) => return format!("Failed to parse arguments ({e})"),
    };
    if params.bert && !ctx.settings.bert {
        return "BERT has been disabled by the administrator".to_string();
    }

    if !ctx.retrain.try_acquire(Instant::now()) {
        return format!(
            "The model has already been retrained within the last {}",
            ctx.retrain.describe()
        );
    }

    info!("{sender} requested a retrain: {params:?}");
    match ctx.inference.retrain(&params).await {
        Ok(report) => {
            let mut reply = format!(
                "The SVM model has been retrained. It took \x02{:.2}\x02 seconds to fit.",
                report.fit_secs
            );
            if !report.url.is_empty() {
                reply.push_str(&format!(
                    " \x02Confusion matrix\x02: {} | \x025-fold CV\x02: Accuracy {:.4}, F1 score {:.4}",
                    report.url, report.accuracy, report.f1
                ));
            }
            reply
        }
        Err(e) => {
            warn!("retrain for {sender}: {e}");
            "Failed to fetch results.".to_string()
        }
    }
}

/// Flags accepted by `retrain`.
#[derive(Parser, Debug)]
#[command(name = "retrain", no_binary_name = true, disable_help_flag = true)]
struct RetrainArgs {
    /// Also compute evaluation statistics.
    #[arg(long)]
    cm: bool,
    /// Train the BERT model instead of the SVM.
    #[arg(long)]
    bert: bool,
    /// Ignore handles with no messages in this many days (0 keeps everyone).
    #[arg(long, default_value_t = 0)]
    past: u32,
}

/// Parse `[--cm] [--bert] [--past <days>]` into inference parameters.
///
/// Errors carry clap's one-line description of the problem.
pub(super) fn parse_args(
    args: &[String],
    settings: &CommandSettings,
) -> Result<RetrainParams, String> {
    let parsed = RetrainArgs::try_parse_from(args).map_err(|e| {
        let rendered = e.to_string();
        let line = rendered.lines().next().unwrap_or_default();
        line.strip_prefix("error: ").unwrap_or(line).to_string()
    })?;

    Ok(RetrainParams {
        confusion_matrix: parsed.cm,
        cutoff_days: parsed.past,
        bert: parsed.bert,
        gpu: settings.gpu,
        min_messages: settings.message_quota,
    })
}
