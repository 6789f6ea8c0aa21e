//! Commands answered by the inference service: attribute, sentiment,
//! readability, me.

use super::{CommandContext, FETCH_FAILED};
use tracing::warn;

/// `attribute <message>` or `attribute --list`.
pub(super) async fn handle_attribute(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }
    if let Some(rejection) = ctx.require_people_quota().await {
        return rejection;
    }
    if args.is_empty() {
        return "You cannot attribute an empty message".to_string();
    }

    if args[0] == "--list" {
        return match ctx.inference.attribute_list().await {
            Ok(authors) => format!(
                "Here is a list of nicks currently in the model's scope of view: {authors}"
            ),
            Err(e) => {
                warn!("attribute list for {sender}: {e}");
                FETCH_FAILED.to_string()
            }
        };
    }

    let msg = args.join(" ");
    match ctx
        .inference
        .attribute(&msg, ctx.settings.message_quota)
        .await
    {
        Ok(result) => format!(
            "Predicted author: {}_. Confidence scores: {}",
            result.author, result.confidence
        ),
        Err(e) => {
            warn!("attribute for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

/// `sentiment <message>`.
pub(super) async fn handle_sentiment(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }
    if args.is_empty() {
        return "You cannot submit an empty message".to_string();
    }

    match ctx.inference.sentiment(&args.join(" ")).await {
        Ok(s) => format!(
            "Largely \x02{}\x02 with a compound score of \x02{:.2}\x02. (pos: {:.2}, neu: {:.2}, neg: {:.2})",
            s.label, s.compound, s.pos, s.neu, s.neg
        ),
        Err(e) => {
            warn!("sentiment for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

/// `readability`: Flesch-Kincaid score of the sender's stored messages.
pub(super) async fn handle_readability(ctx: &CommandContext, sender: &str) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }
    if let Err(rejection) = ctx.require_own_quota(sender).await {
        return rejection;
    }

    match ctx.inference.readability(sender).await {
        Ok(score) => format!(
            "You have a Flesch-Kincaid score of {score:.2} ({})",
            score_class(score)
        ),
        Err(e) => {
            warn!("readability for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

/// `me`: message count, readability, sentiment and nearest neighbour.
pub(super) async fn handle_me(ctx: &CommandContext, sender: &str) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }
    let count = match ctx.require_own_quota(sender).await {
        Ok(count) => count,
        Err(rejection) => return rejection,
    };

    match ctx.inference.me(sender).await {
        Ok(report) => format!(
            "Message count: \x02{count}/{}\x02 | Readability: \x02{:.2}\x02 | Sentiment: \x02{:.2}\x02 ({}) | Neighbour: \x02{}\x02",
            ctx.settings.message_quota,
            report.readability,
            report.sentiment,
            report.sentiment_label,
            report.neighbour
        ),
        Err(e) => {
            warn!("me for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

/// Grade band of a Flesch reading-ease score.
pub(super) fn score_class(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "5th grade level. Very easy to read.",
        s if s >= 80.0 => "6th grade level. Easy to read. Conversational English for consumers.",
        s if s >= 70.0 => "7th grade level. Fairly easy to read.",
        s if s >= 60.0 => "8th & 9th grade. Plain English.",
        s if s >= 50.0 => "10th to 12th grade. Fairly difficult to read.",
        s if s >= 30.0 => "College level. Difficult to read.",
        s if s >= 10.0 => "College graduate level. Very difficult to read.",
        s if s >= 0.0 => "Professional level. Extremely difficult to read.",
        _ => "Unknown.",
    }
}
