//! Chat commands — the registry and the handlers behind it.
//!
//! Handlers never fail: storage and inference errors are logged and turned
//! into a user-facing reply. The returned text is sent back to where the
//! command came from; an empty string means no reply.

mod analysis;
mod consent;
mod info;
mod profile;
mod retrain;

#[cfg(test)]
mod tests;

use hearsay_core::config::Config;
use hearsay_inference::InferenceService;
use hearsay_storage::{ConsentCache, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use retrain::RetrainCooldown;

/// Runtime values the handlers read.
#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub prefix: String,
    pub message_quota: i64,
    pub people_quota: i64,
    pub max_profiles: i64,
    pub deletion_days: u32,
    pub bert: bool,
    pub gpu: bool,
}

impl CommandSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.bot.prefix.clone(),
            message_quota: config.storage.message_quota,
            people_quota: config.storage.people_quota,
            max_profiles: config.storage.max_profiles,
            deletion_days: config.scheduler.deletion_days,
            bert: config.inference.bert,
            gpu: config.inference.gpu,
        }
    }
}

/// Everything a handler may touch. Shared by all command tasks.
pub struct CommandContext {
    pub store: Store,
    pub consent: ConsentCache,
    pub inference: Arc<dyn InferenceService>,
    pub settings: CommandSettings,
    pub retrain: RetrainCooldown,
}

impl CommandContext {
    pub fn new(
        config: &Config,
        store: Store,
        consent: ConsentCache,
        inference: Arc<dyn InferenceService>,
    ) -> Self {
        Self {
            store,
            consent,
            inference,
            settings: CommandSettings::from_config(config),
            retrain: RetrainCooldown::new(Duration::from_secs(
                config.inference.retrain_cooldown_mins * 60,
            )),
        }
    }

    /// Rejection for senders that are not opted in.
    fn require_eligible(&self, sender: &str) -> Option<String> {
        if self.consent.is_eligible(sender) {
            None
        } else {
            Some(format!(
                "You must be opted in to use this command. {}help opt",
                self.settings.prefix
            ))
        }
    }

    /// Rejection when too few handles have enough messages to train on.
    async fn require_people_quota(&self) -> Option<String> {
        let quota = self.settings.message_quota;
        match self.store.people_meeting_quota(quota).await {
            Ok(n) if n >= self.settings.people_quota => None,
            Ok(_) => Some(format!(
                "Not enough people fulfil the message quota. hearsay requires {} people with >= {quota} messages",
                self.settings.people_quota
            )),
            Err(e) => {
                warn!("people quota check failed: {e}");
                Some(FETCH_FAILED.to_string())
            }
        }
    }

    /// The sender's message count, or a rejection if it is below the quota.
    async fn require_own_quota(&self, sender: &str) -> Result<i64, String> {
        let quota = self.settings.message_quota;
        match self.store.message_count(sender).await {
            Ok(count) if count >= quota => Ok(count),
            Ok(count) => Err(format!(
                "You have too few messages stored to use this command ({count}/{quota} required)"
            )),
            Err(e) => {
                warn!("message count for {sender} failed: {e}");
                Err(FETCH_FAILED.to_string())
            }
        }
    }
}

const FETCH_FAILED: &str = "Failed to fetch results";

/// Registered commands, sorted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    About,
    Attribute,
    Forget,
    Help,
    Me,
    Opt,
    Profile,
    Readability,
    Retrain,
    Sentiment,
    Unforget,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Self::About,
        Self::Attribute,
        Self::Forget,
        Self::Help,
        Self::Me,
        Self::Opt,
        Self::Profile,
        Self::Readability,
        Self::Retrain,
        Self::Sentiment,
        Self::Unforget,
    ];

    /// Look a command up by the name typed after the prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::About => "about",
            Self::Attribute => "attribute",
            Self::Forget => "forget",
            Self::Help => "help",
            Self::Me => "me",
            Self::Opt => "opt",
            Self::Profile => "profile",
            Self::Readability => "readability",
            Self::Retrain => "retrain",
            Self::Sentiment => "sentiment",
            Self::Unforget => "unforget",
        }
    }

    /// Help text shown by `help <command>`.
    pub fn description(self, prefix: &str) -> String {
        match self {
            Self::About => format!("Information about hearsay. Usage: {prefix}about"),
            Self::Attribute => format!(
                "Attribute a message to a chatter who is opted in and fulfils the message quota. \
                 To view the model's scope of view, use the --list flag. NOTE: Longer messages \
                 will yield higher accuracy; aim for >= 10 characters. \
                 Usage: {prefix}attribute (--list|<message>)"
            ),
            Self::Forget => format!("Permanently purge all your data. Usage: {prefix}forget"),
            Self::Help => format!("Get information on a command. Usage: {prefix}help [command]"),
            Self::Me => format!("Statistics about yourself. Usage: {prefix}me"),
            Self::Opt => format!(
                "Opt in or out from data collection and model training. If no arguments are \
                 submitted, your current opt status will be returned. \
                 Usage: {prefix}opt [in|out]. (default: out)"
            ),
            Self::Profile => format!(
                "Build author profiles that provide higher attribution accuracy. \
                 Usage: {prefix}profile (attribute|create|destroy) <name> | append <name> <message> | list"
            ),
            Self::Readability => format!(
                "Calculate the Flesch-Kincaid readability score of your messages. \
                 Usage: {prefix}readability"
            ),
            Self::Retrain => format!(
                "Refit the classification model. Add the --cm flag for evaluation statistics \
                 (heavy). To ignore inactive nicks, provide the --past flag with the number of \
                 days of inactivity before being cut off. To include BERT embeddings, append the \
                 --bert flag. Usage: {prefix}retrain [--cm, --bert, --past <days>]"
            ),
            Self::Sentiment => format!(
                "Extract the sentiment (positive, neutral, or negative) from a message. \
                 Usage: {prefix}sentiment <message>"
            ),
            Self::Unforget => format!("Cancel a scheduled data deletion. Usage: {prefix}unforget"),
        }
    }
}

/// Run a command for `sender` and return the reply, addressed to the sender.
pub async fn handle(cmd: Command, ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    let body = match cmd {
        Command::About => info::handle_about(&ctx.settings),
        Command::Help => info::handle_help(&ctx.settings, args),
        Command::Opt => consent::handle_opt(ctx, sender, args).await,
        Command::Forget => consent::handle_forget(ctx, sender).await,
        Command::Unforget => consent::handle_unforget(ctx, sender).await,
        Command::Attribute => analysis::handle_attribute(ctx, sender, args).await,
        Command::Sentiment => analysis::handle_sentiment(ctx, sender, args).await,
        Command::Readability => analysis::handle_readability(ctx, sender).await,
        Command::Me => analysis::handle_me(ctx, sender).await,
        Command::Retrain => retrain::handle_retrain(ctx, sender, args).await,
        Command::Profile => profile::handle_profile(ctx, sender, args).await,
    };

    if body.is_empty() {
        body
    } else {
        format!("{sender}: {body}")
    }
}
