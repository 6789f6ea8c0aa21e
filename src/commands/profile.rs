//! `profile`: named collections of excerpts attributed as a whole.

use super::{CommandContext, FETCH_FAILED};
use hearsay_storage::store::ProfileCreation;
use tracing::{info, warn};

const BAD_ARITY: &str =
    "Too few or too many arguments supplied. Profile names may not contain spaces";

pub(super) async fn handle_profile(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if let Some(rejection) = ctx.require_eligible(sender) {
        return rejection;
    }

    let prefix = &ctx.settings.prefix;
    let Some(action) = args.first() else {
        return format!("No arguments supplied. See {prefix}help profile");
    };

    match action.as_str() {
        "list" => list(ctx, sender).await,
        "create" => create(ctx, sender, args).await,
        "destroy" => destroy(ctx, sender, args).await,
        "append" => append(ctx, sender, args).await,
        "attribute" => attribute(ctx, sender, args).await,
        other => format!("Invalid argument: {other}. See {prefix}help profile."),
    }
}

async fn list(ctx: &CommandContext, sender: &str) -> String {
    match ctx.store.list_profiles(sender).await {
        Ok(profiles) if profiles.is_empty() => "You have 0 profiles".to_string(),
        Ok(profiles) => {
            let entries: Vec<String> = profiles
                .iter()
                .map(|(name, count)| format!("{name} ({count} messages)"))
                .collect();
            format!(
                "You have {} profiles: {}",
                profiles.len(),
                entries.join(", ")
            )
        }
        Err(e) => {
            warn!("list profiles for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}

async fn create(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    let [_, name] = args else {
        return BAD_ARITY.to_string();
    };

    let max = ctx.settings.max_profiles;
    match ctx.store.create_profile(sender, name, max).await {
        Ok(ProfileCreation::Created) => {
            info!("{sender} created profile {name}");
            format!("You have created a new profile {name}")
        }
        Ok(ProfileCreation::LimitReached) => format!(
            "You have reached the maximum number of profiles allowed ({max}). Delete a profile before continuing"
        ),
        Ok(ProfileCreation::Duplicate) => {
            format!("A profile called {name} already exists in your name")
        }
        Err(e) => {
            warn!("create profile {name} for {sender}: {e}");
            "Failed to create profile".to_string()
        }
    }
}

async fn destroy(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    let [_, name] = args else {
        return BAD_ARITY.to_string();
    };

    match ctx.store.destroy_profile(sender, name).await {
        Ok(true) => format!("You have deleted the profile {name}"),
        Ok(false) => format!("No profile called {name} exists in your name"),
        Err(e) => {
            warn!("destroy profile {name} for {sender}: {e}");
            "Failed to delete profile".to_string()
        }
    }
}

/// Appending is silent on success.
async fn append(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    if args.len() < 3 {
        return "Too few arguments supplied".to_string();
    }
    let name = &args[1];
    let excerpt = args[2..].join(" ");

    match ctx.store.append_to_profile(sender, name, &excerpt).await {
        Ok(true) => String::new(),
        Ok(false) => format!("No profile called {name} exists in your name"),
        Err(e) => {
            warn!("append to profile {name} for {sender}: {e}");
            "Failed to append message to profile".to_string()
        }
    }
}

async fn attribute(ctx: &CommandContext, sender: &str, args: &[String]) -> String {
    let [_, name] = args else {
        return BAD_ARITY.to_string();
    };

    let excerpts = match ctx.store.profile_messages(sender, name).await {
        Ok(Some(excerpts)) if excerpts.is_empty() => {
            return format!("Profile {name} has no messages yet");
        }
        Ok(Some(excerpts)) => excerpts,
        Ok(None) => return format!("No profile called {name} exists in your name"),
        Err(e) => {
            warn!("profile messages {name} for {sender}: {e}");
            return FETCH_FAILED.to_string();
        }
    };

    match ctx
        .inference
        .profile_attribute(&excerpts, ctx.settings.message_quota)
        .await
    {
        Ok(result) => format!(
            "Predicted author: {}_. Confidence scores: {}",
            result.author, result.confidence
        ),
        Err(e) => {
            warn!("profile attribute {name} for {sender}: {e}");
            FETCH_FAILED.to_string()
        }
    }
}
