use super::analysis::score_class;
use super::retrain::parse_args;
use super::*;
use crate::testing::{test_store, FakeInference};
use chrono::{Days, Utc};
use hearsay_core::message::ChatMessage;
use std::time::Instant;

/// Small quotas so a handful of seeded messages unlocks the gated commands.
fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.message_quota = 2;
    config.storage.people_quota = 1;
    config.storage.max_profiles = 2;
    config
}

async fn context(config: &Config, inference: Arc<FakeInference>) -> CommandContext {
    CommandContext::new(config, test_store().await, ConsentCache::new(), inference)
}

async fn opt_in(ctx: &CommandContext, nick: &str) {
    let reply = run(ctx, Command::Opt, nick, &["in"]).await;
    assert_eq!(reply, format!("{nick}: You have successfully opted in."));
}

async fn seed_messages(ctx: &CommandContext, nick: &str, count: usize) {
    let batch: Vec<ChatMessage> = (0..count)
        .map(|i| ChatMessage::new(nick, &format!("message {i}"), "#antisocial", Utc::now()))
        .collect();
    ctx.store.submit_messages(&batch).await.unwrap();
}

async fn run(ctx: &CommandContext, cmd: Command, sender: &str, args: &[&str]) -> String {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    handle(cmd, ctx, sender, &args).await
}

// --- Registry ---

#[test]
fn test_from_name_finds_every_command() {
    for cmd in Command::ALL {
        assert_eq!(Command::from_name(cmd.name()), Some(cmd));
    }
    assert_eq!(Command::from_name("nope"), None);
    assert_eq!(Command::from_name(""), None);
    assert_eq!(Command::from_name("HELP"), None);
}

#[test]
fn test_registry_is_sorted() {
    let names: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn test_help_lists_and_describes() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;

    let all = run(&ctx, Command::Help, "alice", &[]).await;
    assert!(all.starts_with("alice: Available commands are about, attribute, forget, help,"));
    assert!(all.ends_with("Usage: +help [command]"));

    let opt = run(&ctx, Command::Help, "alice", &["opt"]).await;
    assert!(opt.contains("Usage: +opt [in|out]"));

    let missing = run(&ctx, Command::Help, "alice", &["dance"]).await;
    assert_eq!(missing, "alice: No such command dance.");
}

#[tokio::test]
async fn test_about_needs_no_consent() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    let reply = run(&ctx, Command::About, "stranger", &[]).await;
    assert!(reply.starts_with("stranger: hearsay is an authorship attribution"));
    assert!(reply.ends_with("Get help with +help."));
}

// --- Consent ---

#[tokio::test]
async fn test_opt_status_unknown_handle() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    let reply = run(&ctx, Command::Opt, "ghost", &[]).await;
    assert_eq!(reply, "ghost: Your nick was not found in the database");
}

#[tokio::test]
async fn test_opt_out_then_in_updates_cache_immediately() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    opt_in(&ctx, "bob").await;
    assert!(ctx.consent.is_eligible("bob"));

    let out = run(&ctx, Command::Opt, "bob", &["out"]).await;
    assert_eq!(out, "bob: You have successfully opted out.");
    assert!(!ctx.consent.is_eligible("bob"));
    assert_eq!(
        run(&ctx, Command::Opt, "bob", &[]).await,
        "bob: You are currently opted out."
    );

    opt_in(&ctx, "bob").await;
    assert!(ctx.consent.is_eligible("bob"));
    assert_eq!(
        run(&ctx, Command::Opt, "bob", &[]).await,
        "bob: You are currently opted in."
    );
}

#[tokio::test]
async fn test_opt_out_unknown_leaves_cache_untouched() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    let reply = run(&ctx, Command::Opt, "ghost", &["out"]).await;
    assert_eq!(reply, "ghost: Your nick was not found in the database");
    assert!(ctx.consent.is_empty());
}

#[tokio::test]
async fn test_opt_improper_arguments() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    for args in [&["maybe"][..], &["in", "out"][..]] {
        let reply = run(&ctx, Command::Opt, "alice", args).await;
        assert_eq!(
            reply,
            "alice: Improper argument(s). See +help opt for usage."
        );
    }
    assert!(!ctx.consent.is_eligible("alice"));
}

#[tokio::test]
async fn test_forget_and_unforget() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;

    assert_eq!(
        run(&ctx, Command::Forget, "ghost", &[]).await,
        "ghost: Your nick was not found in the database"
    );

    opt_in(&ctx, "alice").await;
    let reply = run(&ctx, Command::Forget, "alice", &[]).await;
    assert_eq!(
        reply,
        "alice: Your data is scheduled for deletion and will complete in 1 day. \
         To cancel this request, type +unforget"
    );
    let expected = Utc::now().date_naive().checked_add_days(Days::new(1));
    assert_eq!(ctx.store.deletion_date("alice").await.unwrap(), expected);

    assert_eq!(
        run(&ctx, Command::Forget, "alice", &[]).await,
        "alice: Your data is already scheduled for deletion"
    );

    assert_eq!(
        run(&ctx, Command::Unforget, "alice", &[]).await,
        "alice: You have successfully cancelled your deletion request."
    );
    assert_eq!(ctx.store.deletion_date("alice").await.unwrap(), None);
    assert_eq!(
        run(&ctx, Command::Unforget, "alice", &[]).await,
        "alice: You have no deletion scheduled or were not found in the database."
    );
}

// --- Gates ---

#[tokio::test]
async fn test_gated_commands_reject_ineligible_sender() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    let rejection = "carol: You must be opted in to use this command. +help opt";
    for cmd in [
        Command::Attribute,
        Command::Sentiment,
        Command::Readability,
        Command::Me,
        Command::Retrain,
        Command::Profile,
    ] {
        assert_eq!(run(&ctx, cmd, "carol", &["hello"]).await, rejection, "{cmd:?}");
    }
}

#[tokio::test]
async fn test_attribute_requires_people_quota() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    opt_in(&ctx, "alice").await;
    seed_messages(&ctx, "alice", 1).await;

    let reply = run(&ctx, Command::Attribute, "alice", &["who", "said", "this"]).await;
    assert_eq!(
        reply,
        "alice: Not enough people fulfil the message quota. hearsay requires 1 people with >= 2 messages"
    );
}

#[tokio::test]
async fn test_attribute_message_and_list() {
    let inference = Arc::new(FakeInference::default());
    let ctx = context(&test_config(), inference.clone()).await;
    opt_in(&ctx, "alice").await;
    seed_messages(&ctx, "alice", 2).await;

    assert_eq!(
        run(&ctx, Command::Attribute, "alice", &[]).await,
        "alice: You cannot attribute an empty message"
    );

    let reply = run(&ctx, Command::Attribute, "alice", &["who", "said", "this"]).await;
    assert_eq!(
        reply,
        "alice: Predicted author: katt_. Confidence scores: katt_: 1.20"
    );
    assert_eq!(
        inference.last_msg.lock().unwrap().as_deref(),
        Some("who said this")
    );

    let list = run(&ctx, Command::Attribute, "alice", &["--list"]).await;
    assert_eq!(
        list,
        "alice: Here is a list of nicks currently in the model's scope of view: alice_, katt_"
    );
}

#[tokio::test]
async fn test_inference_failure_is_a_reply() {
    let ctx = context(&test_config(), Arc::new(FakeInference::failing())).await;
    opt_in(&ctx, "alice").await;
    seed_messages(&ctx, "alice", 2).await;

    assert_eq!(
        run(&ctx, Command::Sentiment, "alice", &["great", "day"]).await,
        "alice: Failed to fetch results"
    );
    assert_eq!(
        run(&ctx, Command::Readability, "alice", &[]).await,
        "alice: Failed to fetch results"
    );
}

#[tokio::test]
async fn test_sentiment_reply() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    opt_in(&ctx, "alice").await;

    assert_eq!(
        run(&ctx, Command::Sentiment, "alice", &[]).await,
        "alice: You cannot submit an empty message"
    );
    assert_eq!(
        run(&ctx, Command::Sentiment, "alice", &["great", "day"]).await,
        "alice: Largely \x02positive\x02 with a compound score of \x020.62\x02. (pos: 0.50, neu: 0.40, neg: 0.10)"
    );
}

#[tokio::test]
async fn test_readability_and_me_need_own_quota() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    opt_in(&ctx, "alice").await;
    seed_messages(&ctx, "alice", 1).await;

    assert_eq!(
        run(&ctx, Command::Readability, "alice", &[]).await,
        "alice: You have too few messages stored to use this command (1/2 required)"
    );
    assert_eq!(
        run(&ctx, Command::Me, "alice", &[]).await,
        "alice: You have too few messages stored to use this command (1/2 required)"
    );

    seed_messages(&ctx, "alice", 2).await;
    assert_eq!(
        run(&ctx, Command::Readability, "alice", &[]).await,
        "alice: You have a Flesch-Kincaid score of 72.50 (7th grade level. Fairly easy to read.)"
    );
    assert_eq!(
        run(&ctx, Command::Me, "alice", &[]).await,
        "alice: Message count: \x023/2\x02 | Readability: \x0272.50\x02 | Sentiment: \x020.10\x02 (neutral) | Neighbour: \x02bob\x02"
    );
}

#[test]
fn test_score_class_bands() {
    assert_eq!(score_class(95.0), "5th grade level. Very easy to read.");
    assert_eq!(score_class(90.0), "5th grade level. Very easy to read.");
    assert_eq!(score_class(65.0), "8th & 9th grade. Plain English.");
    assert_eq!(score_class(30.0), "College level. Difficult to read.");
    assert_eq!(
        score_class(0.0),
        "Professional level. Extremely difficult to read."
    );
    assert_eq!(score_class(-12.0), "Unknown.");
}

// --- Retrain ---

#[tokio::test]
async fn test_retrain_cooldown_is_process_wide() {
    let inference = Arc::new(FakeInference::default());
    let ctx = context(&test_config(), inference.clone()).await;
    for nick in ["alice", "bob"] {
        opt_in(&ctx, nick).await;
        seed_messages(&ctx, nick, 2).await;
    }

    assert_eq!(
        run(&ctx, Command::Retrain, "alice", &[]).await,
        "alice: The SVM model has been retrained. It took \x023.25\x02 seconds to fit."
    );
    assert_eq!(
        run(&ctx, Command::Retrain, "bob", &["--cm"]).await,
        "bob: The model has already been retrained within the last 2 hours"
    );
    assert_eq!(inference.retrains.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_rejected_retrain_keeps_cooldown_free() {
    let inference = Arc::new(FakeInference::default());
    let mut config = test_config();
    config.inference.bert = false;
    let ctx = context(&config, inference.clone()).await;
    opt_in(&ctx, "alice").await;
    seed_messages(&ctx, "alice", 2).await;

    assert_eq!(
        run(&ctx, Command::Retrain, "alice", &["--bert"]).await,
        "alice: BERT has been disabled by the administrator"
    );
    let bad = run(&ctx, Command::Retrain, "alice", &["--past", "soon"]).await;
    assert!(bad.starts_with("alice: Failed to parse arguments (invalid value 'soon'"), "{bad}");
    assert!(bad.ends_with(')'));
    assert!(run(&ctx, Command::Retrain, "alice", &["--past", "7"])
        .await
        .starts_with("alice: The SVM model has been retrained."));
    assert_eq!(inference.retrains.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[test]
fn test_parse_retrain_args() {
    let settings = CommandSettings::from_config(&test_config());
    let args = |raw: &[&str]| -> Vec<String> { raw.iter().map(|s| s.to_string()).collect() };

    let params = parse_args(&args(&[]), &settings).unwrap();
    assert!(!params.confusion_matrix && !params.bert);
    assert_eq!(params.cutoff_days, 0);
    assert_eq!(params.min_messages, 2);
    assert!(params.gpu);

    let params = parse_args(&args(&["--cm", "--bert", "--past=14"]), &settings).unwrap();
    assert!(params.confusion_matrix && params.bert);
    assert_eq!(params.cutoff_days, 14);

    let params = parse_args(&args(&["--past", "3"]), &settings).unwrap();
    assert_eq!(params.cutoff_days, 3);

    assert!(parse_args(&args(&["--past"]), &settings).is_err());
    assert!(parse_args(&args(&["--past=-1"]), &settings).is_err());
    assert!(parse_args(&args(&["cm"]), &settings).is_err());
    assert!(parse_args(&args(&["--help"]), &settings).is_err());

    let unknown = parse_args(&args(&["--fast"]), &settings).unwrap_err();
    assert!(unknown.contains("--fast"), "{unknown}");
    assert!(!unknown.contains('\n'));
}

#[test]
fn test_cooldown_window() {
    let cooldown = RetrainCooldown::new(std::time::Duration::from_secs(60));
    let start = Instant::now();
    assert!(cooldown.try_acquire(start));
    assert!(!cooldown.try_acquire(start + std::time::Duration::from_secs(59)));
    assert!(cooldown.try_acquire(start + std::time::Duration::from_secs(60)));
    assert_eq!(cooldown.describe(), "minute");
    assert_eq!(
        RetrainCooldown::new(std::time::Duration::from_secs(90 * 60)).describe(),
        "90 minutes"
    );
}

// --- Profiles ---

#[tokio::test]
async fn test_profile_lifecycle() {
    let inference = Arc::new(FakeInference::default());
    let ctx = context(&test_config(), inference.clone()).await;
    opt_in(&ctx, "alice").await;

    assert_eq!(
        run(&ctx, Command::Profile, "alice", &[]).await,
        "alice: No arguments supplied. See +help profile"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["list"]).await,
        "alice: You have 0 profiles"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["create", "work"]).await,
        "alice: You have created a new profile work"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["create", "work"]).await,
        "alice: A profile called work already exists in your name"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["create", "two", "words"]).await,
        "alice: Too few or too many arguments supplied. Profile names may not contain spaces"
    );

    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["attribute", "work"]).await,
        "alice: Profile work has no messages yet"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["append", "work", "hello", "there"]).await,
        ""
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["append", "gym", "hello"]).await,
        "alice: No profile called gym exists in your name"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["list"]).await,
        "alice: You have 1 profiles: work (1 messages)"
    );

    let reply = run(&ctx, Command::Profile, "alice", &["attribute", "work"]).await;
    assert_eq!(
        reply,
        "alice: Predicted author: katt_. Confidence scores: katt_: 1.20"
    );
    assert_eq!(
        inference.last_msg.lock().unwrap().as_deref(),
        Some("/:MSG/hello there")
    );

    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["destroy", "work"]).await,
        "alice: You have deleted the profile work"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["destroy", "work"]).await,
        "alice: No profile called work exists in your name"
    );
    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["juggle"]).await,
        "alice: Invalid argument: juggle. See +help profile."
    );
}

#[tokio::test]
async fn test_profile_limit() {
    let ctx = context(&test_config(), Arc::new(FakeInference::default())).await;
    opt_in(&ctx, "alice").await;
    run(&ctx, Command::Profile, "alice", &["create", "one"]).await;
    run(&ctx, Command::Profile, "alice", &["create", "two"]).await;

    assert_eq!(
        run(&ctx, Command::Profile, "alice", &["create", "three"]).await,
        "alice: You have reached the maximum number of profiles allowed (2). Delete a profile before continuing"
    );
    assert_eq!(ctx.store.profile_count("alice").await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_profile_creates_respect_limit_and_names() {
    let ctx = Arc::new(context(&test_config(), Arc::new(FakeInference::default())).await);
    opt_in(&ctx, "alice").await;
    opt_in(&ctx, "bob").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let alice = ctx.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("p{i}");
            run(&alice, Command::Profile, "alice", &["create", &name]).await
        }));
        let bob = ctx.clone();
        handles.push(tokio::spawn(async move {
            run(&bob, Command::Profile, "bob", &["create", "same"]).await
        }));
    }
    let mut replies = Vec::new();
    for handle in handles {
        replies.push(handle.await.unwrap());
    }

    assert_eq!(ctx.store.profile_count("alice").await.unwrap(), 2);
    assert_eq!(ctx.store.list_profiles("bob").await.unwrap().len(), 1);
    let created = replies
        .iter()
        .filter(|r| r.contains("You have created a new profile"))
        .count();
    assert_eq!(created, 3);
    assert_eq!(
        replies
            .iter()
            .filter(|r| r.as_str() == "bob: A profile called same already exists in your name")
            .count(),
        7
    );
}
