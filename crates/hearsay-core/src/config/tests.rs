use super::*;

#[test]
fn test_defaults_match_shipped_values() {
    let cfg = Config::default();
    assert_eq!(cfg.bot.prefix, "+");
    assert_eq!(cfg.bot.mode, "+B");
    assert_eq!(cfg.bot.channel, "#antisocial");
    assert_eq!(cfg.bot.port, 6697);
    assert!(cfg.bot.tls);
    assert_eq!(cfg.storage.message_pool_size, 20);
    assert_eq!(cfg.storage.message_quota, 400);
    assert_eq!(cfg.storage.people_quota, 5);
    assert_eq!(cfg.storage.max_profiles, 3);
    assert_eq!(cfg.scheduler.deletion_days, 1);
    assert_eq!(cfg.inference.retrain_cooldown_mins, 120);
    assert!(cfg.logging.dir.is_none());
}

#[test]
fn test_parse_partial_toml() {
    let toml_str = r##"
        [bot]
        prefix = "!"
        channel = "#lab"

        [storage]
        message_pool_size = 5
    "##;
    let cfg = parse(toml_str).unwrap();
    assert_eq!(cfg.bot.prefix, "!");
    assert_eq!(cfg.bot.channel, "#lab");
    assert_eq!(cfg.bot.nick, "hearsay");
    assert_eq!(cfg.storage.message_pool_size, 5);
    assert_eq!(cfg.storage.message_quota, 400);
    assert_eq!(cfg.scheduler.deletion_days, 1);
}

#[test]
fn test_zero_and_empty_values_fall_back() {
    let toml_str = r#"
        [bot]
        prefix = ""
        mode = "  "

        [storage]
        message_pool_size = 0
        message_quota = -3
        people_quota = 0

        [scheduler]
        deletion_days = 0
    "#;
    let cfg = parse(toml_str).unwrap();
    assert_eq!(cfg.bot.prefix, "+");
    assert_eq!(cfg.bot.mode, "+B");
    assert_eq!(cfg.storage.message_pool_size, 20);
    assert_eq!(cfg.storage.message_quota, 400);
    assert_eq!(cfg.storage.people_quota, 5);
    assert_eq!(cfg.scheduler.deletion_days, 1);
}

#[test]
fn test_inference_url_trailing_slash_trimmed() {
    let cfg = parse("[inference]\nbase_url = \"http://localhost:8111/\"\n").unwrap();
    assert_eq!(cfg.inference.base_url, "http://localhost:8111");
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = parse("[bot\nprefix = ").unwrap_err();
    assert!(matches!(err, HearsayError::Config(_)));
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__hearsay_config__.toml").unwrap();
    assert_eq!(cfg.bot.server, "irc.zoite.net");
}

#[test]
fn test_load_from_disk() {
    let dir = std::env::temp_dir().join(format!("__hearsay_cfg_{}__", std::process::id()));
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("config.toml");
    std::fs::write(&path, "[scheduler]\ndeletion_days = 7\n").unwrap();

    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.scheduler.deletion_days, 7);

    let _ = std::fs::remove_dir_all(&dir);
}
