//! Default value functions used by serde for config deserialization.

pub fn default_nick() -> String {
    "hearsay".to_string()
}

pub fn default_server() -> String {
    "irc.zoite.net".to_string()
}

pub fn default_port() -> u16 {
    6697
}

pub fn default_true() -> bool {
    true
}

pub fn default_channel() -> String {
    "#antisocial".to_string()
}

pub fn default_prefix() -> String {
    "+".to_string()
}

pub fn default_mode() -> String {
    "+B".to_string()
}

pub fn default_db_path() -> String {
    "data/database.db".to_string()
}

pub fn default_message_pool_size() -> usize {
    20
}

pub fn default_message_quota() -> i64 {
    400
}

pub fn default_people_quota() -> i64 {
    5
}

pub fn default_max_profiles() -> i64 {
    3
}

pub fn default_deletion_days() -> u32 {
    1
}

pub fn default_grace_period_secs() -> u64 {
    2
}

pub fn default_inference_url() -> String {
    "http://api:8111".to_string()
}

pub fn default_inference_timeout() -> u64 {
    600
}

pub fn default_retrain_cooldown_mins() -> u64 {
    120
}

pub fn default_log_level() -> String {
    "info".to_string()
}
