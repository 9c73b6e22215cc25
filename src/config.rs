//! Environment-driven settings and store key helpers.

pub const USERS_LIST_KEY: &str = "users_list";
pub const FEED_KEY: &str = "feed";
pub const MESSAGES_LIST_KEY: &str = "messages_list";

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const CONVERSATION_LIMIT: usize = 50;

/// Extensions that mark the last media file of a post as a video "bolt".
pub const BOLT_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

pub fn secret_key() -> Vec<u8> {
    std::env::var("BOLT_SECRET_KEY")
        .unwrap_or_else(|_| "bolt-dev-secret".to_string())
        .into_bytes()
}

pub fn token_ttl_secs() -> i64 {
    std::env::var("BOLT_TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(60 * 60)
}

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn comment_key(id: &str) -> String {
    format!("comment:{}", id)
}

pub fn message_key(id: &str) -> String {
    format!("message:{}", id)
}
