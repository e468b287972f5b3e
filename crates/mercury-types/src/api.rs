use serde::{Deserialize, Serialize};

// -- Send --

/// Body of `POST /send`. Serialize is derived too so the load client can
/// build request bodies from the same type the server parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub name: String,
    pub text: String,
}

/// One entry of the recent-messages window returned by `POST /send`.
///
/// `order_number` is the message's 1-based rank over the entire history
/// ordered by ascending id. `message_count` is the owning user's running
/// total at commit time, so several entries from one sender all carry the
/// same, latest count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub name: String,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub order_number: i64,
    pub message_count: i64,
}
