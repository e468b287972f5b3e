/// Database row types; these map directly to SQLite rows.
/// Distinct from mercury-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub message_count: i64,
}

/// One row of the recent-messages window: a message joined with its owner,
/// annotated with its 1-based rank over the whole table by ascending id.
pub struct RankedMessageRow {
    pub name: String,
    pub text: String,
    pub created_at: String,
    pub order_number: i64,
    pub message_count: i64,
}
