use crate::Database;
use crate::models::{RankedMessageRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

/// How many of the newest messages come back after every send.
pub const RECENT_WINDOW: u32 = 10;

impl Database {
    /// The whole send operation as one transaction: look up or create the
    /// user, bump its counter, insert the message, then read the ranked
    /// window. Any failure drops the `Transaction`, which rolls everything
    /// back, so no partial state is ever visible.
    pub fn record_send(
        &self,
        name: &str,
        text: &str,
        created_at: &str,
    ) -> Result<Vec<RankedMessageRow>> {
        self.with_conn_mut(|conn| {
            // BEGIN IMMEDIATE: the transaction writes, so take the write
            // lock up front. A deferred begin would start as a reader and
            // the upgrade at the UPDATE could fail with SQLITE_BUSY_SNAPSHOT
            // instead of waiting out the busy timeout when another process
            // commits in between.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let user_id: Option<i64> = tx
                .query_row("SELECT id FROM users WHERE name = ?1", [name], |row| {
                    row.get(0)
                })
                .optional()?;

            let user_id = match user_id {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO users (name, message_count) VALUES (?1, 0)",
                        [name],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "UPDATE users SET message_count = message_count + 1 WHERE id = ?1",
                [user_id],
            )?;

            tx.execute(
                "INSERT INTO messages (created_at, text, user_id) VALUES (?1, ?2, ?3)",
                params![created_at, text, user_id],
            )?;

            let window = query_recent_ranked(&tx, RECENT_WINDOW)?;
            tx.commit()?;
            Ok(window)
        })
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, message_count FROM users WHERE name = ?1",
                    [name],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            message_count: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }
}

fn query_recent_ranked(conn: &Connection, limit: u32) -> Result<Vec<RankedMessageRow>> {
    // COUNT(*) OVER (ORDER BY m.id) is the running count in ascending id
    // order, i.e. each message's 1-based rank over the full history. The
    // window function is evaluated before ORDER BY/LIMIT narrow the result
    // to the newest rows, so ranks stay global.
    let mut stmt = conn.prepare(
        "SELECT u.name, m.text, m.created_at,
                COUNT(*) OVER (ORDER BY m.id) AS order_number,
                u.message_count
         FROM messages m
         JOIN users u ON m.user_id = u.id
         ORDER BY m.id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(RankedMessageRow {
                name: row.get(0)?,
                text: row.get(1)?,
                created_at: row.get(2)?,
                order_number: row.get(3)?,
                message_count: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
