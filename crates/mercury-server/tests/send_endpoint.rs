/// Integration test: drive the real router over a loopback listener and
/// verify the `/send` contract end to end.
use std::sync::Arc;

use serde_json::json;

use mercury_db::Database;
use mercury_server::{AppStateInner, app};
use mercury_types::api::MessageEntry;

async fn spawn_server() -> String {
    spawn_server_with(Database::open_in_memory().unwrap()).await
}

async fn spawn_server_with(db: Database) -> String {
    let state = Arc::new(AppStateInner { db });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn send(
    client: &reqwest::Client,
    base: &str,
    name: &str,
    text: &str,
) -> Vec<MessageEntry> {
    let resp = client
        .post(format!("{}/send", base))
        .json(&json!({ "name": name, "text": text }))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    resp.json().await.unwrap()
}

#[tokio::test]
async fn send_twice_updates_rank_and_running_count() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let first = send(&client, &base, "Michael", "hi").await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "Michael");
    assert_eq!(first[0].text, "hi");
    assert_eq!(first[0].order_number, 1);
    assert_eq!(first[0].message_count, 1);

    let second = send(&client, &base, "Michael", "again").await;
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].text, "again");
    assert_eq!(second[0].order_number, 2);
    assert_eq!(second[0].message_count, 2);
    // The older entry shows the current total, not a snapshot.
    assert_eq!(second[1].text, "hi");
    assert_eq!(second[1].message_count, 2);
}

#[tokio::test]
async fn response_window_is_capped_and_newest_first() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let mut last = Vec::new();
    for i in 0..12 {
        last = send(&client, &base, "Kevin", &format!("m{}", i)).await;
    }

    assert_eq!(last.len(), 10);
    assert_eq!(last[0].text, "m11");
    assert_eq!(last[0].order_number, 12);
    assert_eq!(last[9].order_number, 3);
    for pair in last.windows(2) {
        assert!(pair[0].order_number > pair[1].order_number);
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn malformed_body_is_rejected_before_any_write() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    // Missing `text` field
    let resp = client
        .post(format!("{}/send", base))
        .json(&json!({ "name": "Ryan" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    // Wrong type
    let resp = client
        .post(format!("{}/send", base))
        .json(&json!({ "name": "Ryan", "text": 42 }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    // Nothing was written: the next real send is rank 1.
    let window = send(&client, &base, "Ryan", "first").await;
    assert_eq!(window[0].order_number, 1);
}

#[tokio::test]
async fn corrupt_stored_timestamp_fails_the_request() {
    let db = Database::open_in_memory().unwrap();
    db.with_conn(|conn| {
        conn.execute_batch(
            "INSERT INTO users (name, message_count) VALUES ('Creed', 1);
             INSERT INTO messages (created_at, text, user_id)
                 VALUES ('not-a-timestamp', 'hi', 1);",
        )?;
        Ok(())
    })
    .unwrap();

    let base = spawn_server_with(db).await;
    let client = reqwest::Client::new();

    // The send itself commits, but the window now contains an unparseable
    // row, so the response must be a server error rather than made-up data.
    let resp = client
        .post(format!("{}/send", base))
        .json(&json!({ "name": "Creed", "text": "again" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_server_error());
}

#[tokio::test]
async fn concurrent_sends_under_one_name_lose_no_updates() {
    let base = spawn_server().await;

    let tasks = 10;
    let sends_per_task = 10;

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let base = base.clone();
            tokio::spawn(async move {
                let client = reqwest::Client::new();
                for _ in 0..sends_per_task {
                    send(&client, &base, "Angela", "text").await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let client = reqwest::Client::new();
    let window = send(&client, &base, "Angela", "one more").await;
    assert_eq!(window[0].message_count, (tasks * sends_per_task + 1) as i64);
    assert_eq!(window[0].order_number, (tasks * sends_per_task + 1) as i64);
}
