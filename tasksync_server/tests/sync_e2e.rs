//! End-to-end: the real engine and HTTP client against a spawned server.

use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use tasksync::{DeviceSettings, HttpRemote, NewTask, Priority, RecordStore, Session, SyncEngine};
use tasksync_server::{db, router, AppState};
use tempfile::TempDir;

const SECRET: &str = "e2e-test-secret";

async fn spawn_server() -> Result<(String, TempDir)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("server.db").display()
    );
    let state = AppState {
        db: db::connect(&url).await?,
        jwt_secret: SECRET.to_string(),
        token_ttl: Duration::minutes(60),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("serve");
    });
    Ok((format!("http://{addr}"), dir))
}

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
    token_type: String,
}

async fn register(base: &str, email: &str, password: &str) -> Result<Token> {
    let response = reqwest::Client::new()
        .post(format!("{base}/auth/register"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?
        .error_for_status()?;
    response.json().await.context("token body")
}

async fn login(base: &str, email: &str, password: &str) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("{base}/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?)
}

/// A device: its own store, settings file and session against `base`.
async fn device(base: &str, token: &str, name: &str) -> Result<(SyncEngine<HttpRemote>, RecordStore, TempDir)> {
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join(format!("{name}.db")).display()
    );
    let store = RecordStore::open(&url).await?;
    let session = Session::new(base, DeviceSettings::new(dir.path().join("settings.json")))
        .with_token(token);
    let remote = HttpRemote::new(base)?;
    Ok((SyncEngine::new(store.clone(), remote, session), store, dir))
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: format!("{title} description"),
        task_type_id: 6,
        personal_priority: 7,
        influence: 4,
        deadline: None,
        final_priority: Priority::High,
    }
}

// Timestamps are real wall-clock here; keep successive edits strictly
// ordered even on a fast machine.
async fn tick() {
    tokio::time::sleep(StdDuration::from_millis(20)).await;
}

#[tokio::test]
async fn test_two_devices_converge_through_the_server() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    let token = register(&base, "user@example.com", "hunter2").await?;
    assert_eq!(token.token_type, "bearer");

    // Device A creates a task and syncs it up.
    let (engine_a, store_a, _dir_a) = device(&base, &token.access_token, "a").await?;
    let created = store_a.insert_task(new_task("Fix login bug")).await?;
    let outcome = engine_a.run().await;
    assert!(outcome.success, "{}", outcome.message);

    // Device B logs in fresh and pulls the full history.
    let relogin: Token = login(&base, "user@example.com", "hunter2")
        .await?
        .error_for_status()?
        .json()
        .await?;
    let (engine_b, store_b, _dir_b) = device(&base, &relogin.access_token, "b").await?;
    let outcome = engine_b.run().await;
    assert!(outcome.success, "{}", outcome.message);
    let copy = store_b.get(&created.id).await?.context("task on device B")?;
    assert_eq!(copy.title, "Fix login bug");
    assert_eq!(copy.final_priority, Priority::High);

    // B edits; the edit flows back to A through the server.
    tick().await;
    store_b
        .update_task(
            &created.id,
            tasksync::TaskEdit {
                title: Some("Fix login bug (auth flow)".to_string()),
                ..Default::default()
            },
        )
        .await?;
    let outcome = engine_b.run().await;
    assert!(outcome.success, "{}", outcome.message);
    tick().await;
    let outcome = engine_a.run().await;
    assert!(outcome.success, "{}", outcome.message);
    let merged = store_a.get(&created.id).await?.context("task on device A")?;
    assert_eq!(merged.title, "Fix login bug (auth flow)");

    // No duplicate rows appeared anywhere along the way.
    assert_eq!(store_a.task_count().await?, 1);
    assert_eq!(store_b.task_count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_server_drops_stale_and_tied_pushes() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    let token = register(&base, "user@example.com", "hunter2").await?;
    let client = reqwest::Client::new();

    let record = |title: &str, updated_at: &str| {
        json!({
            "id": "11111111-2222-3333-4444-555555555555",
            "title": title,
            "description": "patch the auth flow",
            "task_type_id": 6,
            "personal_priority": 5,
            "influence": 4,
            "status": "underway",
            "deadline": null,
            "created_at": "2024-03-01T09:00:00Z",
            "updated_at": updated_at,
            "final_priority": "High"
        })
    };
    let push = |body: serde_json::Value| {
        client
            .post(format!("{base}/sync/push"))
            .bearer_auth(&token.access_token)
            .json(&json!({ "tasks": [body] }))
            .send()
    };

    push(record("device A title", "2024-03-01T11:00:00Z"))
        .await?
        .error_for_status()?;
    // Older write and exact tie both lose to the stored copy, silently.
    push(record("device B stale title", "2024-03-01T10:00:00Z"))
        .await?
        .error_for_status()?;
    push(record("device B tied title", "2024-03-01T11:00:00Z"))
        .await?
        .error_for_status()?;

    let pull: serde_json::Value = client
        .get(format!("{base}/sync/pull"))
        .query(&[("last_sync", "2000-01-01T00:00:00Z")])
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let tasks = pull["tasks"].as_array().context("tasks array")?;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "device A title");

    // A strictly newer write replaces it.
    push(record("device B newer title", "2024-03-01T12:00:00Z"))
        .await?
        .error_for_status()?;
    let pull: serde_json::Value = client
        .get(format!("{base}/sync/pull"))
        .query(&[("last_sync", "2024-03-01T11:30:00Z")])
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let tasks = pull["tasks"].as_array().context("tasks array")?;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "device B newer title");
    Ok(())
}

#[tokio::test]
async fn test_pull_is_scoped_to_the_owner() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    let alice = register(&base, "alice@example.com", "hunter2").await?;
    let bob = register(&base, "bob@example.com", "hunter2").await?;

    let (engine, store, _dir) = device(&base, &alice.access_token, "alice").await?;
    store.insert_task(new_task("Fix login bug")).await?;
    let outcome = engine.run().await;
    assert!(outcome.success, "{}", outcome.message);

    let (engine, store, _dir) = device(&base, &bob.access_token, "bob").await?;
    let outcome = engine.run().await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(store.task_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    register(&base, "user@example.com", "hunter2").await?;

    let response = reqwest::Client::new()
        .post(format!("{base}/auth/register"))
        .json(&json!({ "email": "user@example.com", "password": "other" }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["detail"], "Email already registered");
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_wrong_password() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    register(&base, "user@example.com", "hunter2").await?;

    let response = login(&base, "user@example.com", "wrong").await?;
    assert_eq!(response.status(), 401);
    let response = login(&base, "nobody@example.com", "hunter2").await?;
    assert_eq!(response.status(), 401);
    Ok(())
}

#[tokio::test]
async fn test_invalid_token_surfaces_as_auth_failure() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    register(&base, "user@example.com", "hunter2").await?;

    let (engine, store, _dir) = device(&base, "not-a-real-token", "c").await?;
    store.insert_task(new_task("Fix login bug")).await?;
    let outcome = engine.run().await;
    assert!(!outcome.success);
    assert!(outcome.message.contains("authentication"), "{}", outcome.message);
    Ok(())
}

#[tokio::test]
async fn test_malformed_push_is_rejected_with_field_detail() -> Result<()> {
    let (base, _server_dir) = spawn_server().await?;
    let token = register(&base, "user@example.com", "hunter2").await?;

    let body = json!({
        "tasks": [{
            "id": "11111111-2222-3333-4444-555555555555",
            "title": "Fix login bug",
            "description": "patch the auth flow",
            "task_type_id": 6,
            "personal_priority": 5,
            "influence": 4,
            "status": "paused",
            "deadline": null,
            "created_at": "2024-03-01T09:00:00Z",
            "updated_at": "2024-03-01T09:00:00Z",
            "final_priority": "High"
        }]
    });
    let response = reqwest::Client::new()
        .post(format!("{base}/sync/push"))
        .bearer_auth(&token.access_token)
        .json(&body)
        .send()
        .await?;
    assert_eq!(response.status(), 422);
    let detail: serde_json::Value = response.json().await?;
    let message = detail["detail"].as_str().context("detail string")?;
    assert!(message.contains("status"), "{message}");

    // Nothing from the rejected batch landed.
    let pull: serde_json::Value = reqwest::Client::new()
        .get(format!("{base}/sync/pull"))
        .query(&[("last_sync", "2000-01-01T00:00:00Z")])
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(pull["tasks"].as_array().context("tasks array")?.len(), 0);
    assert!(pull["server_time"].as_str().context("server_time")?.ends_with('Z'));
    Ok(())
}
