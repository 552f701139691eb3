//! Full runs against an in-memory store and mocked platform APIs

mod common;

use common::*;
use media_autopost::{SlotStatus, lifecycle};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REEL: &[u8] = b"launch-day-reel-bytes";

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_youtube(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(YOUTUBE_PATH))
        .and(header("authorization", "Bearer yt-token"))
        .and(body_string_contains("\"title\":\"Launch Day\""))
        .respond_with(ok_json(json!({"id": "yt-1"})))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_facebook(server: &MockServer) {
    let size = REEL.len().to_string();

    Mock::given(method("POST"))
        .and(path(FACEBOOK_PATH))
        .and(body_string_contains("upload_phase=start"))
        .and(body_string_contains(format!("file_size={size}")))
        .respond_with(ok_json(json!({
            "upload_session_id": "sess-1",
            "video_id": "fb-1",
            "start_offset": "0",
            "end_offset": size,
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(FACEBOOK_PATH))
        .and(body_string_contains("video_file_chunk"))
        .and(body_string_contains("launch-day-reel-bytes"))
        .respond_with(ok_json(json!({"start_offset": size, "end_offset": size})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(FACEBOOK_PATH))
        .and(body_string_contains("upload_phase=finish"))
        .and(body_string_contains("title=Launch+Day"))
        .respond_with(ok_json(json!({"success": true})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_instagram(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/ig-1/media"))
        .and(body_string_contains("media_type=REELS"))
        .respond_with(ok_json(json!({"id": "c-1"})))
        .expect(1)
        .mount(server)
        .await;
    // The first status check reports processing; later ones match the next mock
    Mock::given(method("GET"))
        .and(path("/c-1"))
        .and(query_param("access_token", "ig-token"))
        .respond_with(ok_json(json!({"status_code": "IN_PROGRESS"})))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c-1"))
        .respond_with(ok_json(json!({"status_code": "FINISHED"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ig-1/media_publish"))
        .and(body_string_contains("creation_id=c-1"))
        .respond_with(ok_json(json!({"id": "ig-media-1"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_webhook(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(server)
        .await;
}

/// Text of every summary the webhook received
async fn delivered_summaries(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == WEBHOOK_PATH)
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn full_run_publishes_everywhere_then_archives_and_cleans_up() {
    let server = MockServer::start().await;
    mount_youtube(&server, 1).await;
    mount_facebook(&server).await;
    mount_instagram(&server).await;
    mount_webhook(&server, 1).await;

    let staging = TempDir::new().unwrap();
    let store = seeded_store(REEL).await;
    let orchestrator = orchestrator(mock_config(&server, &staging), &store);

    let summary = orchestrator.run(&run_context()).await.unwrap();

    let outcome = summary.outcome("reel_9am").unwrap();
    assert_eq!(outcome.status, SlotStatus::Success);
    assert!(outcome.archived);
    assert_eq!(outcome.attempts.len(), 3);
    assert!(outcome.attempts.iter().all(|a| a.succeeded() && a.attempts == 1));

    let archived = lifecycle::archive_key("archived/", REEL_KEY);
    assert!(!store.contains(REEL_KEY).await);
    assert_eq!(store.body(&archived).await.unwrap(), REEL);

    let cleanup = summary.cleanup.unwrap();
    assert_eq!(cleanup.deleted, 1);
    assert!(!store.contains(STALE_ARCHIVE_KEY).await);
    assert!(store.contains(FRESH_ARCHIVE_KEY).await);

    assert!(!staging.path().join("videos").join("2025-06-01 - Launch Day.mp4").exists());

    let texts = delivered_summaries(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("RUN SUMMARY 2025-06-01 (1 success, 0 failed, 0 skipped)"));
    assert!(texts[0].contains("youtube=ok(1) facebook=ok(1) instagram=ok(1) | archived"));
}

#[tokio::test]
async fn rejected_destination_keeps_artifact_at_source() {
    let server = MockServer::start().await;
    mount_youtube(&server, 1).await;
    mount_instagram(&server).await;
    mount_webhook(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(FACEBOOK_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("temporarily unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let staging = TempDir::new().unwrap();
    let store = seeded_store(REEL).await;
    let orchestrator = orchestrator(mock_config(&server, &staging), &store);

    let summary = orchestrator.run(&run_context()).await.unwrap();

    let outcome = summary.outcome("reel_9am").unwrap();
    assert_eq!(outcome.status, SlotStatus::Failed);
    assert!(!outcome.archived);
    assert_eq!(store.body(REEL_KEY).await.unwrap(), REEL);
    assert!(!store.contains(&lifecycle::archive_key("archived/", REEL_KEY)).await);

    // Cleanup is independent of slot outcomes
    assert!(!store.contains(STALE_ARCHIVE_KEY).await);

    let texts = delivered_summaries(&server).await;
    assert!(texts[0].contains("youtube=ok(1) facebook=failed(3) instagram=ok(1)"));
    assert!(texts[0].contains("failed: facebook; artifact retained"));
}

#[tokio::test]
async fn second_run_after_archival_posts_nothing() {
    let server = MockServer::start().await;
    mount_youtube(&server, 1).await;
    mount_facebook(&server).await;
    mount_instagram(&server).await;
    mount_webhook(&server, 2).await;

    let staging = TempDir::new().unwrap();
    let store = seeded_store(REEL).await;
    let orchestrator = orchestrator(mock_config(&server, &staging), &store);

    let first = orchestrator.run(&run_context()).await.unwrap();
    let second = orchestrator.run(&run_context()).await.unwrap();

    assert_eq!(first.count(SlotStatus::Success), 1);
    assert_eq!(second.count(SlotStatus::Skipped), 1);
    assert!(second.outcome("reel_9am").unwrap().attempts.is_empty());
}

#[tokio::test]
async fn unconfigured_platform_is_left_out_of_the_decision() {
    let server = MockServer::start().await;
    mount_youtube(&server, 1).await;
    mount_facebook(&server).await;
    mount_webhook(&server, 1).await;

    let staging = TempDir::new().unwrap();
    let mut config = mock_config(&server, &staging);
    config.platforms.instagram = None;
    let store = seeded_store(REEL).await;
    let orchestrator = orchestrator(config, &store);

    let summary = orchestrator.run(&run_context()).await.unwrap();

    let outcome = summary.outcome("reel_9am").unwrap();
    assert_eq!(outcome.status, SlotStatus::Success);
    assert!(outcome.archived);
    assert_eq!(outcome.attempts.len(), 2);
    assert!(
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .all(|r| !r.url.path().starts_with("/ig-1"))
    );
}

#[tokio::test]
async fn failing_webhook_does_not_fail_the_run() {
    let server = MockServer::start().await;
    mount_youtube(&server, 1).await;
    mount_facebook(&server).await;
    mount_instagram(&server).await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let staging = TempDir::new().unwrap();
    let store = seeded_store(REEL).await;
    let orchestrator = orchestrator(mock_config(&server, &staging), &store);

    let summary = orchestrator.run(&run_context()).await.unwrap();

    assert_eq!(summary.count(SlotStatus::Success), 1);
}
