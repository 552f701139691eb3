//! Common test utilities for media-autopost end-to-end tests

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use media_autopost::config::{
    FacebookConfig, InstagramConfig, PollConfig, RetryConfig, WebhookConfig, YouTubeConfig,
};
use media_autopost::{
    AdapterRegistry, ArtifactKind, Config, Destination, MemoryObjectStore, NotificationSink,
    Orchestrator, RunContext, SlotConfig, WebhookSink,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

pub const REEL_KEY: &str = "reels/9am/2025-06-01 - Launch Day.mp4";
pub const STALE_ARCHIVE_KEY: &str = "archived/reels/9am/2025-05-28 - Old.mp4";
pub const FRESH_ARCHIVE_KEY: &str = "archived/reels/9am/2025-05-31 - Recent.mp4";

pub const YOUTUBE_PATH: &str = "/upload/youtube/v3/videos";
pub const FACEBOOK_PATH: &str = "/page-1/videos";
pub const WEBHOOK_PATH: &str = "/hooks/summary";

/// Clock fixed at 2025-06-01, noon UTC
pub fn run_context() -> RunContext {
    RunContext::at(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    )
}

/// One short-form slot publishing to every platform, all pointed at `server`
pub fn mock_config(server: &MockServer, staging: &TempDir) -> Config {
    let mut youtube = YouTubeConfig::new("yt-token");
    youtube.upload_url = format!("{}{YOUTUBE_PATH}?uploadType=multipart", server.uri());

    let mut facebook = FacebookConfig::new("page-1", "fb-token");
    facebook.graph_video_url = server.uri();

    let mut instagram = InstagramConfig::new("ig-1", "ig-token");
    instagram.graph_url = server.uri();
    instagram.short = PollConfig {
        interval: Duration::from_millis(10),
        max_wait: Duration::from_secs(2),
    };

    let mut config = Config {
        slots: vec![SlotConfig::new(
            "reel_9am",
            "reels/9am/",
            ArtifactKind::Short,
            vec![Destination::YouTube, Destination::Facebook, Destination::Instagram],
        )],
        retry: RetryConfig {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        },
        ..Config::default()
    };
    config.lifecycle.staging_dir = staging.path().join("videos");
    config.platforms.youtube = Some(youtube);
    config.platforms.facebook = Some(facebook);
    config.platforms.instagram = Some(instagram);
    config
        .notifications
        .webhooks
        .push(WebhookConfig::new(format!("{}{WEBHOOK_PATH}", server.uri())));
    config
}

/// Store with today's reel plus one stale and one fresh archived object
pub async fn seeded_store(reel: &[u8]) -> MemoryObjectStore {
    let now = run_context().now;
    let store = MemoryObjectStore::new();
    store.insert(REEL_KEY, reel.to_vec(), now - TimeDelta::hours(2)).await;
    store
        .insert(STALE_ARCHIVE_KEY, b"old".to_vec(), now - TimeDelta::hours(72))
        .await;
    store
        .insert(FRESH_ARCHIVE_KEY, b"recent".to_vec(), now - TimeDelta::hours(20))
        .await;
    store
}

/// Wire the real adapters and webhook sinks the way the binary does
pub fn orchestrator(config: Config, store: &MemoryObjectStore) -> Orchestrator {
    let config = Arc::new(config);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    let store = Arc::new(store.clone());

    let adapters =
        AdapterRegistry::from_config(&config.platforms, client.clone(), store.clone(), cancel.clone());
    let sinks: Vec<Arc<dyn NotificationSink>> = config
        .notifications
        .webhooks
        .iter()
        .cloned()
        .map(|webhook| Arc::new(WebhookSink::with_client(webhook, client.clone())) as Arc<dyn NotificationSink>)
        .collect();

    Orchestrator::new(config, store, adapters)
        .with_sinks(sinks)
        .with_cancellation(cancel)
}
