//! Shared test helpers for exercising the orchestrator without a network.

use crate::config::{Config, RetryConfig, SlotConfig};
use crate::error::{Error, PublishError, Result};
use crate::notify::NotificationSink;
use crate::orchestrator::{Orchestrator, RunContext};
use crate::publish::{AdapterRegistry, PublishAdapter, PublishReceipt, PublishRequest};
use crate::storage::MemoryObjectStore;
use crate::types::{ArtifactKind, Destination};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Adapter that replays scripted verdicts, then repeats `fallback`
pub(crate) struct ScriptedAdapter {
    destination: Destination,
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    calls: AtomicU32,
    seen_titles: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub(crate) fn always(destination: Destination, succeed: bool) -> Arc<Self> {
        Self::scripted(destination, Vec::new(), succeed)
    }

    pub(crate) fn scripted(destination: Destination, script: Vec<bool>, fallback: bool) -> Arc<Self> {
        Arc::new(Self {
            destination,
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            seen_titles: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_titles(&self) -> Vec<String> {
        self.seen_titles.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishAdapter for ScriptedAdapter {
    fn destination(&self) -> Destination {
        self.destination
    }

    async fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishReceipt> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_titles
            .lock()
            .unwrap()
            .push(request.metadata.title.clone());
        assert!(request.local_path.exists(), "artifact must be staged before publishing");

        let succeed = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        if succeed {
            Ok(PublishReceipt {
                remote_id: Some(format!("{}-{call}", self.destination)),
            })
        } else {
            Err(Error::Publish(PublishError::UnexpectedStatus {
                phase: "scripted",
                status: 500,
                body: format!("attempt {call} rejected"),
            }))
        }
    }
}

/// Sink that records messages and can be told to fail
pub(crate) struct RecordingSink {
    pub(crate) messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub(crate) fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail,
        })
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Notification("sink unavailable".into()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

/// 2025-06-01, noon UTC
pub(crate) fn test_context() -> RunContext {
    RunContext::at(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    )
}

/// Configuration with two slots, instant retries and a temp staging dir
pub(crate) fn test_config(staging: &TempDir) -> Config {
    let mut config = Config {
        slots: vec![
            SlotConfig::new(
                "reel_9am",
                "reels/9am/",
                ArtifactKind::Short,
                vec![Destination::YouTube, Destination::Facebook],
            ),
            SlotConfig::new(
                "video_930am",
                "videos/930am/",
                ArtifactKind::Standard,
                vec![Destination::YouTube],
            ),
        ],
        retry: RetryConfig {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        },
        ..Config::default()
    };
    config.lifecycle.staging_dir = staging.path().join("videos");
    config
}

pub(crate) fn registry(adapters: &[Arc<ScriptedAdapter>]) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter.clone());
    }
    registry
}

pub(crate) fn create_test_orchestrator(
    config: Config,
    store: &MemoryObjectStore,
    adapters: &[Arc<ScriptedAdapter>],
) -> Orchestrator {
    Orchestrator::new(Arc::new(config), Arc::new(store.clone()), registry(adapters))
}
