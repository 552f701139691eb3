use super::*;
use crate::types::Metadata;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use wiremock::{Request, Respond, ResponseTemplate};


/// Replays a fixed list of responses, repeating the last one
pub(super) struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl Sequence {
    pub(super) fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let idx = call.min(self.responses.len() - 1);
        self.responses[idx].clone()
    }
}

pub(super) fn json_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub(super) fn metadata(title: &str) -> Metadata {
    Metadata {
        title: title.to_string(),
        caption: format!("{title} | 2025-06-01"),
        date: "2025-06-01".to_string(),
    }
}

/// Write `content` to a staged file in a fresh temp dir
pub(super) fn staged(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("2025-06-01 - Clip.mp4");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

pub(super) fn request<'a>(
    key: &'a str,
    local_path: &'a std::path::Path,
    kind: ArtifactKind,
    metadata: &'a Metadata,
) -> PublishRequest<'a> {
    PublishRequest {
        key,
        local_path,
        kind,
        metadata,
    }
}

pub(super) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

#[test]
fn registry_only_holds_configured_platforms() {
    let platforms = crate::config::PlatformConfig {
        youtube: Some(crate::config::YouTubeConfig::new("yt-token")),
        facebook: None,
        instagram: Some(crate::config::InstagramConfig::new("ig-user", "ig-token")),
    };
    let store: Arc<dyn ObjectStore> = Arc::new(crate::storage::MemoryObjectStore::new());

    let registry = AdapterRegistry::from_config(&platforms, client(), store, CancellationToken::new());

    assert_eq!(
        registry.enabled(),
        vec![Destination::YouTube, Destination::Instagram]
    );
    assert!(!registry.is_enabled(Destination::Facebook));
    assert_eq!(
        registry.get(Destination::Instagram).unwrap().destination(),
        Destination::Instagram
    );
}

#[test]
fn empty_registry_disables_everything() {
    let registry = AdapterRegistry::new();

    for destination in Destination::ALL {
        assert!(registry.get(destination).is_none());
    }
}

#[test]
fn string_field_accepts_numeric_ids() {
    let body = serde_json::json!({"id": 17841400000000000u64, "empty": ""});

    assert_eq!(string_field("create", &body, "id").unwrap(), "17841400000000000");
    assert_eq!(
        string_field("create", &body, "empty").unwrap_err().code(),
        "malformed_response"
    );
}
