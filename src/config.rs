//! Configuration types for media-autopost
//!
//! A [`Config`] is built once per process (usually with [`Config::from_env`])
//! and shared read-only with every component. Lower layers never read the
//! environment themselves.

use crate::error::{Error, Result};
use crate::types::{ArtifactKind, Destination};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default YouTube multipart upload endpoint
pub const YOUTUBE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=multipart&part=snippet,status";

/// Default Graph API endpoint for large video uploads
pub const FACEBOOK_GRAPH_VIDEO_URL: &str = "https://graph-video.facebook.com/v18.0";

/// Default Graph API endpoint for Instagram media containers
pub const INSTAGRAM_GRAPH_URL: &str = "https://graph.facebook.com/v18.0";

/// S3 bucket access settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding the source artifacts
    pub bucket: String,

    /// AWS region name
    pub region: String,

    /// Static access key id
    pub access_key_id: String,

    /// Static secret access key
    pub secret_access_key: String,

    /// Custom endpoint for S3-compatible stores (None = AWS)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most S3-compatible stores)
    #[serde(default)]
    pub force_path_style: bool,
}

/// A named publishing schedule bound to one source prefix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Unique slot name (e.g., "reel_9am")
    pub name: String,

    /// Source location (key prefix) scanned for candidates
    pub prefix: String,

    /// Kind of artifact the slot publishes
    pub kind: ArtifactKind,

    /// Destinations to publish to, in attempt order
    pub destinations: Vec<Destination>,
}

impl SlotConfig {
    /// Create a slot configuration
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        kind: ArtifactKind,
        destinations: Vec<Destination>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            kind,
            destinations,
        }
    }
}

/// How the selector treats days without a matching artifact
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Prefer today's artifact, fall back to the most recently modified one (default)
    #[default]
    Latest,
    /// Only ever publish an artifact carrying today's date
    StrictDate,
}

impl FromStr for SelectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(SelectionMode::Latest),
            "strict" | "strict_date" => Ok(SelectionMode::StrictDate),
            other => Err(Error::config(
                format!("unknown selection mode '{other}' (expected 'latest' or 'strict')"),
                "SELECTION_MODE",
            )),
        }
    }
}

/// Candidate selection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Selection policy (default: latest)
    #[serde(default)]
    pub mode: SelectionMode,

    /// Media file extension, matched case-insensitively (default: ".mp4")
    #[serde(default = "default_media_extension")]
    pub media_extension: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            media_extension: default_media_extension(),
        }
    }
}

/// Retry policy applied uniformly to every destination
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per destination, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (default: 30 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

/// Artifact lifecycle settings (staging, archival, retention)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Archive and delete the source artifact once every destination succeeded (default: true)
    #[serde(default = "default_true")]
    pub archive_on_success: bool,

    /// Key prefix archived artifacts are copied under (default: "archived/")
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Delete archived artifacts older than the retention window (default: true)
    #[serde(default = "default_true")]
    pub cleanup_enabled: bool,

    /// Age after which archived artifacts are deleted (default: 48 hours)
    #[serde(default = "default_retention", with = "duration_serde")]
    pub retention: Duration,

    /// Local directory the selected artifact is downloaded into (default: "./videos")
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            archive_on_success: true,
            archive_prefix: default_archive_prefix(),
            cleanup_enabled: true,
            retention: default_retention(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Poll cadence for asynchronous container processing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay before each status check, in milliseconds
    #[serde(with = "duration_ms_serde")]
    pub interval: Duration,

    /// Total polling budget, in milliseconds
    #[serde(with = "duration_ms_serde")]
    pub max_wait: Duration,
}

impl PollConfig {
    /// Cadence for short-form clips: every 6 seconds for up to one minute
    pub fn short_form() -> Self {
        Self {
            interval: Duration::from_secs(6),
            max_wait: Duration::from_secs(60),
        }
    }

    /// Cadence for long-form videos: every 10 seconds for up to five minutes
    pub fn long_form() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(300),
        }
    }
}

/// YouTube credentials and upload settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// OAuth access token with the youtube.upload scope
    pub access_token: String,

    /// Multipart upload endpoint
    #[serde(default = "default_youtube_upload_url")]
    pub upload_url: String,

    /// Video category id (default: "24", Entertainment)
    #[serde(default = "default_category_id")]
    pub category_id: String,

    /// Privacy status of uploaded videos (default: "public")
    #[serde(default = "default_privacy_status")]
    pub privacy_status: String,
}

impl YouTubeConfig {
    /// Settings with default endpoint, category and privacy
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            upload_url: default_youtube_upload_url(),
            category_id: default_category_id(),
            privacy_status: default_privacy_status(),
        }
    }
}

/// Facebook Page credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FacebookConfig {
    /// Page id videos are published to
    pub page_id: String,

    /// Long-lived page access token
    pub access_token: String,

    /// Graph video API base URL
    #[serde(default = "default_facebook_graph_video_url")]
    pub graph_video_url: String,
}

impl FacebookConfig {
    /// Settings with the default Graph endpoint
    pub fn new(page_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            access_token: access_token.into(),
            graph_video_url: default_facebook_graph_video_url(),
        }
    }

    /// Full upload endpoint for this page
    pub fn videos_url(&self) -> String {
        format!(
            "{}/{}/videos",
            self.graph_video_url.trim_end_matches('/'),
            self.page_id
        )
    }
}

/// Instagram credentials and container settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// Instagram business user id
    pub user_id: String,

    /// Graph API access token
    pub access_token: String,

    /// Graph API base URL
    #[serde(default = "default_instagram_graph_url")]
    pub graph_url: String,

    /// Lifetime of the presigned share URL handed to the platform (default: 2 hours)
    #[serde(default = "default_share_url_ttl", with = "duration_serde")]
    pub share_url_ttl: Duration,

    /// Poll cadence for short-form containers
    #[serde(default = "PollConfig::short_form")]
    pub short: PollConfig,

    /// Poll cadence for long-form containers
    #[serde(default = "PollConfig::long_form")]
    pub long: PollConfig,
}

impl InstagramConfig {
    /// Settings with default endpoint, share URL lifetime and poll cadence
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            graph_url: default_instagram_graph_url(),
            share_url_ttl: default_share_url_ttl(),
            short: PollConfig::short_form(),
            long: PollConfig::long_form(),
        }
    }
}

/// Per-platform settings; a platform is enabled when its entry is present
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// YouTube (single-shot upload)
    #[serde(default)]
    pub youtube: Option<YouTubeConfig>,

    /// Facebook Page (chunked upload)
    #[serde(default)]
    pub facebook: Option<FacebookConfig>,

    /// Instagram (container publish)
    #[serde(default)]
    pub instagram: Option<InstagramConfig>,
}

impl PlatformConfig {
    /// Whether credentials for a destination are configured
    pub fn is_enabled(&self, destination: Destination) -> bool {
        match destination {
            Destination::YouTube => self.youtube.is_some(),
            Destination::Facebook => self.facebook.is_some(),
            Destination::Instagram => self.instagram.is_some(),
        }
    }
}

/// Webhook the run summary is posted to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// URL to POST to
    pub url: String,

    /// Optional authentication header value
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Timeout for webhook requests (default: 30 seconds)
    #[serde(default = "default_webhook_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl WebhookConfig {
    /// Webhook without authentication and with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_header: None,
            timeout: default_webhook_timeout(),
        }
    }
}

/// Notification configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook configurations
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Main configuration for media-autopost
///
/// Sub-configs group related settings:
/// - [`storage`](StorageConfig) - bucket and credentials
/// - [`selection`](SelectionConfig) - candidate selection policy
/// - [`retry`](RetryConfig) - per-destination retry policy
/// - [`lifecycle`](LifecycleConfig) - staging, archival and retention
/// - [`platforms`](PlatformConfig) - destination credentials
/// - [`notifications`](NotificationConfig) - summary webhooks
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Object storage access
    #[serde(default)]
    pub storage: StorageConfig,

    /// Slots in declaration order
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotConfig>,

    /// Run only the slot with this name
    #[serde(default)]
    pub slot_filter: Option<String>,

    /// Candidate selection
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Artifact lifecycle
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Destination credentials
    #[serde(default)]
    pub platforms: PlatformConfig,

    /// Per-request HTTP timeout for platform calls (default: 300 seconds)
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub http_timeout: Duration,

    /// Summary notifications
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            slots: default_slots(),
            slot_filter: None,
            selection: SelectionConfig::default(),
            retry: RetryConfig::default(),
            lifecycle: LifecycleConfig::default(),
            platforms: PlatformConfig::default(),
            http_timeout: default_http_timeout(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Environment variables that must be present for a run to start
const REQUIRED_STORAGE_KEYS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION_NAME",
    "S3_BUCKET_NAME",
];

impl Config {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset. Missing storage settings are reported
    /// together in a single [`Error::Config`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_STORAGE_KEYS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config {
                message: format!("missing required storage settings: {}", missing.join(", ")),
                key: missing.first().map(|k| k.to_string()),
            });
        }

        let mut config = Config {
            storage: StorageConfig {
                bucket: get("S3_BUCKET_NAME").unwrap_or_default(),
                region: get("AWS_REGION_NAME").unwrap_or_default(),
                access_key_id: get("AWS_ACCESS_KEY_ID").unwrap_or_default(),
                secret_access_key: get("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
                endpoint: get("S3_ENDPOINT_URL"),
                force_path_style: parse_bool(&get, "S3_FORCE_PATH_STYLE")?.unwrap_or(false),
            },
            slot_filter: get("SLOT_FILTER"),
            ..Config::default()
        };

        if let Some(path) = get("SLOTS_FILE") {
            config.slots = load_slots_file(&path)?;
        }

        if let Some(mode) = get("SELECTION_MODE") {
            config.selection.mode = mode.parse()?;
        }
        if let Some(attempts) = parse_u64(&get, "RETRY_MAX_ATTEMPTS")? {
            config.retry.max_attempts = u32::try_from(attempts)
                .map_err(|_| Error::config("value out of range", "RETRY_MAX_ATTEMPTS"))?;
        }
        if let Some(secs) = parse_u64(&get, "RETRY_DELAY_SECS")? {
            config.retry.delay = Duration::from_secs(secs);
        }
        if let Some(hours) = parse_u64(&get, "RETENTION_HOURS")? {
            config.lifecycle.retention = Duration::from_secs(hours * 3600);
        }
        if let Some(archive) = parse_bool(&get, "ARCHIVE_ON_SUCCESS")? {
            config.lifecycle.archive_on_success = archive;
        }
        if let Some(cleanup) = parse_bool(&get, "CLEANUP_ENABLED")? {
            config.lifecycle.cleanup_enabled = cleanup;
        }
        if let Some(dir) = get("STAGING_DIR") {
            config.lifecycle.staging_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_u64(&get, "HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }

        config.platforms.youtube = get("YT_ACCESS_TOKEN").map(YouTubeConfig::new);
        config.platforms.facebook = match (get("FB_PAGE_ID"), get("META_ACCESS_TOKEN")) {
            (Some(page_id), Some(token)) => Some(FacebookConfig::new(page_id, token)),
            _ => None,
        };
        let ig_user = get("IG_USER_ID").or_else(|| get("INSTAGRAM_USER_ID"));
        config.platforms.instagram = match (ig_user, get("IG_ACCESS_TOKEN")) {
            (Some(user_id), Some(token)) => Some(InstagramConfig::new(user_id, token)),
            _ => None,
        };

        config.notifications.webhooks = ["SLACK_WEBHOOK_URL", "WHATSAPP_WEBHOOK_URL"]
            .iter()
            .filter_map(|key| get(*key))
            .map(WebhookConfig::new)
            .collect();

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() {
            return Err(Error::config("at least one slot is required", "slots"));
        }

        let mut names = HashSet::new();
        for slot in &self.slots {
            if slot.name.trim().is_empty() {
                return Err(Error::config("slot name must not be empty", "slots"));
            }
            if !names.insert(slot.name.as_str()) {
                return Err(Error::config(
                    format!("duplicate slot name '{}'", slot.name),
                    "slots",
                ));
            }
            if slot.prefix.is_empty() {
                return Err(Error::config(
                    format!("slot '{}' has an empty prefix", slot.name),
                    "slots",
                ));
            }
            if slot.prefix.starts_with(&self.lifecycle.archive_prefix) {
                return Err(Error::config(
                    format!("slot '{}' reads from the archive prefix", slot.name),
                    "slots",
                ));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "max_attempts must be at least 1",
                "RETRY_MAX_ATTEMPTS",
            ));
        }
        if self.selection.media_extension.is_empty() {
            return Err(Error::config(
                "media extension must not be empty",
                "media_extension",
            ));
        }
        if self.lifecycle.archive_prefix.is_empty() || !self.lifecycle.archive_prefix.ends_with('/')
        {
            return Err(Error::config(
                "archive prefix must be a non-empty key prefix ending in '/'",
                "archive_prefix",
            ));
        }

        if let Some(youtube) = &self.platforms.youtube {
            check_url(&youtube.upload_url, "youtube.upload_url")?;
        }
        if let Some(facebook) = &self.platforms.facebook {
            check_url(&facebook.graph_video_url, "facebook.graph_video_url")?;
        }
        if let Some(instagram) = &self.platforms.instagram {
            check_url(&instagram.graph_url, "instagram.graph_url")?;
            for poll in [instagram.short, instagram.long] {
                if poll.interval.is_zero() {
                    return Err(Error::config(
                        "poll interval must be greater than zero",
                        "instagram.poll",
                    ));
                }
            }
        }
        for webhook in &self.notifications.webhooks {
            check_url(&webhook.url, "webhooks")?;
        }

        Ok(())
    }

    /// Slots selected for this run, in declaration order
    ///
    /// An unknown slot filter is a fatal configuration error rather than an
    /// empty run.
    pub fn selected_slots(&self) -> Result<Vec<&SlotConfig>> {
        match &self.slot_filter {
            None => Ok(self.slots.iter().collect()),
            Some(name) => {
                let selected: Vec<&SlotConfig> =
                    self.slots.iter().filter(|s| &s.name == name).collect();
                if selected.is_empty() {
                    let known: Vec<&str> = self.slots.iter().map(|s| s.name.as_str()).collect();
                    return Err(Error::config(
                        format!("unknown slot '{}' (known: {})", name, known.join(", ")),
                        "SLOT_FILTER",
                    ));
                }
                Ok(selected)
            }
        }
    }
}

fn check_url(value: &str, key: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::config(format!("invalid URL '{value}': {e}"), key))
}

fn parse_u64<G>(get: &G, key: &str) -> Result<Option<u64>>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| Error::config(format!("expected a non-negative integer, got '{raw}'"), key))
        })
        .transpose()
}

fn parse_bool<G>(get: &G, key: &str) -> Result<Option<bool>>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::config(format!("expected a boolean, got '{raw}'"), key)),
        })
        .transpose()
}

fn load_slots_file(path: &str) -> Result<Vec<SlotConfig>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("cannot read slots file {path}: {e}"), "SLOTS_FILE"))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::config(format!("invalid slots file {path}: {e}"), "SLOTS_FILE"))
}

/// The four production slots: two short-form, two long-form
pub fn default_slots() -> Vec<SlotConfig> {
    use Destination::{Facebook, Instagram, YouTube};

    vec![
        SlotConfig::new(
            "reel_9am",
            "reels n shorts/9am content/",
            ArtifactKind::Short,
            vec![YouTube, Facebook, Instagram],
        ),
        SlotConfig::new(
            "reel_4pm",
            "reels n shorts/4pm content/",
            ArtifactKind::Short,
            vec![YouTube, Facebook, Instagram],
        ),
        SlotConfig::new(
            "std_9_30am",
            "standard videos/9:30am content/",
            ArtifactKind::Standard,
            vec![YouTube, Facebook],
        ),
        SlotConfig::new(
            "std_4_30pm",
            "standard videos/4:30pm content/",
            ArtifactKind::Standard,
            vec![YouTube, Facebook],
        ),
    ]
}

fn default_true() -> bool {
    true
}

fn default_media_extension() -> String {
    ".mp4".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_archive_prefix() -> String {
    "archived/".to_string()
}

fn default_retention() -> Duration {
    Duration::from_secs(48 * 3600)
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./videos")
}

fn default_youtube_upload_url() -> String {
    YOUTUBE_UPLOAD_URL.to_string()
}

fn default_category_id() -> String {
    "24".to_string()
}

fn default_privacy_status() -> String {
    "public".to_string()
}

fn default_facebook_graph_video_url() -> String {
    FACEBOOK_GRAPH_VIDEO_URL.to_string()
}

fn default_instagram_graph_url() -> String {
    INSTAGRAM_GRAPH_URL.to_string()
}

fn default_share_url_ttl() -> Duration {
    Duration::from_secs(7200)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (as milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
