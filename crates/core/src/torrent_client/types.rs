//! Types for torrent client operations.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Torrent status as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    /// Stopped (paused or finished).
    Stopped,
    /// Queued to verify local data.
    CheckWait,
    /// Verifying local data.
    Checking,
    /// Queued to download.
    DownloadWait,
    /// Downloading from peers.
    Downloading,
    /// Queued to seed.
    SeedWait,
    /// Seeding to peers.
    Seeding,
    /// Unknown status code.
    Unknown,
}

impl TorrentStatus {
    /// Map the daemon's integer status code.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TorrentStatus::Stopped,
            1 => TorrentStatus::CheckWait,
            2 => TorrentStatus::Checking,
            3 => TorrentStatus::DownloadWait,
            4 => TorrentStatus::Downloading,
            5 => TorrentStatus::SeedWait,
            6 => TorrentStatus::Seeding,
            _ => TorrentStatus::Unknown,
        }
    }

    /// Returns the string representation for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentStatus::Stopped => "stopped",
            TorrentStatus::CheckWait => "check_wait",
            TorrentStatus::Checking => "checking",
            TorrentStatus::DownloadWait => "download_wait",
            TorrentStatus::Downloading => "downloading",
            TorrentStatus::SeedWait => "seed_wait",
            TorrentStatus::Seeding => "seeding",
            TorrentStatus::Unknown => "unknown",
        }
    }
}

/// Download priority requested for a torrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl TorrentPriority {
    /// Map the -1/0/1 priority used by search results. Anything else is normal.
    pub fn from_level(level: i32) -> Self {
        match level {
            -1 => TorrentPriority::Low,
            1 => TorrentPriority::High,
            _ => TorrentPriority::Normal,
        }
    }
}

/// A torrent handed to a client backend.
#[derive(Debug, Clone, Default)]
pub struct TorrentDescriptor {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Magnet or .torrent URL.
    pub url: Option<String>,
    /// Raw .torrent file bytes.
    pub content: Option<Vec<u8>>,
    /// Desired seed ratio (-1 = unlimited).
    pub ratio: Option<f64>,
    /// Download priority.
    pub priority: TorrentPriority,
}

impl TorrentDescriptor {
    /// Create a descriptor from a magnet URI, taking the hash from its `xt` parameter.
    pub fn magnet(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            hash: extract_hash_from_magnet(&uri).unwrap_or_default(),
            url: Some(uri),
            ..Default::default()
        }
    }

    /// Create a descriptor from .torrent file contents.
    pub fn file(hash: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            hash: hash.into().to_lowercase(),
            content: Some(content),
            ..Default::default()
        }
    }

    /// Set the desired seed ratio.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    /// Set the download priority.
    pub fn with_priority(mut self, priority: TorrentPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Properties reported by the daemon for a single torrent.
///
/// Every field tolerates absence or an unexpected type (e.g. a null
/// `errorString`) so one odd field never hides the status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentProperties {
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub hash_string: String,
    /// Download progress (0.0 - 1.0).
    #[serde(deserialize_with = "lenient")]
    pub percent_done: f64,
    /// Raw status code, see [`TorrentStatus::from_code`].
    #[serde(deserialize_with = "lenient")]
    pub status: i64,
    #[serde(deserialize_with = "lenient")]
    pub is_stalled: bool,
    #[serde(deserialize_with = "lenient")]
    pub error_string: String,
    #[serde(deserialize_with = "lenient")]
    pub seed_ratio_limit: f64,
    #[serde(deserialize_with = "lenient")]
    pub is_finished: bool,
    #[serde(deserialize_with = "lenient")]
    pub upload_ratio: f64,
    /// Idle seeding limit in minutes.
    #[serde(deserialize_with = "lenient")]
    pub seed_idle_limit: i64,
    /// Unix timestamp of last activity.
    #[serde(deserialize_with = "lenient")]
    pub activity_date: i64,
}

impl TorrentProperties {
    pub fn state(&self) -> TorrentStatus {
        TorrentStatus::from_code(self.status)
    }

    /// Last activity, if the daemon reported one.
    pub fn activity_at(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.activity_date)
    }

    /// Stopped after reaching its seeding goal.
    pub fn is_seeded(&self) -> bool {
        self.status == 0 && self.is_finished
    }

    /// Finished downloading: seeding, or done seeding.
    pub fn is_completed(&self) -> bool {
        self.status == 6 || self.is_seeded()
    }
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Session token currently cached, if any.
    async fn session_token(&self) -> Option<String>;

    /// Obtain and cache a session token.
    async fn authenticate(&self) -> Option<String>;

    /// Add a torrent by magnet or URL.
    async fn add_torrent_uri(&self, torrent: &TorrentDescriptor) -> bool;

    /// Add a torrent by uploading its .torrent file.
    async fn add_torrent_file(&self, torrent: &TorrentDescriptor) -> bool;

    /// Apply the torrent's seed ratio policy.
    async fn set_torrent_ratio(&self, torrent: &TorrentDescriptor) -> bool;

    /// Apply the configured seed idle time.
    async fn set_torrent_seed_time(&self, torrent: &TorrentDescriptor) -> bool;

    /// Apply the torrent's download priority.
    async fn set_torrent_priority(&self, torrent: &TorrentDescriptor) -> bool;

    /// Remove a torrent and its local data.
    async fn remove_torrent(&self, hash: &str) -> bool;

    /// Move a torrent to the seed location.
    /// None if there was nothing to do.
    async fn move_torrent(&self, hash: &str) -> Option<bool>;

    /// Whether the torrent finished downloading.
    /// None if its status could not be fetched.
    async fn torrent_completed(&self, hash: &str) -> Option<bool>;

    /// Whether the torrent finished seeding.
    /// None if its status could not be fetched.
    async fn torrent_seeded(&self, hash: &str) -> Option<bool>;

    /// Default seed ratio applied when a torrent carries none.
    fn default_ratio(&self) -> Option<f64> {
        None
    }

    /// Add a torrent and apply its seeding policy.
    ///
    /// Policy failures are logged but do not fail the add.
    async fn send_torrent(&self, torrent: &TorrentDescriptor) -> bool {
        if self.session_token().await.is_none() && self.authenticate().await.is_none() {
            warn!(client = self.name(), "Unable to authenticate");
            return false;
        }

        let added = if torrent.content.is_some() {
            self.add_torrent_file(torrent).await
        } else {
            self.add_torrent_uri(torrent).await
        };

        if !added {
            warn!(client = self.name(), hash = %torrent.hash, "Unable to send torrent");
            return false;
        }

        let with_default;
        let torrent = match (torrent.ratio, self.default_ratio()) {
            (None, Some(ratio)) => {
                with_default = torrent.clone().with_ratio(ratio);
                &with_default
            }
            _ => torrent,
        };

        if !self.set_torrent_ratio(torrent).await {
            warn!(client = self.name(), hash = %torrent.hash, "Unable to set seed ratio");
        }
        if !self.set_torrent_seed_time(torrent).await {
            warn!(client = self.name(), hash = %torrent.hash, "Unable to set seed time");
        }
        if !self.set_torrent_priority(torrent).await {
            warn!(client = self.name(), hash = %torrent.hash, "Unable to set priority");
        }

        true
    }

    /// Authenticate and report why it failed.
    async fn test_authentication(&self) -> Result<(), TorrentClientError> {
        match self.authenticate().await {
            Some(_) => Ok(()),
            None => Err(TorrentClientError::AuthenticationFailed(format!(
                "Unable to authenticate with {}",
                self.name()
            ))),
        }
    }
}

/// Extract info hash from a magnet URI.
pub fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;

    query
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .map(|hash| hash.to_lowercase())
}

/// Deserialize a field, falling back to its default on null or a type mismatch.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Convert Unix timestamp to DateTime<Utc>.
fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_torrent_status_from_code() {
        assert_eq!(TorrentStatus::from_code(0), TorrentStatus::Stopped);
        assert_eq!(TorrentStatus::from_code(2), TorrentStatus::Checking);
        assert_eq!(TorrentStatus::from_code(4), TorrentStatus::Downloading);
        assert_eq!(TorrentStatus::from_code(6), TorrentStatus::Seeding);
        assert_eq!(TorrentStatus::from_code(42), TorrentStatus::Unknown);
        assert_eq!(TorrentStatus::from_code(-1), TorrentStatus::Unknown);
    }

    #[test]
    fn test_torrent_status_as_str() {
        assert_eq!(TorrentStatus::Stopped.as_str(), "stopped");
        assert_eq!(TorrentStatus::SeedWait.as_str(), "seed_wait");
        assert_eq!(TorrentStatus::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_priority_from_level() {
        assert_eq!(TorrentPriority::from_level(-1), TorrentPriority::Low);
        assert_eq!(TorrentPriority::from_level(0), TorrentPriority::Normal);
        assert_eq!(TorrentPriority::from_level(1), TorrentPriority::High);
        assert_eq!(TorrentPriority::from_level(7), TorrentPriority::Normal);
    }

    #[test]
    fn test_extract_hash_from_magnet() {
        let magnet = "magnet:?xt=urn:btih:abc123def456&dn=Test";
        assert_eq!(extract_hash_from_magnet(magnet), Some("abc123def456".to_string()));

        let magnet_upper = "magnet:?dn=Test&xt=urn:btih:ABC123DEF456";
        assert_eq!(extract_hash_from_magnet(magnet_upper), Some("abc123def456".to_string()));

        assert_eq!(extract_hash_from_magnet("not a magnet"), None);
        assert_eq!(extract_hash_from_magnet("magnet:?dn=Test"), None);
    }

    #[test]
    fn test_descriptor_magnet_builder() {
        let torrent = TorrentDescriptor::magnet("magnet:?xt=urn:btih:ABCDEF")
            .with_ratio(2.5)
            .with_priority(TorrentPriority::High);

        assert_eq!(torrent.hash, "abcdef");
        assert_eq!(torrent.url.as_deref(), Some("magnet:?xt=urn:btih:ABCDEF"));
        assert_eq!(torrent.ratio, Some(2.5));
        assert_eq!(torrent.priority, TorrentPriority::High);
        assert!(torrent.content.is_none());
    }

    #[test]
    fn test_descriptor_file_builder() {
        let torrent = TorrentDescriptor::file("ABC", vec![1, 2, 3]);
        assert_eq!(torrent.hash, "abc");
        assert!(torrent.url.is_none());
        assert_eq!(torrent.priority, TorrentPriority::Normal);
        assert!(torrent.ratio.is_none());
    }

    #[test]
    fn test_properties_partial_reply_parses() {
        let json = r#"{"hashString": "abc", "status": 4, "percentDone": 0.25}"#;
        let props: TorrentProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.hash_string, "abc");
        assert_eq!(props.state(), TorrentStatus::Downloading);
        assert!((props.percent_done - 0.25).abs() < 0.001);
        assert!(!props.is_finished);
        assert!(props.name.is_empty());
    }

    #[test]
    fn test_properties_null_fields_fall_back() {
        let json = r#"{"status": 0, "isFinished": true, "errorString": null, "seedRatioLimit": "2"}"#;
        let props: TorrentProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.state(), TorrentStatus::Stopped);
        assert!(props.is_finished);
        assert!(props.error_string.is_empty());
        assert_eq!(props.seed_ratio_limit, 0.0);
        assert!(props.is_completed());
    }

    #[test]
    fn test_properties_completion_truth_table() {
        for status in 0..=7 {
            for finished in [false, true] {
                let props = TorrentProperties {
                    status,
                    is_finished: finished,
                    ..Default::default()
                };
                let expected = status == 6 || (status == 0 && finished);
                assert_eq!(props.is_completed(), expected, "status={status} finished={finished}");
                assert_eq!(props.is_seeded(), status == 0 && finished);
            }
        }
    }

    #[test]
    fn test_properties_activity_at() {
        let props = TorrentProperties {
            activity_date: 1703980800,
            ..Default::default()
        };
        assert_eq!(props.activity_at().unwrap().year(), 2023);

        let idle = TorrentProperties::default();
        assert!(idle.activity_at().is_none());
    }
}
