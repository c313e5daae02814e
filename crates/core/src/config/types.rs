use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub transmission: TransmissionConfig,
    #[serde(default)]
    pub torrent: TorrentPolicyConfig,
}

/// Transmission daemon connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransmissionConfig {
    /// Daemon base URL (e.g., "http://localhost:9091")
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// RPC base path, joined with the host and "/rpc"
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,
    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Verify the daemon's TLS certificate
    #[serde(default = "default_verify_cert")]
    pub verify_cert: bool,
}

impl TransmissionConfig {
    /// Connection settings with defaults for everything but the host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: String::new(),
            password: String::new(),
            rpc_path: default_rpc_path(),
            timeout_secs: default_timeout(),
            verify_cert: default_verify_cert(),
        }
    }
}

fn default_rpc_path() -> String {
    "transmission".to_string()
}

fn default_timeout() -> u32 {
    120
}

fn default_verify_cert() -> bool {
    true
}

/// Seeding and placement policy applied to torrents handed to the daemon
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TorrentPolicyConfig {
    /// Add torrents in the paused state
    #[serde(default)]
    pub paused: bool,
    /// Download directory; only sent to the daemon when absolute
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Ratio used when a torrent carries none (-1 = unlimited)
    #[serde(default)]
    pub seed_ratio: Option<f64>,
    /// Seed idle time in minutes (-1 = unlimited)
    #[serde(default)]
    pub seed_time_minutes: Option<f64>,
    /// Raise bandwidth priority for high priority torrents
    #[serde(default)]
    pub high_bandwidth: bool,
    /// Where finished torrents are moved for seeding
    #[serde(default)]
    pub seed_location: Option<PathBuf>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub transmission: SanitizedTransmissionConfig,
    pub torrent: TorrentPolicyConfig,
}

/// Sanitized connection config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTransmissionConfig {
    pub host: String,
    pub username: String,
    pub password_configured: bool,
    pub rpc_path: String,
    pub timeout_secs: u32,
    pub verify_cert: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let t = &config.transmission;
        Self {
            transmission: SanitizedTransmissionConfig {
                host: t.host.clone(),
                username: t.username.clone(),
                password_configured: !t.password.is_empty(),
                rpc_path: t.rpc_path.clone(),
                timeout_secs: t.timeout_secs,
                verify_cert: t.verify_cert,
            },
            torrent: config.torrent.clone(),
        }
    }
}
