//! Transmission torrent client implementation.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex_lite::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{Config, TorrentPolicyConfig, TransmissionConfig};

use super::rpc::{check_response, RpcMethod, RpcRequest, RpcResponse};
use super::session::RpcSession;
use super::transport::{HttpTransport, RpcTransport};
use super::{
    TorrentClient, TorrentClientError, TorrentDescriptor, TorrentPriority, TorrentProperties,
};

/// Fields requested when checking a torrent's status.
const PROPERTY_FIELDS: &[&str] = &[
    "name",
    "hashString",
    "percentDone",
    "status",
    "isStalled",
    "errorString",
    "seedRatioLimit",
    "isFinished",
    "uploadRatio",
    "seedIdleLimit",
    "activityDate",
];

/// Transmission client implementation.
pub struct TransmissionClient {
    session: RpcSession,
    config: TransmissionConfig,
    policy: TorrentPolicyConfig,
}

impl TransmissionClient {
    /// Create a new Transmission client talking HTTP to the configured daemon.
    pub fn new(
        config: TransmissionConfig,
        policy: TorrentPolicyConfig,
    ) -> Result<Self, TorrentClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, policy, Arc::new(transport)))
    }

    /// Create a client from the loaded application configuration.
    pub fn from_config(config: &Config) -> Result<Self, TorrentClientError> {
        Self::new(config.transmission.clone(), config.torrent.clone())
    }

    /// Create a client over an existing transport.
    pub fn with_transport(
        config: TransmissionConfig,
        policy: TorrentPolicyConfig,
        transport: Arc<dyn RpcTransport>,
    ) -> Self {
        let url = rpc_url(&config.host, &config.rpc_path);
        Self {
            session: RpcSession::new(transport, url),
            config,
            policy,
        }
    }

    /// The RPC endpoint requests are posted to.
    pub fn rpc_url(&self) -> &str {
        self.session.url()
    }

    /// Issue a request and report whether the daemon answered "success".
    async fn call(&self, request: RpcRequest) -> bool {
        match self.session.issue(&request).await {
            Ok(response) => {
                let success = check_response(&response);
                if !success {
                    debug!(
                        method = request.method.as_str(),
                        result = ?response.result(),
                        "Transmission request was not successful"
                    );
                }
                success
            }
            Err(e) => {
                warn!(
                    method = request.method.as_str(),
                    error = %e,
                    "Transmission request failed"
                );
                false
            }
        }
    }

    /// Build a `torrent-add` request with the pause and download dir policy.
    fn add_request(&self, source_key: &str, source: String) -> RpcRequest {
        let mut request = RpcRequest::new(RpcMethod::TorrentAdd)
            .arg(source_key, source)
            .arg("paused", if self.policy.paused { 1 } else { 0 });

        if let Some(dir) = self.policy.download_dir.as_ref().filter(|d| d.is_absolute()) {
            request = request.arg("download-dir", dir.to_string_lossy().into_owned());
        }

        request
    }

    /// Fetch the daemon's view of a torrent.
    ///
    /// Returns None if the request fails, the daemon reports an error, or no
    /// torrent matches the hash.
    pub async fn torrent_properties(&self, hash: &str) -> Option<TorrentProperties> {
        info!(client = self.name(), hash = %hash, "Checking torrent status");

        let request = RpcRequest::new(RpcMethod::TorrentGet)
            .ids(hash)
            .arg("fields", PROPERTY_FIELDS.to_vec());

        let response = match self.session.issue(&request).await {
            Ok(response) if check_response(&response) => response,
            Ok(response) => {
                warn!(hash = %hash, result = ?response.result(), "Error while fetching torrent status");
                return None;
            }
            Err(e) => {
                warn!(hash = %hash, error = %e, "Error while fetching torrent status");
                return None;
            }
        };

        let Some(torrent) = first_torrent(&response) else {
            warn!(hash = %hash, "Error while fetching torrent status: no such torrent");
            return None;
        };

        match serde_json::from_value(torrent) {
            Ok(properties) => Some(properties),
            Err(e) => {
                warn!(hash = %hash, error = %e, "Unexpected torrent status payload");
                None
            }
        }
    }
}

/// Join host, RPC path and "/rpc", ignoring stray slashes on either side.
fn rpc_url(host: &str, rpc_path: &str) -> String {
    let host = host.trim_end_matches('/');
    let path = rpc_path.trim_matches('/');
    if path.is_empty() {
        format!("{}/rpc", host)
    } else {
        format!("{}/{}/rpc", host, path)
    }
}

/// Pull the session id out of a response body.
fn extract_session_id(text: &str) -> Option<String> {
    let re = Regex::new(r"X-Transmission-Session-Id:\s*(\w+)").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First entry of `arguments.torrents`, if any.
fn first_torrent(response: &RpcResponse) -> Option<Value> {
    match response.arguments()? {
        Value::Object(mut arguments) => match arguments.remove("torrents")? {
            Value::Array(torrents) => torrents.into_iter().next(),
            _ => None,
        },
        _ => None,
    }
}

/// Map a seed ratio to `(seedRatioLimit, seedRatioMode)`.
///
/// Mode 0 defers to the daemon's global setting, 1 stops at the limit,
/// 2 seeds regardless of ratio.
fn ratio_policy(ratio: Option<f64>) -> (Option<f64>, u8) {
    match ratio {
        Some(r) if r == -1.0 => (Some(0.0), 2),
        Some(r) if r > 0.0 => (Some(r), 1),
        // Negatives other than -1 are dropped: mode 0 follows the global limit
        _ => (None, 0),
    }
}

/// Seed idle limit in seconds, or None when no limit is configured.
fn seed_idle_limit(minutes: Option<f64>) -> Option<i64> {
    match minutes {
        Some(m) if m != 0.0 && m != -1.0 => Some((60.0 * m) as i64),
        _ => None,
    }
}

#[async_trait]
impl TorrentClient for TransmissionClient {
    fn name(&self) -> &str {
        "transmission"
    }

    async fn session_token(&self) -> Option<String> {
        self.session.token().await
    }

    fn default_ratio(&self) -> Option<f64> {
        self.policy.seed_ratio
    }

    async fn authenticate(&self) -> Option<String> {
        let body = json!({
            "method": RpcMethod::SessionGet.as_str(),
            "user": self.config.username,
            "password": self.config.password,
        });

        let response = match self.session.handshake(&body).await {
            Ok(response) => response,
            Err(TorrentClientError::Timeout) => {
                warn!(client = self.name(), "Connection timed out");
                return None;
            }
            Err(e) => {
                warn!(client = self.name(), error = %e, "Unable to connect");
                return None;
            }
        };

        let Some(token) =
            extract_session_id(&response.body).or_else(|| response.session_id.clone())
        else {
            warn!(
                client = self.name(),
                status = response.status,
                "Daemon did not issue a session id"
            );
            return None;
        };

        self.session.set_token(token.clone()).await;

        // Validate the token with a regular request
        let validate = RpcRequest::new(RpcMethod::SessionGet);
        if !self.call(validate).await {
            warn!(client = self.name(), "Session id was not accepted");
        }

        Some(token)
    }

    async fn add_torrent_uri(&self, torrent: &TorrentDescriptor) -> bool {
        let Some(url) = torrent.url.clone() else {
            warn!(hash = %torrent.hash, "Torrent has no URI to add");
            return false;
        };

        self.call(self.add_request("filename", url)).await
    }

    async fn add_torrent_file(&self, torrent: &TorrentDescriptor) -> bool {
        let Some(content) = torrent.content.as_ref() else {
            warn!(hash = %torrent.hash, "Torrent has no file content to add");
            return false;
        };

        self.call(self.add_request("metainfo", STANDARD.encode(content)))
            .await
    }

    async fn set_torrent_ratio(&self, torrent: &TorrentDescriptor) -> bool {
        let (limit, mode) = ratio_policy(torrent.ratio);

        let request = RpcRequest::new(RpcMethod::TorrentSet)
            .ids(&torrent.hash)
            .arg("seedRatioLimit", limit)
            .arg("seedRatioMode", mode);

        self.call(request).await
    }

    async fn set_torrent_seed_time(&self, torrent: &TorrentDescriptor) -> bool {
        let Some(limit) = seed_idle_limit(self.policy.seed_time_minutes) else {
            return true;
        };

        let request = RpcRequest::new(RpcMethod::TorrentSet)
            .ids(&torrent.hash)
            .arg("seedIdleLimit", limit)
            .arg("seedIdleMode", 1);

        self.call(request).await
    }

    async fn set_torrent_priority(&self, torrent: &TorrentDescriptor) -> bool {
        let all_files: Vec<Value> = Vec::new();
        let mut request = RpcRequest::new(RpcMethod::TorrentSet).ids(&torrent.hash);

        request = match torrent.priority {
            TorrentPriority::Low => request.arg("priority-low", all_files),
            TorrentPriority::High => {
                let request = request
                    .arg("priority-high", all_files)
                    .arg("queuePosition", 0);
                if self.policy.high_bandwidth {
                    request.arg("bandwidthPriority", 1)
                } else {
                    request
                }
            }
            TorrentPriority::Normal => request.arg("priority-normal", all_files),
        };

        self.call(request).await
    }

    async fn remove_torrent(&self, hash: &str) -> bool {
        let request = RpcRequest::new(RpcMethod::TorrentRemove)
            .ids(hash)
            .arg("delete-local-data", 1);

        self.call(request).await
    }

    async fn move_torrent(&self, hash: &str) -> Option<bool> {
        let location = self
            .policy
            .seed_location
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())?;
        if hash.is_empty() {
            return None;
        }

        let request = RpcRequest::new(RpcMethod::TorrentSetLocation)
            .ids(hash)
            .arg("location", location.to_string_lossy().into_owned())
            .arg("move", "true");

        Some(self.call(request).await)
    }

    async fn torrent_completed(&self, hash: &str) -> Option<bool> {
        self.torrent_properties(hash)
            .await
            .map(|properties| properties.is_completed())
    }

    async fn torrent_seeded(&self, hash: &str) -> Option<bool> {
        self.torrent_properties(hash)
            .await
            .map(|properties| properties.is_seeded())
    }
}
