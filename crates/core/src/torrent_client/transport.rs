//! HTTP transport for the Transmission RPC endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::Value;

use crate::config::TransmissionConfig;

use super::rpc::RpcResponse;
use super::TorrentClientError;

/// Name of the header carrying the session token.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// A single JSON POST to the RPC endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Post `body` to `url`, attaching the session token when given.
    async fn post(
        &self,
        url: &str,
        body: &Value,
        session_id: Option<&str>,
    ) -> Result<RpcResponse, TorrentClientError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    username: String,
    password: String,
}

impl HttpTransport {
    /// Create a transport using the connection settings.
    pub fn new(config: &TransmissionConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .danger_accept_invalid_certs(!config.verify_cert)
            .build()
            .map_err(|e| {
                TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        session_id: Option<&str>,
    ) -> Result<RpcResponse, TorrentClientError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());

        if let Some(session_id) = session_id {
            request = request.header(SESSION_ID_HEADER, session_id);
        }

        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TorrentClientError::Timeout
            } else if e.is_connect() {
                TorrentClientError::ConnectionFailed(e.to_string())
            } else {
                TorrentClientError::ApiError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TorrentClientError::Timeout
            } else {
                TorrentClientError::ApiError(e.to_string())
            }
        })?;

        Ok(RpcResponse {
            status,
            session_id,
            body,
        })
    }
}
