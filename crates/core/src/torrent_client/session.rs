//! Request executor holding the daemon session token.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::rpc::{RpcRequest, RpcResponse};
use super::transport::RpcTransport;
use super::TorrentClientError;

/// HTTP status the daemon uses to hand out a fresh session token.
const SESSION_CONFLICT: u16 = 409;

/// Posts requests to one RPC endpoint with the cached session token.
pub struct RpcSession {
    transport: Arc<dyn RpcTransport>,
    url: String,
    token: RwLock<Option<String>>,
}

impl RpcSession {
    pub fn new(transport: Arc<dyn RpcTransport>, url: String) -> Self {
        Self {
            transport,
            url,
            token: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Currently cached token.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replace the cached token.
    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    /// Post a body without token or retry; the status is not checked.
    pub async fn handshake(&self, body: &Value) -> Result<RpcResponse, TorrentClientError> {
        self.transport.post(&self.url, body, None).await
    }

    /// Post a request, retrying once if the daemon rotated the token.
    pub async fn issue(&self, request: &RpcRequest) -> Result<RpcResponse, TorrentClientError> {
        let body = request.to_json();
        let token = self.token().await;

        let mut response = self.transport.post(&self.url, &body, token.as_deref()).await?;

        if response.status == SESSION_CONFLICT {
            let Some(fresh) = response.session_id.clone() else {
                return Err(TorrentClientError::AuthenticationFailed(
                    "Daemon rejected the session without issuing a new one".to_string(),
                ));
            };
            warn!("Transmission session expired, retrying with new session id");
            self.set_token(fresh.clone()).await;

            response = self.transport.post(&self.url, &body, Some(&fresh)).await?;
            if response.status == SESSION_CONFLICT {
                return Err(TorrentClientError::AuthenticationFailed(
                    "Session id rejected twice".to_string(),
                ));
            }
        }

        debug!(
            method = request.method.as_str(),
            status = response.status,
            "Transmission RPC round trip"
        );

        match response.status {
            200..=299 => Ok(response),
            401 => Err(TorrentClientError::AuthenticationFailed(
                "Invalid username or password".to_string(),
            )),
            status => Err(TorrentClientError::ApiError(format!("HTTP {}", status))),
        }
    }
}
