//! Mock RPC transport for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::torrent_client::{RpcResponse, RpcTransport, TorrentClientError};

/// A recorded POST for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    /// Endpoint the body was posted to.
    pub url: String,
    /// The JSON body.
    pub body: Value,
    /// Session token attached to the request.
    pub session_id: Option<String>,
}

/// Mock implementation of the RpcTransport trait.
///
/// Replies are served in the order they were pushed. Once the queue is
/// empty every request gets `{"result": "success", "arguments": {}}`.
///
/// # Example
///
/// ```rust,ignore
/// let transport = Arc::new(MockTransport::new());
/// transport.push_result("duplicate torrent").await;
///
/// let client = TransmissionClient::with_transport(config, policy, transport.clone());
/// assert!(!client.remove_torrent("abc").await);
///
/// let sent = transport.sent().await;
/// assert_eq!(sent[0].body["method"], "torrent-remove");
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Arc<RwLock<VecDeque<Result<RpcResponse, TorrentClientError>>>>,
    sent: Arc<RwLock<Vec<RecordedPost>>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply.
    pub async fn push_reply(&self, status: u16, session_id: Option<&str>, body: &str) {
        self.replies.write().await.push_back(Ok(RpcResponse {
            status,
            session_id: session_id.map(str::to_string),
            body: body.to_string(),
        }));
    }

    /// Queue a successful reply carrying `arguments`.
    pub async fn push_success(&self, arguments: Value) {
        let body = json!({"result": "success", "arguments": arguments});
        self.push_reply(200, None, &body.to_string()).await;
    }

    /// Queue a 200 reply whose `result` is `result`.
    pub async fn push_result(&self, result: &str) {
        let body = json!({"result": result, "arguments": {}});
        self.push_reply(200, None, &body.to_string()).await;
    }

    /// Queue a 409 reply the way the daemon hands out a session token.
    pub async fn push_conflict(&self, session_id: &str) {
        let body = format!(
            "<h1>409: Conflict</h1><p>Your request had an invalid session-id header.</p>\
             <p><code>X-Transmission-Session-Id: {}</code></p>",
            session_id
        );
        self.push_reply(409, Some(session_id), &body).await;
    }

    /// Queue a transport failure.
    pub async fn push_error(&self, error: TorrentClientError) {
        self.replies.write().await.push_back(Err(error));
    }

    /// All requests posted so far.
    pub async fn sent(&self) -> Vec<RecordedPost> {
        self.sent.read().await.clone()
    }

    /// Clear recorded requests.
    pub async fn clear_recorded(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        session_id: Option<&str>,
    ) -> Result<RpcResponse, TorrentClientError> {
        self.sent.write().await.push(RecordedPost {
            url: url.to_string(),
            body: body.clone(),
            session_id: session_id.map(str::to_string),
        });

        match self.replies.write().await.pop_front() {
            Some(reply) => reply,
            None => Ok(RpcResponse {
                status: 200,
                session_id: None,
                body: json!({"result": "success", "arguments": {}}).to_string(),
            }),
        }
    }
}
