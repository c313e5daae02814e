//! Transmission RPC request and response envelopes.

use serde::Serialize;
use serde_json::{Map, Value};

/// RPC verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RpcMethod {
    SessionGet,
    TorrentAdd,
    TorrentSet,
    TorrentRemove,
    TorrentSetLocation,
    TorrentGet,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::SessionGet => "session-get",
            RpcMethod::TorrentAdd => "torrent-add",
            RpcMethod::TorrentSet => "torrent-set",
            RpcMethod::TorrentRemove => "torrent-remove",
            RpcMethod::TorrentSetLocation => "torrent-set-location",
            RpcMethod::TorrentGet => "torrent-get",
        }
    }
}

/// A request body: `{"method": ..., "arguments": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub method: RpcMethod,
    pub arguments: Map<String, Value>,
}

impl RpcRequest {
    pub fn new(method: RpcMethod) -> Self {
        Self {
            method,
            arguments: Map::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    /// Target the given torrent hashes.
    pub fn ids(self, hash: &str) -> Self {
        self.arg("ids", vec![Value::from(hash)])
    }

    pub fn to_json(&self) -> Value {
        // RpcMethod and Map always serialize
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A daemon reply.
///
/// The body is kept as text; nothing here assumes it is valid JSON.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    pub status: u16,
    pub session_id: Option<String>,
    pub body: String,
}

impl RpcResponse {
    fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The top-level `result` string, if the body has one.
    pub fn result(&self) -> Option<String> {
        self.json()?
            .get("result")?
            .as_str()
            .map(str::to_string)
    }

    /// The top-level `arguments` object, if the body has one.
    pub fn arguments(&self) -> Option<Value> {
        match self.json()? {
            Value::Object(mut map) => map.remove("arguments"),
            _ => None,
        }
    }
}

/// True iff the body is JSON with `result == "success"`.
pub fn check_response(response: &RpcResponse) -> bool {
    response.result().as_deref() == Some("success")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: &str) -> RpcResponse {
        RpcResponse {
            status: 200,
            session_id: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_method_serializes_as_verb() {
        for method in [
            RpcMethod::SessionGet,
            RpcMethod::TorrentAdd,
            RpcMethod::TorrentSet,
            RpcMethod::TorrentRemove,
            RpcMethod::TorrentSetLocation,
            RpcMethod::TorrentGet,
        ] {
            assert_eq!(serde_json::to_value(method).unwrap(), json!(method.as_str()));
        }
    }

    #[test]
    fn test_request_envelope() {
        let request = RpcRequest::new(RpcMethod::TorrentRemove)
            .ids("abc")
            .arg("delete-local-data", 1);
        assert_eq!(
            request.to_json(),
            json!({
                "method": "torrent-remove",
                "arguments": {"ids": ["abc"], "delete-local-data": 1}
            })
        );
    }

    #[test]
    fn test_empty_arguments_still_present() {
        let request = RpcRequest::new(RpcMethod::SessionGet);
        assert_eq!(request.to_json(), json!({"method": "session-get", "arguments": {}}));
    }

    #[test]
    fn test_check_response_success() {
        assert!(check_response(&response(r#"{"result": "success", "arguments": {}}"#)));
        assert!(check_response(&response(r#"{"result": "success"}"#)));
    }

    #[test]
    fn test_check_response_other_result() {
        assert!(!check_response(&response(r#"{"result": "duplicate torrent"}"#)));
        assert!(!check_response(&response(r#"{"result": "invalid or corrupt torrent file"}"#)));
        assert!(!check_response(&response(r#"{"result": 1}"#)));
        assert!(!check_response(&response(r#"{"arguments": {}}"#)));
    }

    #[test]
    fn test_check_response_not_json() {
        assert!(!check_response(&response("")));
        assert!(!check_response(&response("<h1>409: Conflict</h1>")));
        assert!(!check_response(&response("[1, 2, 3]")));
        assert!(!check_response(&response("\"success\"")));
    }

    #[test]
    fn test_arguments_tolerates_garbage() {
        assert!(response("not json").arguments().is_none());
        assert!(response("[]").arguments().is_none());
        assert_eq!(
            response(r#"{"result": "success", "arguments": {"torrents": []}}"#).arguments(),
            Some(json!({"torrents": []}))
        );
    }
}
