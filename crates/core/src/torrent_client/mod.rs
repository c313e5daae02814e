//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait for handing torrents to a
//! download client, and the Transmission RPC backend implementing it.

mod rpc;
mod session;
mod transmission;
mod transport;
mod types;

pub use rpc::{check_response, RpcMethod, RpcRequest, RpcResponse};
pub use session::RpcSession;
pub use transmission::TransmissionClient;
pub use transport::{HttpTransport, RpcTransport, SESSION_ID_HEADER};
pub use types::*;
