//! Testing utilities and mock implementations.
//!
//! This module provides a mock RPC transport, allowing the Transmission
//! client to be exercised without a running daemon.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediadl_core::testing::MockTransport;
//!
//! let transport = Arc::new(MockTransport::new());
//!
//! // Configure mock replies
//! transport.push_conflict("session-token").await;
//! transport.push_success(json!({"torrents": []})).await;
//! ```

mod mock_transport;

pub use mock_transport::{MockTransport, RecordedPost};
