//! The `Transport` trait.

use std::future::Future;

use mcpmount_core::error::McpError;
use mcpmount_core::protocol::Message;

/// A bidirectional message channel between two JSON-RPC peers.
///
/// Futures returned by a transport are `Send` so session runtimes can drive
/// them from spawned tasks.
pub trait Transport: Send + Sync + 'static {
    /// The error type for this transport. Session runtimes report it as an
    /// [`McpError`].
    type Error: std::error::Error + Into<McpError> + Send + Sync + 'static;

    /// Send a message to the peer.
    fn send(&self, msg: Message) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next message. `Ok(None)` means the peer closed cleanly.
    fn recv(&self) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send;

    /// Close the transport. The peer's `recv` returns `Ok(None)` once it
    /// has drained what was already sent.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether the transport is still usable.
    fn is_connected(&self) -> bool;

    /// Descriptive information about this end of the transport.
    fn metadata(&self) -> TransportMetadata;
}

/// Descriptive information about a transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMetadata {
    /// Transport type, e.g. `"memory"`.
    pub transport_type: String,
    /// Name of this end.
    pub local_addr: Option<String>,
    /// Name of the other end.
    pub remote_addr: Option<String>,
}

impl TransportMetadata {
    /// Metadata for a transport of the given type.
    #[must_use]
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: transport_type.into(),
            local_addr: None,
            remote_addr: None,
        }
    }

    /// Set the local address.
    #[must_use]
    pub fn local_addr(mut self, addr: impl Into<String>) -> Self {
        self.local_addr = Some(addr.into());
        self
    }

    /// Set the remote address.
    #[must_use]
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}
