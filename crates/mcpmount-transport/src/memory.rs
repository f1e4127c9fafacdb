//! In-memory transport.
//!
//! A pair of `futures` channels wired back to back. Both ends share one
//! connected flag, so closing either end disconnects both.
//!
//! ```rust
//! use mcpmount_transport::{MemoryTransport, Transport};
//!
//! let (client, server) = MemoryTransport::pair();
//! assert_eq!(client.metadata().transport_type, "memory");
//! assert!(server.is_connected());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_lock::Mutex as AsyncMutex;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use mcpmount_core::protocol::Message;
use tracing::trace;

use crate::error::TransportError;
use crate::traits::{Transport, TransportMetadata};

/// Default per-direction buffer.
pub const DEFAULT_CAPACITY: usize = 32;

/// One end of an in-memory transport.
pub struct MemoryTransport {
    sender: mpsc::Sender<Message>,
    receiver: AsyncMutex<mpsc::Receiver<Message>>,
    connected: Arc<AtomicBool>,
    metadata: TransportMetadata,
}

impl MemoryTransport {
    /// Create a connected pair of transports.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a connected pair with a specific per-direction buffer.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        Self::named_pair(capacity, "client", "server")
    }

    /// Create a connected pair whose ends carry the given names in their
    /// metadata.
    #[must_use]
    pub fn named_pair(capacity: usize, first: &str, second: &str) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(capacity);
        let (tx2, rx2) = mpsc::channel(capacity);
        let connected = Arc::new(AtomicBool::new(true));

        let a = Self {
            sender: tx2,
            receiver: AsyncMutex::new(rx1),
            connected: Arc::clone(&connected),
            metadata: TransportMetadata::new("memory")
                .local_addr(first)
                .remote_addr(second),
        };
        let b = Self {
            sender: tx1,
            receiver: AsyncMutex::new(rx2),
            connected,
            metadata: TransportMetadata::new("memory")
                .local_addr(second)
                .remote_addr(first),
        };
        (a, b)
    }
}

impl Transport for MemoryTransport {
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        trace!(method = msg.method().unwrap_or("<response>"), "memory send");

        let mut sender = self.sender.clone();
        sender
            .send(msg)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        let mut receiver = self.receiver.lock().await;
        match receiver.next().await {
            Some(msg) => Ok(Some(msg)),
            None => {
                self.connected.store(false, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        // Closing a clone closes the channel for every sender.
        self.sender.clone().close_channel();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn metadata(&self) -> TransportMetadata {
        self.metadata.clone()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("connected", &self.is_connected())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpmount_core::error::McpError;
    use mcpmount_core::protocol::{Notification, Request, RequestId};

    #[tokio::test]
    async fn test_send_receive() {
        let (client, server) = MemoryTransport::pair();

        client
            .send(Request::new("tools/list", RequestId::Number(1)).into())
            .await
            .unwrap();

        match server.recv().await.unwrap().unwrap() {
            Message::Request(req) => assert_eq!(req.method(), "tools/list"),
            other => panic!("Expected request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bidirectional() {
        let (client, server) = MemoryTransport::pair();

        client.send(Notification::new("client/ping").into()).await.unwrap();
        server.send(Notification::new("server/pong").into()).await.unwrap();

        let from_client = server.recv().await.unwrap().unwrap();
        let from_server = client.recv().await.unwrap().unwrap();
        assert_eq!(from_client.method(), Some("client/ping"));
        assert_eq!(from_server.method(), Some("server/pong"));
    }

    #[tokio::test]
    async fn test_close_ends_peer_recv() {
        let (client, server) = MemoryTransport::pair();

        client.send(Notification::new("last").into()).await.unwrap();
        client.close().await.unwrap();

        assert!(!server.is_connected());
        // Buffered messages are still delivered before end of stream.
        assert_eq!(server.recv().await.unwrap().unwrap().method(), Some("last"));
        assert!(server.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (client, _server) = MemoryTransport::pair();
        client.close().await.unwrap();

        let result = client.send(Notification::new("test").into()).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    async fn send_generic<T: Transport>(transport: &T, msg: Message) -> Result<(), McpError> {
        transport.send(msg).await.map_err(Into::into)
    }

    #[tokio::test]
    async fn test_generic_send_error_is_mcp_error() {
        let (client, _server) = MemoryTransport::pair();
        client.close().await.unwrap();

        let err = send_generic(&client, Notification::new("test").into())
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
    }

    #[test]
    fn test_named_pair_metadata() {
        let (a, b) = MemoryTransport::named_pair(4, "parent", "weather");
        assert_eq!(a.metadata().remote_addr.as_deref(), Some("weather"));
        assert_eq!(b.metadata().remote_addr.as_deref(), Some("parent"));
    }
}
