//! Transport layer for mcpmount.
//!
//! A [`Transport`] moves JSON-RPC [`Message`]s between two peers. Proxy
//! mounts drive a subserver through one, which keeps the subserver behind
//! a real request/response boundary even when it lives in the same
//! process.
//!
//! Only the in-memory transport ships here; network transports are left
//! to the embedding application, which can implement [`Transport`] for
//! whatever carries its messages.
//!
//! [`Message`]: mcpmount_core::protocol::Message

#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use traits::{Transport, TransportMetadata};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::memory::MemoryTransport;
    pub use crate::traits::{Transport, TransportMetadata};
}
