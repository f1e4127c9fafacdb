//! Request context for component handlers.
//!
//! Every handler receives a [`Context`] borrowed for the duration of the
//! request. The context carries the request ID and a [`CancellationToken`]
//! that is tripped when the caller abandons the request, so long-running
//! handlers can stop early.
//!
//! # Example
//!
//! ```rust
//! use mcpmount_core::protocol::RequestId;
//! use mcpmount_server::{CancellationToken, Context};
//!
//! let id = RequestId::Number(1);
//! let token = CancellationToken::new();
//! let ctx = Context::with_cancellation(&id, token.clone());
//!
//! assert!(!ctx.is_cancelled());
//! token.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use event_listener::Event;
use mcpmount_core::error::McpError;
use mcpmount_core::protocol::RequestId;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    event: Event,
}

/// A cancellation flag shared between a caller and the handler it invoked.
///
/// Clones observe the same flag. Cancelling is idempotent and wakes every
/// task waiting in [`cancelled`](Self::cancelled).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a new, untripped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            self.state.event.notify(usize::MAX);
        }
    }

    /// Wait until cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let listener = self.state.event.listen();
            // Re-check: cancel() may have fired between the load and listen().
            if self.is_cancelled() {
                return;
            }
            listener.await;
        }
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self, operation: &str) -> Result<(), McpError> {
        if self.is_cancelled() {
            Err(McpError::cancelled(operation))
        } else {
            Ok(())
        }
    }
}

/// Request context passed to handlers.
///
/// Borrowed rather than owned, so handlers never need `'static` access to
/// request data. A handler that spawns work can clone the token out with
/// [`cancellation_token`](Self::cancellation_token).
pub struct Context<'a> {
    /// The request ID for this operation.
    pub request_id: &'a RequestId,
    cancel: CancellationToken,
}

impl<'a> Context<'a> {
    /// Create a context with a fresh cancellation token.
    #[must_use]
    pub fn new(request_id: &'a RequestId) -> Self {
        Self::with_cancellation(request_id, CancellationToken::new())
    }

    /// Create a context that observes an existing token.
    #[must_use]
    pub fn with_cancellation(request_id: &'a RequestId, cancel: CancellationToken) -> Self {
        Self { request_id, cancel }
    }

    /// Check if the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Get the cancellation token for this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}
