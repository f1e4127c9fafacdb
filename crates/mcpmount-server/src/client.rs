//! Client side of a proxy session.
//!
//! [`ClientSession`] owns one [`Transport`] to a server runtime. A router
//! task moves outgoing messages onto the transport and hands each incoming
//! response to the request waiting for it. A request that is abandoned,
//! because its caller dropped it, cancelled it, or ran out of time, sends
//! `notifications/cancelled` so the server stops working on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::{mpsc, oneshot};
use mcpmount_core::capability::{ClientInfo, InitializeResult, PROTOCOL_VERSION, ServerInfo};
use mcpmount_core::component::{ComponentKind, ComponentMeta, ComponentRequest, ComponentResponse};
use mcpmount_core::error::{McpError, TransportErrorKind};
use mcpmount_core::protocol::{
    INITIALIZED_NOTIFICATION, Message, Notification, Request, RequestId, Response,
};
use mcpmount_transport::Transport;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::context::CancellationToken;
use crate::session::Session;

type Pending = Arc<Mutex<HashMap<RequestId, oneshot::Sender<Response>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashMap<RequestId, oneshot::Sender<Response>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An initialized client connection to one server.
pub struct ClientSession {
    server_name: String,
    server_info: ServerInfo,
    next_id: AtomicU64,
    pending: Pending,
    outgoing: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
    timeout: Option<Duration>,
    router: async_lock::Mutex<Option<JoinHandle<()>>>,
}

impl ClientSession {
    /// Run the `initialize` handshake over `transport`.
    ///
    /// `server_name` labels errors decoded from this session. A server
    /// whose startup hook fails answers `initialize` with a lifecycle
    /// error, which is returned here.
    pub async fn connect<T: Transport>(
        transport: T,
        server_name: &str,
        config: &RuntimeConfig,
    ) -> Result<Self, McpError> {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let open = Arc::new(AtomicBool::new(true));
        let (outgoing, outgoing_rx) = mpsc::unbounded();
        let router = spawn_router(transport, Arc::clone(&pending), Arc::clone(&open), outgoing_rx);

        let mut session = Self {
            server_name: server_name.to_owned(),
            server_info: ServerInfo::new(server_name, ""),
            next_id: AtomicU64::new(1),
            pending,
            outgoing,
            open,
            timeout: config.request_timeout(),
            router: async_lock::Mutex::new(Some(router)),
        };

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": ClientInfo::new(&config.client_name, env!("CARGO_PKG_VERSION")),
        });
        let handshake = session
            .request("initialize", Some(params), &CancellationToken::new())
            .await
            .and_then(|value| Ok(serde_json::from_value::<InitializeResult>(value)?));
        let init = match handshake {
            Ok(init) => init,
            Err(err) => {
                session.shutdown().await;
                return Err(err);
            }
        };

        if init.protocol_version != PROTOCOL_VERSION {
            warn!(
                server = server_name,
                version = %init.protocol_version,
                "server answered with a different protocol version"
            );
        }
        session.server_info = init.server_info;
        session.notify(Notification::new(INITIALIZED_NOTIFICATION));
        debug!(server = server_name, "client session initialized");
        Ok(session)
    }

    /// Identity the server reported during `initialize`.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Whether requests can still be sent.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.outgoing.is_closed()
    }

    /// Stop sending. The router closes the transport once it has flushed
    /// what was already queued.
    pub fn disconnect(&self) {
        self.outgoing.close_channel();
    }

    async fn shutdown(&self) {
        self.disconnect();
        let router = self.router.lock().await.take();
        if let Some(router) = router {
            if let Err(err) = router.await {
                warn!(server = %self.server_name, error = %err, "client router panicked");
            }
        }
    }

    fn notify(&self, notification: Notification) {
        if self.outgoing.unbounded_send(notification.into()).is_err() {
            trace!(server = %self.server_name, "notification dropped on closed session");
        }
    }

    fn closed(&self) -> McpError {
        McpError::transport(
            TransportErrorKind::ConnectionClosed,
            format!("session to '{}' is closed", self.server_name),
        )
    }

    /// Send a request and wait for its result.
    async fn request(
        &self,
        method: &'static str,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, McpError> {
        if !self.is_open() {
            return Err(self.closed());
        }

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), tx);
        let mut in_flight = InFlight {
            id: &id,
            pending: &self.pending,
            outgoing: &self.outgoing,
            armed: true,
        };

        let mut request = Request::new(method, id.clone());
        if let Some(params) = params {
            request = request.params(params);
        }
        trace!(server = %self.server_name, %id, method, "sending request");
        if self.outgoing.unbounded_send(request.into()).is_err() {
            return Err(self.closed());
        }

        let waited = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, rx)
                    .await
                    .map_err(|_| McpError::timeout(method, limit))?,
                None => rx.await,
            }
            .map_err(|_| self.closed())
        };
        let response = tokio::select! {
            response = waited => response?,
            () = cancel.cancelled() => return Err(McpError::cancelled(method)),
        };
        in_flight.armed = false;

        response
            .into_result()
            .map_err(|err| McpError::from_jsonrpc(&self.server_name, err))
    }

    /// Send a component request.
    pub async fn call(
        &self,
        request: ComponentRequest,
        cancel: &CancellationToken,
    ) -> Result<ComponentResponse, McpError> {
        let value = self
            .request(request.method(), Some(request.to_params()?), cancel)
            .await?;
        ComponentResponse::from_value(&request, value)
    }

    /// List the server's components of `kind`.
    pub async fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentMeta>, McpError> {
        let value = self
            .request(kind.list_method(), None, &CancellationToken::new())
            .await?;
        ComponentMeta::from_list_result(kind, value)
    }

    /// Round-trip a `ping`.
    pub async fn ping(&self) -> Result<(), McpError> {
        self.request("ping", None, &CancellationToken::new())
            .await
            .map(drop)
    }
}

#[async_trait]
impl Session for ClientSession {
    async fn call(
        &self,
        request: ComponentRequest,
        cancel: &CancellationToken,
    ) -> Result<ComponentResponse, McpError> {
        ClientSession::call(self, request, cancel).await
    }

    async fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentMeta>, McpError> {
        ClientSession::list(self, kind).await
    }

    async fn ping(&self) -> Result<(), McpError> {
        ClientSession::ping(self).await
    }

    async fn close(&self) -> Result<(), McpError> {
        self.shutdown().await;
        Ok(())
    }

    fn is_open(&self) -> bool {
        ClientSession::is_open(self)
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("server", &self.server_name)
            .field("open", &self.is_open())
            .field("pending", &lock(&self.pending).len())
            .finish_non_exhaustive()
    }
}

/// Drop guard for an outstanding request. Unless disarmed it forgets the
/// pending entry and tells the server to cancel.
struct InFlight<'a> {
    id: &'a RequestId,
    pending: &'a Pending,
    outgoing: &'a mpsc::UnboundedSender<Message>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        lock(self.pending).remove(self.id);
        debug!(id = %self.id, "request abandoned, sending cancellation");
        let note = Notification::cancelled(self.id, Some("request abandoned by caller"));
        // A closed session has nothing left to cancel.
        let _ = self.outgoing.unbounded_send(note.into());
    }
}

fn spawn_router<T: Transport>(
    transport: T,
    pending: Pending,
    open: Arc<AtomicBool>,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                message = outgoing.next() => {
                    let Some(message) = message else {
                        trace!("client outbox closed");
                        break;
                    };
                    if let Err(err) = transport.send(message).await {
                        warn!(error = %err, "client failed to send");
                        break;
                    }
                }
                incoming = transport.recv() => match incoming {
                    Ok(Some(Message::Response(response))) => route_response(response, &pending),
                    Ok(Some(other)) => {
                        trace!(method = other.method().unwrap_or_default(), "ignoring server message");
                    }
                    Ok(None) => {
                        debug!("server closed the session");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "client failed to receive");
                        break;
                    }
                },
            }
        }

        open.store(false, Ordering::SeqCst);
        if let Err(err) = transport.close().await {
            trace!(error = %err, "closing client transport");
        }
        // Dropping the senders fails every request still waiting.
        lock(&pending).clear();
    })
}

fn route_response(response: Response, pending: &Pending) {
    let waiter = lock(pending).remove(&response.id);
    match waiter {
        Some(waiter) => {
            if waiter.send(response).is_err() {
                trace!("response arrived after its request was dropped");
            }
        }
        None => trace!(id = %response.id, "response for unknown or abandoned request"),
    }
}
