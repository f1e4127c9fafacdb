//! Server side of a session.
//!
//! [`serve`] answers JSON-RPC requests for one [`Server`] over one
//! transport until the peer goes away. It owns the server's lifespan for
//! the length of the session:
//!
//! 1. `initialize` runs the startup hook. If the hook fails the client
//!    gets a lifecycle error and the session ends without a shutdown.
//! 2. Component and list requests are served concurrently, each with its
//!    own cancellation token. `notifications/cancelled` trips the token
//!    and aborts the handler.
//! 3. When the transport closes, outstanding requests are cancelled and
//!    the shutdown hook runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_lock::Semaphore;
use mcpmount_core::capability::{InitializeResult, PROTOCOL_VERSION};
use mcpmount_core::component::{ComponentKind, ComponentMeta, ComponentRequest};
use mcpmount_core::error::{LifecyclePhase, McpError};
use mcpmount_core::protocol::{
    CANCELLED_NOTIFICATION, CancelledParams, INITIALIZED_NOTIFICATION, Message, Notification,
    Request, RequestId, Response,
};
use mcpmount_transport::Transport;
use serde_json::Value;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

use crate::config::RuntimeConfig;
use crate::context::{CancellationToken, Context};
use crate::server::Server;

type InFlight = Arc<Mutex<HashMap<RequestId, (CancellationToken, Option<AbortHandle>)>>>;

fn lock(
    in_flight: &InFlight,
) -> MutexGuard<'_, HashMap<RequestId, (CancellationToken, Option<AbortHandle>)>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serve `server` over `transport` until the peer closes it.
///
/// Returns the shutdown hook's error, if any, or the transport error that
/// ended the session.
pub async fn serve<T: Transport>(
    server: Server,
    transport: T,
    config: RuntimeConfig,
) -> Result<(), McpError> {
    SessionRuntime::new(server, transport, &config).run().await
}

struct SessionRuntime<T> {
    server: Server,
    transport: Arc<T>,
    limit: Arc<Semaphore>,
    in_flight: InFlight,
}

impl<T: Transport> SessionRuntime<T> {
    fn new(server: Server, transport: T, config: &RuntimeConfig) -> Self {
        Self {
            server,
            transport: Arc::new(transport),
            limit: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn run(self) -> Result<(), McpError> {
        let mut started = false;
        let outcome = loop {
            let message = match self.transport.recv().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!(server = self.server.name(), "session closed by client");
                    break Ok(());
                }
                Err(err) => {
                    let err: McpError = err.into();
                    warn!(server = self.server.name(), error = %err, "session transport failed");
                    break Err(err);
                }
            };

            match message {
                Message::Request(request) if request.method() == "initialize" => {
                    if started {
                        let err = McpError::invalid_request("Already initialized");
                        self.respond(Response::error(request.id, (&err).into())).await;
                    } else if self.initialize(request).await.is_ok() {
                        started = true;
                    } else {
                        break Ok(());
                    }
                }
                Message::Request(request) => self.handle_request(request, started).await,
                Message::Notification(notification) => self.handle_notification(&notification),
                Message::Response(response) => {
                    trace!(id = %response.id, "ignoring response sent to a server");
                }
            }
        };

        self.cancel_all();
        let shutdown = if started { self.shutdown().await } else { Ok(()) };
        if let Err(err) = self.transport.close().await {
            trace!(error = %err, "closing server transport");
        }
        outcome.and(shutdown)
    }

    async fn initialize(&self, request: Request) -> Result<(), McpError> {
        let name = self.server.name();
        if let Some(lifespan) = self.server.lifespan() {
            debug!(server = name, "running startup hook");
            if let Err(err) = lifespan.startup(&self.server).await {
                let err = into_lifecycle(name, LifecyclePhase::Startup, err);
                warn!(server = name, error = %err, "startup failed");
                self.respond(Response::error(request.id, (&err).into())).await;
                return Err(err);
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            server_info: self.server.info().clone(),
        };
        let response = match serde_json::to_value(result) {
            Ok(value) => Response::success(request.id, value),
            Err(err) => Response::error(request.id, (&McpError::from(err)).into()),
        };
        self.respond(response).await;
        info!(server = name, "session initialized");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), McpError> {
        let Some(lifespan) = self.server.lifespan() else {
            return Ok(());
        };
        let name = self.server.name();
        debug!(server = name, "running shutdown hook");
        lifespan.shutdown(&self.server).await.map_err(|err| {
            let err = into_lifecycle(name, LifecyclePhase::Shutdown, err);
            warn!(server = name, error = %err, "shutdown failed");
            err
        })
    }

    async fn handle_request(&self, request: Request, started: bool) {
        trace!(server = self.server.name(), method = request.method(), id = %request.id, "request");
        if request.method() == "ping" {
            self.respond(Response::success(request.id, Value::Object(Default::default())))
                .await;
            return;
        }
        if !started {
            let err = McpError::invalid_request("Server not initialized");
            self.respond(Response::error(request.id, (&err).into())).await;
            return;
        }

        let token = CancellationToken::new();
        let duplicate = {
            let mut in_flight = lock(&self.in_flight);
            let duplicate = in_flight.contains_key(&request.id);
            if !duplicate {
                in_flight.insert(request.id.clone(), (token.clone(), None));
            }
            duplicate
        };
        if duplicate {
            let err = McpError::invalid_request(format!("Duplicate request id {}", request.id));
            self.respond(Response::error(request.id, (&err).into())).await;
            return;
        }

        let id = request.id.clone();
        let task = tokio::spawn(serve_request(
            self.server.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.limit),
            Arc::clone(&self.in_flight),
            request,
            token,
        ));
        // The task may already be done and gone from the map.
        if let Some(entry) = lock(&self.in_flight).get_mut(&id) {
            entry.1 = Some(task.abort_handle());
        }
    }

    fn handle_notification(&self, notification: &Notification) {
        match notification.method() {
            CANCELLED_NOTIFICATION => {
                let Some(params) = notification
                    .params
                    .clone()
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok())
                else {
                    warn!(server = self.server.name(), "malformed cancellation");
                    return;
                };
                let entry = lock(&self.in_flight).remove(&params.request_id);
                match entry {
                    Some((token, abort)) => {
                        debug!(
                            server = self.server.name(),
                            id = %params.request_id,
                            reason = params.reason.as_deref().unwrap_or_default(),
                            "request cancelled by client"
                        );
                        token.cancel();
                        if let Some(abort) = abort {
                            abort.abort();
                        }
                    }
                    None => trace!(id = %params.request_id, "cancellation for finished request"),
                }
            }
            INITIALIZED_NOTIFICATION => trace!(server = self.server.name(), "client initialized"),
            other => trace!(method = other, "ignoring notification"),
        }
    }

    fn cancel_all(&self) {
        let entries: Vec<_> = lock(&self.in_flight).drain().collect();
        if !entries.is_empty() {
            debug!(server = self.server.name(), count = entries.len(), "cancelling outstanding requests");
        }
        for (_, (token, abort)) in entries {
            token.cancel();
            if let Some(abort) = abort {
                abort.abort();
            }
        }
    }

    async fn respond(&self, response: Response) {
        if let Err(err) = self.transport.send(response.into()).await {
            warn!(server = self.server.name(), error = %err, "failed to send response");
        }
    }
}

async fn serve_request<T: Transport>(
    server: Server,
    transport: Arc<T>,
    limit: Arc<Semaphore>,
    in_flight: InFlight,
    request: Request,
    token: CancellationToken,
) {
    let _permit = limit.acquire_arc().await;
    let ctx = Context::with_cancellation(&request.id, token.clone());
    let result = route(&server, request.method(), request.params.as_ref(), &ctx).await;
    lock(&in_flight).remove(&request.id);

    if token.is_cancelled() {
        trace!(id = %request.id, "dropping result of cancelled request");
        return;
    }
    let response = match result {
        Ok(value) => Response::success(request.id, value),
        Err(err) => {
            debug!(server = server.name(), method = request.method(), error = %err, "request failed");
            Response::error(request.id, (&err).into())
        }
    };
    if let Err(err) = transport.send(response.into()).await {
        warn!(server = server.name(), error = %err, "failed to send response");
    }
}

async fn route(
    server: &Server,
    method: &str,
    params: Option<&Value>,
    ctx: &Context<'_>,
) -> Result<Value, McpError> {
    if let Some(kind) = ComponentKind::ALL.into_iter().find(|k| k.list_method() == method) {
        let metas = server.list(kind).await?;
        return ComponentMeta::to_list_result(kind, &metas);
    }
    match ComponentRequest::from_request(method, params)? {
        Some(request) => server.dispatch(request, ctx).await?.to_value(),
        None => Err(McpError::method_not_found(method)),
    }
}

fn into_lifecycle(server: &str, phase: LifecyclePhase, err: McpError) -> McpError {
    if err.is_lifecycle() {
        err
    } else {
        let message = err.to_string();
        McpError::lifecycle(server, phase, message, Some(Box::new(err)))
    }
}
