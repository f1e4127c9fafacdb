//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mcpmount::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once. `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How often each lifespan hook ran.
#[derive(Debug, Default)]
pub struct Counts {
    pub startups: AtomicUsize,
    pub shutdowns: AtomicUsize,
    failures_left: AtomicUsize,
}

impl Counts {
    pub fn startups(&self) -> usize {
        self.startups.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

/// A lifespan that counts its hooks, optionally failing the first few
/// startups and sleeping inside startup.
pub struct Hooks {
    counts: Arc<Counts>,
    delay: Duration,
}

impl Hooks {
    pub fn new(counts: &Arc<Counts>) -> Self {
        Self {
            counts: Arc::clone(counts),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(self, times: usize) -> Self {
        self.counts.failures_left.store(times, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl Lifespan for Hooks {
    async fn startup(&self, server: &Server) -> Result<(), McpError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.counts.startups.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .counts
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(McpError::startup_failed(server.name(), "backend not ready"));
        }
        Ok(())
    }

    async fn shutdown(&self, _server: &Server) -> Result<(), McpError> {
        self.counts.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A server with a `ping` tool and counting hooks.
pub fn hooked_server(name: &str, hooks: Hooks) -> Server {
    let server = Server::builder(name).lifespan(hooks).build();
    server.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });
    server
}

/// Flag set when dropped, to observe a handler future going away.
pub struct SetOnDrop(pub Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Register a `hang` tool that signals `started`, then never finishes.
/// `dropped` is set once the handler future is dropped.
pub fn add_hanging_tool(server: &Server, started: &Arc<tokio::sync::Notify>, dropped: &Arc<AtomicBool>) {
    let (started, dropped) = (Arc::clone(started), Arc::clone(dropped));
    server.tool(Tool::new("hang"), move |_, _| {
        let guard = SetOnDrop(Arc::clone(&dropped));
        let started = Arc::clone(&started);
        async move {
            let _guard = guard;
            started.notify_one();
            std::future::pending::<()>().await;
            Ok(ToolOutput::text("unreachable"))
        }
    });
}

/// Wait until `flag` is set, failing the test after a second.
pub async fn wait_for(flag: &AtomicBool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !flag.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("flag was never set");
}
