//! Proxy mounts: session policies, startup/shutdown hooks, and errors
//! crossing the session boundary.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Counts, Hooks, hooked_server};
use futures::future::join_all;
use mcpmount::error::{LifecyclePhase, codes};
use mcpmount::prelude::*;
use mcpmount::server::{InProcessConnector, MountTarget};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_auto_mode_follows_lifespan() {
    let counts = Arc::new(Counts::default());
    let hooked = hooked_server("hooked", Hooks::new(&counts));
    let plain = Server::new("plain");

    let parent = Server::new("parent");
    parent.mount("h", &hooked, MountOptions::default()).unwrap();
    parent.mount("p", &plain, MountOptions::default()).unwrap();
    parent
        .mount("forced", &hooked, MountOptions::new().mode(MountMode::Direct))
        .unwrap();

    let modes: Vec<_> = parent.mounts().iter().map(|m| m.mode()).collect();
    assert_eq!(modes, [MountMode::Proxy, MountMode::Direct, MountMode::Direct]);

    // A direct mount never runs the hooks.
    parent.call_tool("forced_ping", json!({})).await.unwrap();
    assert_eq!(counts.startups(), 0);
}

#[tokio::test]
async fn test_persistent_session_starts_once_under_concurrency() {
    common::init_tracing();
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts).slow(Duration::from_millis(50)));
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let calls = (0..8).map(|_| parent.call_tool("c_ping", json!({})));
    for result in join_all(calls).await {
        assert_eq!(result.unwrap().first_text(), Some("pong"));
    }
    assert_eq!(counts.startups(), 1);
    assert_eq!(counts.shutdowns(), 0);

    parent.shutdown().await.unwrap();
    assert_eq!(counts.shutdowns(), 1);
}

#[tokio::test]
async fn test_per_call_session_runs_hooks_every_call() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    let parent = Server::new("parent");
    parent
        .mount(
            "c",
            &child,
            MountOptions::new().session_policy(SessionPolicy::PerCall),
        )
        .unwrap();

    for _ in 0..3 {
        parent.call_tool("c_ping", json!({})).await.unwrap();
    }
    assert_eq!(counts.startups(), 3);
    assert_eq!(counts.shutdowns(), 3);
}

#[tokio::test]
async fn test_failed_startup_is_retried() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("flaky", Hooks::new(&counts).failing(1));
    let parent = Server::new("parent");
    parent.mount("f", &child, MountOptions::default()).unwrap();

    let err = parent.call_tool("f_ping", json!({})).await.unwrap_err();
    let McpError::Lifecycle(details) = err else {
        panic!("expected a lifecycle error");
    };
    assert_eq!(details.server, "flaky");
    assert_eq!(details.phase, LifecyclePhase::Startup);

    let result = parent.call_tool("f_ping", json!({})).await.unwrap();
    assert_eq!(result.first_text(), Some("pong"));
    assert_eq!(counts.startups(), 2);
    // The failed attempt never started, so it never shuts down.
    parent.shutdown().await.unwrap();
    assert_eq!(counts.shutdowns(), 1);
}

#[tokio::test]
async fn test_unmount_closes_persistent_session() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    parent.call_tool("c_ping", json!({})).await.unwrap();
    let MountTarget::Proxy(link) = parent.mounts()[0].target().clone() else {
        panic!("expected a proxy mount");
    };
    assert!(link.has_session().await);

    assert_eq!(parent.unmount("c").await, 1);
    assert!(!link.has_session().await);
    assert_eq!(counts.shutdowns(), 1);
}

#[tokio::test]
async fn test_errors_cross_the_session_boundary() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    child.tool(Tool::new("boom"), |_, _| async {
        Err(McpError::tool_error("boom", "exploded"))
    });
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let missing = parent.call_tool("c_missing", json!({})).await.unwrap_err();
    assert!(matches!(
        missing,
        McpError::NotFound { kind: ComponentKind::Tool, ref identifier } if identifier == "c_missing"
    ));

    let failed = parent.call_tool("c_boom", json!({})).await.unwrap_err();
    let McpError::SubserverFailure(details) = failed else {
        panic!("expected a subserver failure");
    };
    assert_eq!(details.server, "child");
    assert_eq!(details.code, codes::TOOL_EXECUTION_ERROR);
}

#[tokio::test]
async fn test_listing_goes_through_the_session() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    child.prompt(Prompt::new("greet"), |_, _| async { Ok(GetPromptResult::user("hi")) });
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let tools: Vec<_> = parent
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tools, ["c_ping"]);
    let prompts: Vec<_> = parent
        .list_prompts()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(prompts, ["c_greet"]);
    assert_eq!(counts.startups(), 1);
}

#[tokio::test]
async fn test_import_of_proxy_mount_forwards_through_link() {
    let counts = Arc::new(Counts::default());
    let leaf = hooked_server("leaf", Hooks::new(&counts));
    let middle = Server::new("middle");
    middle.mount("leaf", &leaf, MountOptions::default()).unwrap();

    let root = Server::new("root");
    let summary = root.import_server("m", &middle, ImportOptions::default()).unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(counts.startups(), 0);

    let result = root.call_tool("m_leaf_ping", json!({})).await.unwrap();
    assert_eq!(result.first_text(), Some("pong"));
    assert_eq!(counts.startups(), 1);
    middle.shutdown().await.unwrap();
    assert_eq!(counts.shutdowns(), 1);
}

struct CountingConnector {
    opened: Arc<AtomicUsize>,
    inner: InProcessConnector,
}

#[async_trait]
impl SessionConnector for CountingConnector {
    async fn open_session(&self, server: &Server) -> Result<Arc<dyn Session>, McpError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open_session(server).await
    }
}

#[tokio::test]
async fn test_custom_connector_and_runtime_config() {
    let opened = Arc::new(AtomicUsize::new(0));
    let child = Server::new("child");
    child.tool(Tool::new("ping"), |_, _| async { Ok(ToolOutput::text("pong")) });

    let connector = CountingConnector {
        opened: Arc::clone(&opened),
        inner: InProcessConnector::with_config(RuntimeConfig {
            max_concurrent_requests: 1,
            ..RuntimeConfig::default()
        }),
    };
    let parent = Server::new("parent");
    parent
        .mount(
            "c",
            &child,
            MountOptions::new().mode(MountMode::Proxy).connector(connector),
        )
        .unwrap();

    let calls = (0..4).map(|_| parent.call_tool("c_ping", json!({})));
    assert!(join_all(calls).await.iter().all(Result::is_ok));
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    parent.shutdown().await.unwrap();
}
