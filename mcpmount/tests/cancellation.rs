//! Dropping or cancelling a request reaches the handler that serves it,
//! in both mount modes.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use common::{Counts, Hooks, add_hanging_tool, hooked_server, wait_for};
use mcpmount::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Notify;

#[tokio::test]
async fn test_dropped_proxy_call_cancels_child_and_session_survives() {
    common::init_tracing();
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    let started = Arc::new(Notify::new());
    let dropped = Arc::new(AtomicBool::new(false));
    add_hanging_tool(&child, &started, &dropped);

    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let caller = {
        let parent = parent.clone();
        tokio::spawn(async move { parent.call_tool("c_hang", json!({})).await })
    };
    started.notified().await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    wait_for(&dropped).await;

    // Same session, no second startup.
    let result = parent.call_tool("c_ping", json!({})).await.unwrap();
    assert_eq!(result.first_text(), Some("pong"));
    assert_eq!(counts.startups(), 1);
    parent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_token_reaches_proxy_child() {
    let counts = Arc::new(Counts::default());
    let child = hooked_server("child", Hooks::new(&counts));
    let started = Arc::new(Notify::new());
    let dropped = Arc::new(AtomicBool::new(false));
    add_hanging_tool(&child, &started, &dropped);

    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let token = CancellationToken::new();
    let id = RequestId::from("outer-1");
    let ctx = Context::with_cancellation(&id, token.clone());
    let call = parent.dispatch(ComponentRequest::call_tool("c_hang", json!({})), &ctx);
    let trip = async {
        started.notified().await;
        token.cancel();
    };
    let (result, ()) = tokio::join!(call, trip);

    assert!(result.unwrap_err().is_cancelled());
    wait_for(&dropped).await;
    parent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dropped_direct_call_drops_handler() {
    let child = Server::new("child");
    let started = Arc::new(Notify::new());
    let dropped = Arc::new(AtomicBool::new(false));
    add_hanging_tool(&child, &started, &dropped);
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        parent.call_tool("c_hang", json!({})),
    )
    .await;
    assert!(outcome.is_err());
    wait_for(&dropped).await;
}

#[tokio::test]
async fn test_direct_handler_observes_token() {
    let child = Server::new("child");
    child.tool(Tool::new("wait"), |_, ctx| {
        let token = ctx.cancellation_token().clone();
        async move {
            token.cancelled().await;
            Ok(ToolOutput::text("stopped early"))
        }
    });
    let parent = Server::new("parent");
    parent.mount("c", &child, MountOptions::default()).unwrap();

    let token = CancellationToken::new();
    let id = RequestId::Number(9);
    let ctx = Context::with_cancellation(&id, token.clone());
    token.cancel();

    let response = parent
        .dispatch(ComponentRequest::call_tool("c_wait", json!({})), &ctx)
        .await
        .unwrap();
    assert_eq!(response.into_tool().unwrap().first_text(), Some("stopped early"));
}
