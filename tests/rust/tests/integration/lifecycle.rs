//! Connection lifecycle: partial failure, total failure, close semantics,
//! scoped acquisition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use multimcp_client::{
    ClientError, Connect, MultiServerClient, RoutingError, ServerConfig, ServerSession,
    SessionError, TransportConnector,
};
use multimcp_core::TransportConfig;
use tests::mocks::{fixture_config, start_fixture, unreachable_transport, Fixture};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(flavor = "multi_thread")]
async fn partial_failure_keeps_live_servers_and_closes_cleanly() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let beta = start_fixture(Fixture::new("beta").with_tools(&["t2"])).await;

    let mut config = fixture_config(&[("alpha", &alpha)]);
    config
        .push(ServerConfig {
            name: "broken".to_string(),
            transport: unreachable_transport(),
        })
        .unwrap();
    config
        .push(ServerConfig {
            name: "beta".to_string(),
            transport: TransportConfig::Http {
                url: beta.url.clone(),
                headers: Default::default(),
            },
        })
        .unwrap();

    let client = MultiServerClient::builder(config)
        .with_connect_timeout(CONNECT_TIMEOUT)
        .connect()
        .await
        .expect("open should tolerate one failing server");

    // The failed server is absent from connectivity and from all listings.
    assert_eq!(client.connected_servers(), vec!["alpha", "beta"]);
    let failed = client.failed_servers();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "broken");
    assert!(!client.is_connected("broken"));

    let owners: Vec<String> = client.list_tools().into_iter().map(|t| t.server).collect();
    assert_eq!(owners, vec!["alpha", "beta"]);

    // Closing attempts the two live sessions and reports zero errors.
    client.close().await.expect("close should be clean");
}

#[tokio::test(flavor = "multi_thread")]
async fn all_servers_failing_is_fatal_by_default() {
    let config = multimcp_core::McpServersConfig::new()
        .with_server("only", unreachable_transport())
        .unwrap();

    let err = MultiServerClient::builder(config)
        .with_connect_timeout(CONNECT_TIMEOUT)
        .connect()
        .await
        .expect_err("zero live servers should fail open");

    match err {
        ClientError::AllServersUnavailable { attempted, failures } => {
            assert_eq!(attempted, 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "only");
        }
        other => panic!("expected AllServersUnavailable, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn allow_no_servers_downgrades_total_failure() {
    let config = multimcp_core::McpServersConfig::new()
        .with_server("only", unreachable_transport())
        .unwrap();

    let client = MultiServerClient::builder(config)
        .with_connect_timeout(CONNECT_TIMEOUT)
        .allow_no_servers(true)
        .connect()
        .await
        .expect("allow_no_servers should tolerate total failure");

    assert!(client.connected_servers().is_empty());
    assert_eq!(client.failed_servers().len(), 1);
    assert!(client.list_tools().is_empty());
    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stdio_spawn_failure_is_recorded_per_server() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;

    let mut config = fixture_config(&[("alpha", &alpha)]);
    config
        .push(ServerConfig {
            name: "ghost".to_string(),
            transport: TransportConfig::Stdio {
                command: "/nonexistent/multimcp-test-binary".to_string(),
                args: vec![],
                env: Default::default(),
            },
        })
        .unwrap();

    let client = MultiServerClient::builder(config)
        .with_connect_timeout(CONNECT_TIMEOUT)
        .connect()
        .await
        .unwrap();

    assert_eq!(client.connected_servers(), vec!["alpha"]);
    let failed = client.failed_servers();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "ghost");
    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn close_is_idempotent() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let client = MultiServerClient::connect(fixture_config(&[("alpha", &alpha)]))
        .await
        .unwrap();

    client.close().await.expect("first close");
    client.close().await.expect("second close is a no-op");
}

#[tokio::test(flavor = "multi_thread")]
async fn calls_after_close_fail_tagged_with_the_server() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let client = MultiServerClient::connect(fixture_config(&[("alpha", &alpha)]))
        .await
        .unwrap();

    client.close().await.unwrap();

    let err = client
        .call_tool("t1", None, None)
        .await
        .expect_err("call through a closed session should fail");
    assert_eq!(err.server(), Some("alpha"));
}

#[tokio::test(flavor = "multi_thread")]
async fn scoped_returns_the_closure_value() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let config = fixture_config(&[("alpha", &alpha)]);

    let tool_count = MultiServerClient::scoped(config, |client| {
        async move { Ok(client.list_tools().len()) }.boxed()
    })
    .await
    .unwrap();

    assert_eq!(tool_count, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn scoped_propagates_errors_after_closing() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let config = fixture_config(&[("alpha", &alpha)]);

    let err = MultiServerClient::scoped(config, |client| {
        async move {
            // A failing operation mid-scope must still end with every
            // session closed by scope exit.
            client.call_tool("no-such-tool", None, None).await?;
            Ok(())
        }
        .boxed()
    })
    .await
    .expect_err("closure error should propagate");

    assert!(matches!(
        err,
        ClientError::Routing(RoutingError::NotFound { .. })
    ));
}

/// Connector that refuses one server by name and delegates the rest;
/// exercises the session-establishment seam the builder exposes.
struct Refusing {
    name: String,
    inner: TransportConnector,
}

#[async_trait]
impl Connect for Refusing {
    async fn connect(&self, config: &ServerConfig) -> Result<ServerSession, SessionError> {
        if config.name == self.name {
            return Err(SessionError::Handshake("refused by test connector".into()));
        }
        self.inner.connect(config).await
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_connector_controls_session_establishment() {
    let alpha = start_fixture(Fixture::new("alpha").with_tools(&["t1"])).await;
    let beta = start_fixture(Fixture::new("beta").with_tools(&["t2"])).await;
    let config = fixture_config(&[("alpha", &alpha), ("beta", &beta)]);

    let client = MultiServerClient::builder(config)
        .with_connector(Arc::new(Refusing {
            name: "beta".to_string(),
            inner: TransportConnector,
        }))
        .connect()
        .await
        .unwrap();

    assert_eq!(client.connected_servers(), vec!["alpha"]);
    assert_eq!(client.failed_servers()[0].0, "beta");
    client.close().await.unwrap();
}
