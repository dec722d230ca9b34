//! Resource and prompt routing: namespaces, explicit overrides, pass-through
//! errors scoped to the addressed server.

use multimcp_client::{ClientError, MultiServerClient, RoutingError};
use pretty_assertions::assert_eq;
use tests::mocks::{fixture_config, resource_text, start_fixture, Fixture};

#[tokio::test(flavor = "multi_thread")]
async fn namespaced_read_routes_to_the_prefixed_server() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("notes", "fs-notes")])).await;
    let db = start_fixture(Fixture::new("db").with_resources(&[("overview", "db-overview")])).await;

    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs), ("db", &db)]))
        .await
        .unwrap();

    let result = client.read_resource("db:overview", None).await.unwrap();
    assert_eq!(resource_text(&result), "db::db-overview");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn namespaced_read_never_falls_back_to_another_server() {
    // `fs` has no resource named `overview`; `db` does. The namespaced read
    // must fail scoped to `fs`, not silently serve db's resource.
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("notes", "fs-notes")])).await;
    let db = start_fixture(Fixture::new("db").with_resources(&[("overview", "db-overview")])).await;

    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs), ("db", &db)]))
        .await
        .unwrap();

    let err = client
        .read_resource("fs:overview", None)
        .await
        .expect_err("fs has no 'overview' resource");
    assert_eq!(err.server(), Some("fs"));

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unnamespaced_unique_resource_routes_via_registry() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("notes", "fs-notes")])).await;
    let db = start_fixture(Fixture::new("db").with_resources(&[("overview", "db-overview")])).await;

    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs), ("db", &db)]))
        .await
        .unwrap();

    let result = client.read_resource("notes", None).await.unwrap();
    assert_eq!(resource_text(&result), "fs::fs-notes");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unnamespaced_colliding_resource_is_ambiguous() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("shared", "from-fs")])).await;
    let db = start_fixture(Fixture::new("db").with_resources(&[("shared", "from-db")])).await;

    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs), ("db", &db)]))
        .await
        .unwrap();

    let err = client.read_resource("shared", None).await.unwrap_err();
    match err {
        ClientError::Routing(RoutingError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates, vec!["fs", "db"]);
        }
        other => panic!("expected ambiguous, got {other:?}"),
    }

    // The namespaced forms from the listing disambiguate.
    let listed = client.list_resources();
    let fs_row = listed.iter().find(|r| r.server == "fs").unwrap();
    assert!(fs_row.collision);
    let result = client
        .read_resource(&fs_row.namespaced_uri(), None)
        .await
        .unwrap();
    assert_eq!(resource_text(&result), "fs::from-fs");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_resource_is_not_found() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("notes", "fs-notes")])).await;
    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs)]))
        .await
        .unwrap();

    let err = client.read_resource("missing", None).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Routing(RoutingError::NotFound { .. })
    ));

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn colon_bearing_raw_uri_resolves_via_registry() {
    // No connected server is named "http", so the scheme is not a namespace
    // and the whole string resolves through the registry.
    let fs = start_fixture(
        Fixture::new("fs").with_resources(&[("http://host/path", "scheme-resource")]),
    )
    .await;
    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs)]))
        .await
        .unwrap();

    let result = client.read_resource("http://host/path", None).await.unwrap();
    assert_eq!(resource_text(&result), "fs::scheme-resource");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn server_named_like_a_scheme_claims_the_prefix() {
    let http = start_fixture(
        Fixture::new("http").with_resources(&[("//host/path", "prefixed-resource")]),
    )
    .await;
    let client = MultiServerClient::connect(fixture_config(&[("http", &http)]))
        .await
        .unwrap();

    let result = client.read_resource("http://host/path", None).await.unwrap();
    assert_eq!(resource_text(&result), "http::prefixed-resource");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_server_overrides_any_namespace() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("db:overview", "odd-name")])).await;
    let db = start_fixture(Fixture::new("db").with_resources(&[("overview", "db-overview")])).await;

    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs), ("db", &db)]))
        .await
        .unwrap();

    // With an explicit server the URI is passed through verbatim, namespace
    // syntax and all.
    let result = client
        .read_resource("db:overview", Some("fs"))
        .await
        .unwrap();
    assert_eq!(resource_text(&result), "fs::odd-name");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_unknown_server_is_rejected() {
    let fs = start_fixture(Fixture::new("fs").with_tools(&["t1"])).await;
    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs)]))
        .await
        .unwrap();

    let err = client.call_tool("t1", None, Some("gamma")).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Routing(RoutingError::UnknownServer { name }) if name == "gamma"
    ));

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn prompts_route_by_name_and_explicit_override() {
    let alpha = start_fixture(Fixture::new("alpha").with_prompts(&["greet", "shared"])).await;
    let beta = start_fixture(Fixture::new("beta").with_prompts(&["shared"])).await;

    let client = MultiServerClient::connect(fixture_config(&[("alpha", &alpha), ("beta", &beta)]))
        .await
        .unwrap();

    let unique = client.get_prompt("greet", None, None).await.unwrap();
    assert_eq!(unique.description.as_deref(), Some("alpha::greet"));

    let err = client.get_prompt("shared", None, None).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Routing(RoutingError::Ambiguous { .. })
    ));

    let pinned = client
        .get_prompt("shared", None, Some("beta"))
        .await
        .unwrap();
    assert_eq!(pinned.description.as_deref(), Some("beta::shared"));

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn resource_templates_are_listed_with_namespaced_uris() {
    let fs = start_fixture(
        Fixture::new("fs").with_resource_templates(&["file:///{path}"]),
    )
    .await;
    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs)]))
        .await
        .unwrap();

    let listed = client.list_resource_templates();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].server, "fs");
    assert_eq!(listed[0].identifier(), "file:///{path}");
    assert_eq!(listed[0].namespaced_uri(), "fs:file:///{path}");

    client.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn listed_namespaced_uris_round_trip_through_read() {
    let fs = start_fixture(Fixture::new("fs").with_resources(&[("notes", "fs-notes")])).await;
    let client = MultiServerClient::connect(fixture_config(&[("fs", &fs)]))
        .await
        .unwrap();

    let listed = client.list_resources();
    let result = client
        .read_resource(&listed[0].namespaced_uri(), None)
        .await
        .unwrap();
    assert_eq!(resource_text(&result), "fs::fs-notes");

    client.close().await.unwrap();
}
