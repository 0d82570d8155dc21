use super::common::{
    CountingFactory, handshake, next_json, request, single_tenant_config, test_config,
};
use mcp_sse_bridge::Bridge;
use mcp_sse_bridge::capability::Credential;
use mcp_sse_bridge::error::Error;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn bridge(factory: &CountingFactory) -> Bridge {
    Bridge::new(test_config(), Arc::new(factory.clone()))
}

#[tokio::test]
async fn test_connect_announces_endpoint_and_registers() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;

    assert!(bridge.sessions().contains(&session_id));
    assert_eq!(bridge.sessions().len(), 1);
    assert_eq!(factory.constructions("key-1"), 1);
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let mut streams = Vec::new();
    for _ in 0..20 {
        streams.push(bridge.connect(Some("key-1")).await.unwrap());
    }
    let ids: HashSet<_> = streams.iter().map(|s| s.session_id().to_string()).collect();

    assert_eq!(ids.len(), 20);
    assert_eq!(bridge.sessions().len(), 20);
    assert_eq!(factory.constructions("key-1"), 1);
}

#[tokio::test]
async fn test_dropping_stream_closes_session() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    drop(stream);

    assert!(!bridge.sessions().contains(&session_id));
    assert!(matches!(
        bridge.sessions().lookup(&session_id),
        Err(Error::UnknownSession(_))
    ));
    // The backend outlives the session
    assert!(bridge.instances().contains(&Credential::new("key-1")).await);
}

#[tokio::test]
async fn test_post_to_closed_session_is_rejected() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    drop(stream);

    let body = request(1, "tools/call", Some(json!({"name": "whoami"})));
    let err = bridge.post_message(&session_id, &body).await.err().unwrap();

    assert!(matches!(err, Error::UnknownSession(_)));
    assert_eq!(factory.invocations(), 0);
}

#[tokio::test]
async fn test_post_to_unknown_session_is_rejected() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let err = bridge
        .post_message("no-such-session", &request(1, "tools/list", None))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, Error::UnknownSession(_)));
    assert_eq!(err.to_string(), "No transport found for sessionId: no-such-session");
}

#[tokio::test]
async fn test_missing_credential_is_rejected_before_construction() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let err = bridge.connect(None).await.err().unwrap();

    assert!(matches!(err, Error::MissingCredential));
    assert_eq!(factory.total_constructions(), 0);
    assert!(bridge.sessions().is_empty());
}

#[tokio::test]
async fn test_empty_credential_is_treated_as_missing() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let err = bridge.connect(Some("")).await.err().unwrap();

    assert!(matches!(err, Error::MissingCredential));
    assert_eq!(factory.total_constructions(), 0);
}

#[tokio::test]
async fn test_failed_construction_registers_nothing() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let err = bridge.connect(Some("bad-key")).await.err().unwrap();

    assert!(matches!(err, Error::BackendConstruction(_)));
    assert!(bridge.sessions().is_empty());
    assert!(!bridge.instances().contains(&Credential::new("bad-key")).await);

    // A later attempt constructs again rather than replaying the failure
    let _ = bridge.connect(Some("bad-key")).await;
    assert_eq!(factory.constructions("bad-key"), 2);
}

#[tokio::test]
async fn test_single_tenant_ignores_supplied_credential() {
    let factory = CountingFactory::new();
    let bridge = Bridge::new(single_tenant_config("static-key"), Arc::new(factory.clone()));

    let mut anonymous = bridge.connect(None).await.unwrap();
    let mut keyed = bridge.connect(Some("key-1")).await.unwrap();
    handshake(&mut anonymous).await;
    let keyed_id = handshake(&mut keyed).await;

    assert_eq!(factory.constructions("static-key"), 1);
    assert_eq!(factory.constructions("key-1"), 0);

    bridge
        .post_message(&keyed_id, &request(7, "tools/call", Some(json!({"name": "whoami"}))))
        .await
        .unwrap();
    let response = next_json(&mut keyed).await;
    assert_eq!(response["id"], 7);
    assert_eq!(response["result"]["backend"], "static-key");
}

#[tokio::test]
async fn test_close_all_sessions_ends_streams() {
    let factory = CountingFactory::new();
    let bridge = bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    handshake(&mut stream).await;
    bridge.close_all_sessions();

    assert!(bridge.sessions().is_empty());
    assert!(futures::StreamExt::next(&mut stream).await.is_none());
}
