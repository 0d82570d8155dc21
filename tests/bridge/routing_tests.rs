use super::common::{
    CountingFactory, MockAdapter, assert_silent, fixed_factory, handshake, next_json, request,
    test_config,
};
use mcp_sse_bridge::Bridge;
use async_trait::async_trait;
use mcp_sse_bridge::BridgeConfig;
use mcp_sse_bridge::capability::{CapabilityAdapter, OperationDescriptor};
use mcp_sse_bridge::error::{Error, Result};
use mcp_sse_bridge::protocol::json_rpc::error_codes;
use serde_json::{Value, json};
use std::sync::Arc;

fn calculator_operations() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "add",
            json!({
                "type": "object",
                "properties": { "a": { "type": "number" }, "b": { "type": "number" } }
            }),
        )
        .with_description("Add two numbers"),
        OperationDescriptor::new("now", json!({"type": "object"})),
    ]
}

fn counting_bridge(factory: &CountingFactory) -> Bridge {
    Bridge::new(test_config(), Arc::new(factory.clone()))
}

#[tokio::test]
async fn test_tools_list_reports_backend_catalog() {
    let mut mock = MockAdapter::new();
    mock.expect_list_operations()
        .times(1)
        .returning(calculator_operations);
    let bridge = Bridge::new(test_config(), fixed_factory(Arc::new(mock)));

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    bridge
        .post_message(&session_id, &request(1, "tools/list", None))
        .await
        .unwrap();

    let response = next_json(&mut stream).await;
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(
        response["result"]["tools"],
        serde_json::to_value(calculator_operations()).unwrap()
    );
    assert_eq!(response["result"]["tools"][0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn test_tools_call_forwards_name_and_arguments() {
    let mut mock = MockAdapter::new();
    mock.expect_invoke()
        .withf(|name: &str, arguments: &Value| name == "add" && *arguments == json!({"a": 2, "b": 3}))
        .times(1)
        .returning(|_, _| Ok(json!({"content": [{"type": "text", "text": "5"}]})));
    let bridge = Bridge::new(test_config(), fixed_factory(Arc::new(mock)));

    let mut caller = bridge.connect(Some("key-1")).await.unwrap();
    let mut bystander = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut caller).await;
    handshake(&mut bystander).await;

    let params = json!({"name": "add", "arguments": {"a": 2, "b": 3}});
    bridge
        .post_message(&session_id, &request(42, "tools/call", Some(params)))
        .await
        .unwrap();

    let response = next_json(&mut caller).await;
    assert_eq!(response["id"], 42);
    assert_eq!(response["result"]["content"][0]["text"], "5");
    assert_silent(&mut bystander).await;
}

#[tokio::test]
async fn test_missing_arguments_default_to_empty_object() {
    let mut mock = MockAdapter::new();
    mock.expect_invoke()
        .withf(|name: &str, arguments: &Value| name == "now" && *arguments == json!({}))
        .times(1)
        .returning(|_, _| Ok(json!({"content": []})));
    let bridge = Bridge::new(test_config(), fixed_factory(Arc::new(mock)));

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    bridge
        .post_message(&session_id, &request(3, "tools/call", Some(json!({"name": "now"}))))
        .await
        .unwrap();

    let response = next_json(&mut stream).await;
    assert_eq!(response["result"], json!({"content": []}));
}

#[tokio::test]
async fn test_same_credential_sessions_share_backend_but_not_streams() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut first = bridge.connect(Some("key-1")).await.unwrap();
    let mut second = bridge.connect(Some("key-1")).await.unwrap();
    let first_id = handshake(&mut first).await;
    let second_id = handshake(&mut second).await;
    assert_ne!(first_id, second_id);

    let call = |id, tag: &str| {
        request(id, "tools/call", Some(json!({"name": "whoami", "arguments": {"from": tag}})))
    };
    bridge.post_message(&first_id, &call(1, "first")).await.unwrap();
    let response = next_json(&mut first).await;
    assert_eq!(response["result"]["arguments"]["from"], "first");
    assert_silent(&mut second).await;

    bridge.post_message(&second_id, &call(2, "second")).await.unwrap();
    let response = next_json(&mut second).await;
    assert_eq!(response["id"], 2);
    assert_eq!(response["result"]["arguments"]["from"], "second");
    assert_silent(&mut first).await;

    assert_eq!(factory.constructions("key-1"), 1);
    assert_eq!(factory.invocations(), 2);
}

#[tokio::test]
async fn test_tenants_reach_their_own_backend() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut alice = bridge.connect(Some("key-1")).await.unwrap();
    let mut bob = bridge.connect(Some("key-2")).await.unwrap();
    let alice_id = handshake(&mut alice).await;
    let bob_id = handshake(&mut bob).await;

    let whoami = request(1, "tools/call", Some(json!({"name": "whoami"})));
    bridge.post_message(&alice_id, &whoami).await.unwrap();
    bridge.post_message(&bob_id, &whoami).await.unwrap();

    assert_eq!(next_json(&mut alice).await["result"]["backend"], "key-1");
    assert_eq!(next_json(&mut bob).await["result"]["backend"], "key-2");
    assert_eq!(factory.total_constructions(), 2);
}

#[tokio::test]
async fn test_invocation_failure_becomes_error_response() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;

    bridge
        .post_message(&session_id, &request(5, "tools/call", Some(json!({"name": "explode"}))))
        .await
        .unwrap();
    let response = next_json(&mut stream).await;
    assert_eq!(response["id"], 5);
    assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
    assert!(response.get("result").is_none());

    bridge
        .post_message(&session_id, &request(6, "tools/call", Some(json!({"name": "missing"}))))
        .await
        .unwrap();
    let response = next_json(&mut stream).await;
    assert_eq!(response["id"], 6);
    assert_eq!(response["error"]["code"], error_codes::INVALID_PARAMS);

    // The session survives failed calls
    assert!(bridge.sessions().contains(&session_id));
}

#[tokio::test]
async fn test_unknown_method_is_reported() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    bridge
        .post_message(&session_id, &request(9, "resources/list", None))
        .await
        .unwrap();

    let response = next_json(&mut stream).await;
    assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_initialize_handshake() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;
    let params = json!({
        "protocolVersion": "2025-03-26",
        "capabilities": {},
        "clientInfo": {"name": "test-client", "version": "1.0.0"}
    });
    bridge
        .post_message(&session_id, &request(0, "initialize", Some(params)))
        .await
        .unwrap();

    let response = next_json(&mut stream).await;
    assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(response["result"]["serverInfo"]["name"], test_config().server_name);
    assert!(response["result"]["capabilities"]["tools"].is_object());

    let initialized = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    bridge
        .post_message(&session_id, &serde_json::to_vec(&initialized).unwrap())
        .await
        .unwrap();
    assert_silent(&mut stream).await;
}

#[tokio::test]
async fn test_malformed_messages_are_rejected() {
    let factory = CountingFactory::new();
    let bridge = counting_bridge(&factory);

    let mut stream = bridge.connect(Some("key-1")).await.unwrap();
    let session_id = handshake(&mut stream).await;

    for body in [
        &b"not json"[..],
        &br#"{"id": 1, "method": "tools/list"}"#[..],
        &br#"[{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}]"#[..],
    ] {
        let err = bridge.post_message(&session_id, body).await.err().unwrap();
        assert!(matches!(err, Error::InvalidMessage(_)), "got {:?}", err);
    }
    assert_silent(&mut stream).await;
}

/// Adapter whose calls never finish
struct Stalled;

#[async_trait]
impl CapabilityAdapter for Stalled {
    fn list_operations(&self) -> Vec<OperationDescriptor> {
        vec![OperationDescriptor::new("hang", json!({"type": "object"}))]
    }

    async fn invoke(&self, _name: &str, _arguments: Value) -> Result<Value> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_unanswered_messages_are_bounded_per_session() {
    let config = BridgeConfig {
        channel_capacity: 2,
        invocation_timeout_secs: 60,
        ..test_config()
    };
    let bridge = Bridge::new(config, fixed_factory(Arc::new(Stalled)));

    let mut busy = bridge.connect(Some("key-1")).await.unwrap();
    let mut idle = bridge.connect(Some("key-1")).await.unwrap();
    let busy_id = handshake(&mut busy).await;
    let idle_id = handshake(&mut idle).await;

    let hang = |id| request(id, "tools/call", Some(json!({"name": "hang"})));
    bridge.post_message(&busy_id, &hang(1)).await.unwrap();
    bridge.post_message(&busy_id, &hang(2)).await.unwrap();

    let err = bridge.post_message(&busy_id, &hang(3)).await.err().unwrap();
    assert!(matches!(err, Error::SessionBusy(ref id) if id == &busy_id));

    // Other sessions keep their own allowance
    bridge
        .post_message(&idle_id, &request(4, "ping", None))
        .await
        .unwrap();
    assert_eq!(next_json(&mut idle).await["id"], 4);
}
