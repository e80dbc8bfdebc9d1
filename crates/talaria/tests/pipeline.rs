//! End-to-end pipeline tests across transports.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use indexmap::IndexMap;
use serde_json::{json, Value};

use talaria::prelude::*;

struct Greet;

#[async_trait]
impl Action for Greet {
    async fn execute(&mut self, ctx: &ActionContext) -> DispatchResult<ActionReply> {
        let name = ctx
            .parameter("name")
            .and_then(Value::as_str)
            .unwrap_or("world");
        Ok(ActionReply::ok(json!({ "greeting": format!("hello {name}") })))
    }
}

fn dispatcher() -> Dispatcher {
    let routes = StaticRouteTable::new().route("greet", || HandlerResolution {
        initializer: Initializer::new()
            .verb(Method::POST)
            .parameter(ParameterDefinition::required(
                "name",
                ParameterKind::String,
            )),
        action: Box::new(Greet),
    });

    let renderer = Renderer::new(
        Arc::new(MemoryCatalogProvider::default()),
        "en",
        OutputTemplate::Structured,
    )
    .unwrap();

    Dispatcher::new(TalariaConfig::default(), Arc::new(routes), renderer)
}

fn structured(rendered: Rendered) -> ResponseEnvelope {
    match rendered {
        Rendered::Structured(envelope) => envelope,
        other => panic!("expected structured output, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_request_flows_to_structured_response() {
    let parts = HttpRequestParts {
        method: Method::POST,
        path: "/greet".to_string(),
        headers: IndexMap::new(),
        query: IndexMap::new(),
        body: Some(serde_json::to_vec(&json!({ "name": "ada" })).unwrap().into()),
    };

    let response = structured(dispatcher().dispatch(parts.into_envelope()).await);
    assert_eq!(response.response_code, json!(200));
    assert_eq!(response.response_data["greeting"], "hello ada");
}

#[tokio::test]
async fn test_http_validation_failure_names_the_parameter() {
    let parts = HttpRequestParts {
        method: Method::POST,
        path: "/greet".to_string(),
        body: Some(serde_json::to_vec(&json!({})).unwrap().into()),
        ..Default::default()
    };

    let response = structured(dispatcher().dispatch(parts.into_envelope()).await);
    assert_eq!(response.response_code, json!(400));
    assert_eq!(
        response.response_message,
        "The parameter name is missing or empty."
    );
}

#[tokio::test]
async fn test_socket_message_dispatches_and_emits_back() {
    let registry = Arc::new(ConnectionRegistry::new());
    let adapter = SocketAdapter::new(Arc::clone(&registry));
    let dispatcher = dispatcher();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let connection_id = registry.register(IndexMap::new(), tx);

    let envelope = adapter.envelope(SocketEvent::Message {
        connection_id: connection_id.clone(),
        event: "greet".to_string(),
        payload: json!({ "name": "grace" }),
    });
    let response = structured(dispatcher.dispatch(envelope).await);
    assert_eq!(response.response_data["greeting"], "hello grace");

    registry.emit(&connection_id, serde_json::to_value(&response).unwrap());
    let pushed = rx.recv().await.unwrap();
    assert_eq!(pushed["responseData"]["greeting"], "hello grace");
}
