use super::*;
use crate::fakes::RecordingConnector;
use axum::{body, body::Body, http::Request};
use tower::ServiceExt;

fn test_app(connector: RecordingConnector) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let codes_file = dir.path().join("remote_codes.json");
    std::fs::write(&codes_file, r#"{"1 ON": {"code": 1001}, "1 OFF": {"code": 1000}}"#)
        .expect("codes");
    let state = AppState {
        bridge: BridgeContext {
            codes_file,
            serial: Arc::new(SerialManager::new(Arc::new(connector))),
        },
    };
    (build_router(Arc::new(state)), dir)
}

fn control_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/api/control")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn control_route_sends_known_button() {
    let connector = RecordingConnector::default();
    let (app, _dir) = test_app(connector.clone());

    let response = app
        .oneshot(control_request(serde_json::json!({ "button": "1 ON" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Sent 1 ON");
    assert_eq!(body["pico_response"], "Done.");
    assert_eq!(connector.lines(), vec!["1001,1,150\n".to_string()]);
}

#[tokio::test]
async fn control_route_maps_errors_to_status_codes() {
    let (app, _dir) = test_app(RecordingConnector::default());

    let response = app
        .clone()
        .oneshot(control_request(serde_json::json!({})))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "validation");

    let response = app
        .oneshot(control_request(serde_json::json!({ "button": "7 ON" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["code"], "not_found");
    assert_eq!(body["available_buttons"], serde_json::json!(["1 OFF", "1 ON"]));
}

#[tokio::test]
async fn control_route_reports_missing_transmitter() {
    let (app, _dir) = test_app(RecordingConnector::unplugged());
    let response = app
        .oneshot(control_request(serde_json::json!({ "button": "1 OFF" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "unavailable");
}

#[tokio::test]
async fn health_route_reports_unhealthy_before_connect() {
    let (app, _dir) = test_app(RecordingConnector::default());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["serial_connected"], false);
}
