//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use pantry_assistant::api::ApiServerBuilder;
use pantry_assistant::{Pantry, Pipeline};
use tower::ServiceExt;

mod common;
use common::{StubModel, StubTranscriber, memory_pantry, silent_wav, tone_wav};

/// Build a test API router over an in-memory pantry
fn build_test_router(pantry: Arc<Pantry>, reply: &str) -> Router {
    let pipeline = Pipeline::new(pantry, StubModel::replying(reply))
        .with_transcriber(StubTranscriber::hearing("add milk"));
    ApiServerBuilder::new(pipeline, 0).build().router()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(memory_pantry(None), "hi");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_list_pantry() {
    let app = build_test_router(memory_pantry(Some("milk (dairy), eggs")), "hi");

    let response = app
        .oneshot(Request::builder().uri("/api/pantry").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["items"], serde_json::json!(["milk (dairy)", "eggs"]));
}

#[tokio::test]
async fn test_add_and_remove_item() {
    let pantry = memory_pantry(None);
    let app = build_test_router(Arc::clone(&pantry), "hi");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/pantry/items",
            &serde_json::json!({"item": "  Milk "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["entry"], "milk (dairy)");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/pantry/items/milk")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["removed"], 1);
    assert!(pantry.read().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_blank_item_is_bad_request() {
    let app = build_test_router(memory_pantry(None), "hi");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/pantry/items",
            &serde_json::json!({"item": "   "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_add_item_with_comma_is_bad_request() {
    let pantry = memory_pantry(None);
    let app = build_test_router(Arc::clone(&pantry), "hi");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/pantry/items",
            &serde_json::json!({"item": "salt, pepper"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "bad_request");
    assert!(pantry.read().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_test_router(memory_pantry(None), "hi");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_clear_pantry() {
    let pantry = memory_pantry(Some("rice, beans"));
    let app = build_test_router(Arc::clone(&pantry), "hi");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/pantry")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(pantry.read().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_applies_action() {
    let pantry = memory_pantry(None);
    let app = build_test_router(Arc::clone(&pantry), "ACTION: ADD apples and kiwi");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/chat",
            &serde_json::json!({"text": "add apples and kiwi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "replied");
    assert_eq!(json["reply"], "I have added apples, kiwi to your list.");
    assert_eq!(json["action"]["kind"], "add");
    assert_eq!(pantry.read().unwrap(), vec!["apples (produce)", "kiwi"]);
}

#[tokio::test]
async fn test_chat_rejects_empty_text() {
    let app = build_test_router(memory_pantry(None), "hi");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/chat",
            &serde_json::json!({"text": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_voice_turn_and_duplicate() {
    let pantry = memory_pantry(None);
    let app = build_test_router(Arc::clone(&pantry), "ACTION: ADD milk");
    let wav = tone_wav(0.5, 0.3);

    let voice_request = |wav: Vec<u8>| {
        Request::builder()
            .method("POST")
            .uri("/api/voice")
            .header("Content-Type", "audio/wav")
            .body(Body::from(wav))
            .unwrap()
    };

    let response = app.clone().oneshot(voice_request(wav.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "replied");
    assert_eq!(json["transcript"], "add milk");

    let response = app.oneshot(voice_request(wav)).await.unwrap();
    assert_eq!(json_body(response).await["status"], "duplicate");
    assert_eq!(pantry.read().unwrap(), vec!["milk (dairy)"]);
}

#[tokio::test]
async fn test_voice_silence_is_no_speech() {
    let app = build_test_router(memory_pantry(None), "unused");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/voice")
                .body(Body::from(silent_wav(1.0)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "no_speech");
    assert_eq!(json["message"], "I didn't catch that. Could you say it again?");
}

#[tokio::test]
async fn test_voice_rejects_non_wav() {
    let app = build_test_router(memory_pantry(None), "unused");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/voice")
                .body(Body::from("not audio"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "audio_format");
}

#[tokio::test]
async fn test_voice_speech_service_down() {
    let pipeline = Pipeline::new(memory_pantry(None), StubModel::replying("unused"))
        .with_transcriber(StubTranscriber::unavailable());
    let app = ApiServerBuilder::new(pipeline, 0).build().router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/voice")
                .body(Body::from(tone_wav(0.5, 0.3)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"]["code"], "speech_unavailable");
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let app = build_test_router(memory_pantry(None), "Hello!");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/chat",
            &serde_json::json!({"text": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = json_body(response).await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["role"], "assistant");
    assert_eq!(entries[0]["content"], "Hello!");
    assert_eq!(entries[1]["role"], "user");
    assert_eq!(entries[1]["content"], "hi");
}
