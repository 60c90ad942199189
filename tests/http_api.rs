//! HTTP API tests driven through the router with a scripted AI backend

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ScriptedBackend, app, send};
use rajbari_ai::bridge::EMPTY_REPLY_PLACEHOLDER;
use rajbari_ai::error::{MSG_GATEWAY, MSG_RATE_LIMITED};
use rajbari_ai::gemini::{BackendError, GenerateContentResponse};
use rajbari_ai::services::chat::RESET_MESSAGE;
use serde_json::json;
use tower::ServiceExt;

fn ping_body() -> serde_json::Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": "Ping" }] }],
        "systemInstruction": "Respond with 'Vercel Edge Active'"
    })
}

#[tokio::test]
async fn gateway_ping_reports_live_cloud_mode() {
    let backend = ScriptedBackend::replying("Vercel Edge Active");
    let (status, body) = send(app(backend.clone(), Some("key")), "POST", "/api/ai", Some(ping_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "text": "Vercel Edge Active", "groundingMetadata": null, "mode": "live_cloud_v2" })
    );
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn gateway_rejects_other_methods() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend.clone(), Some("key")), "GET", "/api/ai", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed" }));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn gateway_without_key_fails_before_calling_backend() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend.clone(), None), "POST", "/api/ai", Some(ping_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API_KEY_MISSING");
    assert!(body["details"].as_str().unwrap().contains("API_KEY"));
    assert!(body.get("raw").is_none());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn gateway_maps_rate_limit() {
    let backend = ScriptedBackend::with_outcome(Err(BackendError::Status {
        status: 429,
        body: "{\"error\":{\"status\":\"RESOURCE_EXHAUSTED\"}}".into(),
    }));
    let (status, body) = send(app(backend, Some("key")), "POST", "/api/ai", Some(ping_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI_GATEWAY_ERROR");
    assert_eq!(body["details"], MSG_RATE_LIMITED);
    assert!(body["raw"].as_str().unwrap().contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn gateway_unknown_failure_carries_raw_message() {
    let backend = ScriptedBackend::with_outcome(Err(BackendError::Transport("connection refused".into())));
    let (_, body) = send(app(backend, Some("key")), "POST", "/api/ai", Some(ping_body())).await;

    assert_eq!(body["details"], MSG_GATEWAY);
    assert_eq!(body["raw"], "request failed: connection refused");
}

#[tokio::test]
async fn gateway_substitutes_placeholder_for_empty_text() {
    let backend = ScriptedBackend::with_outcome(Ok(GenerateContentResponse::default()));
    let (status, body) = send(app(backend, Some("key")), "POST", "/api/ai", Some(ping_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], EMPTY_REPLY_PLACEHOLDER);
}

#[tokio::test]
async fn gateway_rejects_malformed_body() {
    let backend = ScriptedBackend::replying("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/api/ai")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(backend.clone(), Some("key")).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn diagnostics_uses_direct_mode() {
    let backend = ScriptedBackend::replying("Vercel Edge Active");
    let (status, body) = send(app(backend, Some("key")), "GET", "/api/diagnostics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["mode"], "client_direct_v3");
}

#[tokio::test]
async fn categories_serve_fallback_records() {
    let backend = ScriptedBackend::replying("unused");

    let (status, body) = send(app(backend.clone(), None), "GET", "/api/categories/police", None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| !r["id"].as_str().unwrap().is_empty()));

    let (status, body) = send(app(backend.clone(), None), "GET", "/api/categories/unknown", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(app(backend.clone(), None), "GET", "/api/categories", None).await;
    assert!(body.as_array().unwrap().contains(&json!("trains")));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn market_falls_back_without_key() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend.clone(), None), "GET", "/api/market", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "offline_knowledge");
    assert!(!body["items"].as_array().unwrap().is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn train_locate_unknown_id_is_not_found() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend, Some("key")), "POST", "/api/trains/9999/locate", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn train_locate_parses_station() {
    let backend = ScriptedBackend::replying("ট্রেনটি কালুখালী পার হয়েছে। [STATION: কালুখালী জংশন]");
    let (status, body) = send(app(backend, Some("key")), "POST", "/api/trains/725/locate", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStation"], "কালুখালী");
    assert_eq!(body["reason"], "ট্রেনটি কালুখালী পার হয়েছে।");
    assert_eq!(body["isAI"], true);
}

#[tokio::test]
async fn chat_round_trip_returns_history() {
    let backend = ScriptedBackend::replying("রাজবাড়ী ঢাকা বিভাগের একটি জেলা।");
    let (status, body) = send(
        app(backend, Some("key")),
        "POST",
        "/api/chat",
        Some(json!({ "message": "রাজবাড়ী কোথায়?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"]["role"], "model");
    assert_eq!(body["reply"]["mode"], "client_direct_v3");
    assert_eq!(body["history"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn chat_reset_returns_fresh_history() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend.clone(), Some("key")), "POST", "/api/chat/reset", None).await;

    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["role"], "model");
    assert_eq!(history[0]["text"], RESET_MESSAGE);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn place_search_and_static_filter() {
    let backend = ScriptedBackend::replying(
        r#"[{"name":"রাজবাড়ী রেলস্টেশন","lat":23.76,"lng":89.64,"category":"landmark"}]"#,
    );
    let (status, body) = send(
        app(backend.clone(), Some("key")),
        "POST",
        "/api/places/search",
        Some(json!({ "query": "Station" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["places"][0]["id"], "ai-0");
    assert_eq!(body["places"][0]["isAI"], true);

    let (status, body) = send(app(backend, None), "GET", "/api/places?category=hospital", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().all(|p| p["category"] == "hospital"));
}

#[tokio::test]
async fn health_reports_version() {
    let backend = ScriptedBackend::replying("unused");
    let (status, body) = send(app(backend, None), "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
