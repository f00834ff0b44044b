//! HTTP endpoint tests using axum-test
//!
//! Records come from a `MemoryStore`; the chat-completion endpoint and the TTS service
//! are throwaway axum servers on 127.0.0.1.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::RawQuery;
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use treeqr_core::record::Attributes;
use treeqr_core::{GenerationConfig, MemoryStore, Record, SpeechConfig, StoreConfig};

use crate::build_router;
use crate::state::{AppState, StoreSource};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn fixtures() -> MemoryStore {
    let mut classification = Attributes::new();
    classification.insert("family".into(), "Moraceae".into());

    MemoryStore::new()
        .with_record(
            "tree-42",
            Record {
                id: "tree-42".into(),
                name: "Banyan".into(),
                ..Record::default()
            },
        )
        .with_record(
            "tree-7",
            Record {
                id: "tree-7".into(),
                name: "Peepal".into(),
                botanical: "Ficus religiosa".into(),
                classification: Some(classification),
                ..Record::default()
            },
        )
}

/// Chat endpoint replying with `reply`, plus a call counter
async fn chat_upstream(status: StatusCode, reply: Value) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new().route(
        "/chat/completions",
        post(move |Json(_body): Json<Value>| {
            let counter = counter.clone();
            let reply = reply.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, Json(reply))
            }
        }),
    );
    (format!("{}/chat/completions", spawn(app).await), calls)
}

/// TTS endpoint echoing the raw query back as `audio/wav` bytes
async fn tts_upstream() -> String {
    let app = Router::new().route(
        "/speak",
        get(|RawQuery(query): RawQuery| async move {
            let mut audio = b"RIFF".to_vec();
            audio.extend(query.unwrap_or_default().into_bytes());
            ([(header::CONTENT_TYPE, "audio/wav")], audio)
        }),
    );
    format!("{}/speak", spawn(app).await)
}

fn test_server(chat_url: &str, tts_url: &str) -> TestServer {
    let state = AppState::new(
        StoreSource::Fixtures(fixtures()),
        GenerationConfig {
            endpoint: chat_url.to_string(),
            api_key: Some("sk-test".into()),
            ..GenerationConfig::default()
        },
        SpeechConfig {
            endpoint: tts_url.to_string(),
            ..SpeechConfig::default()
        },
    )
    .unwrap();

    TestServer::new(build_router(state, Path::new("static"))).unwrap()
}

fn story(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

#[tokio::test]
async fn test_health_returns_200() {
    let server = test_server("http://127.0.0.1:9/chat", "http://127.0.0.1:9/speak");
    let response = server.get("/health").await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "treeqr-server");
}

#[tokio::test]
async fn test_tree_page_renders_normalized_record() {
    let server = test_server("http://127.0.0.1:9/chat", "http://127.0.0.1:9/speak");
    let response = server.get("/tree-42").await;
    response.assert_status_ok();

    let content_type = response.header(header::CONTENT_TYPE);
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let html = response.text();
    assert!(html.contains("<h1>Banyan</h1>"));
    assert!(html.contains("const treeId = \"tree-42\";"));
}

#[tokio::test]
async fn test_tree_page_shows_classification() {
    let server = test_server("http://127.0.0.1:9/chat", "http://127.0.0.1:9/speak");
    let html = server.get("/tree-7").await.text();
    assert!(html.contains("<em>Ficus religiosa</em>"));
    assert!(html.contains("<dt>Family</dt><dd>Moraceae</dd>"));
}

#[tokio::test]
async fn test_unknown_tree_returns_404() {
    let server = test_server("http://127.0.0.1:9/chat", "http://127.0.0.1:9/speak");
    let response = server.get("/tree-0").await;
    response.assert_status_not_found();

    let json = response.json::<Value>();
    assert_eq!(json["error"], "Tree not found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_store_outage_returns_503() {
    let store = StoreConfig {
        database_url: closed_port().await,
        ..StoreConfig::default()
    };
    let state = AppState::new(
        StoreSource::Firebase(store),
        GenerationConfig::default(),
        SpeechConfig::default(),
    )
    .unwrap();
    let server = TestServer::new(build_router(state, Path::new("static"))).unwrap();

    let response = server.get("/tree-42").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let response = server.get("/generate-description/tree-42").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_generate_description_returns_plain_text() {
    let (chat, calls) = chat_upstream(StatusCode::OK, story("I am the Banyan tree.")).await;
    let server = test_server(&chat, "http://127.0.0.1:9/speak");

    let response = server.get("/generate-description/tree-42").await;
    response.assert_status_ok();
    assert!(response
        .header(header::CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.text(), "I am the Banyan tree.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generate_description_unknown_tree_returns_404() {
    let (chat, calls) = chat_upstream(StatusCode::OK, story("unused")).await;
    let server = test_server(&chat, "http://127.0.0.1:9/speak");

    server
        .get("/generate-description/tree-0")
        .await
        .assert_status_not_found();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_returns_generic_500() {
    let (chat, calls) = chat_upstream(StatusCode::OK, json!({ "choices": [] })).await;
    let server = test_server(&chat, "http://127.0.0.1:9/speak");

    let response = server.get("/generate-description/tree-42").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let json = response.json::<Value>();
    assert_eq!(json["error"], "Failed to generate description");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generation_upstream_error_returns_500() {
    let (chat, _) = chat_upstream(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "bad key" } }),
    )
    .await;
    let server = test_server(&chat, "http://127.0.0.1:9/speak");

    let response = server.get("/generate-description/tree-42").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains("bad key"));
}

#[tokio::test]
async fn test_speak_streams_audio_with_content_type() {
    let tts = tts_upstream().await;
    let server = test_server("http://127.0.0.1:9/chat", &tts);

    let response = server
        .get("/speak")
        .add_query_param("text", "hello world")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "audio/wav");

    let expected = b"RIFFtext=hello%20world".to_vec();
    assert_eq!(response.as_bytes().to_vec(), expected);
}

#[tokio::test]
async fn test_speak_relays_upstream_status() {
    let app = Router::new().route(
        "/speak",
        get(|| async {
            (
                StatusCode::BAD_GATEWAY,
                [(header::CONTENT_TYPE, "text/plain")],
                "voice unavailable",
            )
        }),
    );
    let tts = format!("{}/speak", spawn(app).await);
    let server = test_server("http://127.0.0.1:9/chat", &tts);

    let response = server.get("/speak").add_query_param("text", "hello").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.header(header::CONTENT_TYPE), "text/plain");
    assert_eq!(response.text(), "voice unavailable");
}

#[tokio::test]
async fn test_speak_missing_text_returns_400() {
    let server = test_server("http://127.0.0.1:9/chat", "http://127.0.0.1:9/speak");

    let response = server.get("/speak").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing 'text' parameter");

    server
        .get("/speak")
        .add_query_param("text", "")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_speak_unreachable_tts_returns_500() {
    let tts = format!("{}/speak", closed_port().await);
    let server = test_server("http://127.0.0.1:9/chat", &tts);

    let response = server.get("/speak").add_query_param("text", "hello").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "Failed to get TTS audio");
}

#[tokio::test]
async fn test_bundled_fixtures_serve_pages() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/trees.json");
    let store = MemoryStore::from_json_file(&path, "trees").unwrap();
    assert_eq!(store.len(), 2);

    let state = AppState::new(
        StoreSource::Fixtures(store),
        GenerationConfig::default(),
        SpeechConfig::default(),
    )
    .unwrap();
    let server = TestServer::new(build_router(state, Path::new("static"))).unwrap();

    let html = server.get("/tree-7").await.text();
    assert!(html.contains("<h1>Neem</h1>"));
    assert!(html.contains("<dt>Landmark</dt><dd>Library lawn</dd>"));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let state = AppState::new(
        StoreSource::Fixtures(MemoryStore::new()),
        GenerationConfig::default(),
        SpeechConfig::default(),
    )
    .unwrap();
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
    let server = TestServer::new(build_router(state, &static_dir)).unwrap();

    let response = server.get("/static/style.css").await;
    response.assert_status_ok();
    assert!(response.text().contains("main.tree"));
}
