use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use cinesearch_core::config::{EmbeddingSettings, HttpSettings};
use cinesearch_core::error::Error;
use cinesearch_core::retry::RetryPolicy;
use cinesearch_core::traits::Embedder;
use cinesearch_embed::{FakeEmbedder, HostedEmbedder};

#[derive(Clone, Default)]
struct Mock {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    // responses served in order; the last one repeats
    script: Arc<Vec<(u16, Value)>>,
}

async fn handle(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let n = mock.calls.fetch_add(1, Ordering::SeqCst);
    mock.seen.lock().unwrap().push((headers, body));
    let (status, payload) = mock.script[n.min(mock.script.len() - 1)].clone();
    (StatusCode::from_u16(status).unwrap(), Json(payload)).into_response()
}

async fn spawn_mock(script: Vec<(u16, Value)>) -> (String, Mock) {
    let mock = Mock { script: Arc::new(script), ..Mock::default() };
    let app = Router::new().route("/models/e5", post(handle)).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/models/e5", addr), mock)
}

fn embedder(endpoint: String, dimension: Option<usize>) -> HostedEmbedder {
    let settings = EmbeddingSettings { endpoint, wait_for_model: true, dimension };
    HostedEmbedder::new(&settings, &HttpSettings::default(), "hf_test")
        .expect("client")
        .with_retry(RetryPolicy { max_retries: 2, base_delay: Duration::from_millis(1) })
}

#[tokio::test]
async fn sends_bearer_wait_header_and_inputs() {
    let (url, mock) = spawn_mock(vec![(200, json!([0.1, 0.2, 0.3, 0.4]))]).await;
    let v = embedder(url, Some(4)).embed("time travel").await.expect("embed");
    assert_eq!(v.as_slice(), &[0.1, 0.2, 0.3, 0.4]);

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers.get("authorization").unwrap(), "Bearer hf_test");
    assert_eq!(headers.get("x-wait-for-model").unwrap(), "true");
    assert_eq!(body, &json!({"inputs": "time travel"}));
}

#[tokio::test]
async fn error_object_is_a_service_error() {
    let (url, mock) = spawn_mock(vec![(400, json!({"error": "Input is invalid"}))]).await;
    let err = embedder(url, None).embed("time travel").await.expect_err("error object");
    match err {
        Error::EmbeddingService { status, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Input is invalid");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1, "client errors are not retried");
}

#[tokio::test]
async fn error_object_with_ok_status_is_still_an_error() {
    let (url, _mock) = spawn_mock(vec![(200, json!({"error": "Authorization header is invalid"}))]).await;
    let err = embedder(url, None).embed("heist").await.expect_err("shape decides");
    assert!(matches!(err, Error::EmbeddingService { status: 200, .. }));
}

#[tokio::test]
async fn loading_model_is_retried() {
    let (url, mock) = spawn_mock(vec![
        (503, json!({"error": "Model is currently loading", "estimated_time": 1.0})),
        (200, json!([[1.0, 0.0]])),
    ])
    .await;
    let v = embedder(url, Some(2)).embed("heist").await.expect("second attempt");
    assert_eq!(v.as_slice(), &[1.0, 0.0]);
    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persistent_outage_gives_up() {
    let (url, mock) = spawn_mock(vec![(502, json!({"error": "Bad gateway"}))]).await;
    let err = embedder(url, None).embed("heist").await.expect_err("outage");
    assert!(matches!(err, Error::EmbeddingService { status: 502, .. }));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let (url, _mock) = spawn_mock(vec![(200, json!([0.1, 0.2]))]).await;
    let err = embedder(url, Some(1024)).embed("heist").await.expect_err("dimension");
    assert!(matches!(err, Error::DimensionMismatch { expected: 1024, actual: 2 }));
}

#[tokio::test]
async fn invalid_text_never_reaches_the_service() {
    let (url, mock) = spawn_mock(vec![(200, json!([0.1]))]).await;
    let e = embedder(url, None);
    assert!(matches!(e.embed("").await, Err(Error::InvalidQuery(_))));
    assert!(matches!(e.embed(&"x".repeat(501)).await, Err(Error::InvalidQuery(_))));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(1024);
    let v1 = embedder.embed("hello world").await.expect("embed");
    let v2 = embedder.embed("hello world").await.expect("embed");

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    let norm: f32 = v1.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.as_slice().iter().zip(v2.as_slice()) {
        assert!((a - b).abs() <= 1e-6);
    }
}
