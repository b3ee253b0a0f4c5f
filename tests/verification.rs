//! End-to-end tests against a mock verification service.
//!
//! Each test spawns an axum server on a random port that records the
//! multipart parts it receives and answers with scripted responses.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use face_verify::acquisition::{ImageSlot, Role, StillCamera};
use face_verify::client::{Started, SubmissionMetrics, VerificationClient, VerificationScreen};
use face_verify::common::config::{CameraConfig, ServiceConfig};
use face_verify::presentation::{render_faces, render_status, render_timer};
use face_verify::{CapturedImage, VerificationRequest, VerificationResult};

const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0xFF, 0xD9,
];
const FACE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct MockService {
    /// Scripted answers; the last one repeats once the queue is down to one.
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    delay: Duration,
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

impl MockService {
    fn answering(responses: Vec<(StatusCode, Value)>) -> Self {
        Self::answering_raw(
            responses
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect(),
        )
    }

    fn answering_raw(responses: Vec<(StatusCode, String)>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn requests(&self) -> Vec<Vec<ReceivedPart>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn verify_handler(
    State(mock): State<MockService>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        parts.push(ReceivedPart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.unwrap().to_vec(),
        });
    }
    mock.requests.lock().unwrap().push(parts);

    tokio::time::sleep(mock.delay).await;

    let mut responses = mock.responses.lock().unwrap();
    if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().cloned().unwrap()
    }
}

/// Spawns the mock on an available port and returns the base URL.
async fn spawn_service(mock: MockService) -> String {
    let app = Router::new()
        .route("/api/v1/verify", post(verify_handler))
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Accepts one connection and never answers. Reports how many request
/// bytes arrived once the client hangs up.
async fn spawn_silent_service() -> (String, oneshot::Receiver<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (hung_up_tx, hung_up_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = 0;
        let mut buf = [0u8; 4096];
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => received += n,
            }
        }
        let _ = hung_up_tx.send(received);
    });

    (format!("http://{}", addr), hung_up_rx)
}

fn client_for(base_url: &str) -> Arc<VerificationClient> {
    Arc::new(VerificationClient::new(&ServiceConfig::with_base_url(base_url)).unwrap())
}

fn ready_screen(base_url: &str) -> VerificationScreen {
    ready_screen_with(client_for(base_url))
}

fn ready_screen_with(client: Arc<VerificationClient>) -> VerificationScreen {
    let mut screen = VerificationScreen::new(
        client,
        ImageSlot::new(Role::Document),
        ImageSlot::new(Role::Live),
    );
    screen
        .slot_mut(Role::Document)
        .set(CapturedImage::data_uri("image/jpeg", b"document"));
    screen
        .slot_mut(Role::Live)
        .set(CapturedImage::data_uri("image/jpeg", b"live"));
    screen
}

#[tokio::test]
async fn test_verified_match_without_faces() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.92, "message": "match" }),
    )]);
    let base_url = spawn_service(mock.clone()).await;
    let mut screen = ready_screen(&base_url);

    let result = screen.verify().await.unwrap();
    assert!(result.is_success());

    let view = screen.view();
    assert_eq!(
        render_status(view).unwrap(),
        "✓ Face Match Verified\nConfidence Score: 92.00%\nmatch"
    );
    assert!(render_faces(view).is_none());
    assert!(render_timer(view)
        .unwrap()
        .starts_with("Verification completed in: "));

    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_negative_confidence_is_a_no_match() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": false, "confidence": -0.08, "message": "Faces do not match" }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    let result = screen.verify().await.unwrap();
    assert_eq!(result.outcome().map(|o| o.confidence), Some(-0.08));

    let view = screen.view();
    assert!(view.error.is_none());
    assert_eq!(
        render_status(view).unwrap(),
        "✗ No Face Match\nConfidence Score: -8.00%\nFaces do not match"
    );
}

#[tokio::test]
async fn test_service_error_detail_is_shown() {
    let mock = MockService::answering(vec![(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "model unavailable" }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    let result = screen.verify().await.unwrap();
    assert_eq!(result.error_message(), Some("model unavailable"));

    let view = screen.view();
    assert!(view.result.is_none());
    assert_eq!(render_status(view).unwrap(), "✗ model unavailable");
    assert!(view.elapsed.is_some());
}

#[tokio::test]
async fn test_not_verified_with_extracted_faces() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({
            "verified": false,
            "confidence": 0.12,
            "faces": { "id_face": FACE, "live_face": FACE }
        }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    screen.verify().await.unwrap();

    let view = screen.view();
    assert!(render_status(view).unwrap().starts_with("✗ No Face Match"));
    let faces = render_faces(view).unwrap();
    assert!(faces.contains("Extracted ID Face"));
    assert!(faces.contains("Extracted Live Face"));
}

#[tokio::test]
async fn test_partial_faces_render_nothing() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({
            "verified": true,
            "confidence": 0.8,
            "faces": { "id_face": FACE, "live_face": "" }
        }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    screen.verify().await.unwrap();
    assert!(screen.view().faces.is_none());
    assert!(render_faces(screen.view()).is_none());
}

#[tokio::test]
async fn test_error_without_detail_uses_fallback() {
    let mock = MockService::answering_raw(vec![(
        StatusCode::BAD_GATEWAY,
        "<html>bad gateway</html>".to_string(),
    )]);
    let base_url = spawn_service(mock).await;
    let client = client_for(&base_url);

    let request = VerificationRequest {
        document: CapturedImage::data_uri("image/jpeg", b"a"),
        live: CapturedImage::data_uri("image/jpeg", b"b"),
    };
    let result = client.verify(&request).await;
    assert_eq!(result.error_message(), Some("Verification failed"));
}

#[tokio::test]
async fn test_malformed_success_body_is_failure() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": "probably", "confidence": 0.5 }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    let result = screen.verify().await.unwrap();
    assert_eq!(
        result.error_message(),
        Some("Verification failed: unexpected response from service")
    );
    assert!(screen.view().result.is_none());
}

#[tokio::test]
async fn test_multipart_carries_exact_file_bytes() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.5, "message": "ok" }),
    )]);
    let base_url = spawn_service(mock.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let id_path = dir.path().join("passport.jpg");
    std::fs::write(&id_path, JPEG_BYTES).unwrap();

    let mut screen = VerificationScreen::new(
        client_for(&base_url),
        ImageSlot::new(Role::Document),
        ImageSlot::with_camera(
            Role::Live,
            Box::new(StillCamera::new(image::RgbImage::new(16, 16))),
            &CameraConfig::default(),
        ),
    );
    screen.slot_mut(Role::Document).upload(&id_path).await.unwrap();
    screen.slot_mut(Role::Live).capture().unwrap().unwrap();

    screen.verify().await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let parts = &requests[0];
    assert_eq!(parts.len(), 2);

    let id_part = parts.iter().find(|p| p.name == "id_image").unwrap();
    assert_eq!(id_part.bytes, JPEG_BYTES);
    assert_eq!(id_part.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(id_part.file_name.as_deref(), Some("image.jpg"));

    let live_part = parts.iter().find(|p| p.name == "live_image").unwrap();
    assert!(image::load_from_memory(&live_part.bytes).is_ok());
}

#[tokio::test]
async fn test_blob_part_passes_through() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.5 }),
    )]);
    let base_url = spawn_service(mock.clone()).await;
    let client = client_for(&base_url);

    let request = VerificationRequest {
        document: CapturedImage::blob("image/png", "scan.png", b"png-bytes".to_vec()),
        live: CapturedImage::data_uri("image/jpeg", JPEG_BYTES),
    };
    assert!(client.verify(&request).await.is_success());

    let parts = &mock.requests()[0];
    let id_part = parts.iter().find(|p| p.name == "id_image").unwrap();
    assert_eq!(id_part.file_name.as_deref(), Some("scan.png"));
    assert_eq!(id_part.content_type.as_deref(), Some("image/png"));
    assert_eq!(id_part.bytes, b"png-bytes");
}

#[tokio::test]
async fn test_failure_clears_previous_success() {
    let mock = MockService::answering(vec![
        (
            StatusCode::OK,
            json!({
                "verified": true,
                "confidence": 0.95,
                "faces": { "id_face": FACE, "live_face": FACE }
            }),
        ),
        (StatusCode::BAD_REQUEST, json!({ "detail": "No face detected in ID image" })),
    ]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    screen.verify().await.unwrap();
    assert!(screen.view().result.is_some());
    assert!(screen.view().faces.is_some());

    screen.verify().await.unwrap();
    let view = screen.view();
    assert!(view.result.is_none());
    assert!(view.faces.is_none());
    assert_eq!(view.error.as_deref(), Some("No face detected in ID image"));
}

#[tokio::test]
async fn test_single_submission_in_flight() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.7 }),
    )])
    .with_delay(Duration::from_millis(200));
    let base_url = spawn_service(mock.clone()).await;
    let mut screen = ready_screen(&base_url);

    assert_eq!(screen.start_verification(), Started::Submitted);
    assert!(!screen.can_verify());
    assert!(screen.view().loading);
    assert_eq!(render_status(screen.view()).unwrap(), "Verifying faces...");
    assert_eq!(render_timer(screen.view()).unwrap(), "Processing...");

    assert_eq!(screen.start_verification(), Started::Busy);

    let result = screen.finish_verification().await.unwrap();
    assert!(result.is_success());
    assert!(screen.can_verify());
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_cancel_discards_pending_result() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.7 }),
    )])
    .with_delay(Duration::from_secs(2));
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    assert_eq!(screen.start_verification(), Started::Submitted);
    tokio::time::sleep(Duration::from_millis(50)).await;
    screen.cancel();

    assert!(!screen.is_busy());
    assert!(!screen.view().loading);
    assert!(screen.view().result.is_none());
    assert!(screen.finish_verification().await.is_none());
    assert!(screen.can_verify());
}

#[tokio::test]
async fn test_metrics_record_each_submission() {
    let mock = MockService::answering(vec![
        (StatusCode::OK, json!({ "verified": true, "confidence": 0.9 })),
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "detail": "busy" })),
    ]);
    let base_url = spawn_service(mock).await;
    let metrics = Arc::new(Mutex::new(SubmissionMetrics::new("Kiosk".to_string())));
    let mut screen = ready_screen(&base_url).with_metrics(metrics.clone());

    let first = screen.verify().await.unwrap();
    let second = screen.verify().await.unwrap();
    assert!(matches!(first, VerificationResult::Success(_)));
    assert!(matches!(second, VerificationResult::Failure { .. }));

    let stats = metrics.lock().unwrap().aggregate();
    assert_eq!(stats.total_submissions, 2);
    assert_eq!(stats.verified, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failure_reasons.get("busy"), Some(&1));
}

#[tokio::test]
async fn test_elapsed_ends_when_the_call_resolves() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.9 }),
    )]);
    let base_url = spawn_service(mock).await;
    let mut screen = ready_screen(&base_url);

    assert_eq!(screen.start_verification(), Started::Submitted);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let result = screen.finish_verification().await.unwrap();
    assert!(result.is_success());

    let elapsed = screen.view().elapsed.unwrap();
    assert!(elapsed < Duration::from_secs(1), "elapsed was {:?}", elapsed);
}

#[tokio::test]
async fn test_dropping_screen_abandons_request() {
    let (base_url, hung_up) = spawn_silent_service().await;
    let client = client_for(&base_url);
    let mut screen = ready_screen_with(client.clone());

    assert_eq!(screen.start_verification(), Started::Submitted);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(Arc::strong_count(&client), 3);

    drop(screen);

    let received = tokio::time::timeout(Duration::from_secs(5), hung_up)
        .await
        .expect("request connection was not closed")
        .unwrap();
    assert!(received > 0);
    assert_eq!(Arc::strong_count(&client), 1);
}

#[tokio::test]
async fn test_configured_timeout_is_generic_failure() {
    let mock = MockService::answering(vec![(
        StatusCode::OK,
        json!({ "verified": true, "confidence": 0.9 }),
    )])
    .with_delay(Duration::from_secs(3));
    let base_url = spawn_service(mock).await;
    let config = ServiceConfig {
        timeout_secs: Some(1),
        ..ServiceConfig::with_base_url(base_url)
    };
    let mut screen = ready_screen_with(Arc::new(VerificationClient::new(&config).unwrap()));

    let result = screen.verify().await.unwrap();
    assert_eq!(result.error_message(), Some("Verification failed"));

    let view = screen.view();
    assert_eq!(view.error.as_deref(), Some("Verification failed"));
    assert!(view.elapsed.unwrap() < Duration::from_secs(3));
}
