use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ai_photo_poet::data_uri::ImageDataUri;
use ai_photo_poet::gateway::{
    BackendFuture, PoemBackend, PoemGenerationGateway, PoemReply, UpstreamFault,
};
use ai_photo_poet::session::SessionRegistry;
use ai_photo_poet::web::{self, AppState, MAX_PHOTO_BYTES};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const VALID: &str = "data:image/png;base64,aGVsbG8=";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

struct CountingBackend {
    poem: &'static str,
    calls: AtomicUsize,
}

impl PoemBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn compose<'a>(&'a self, _instruction: &'a str, _image: &'a ImageDataUri) -> BackendFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply: Result<PoemReply, UpstreamFault> = Ok(PoemReply::poem(self.poem));
        Box::pin(async move { reply })
    }
}

struct Harness {
    app: Router,
    backend: Arc<CountingBackend>,
}

impl Harness {
    fn new() -> Self {
        let backend = Arc::new(CountingBackend {
            poem: "Roses bloom\nin borrowed light",
            calls: AtomicUsize::new(0),
        });
        let gateway = PoemGenerationGateway::new(backend.clone(), Duration::from_secs(5));
        let sessions = SessionRegistry::new(gateway, Duration::from_secs(600), 64);
        let app = web::router(AppState {
            sessions: Arc::new(sessions),
        });
        Self { app, backend }
    }

    fn calls(&self) -> usize {
        self.backend.calls.load(Ordering::SeqCst)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn new_session(&self) -> String {
        let (status, body) = self.json(post("/api/sessions", Body::empty())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["status"], "idle");
        body["sessionId"].as_str().unwrap().to_string()
    }

    async fn submit(&self, session: &str, data_uri: &str) -> (StatusCode, Value) {
        let body = json!({ "photoDataUri": data_uri });
        self.json(post_json(&format!("/api/sessions/{session}/poem"), body))
            .await
    }
}

fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart(uri: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "poem-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn index_page_is_served() {
    let harness = Harness::new();
    let (status, _, body) = harness.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("PoemSnap"));
}

#[tokio::test]
async fn valid_data_uri_produces_poem_and_exports() {
    let harness = Harness::new();
    let session = harness.new_session().await;

    let (status, body) = harness.submit(&session, VALID).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["superseded"], false);
    assert_eq!(body["view"]["status"], "success");
    assert_eq!(body["view"]["poem"], "Roses bloom\nin borrowed light");
    assert_eq!(body["view"]["imageSrc"], VALID);

    let (_, view) = harness.json(get(&format!("/api/sessions/{session}"))).await;
    assert_eq!(view, body["view"]);

    let (status, headers, poem) = harness
        .send(get(&format!("/api/sessions/{session}/export/poem")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poem, b"Roses bloom\nin borrowed light");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"poem.txt\""
    );

    let (status, headers, image) = harness
        .send(get(&format!("/api/sessions/{session}/export/image")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image, b"hello");
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"photo.png\""
    );
}

#[tokio::test]
async fn malformed_data_uri_never_reaches_the_model() {
    let harness = Harness::new();
    let session = harness.new_session().await;

    let (status, body) = harness.submit(&session, "not-a-data-uri").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["status"], "error");
    assert_eq!(body["view"]["kind"], "invalid_format");
    assert!(body["view"].get("poem").is_none());
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn non_image_upload_is_rejected_before_generation() {
    let harness = Harness::new();
    let session = harness.new_session().await;

    let (status, body) = harness
        .json(multipart(
            &format!("/api/sessions/{session}/upload"),
            "text/plain",
            b"just text",
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Please upload a valid image file (e.g., JPG, PNG, GIF)."
    );
    assert_eq!(harness.calls(), 0);

    let (_, view) = harness.json(get(&format!("/api/sessions/{session}"))).await;
    assert_eq!(view["status"], "idle");
}

#[tokio::test]
async fn image_upload_generates_poem() {
    let harness = Harness::new();
    let session = harness.new_session().await;

    let (status, body) = harness
        .json(multipart(
            &format!("/api/sessions/{session}/upload"),
            "image/png",
            PNG_BYTES,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["status"], "success");
    assert!(body["view"]["imageSrc"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,iVBORw0KGgo"));
    assert_eq!(harness.calls(), 1);

    let (_, _, image) = harness
        .send(get(&format!("/api/sessions/{session}/export/image")))
        .await;
    assert_eq!(image, PNG_BYTES);
}

#[tokio::test]
async fn share_plan_follows_browser_capabilities() {
    let harness = Harness::new();
    let session = harness.new_session().await;
    harness.submit(&session, VALID).await;
    let share = format!("/api/sessions/{session}/share");

    let (status, plan) = harness
        .json(post_json(&share, json!({ "share": true, "shareFiles": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["steps"][0]["method"], "text_and_image");
    assert_eq!(plan["steps"][1]["method"], "clipboard");
    assert_eq!(plan["image"]["name"], "poem_snap_image.png");
    assert_eq!(plan["image"]["url"], format!("/api/sessions/{session}/export/image"));

    let (_, plan) = harness
        .json(post_json(&share, json!({ "share": true, "shareFiles": false })))
        .await;
    assert_eq!(plan["steps"][0]["method"], "text_only");
    assert_eq!(plan["steps"][0]["onSuccess"]["level"], "partial");
    assert!(plan["image"].is_null());

    let (_, plan) = harness.json(post_json(&share, json!({}))).await;
    assert_eq!(plan["steps"].as_array().unwrap().len(), 1);
    assert_eq!(plan["steps"][0]["method"], "clipboard");
    assert_eq!(plan["steps"][0]["onSuccess"]["title"], "Poem Copied");
    assert_eq!(plan["poem"], "Roses bloom\nin borrowed light");
    assert_eq!(plan["onFailure"]["title"], "Copy Failed");
}

#[tokio::test]
async fn copy_plan_is_clipboard_only() {
    let harness = Harness::new();
    let session = harness.new_session().await;
    harness.submit(&session, VALID).await;

    let (status, plan) = harness
        .json(post(&format!("/api/sessions/{session}/copy"), Body::empty()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["steps"][0]["method"], "clipboard");
    assert_eq!(plan["steps"][0]["onSuccess"]["level"], "success");
    assert_eq!(plan["poem"], "Roses bloom\nin borrowed light");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let harness = Harness::new();
    let session = harness.new_session().await;
    let mut photo = PNG_BYTES.to_vec();
    photo.resize(MAX_PHOTO_BYTES + 1, 0);

    let (status, body) = harness
        .json(multipart(
            &format!("/api/sessions/{session}/upload"),
            "image/png",
            &photo,
        ))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("10 MiB"));
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn exports_need_a_finished_poem() {
    let harness = Harness::new();
    let session = harness.new_session().await;

    let (status, _, _) = harness
        .send(get(&format!("/api/sessions/{session}/export/poem")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = harness
        .json(post_json(&format!("/api/sessions/{session}/share"), json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = harness
        .json(post(&format!("/api/sessions/{session}/copy"), Body::empty()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let harness = Harness::new();
    let (status, body) = harness
        .submit("6a2f41a3-c54c-fce8-32d2-0324e1c32e22", VALID)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("unknown session"));
}
