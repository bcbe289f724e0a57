use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{BackendFuture, PoemBackend, PoemReply, UpstreamFault};
use crate::config::GeminiConfig;
use crate::data_uri::ImageDataUri;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` client. The key travels in a header so it
/// never shows up in a logged URL.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        }
    }

    fn endpoint(&self) -> Result<reqwest::Url, UpstreamFault> {
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        let endpoint = format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model_path
        );
        reqwest::Url::parse(&endpoint)
            .map_err(|e| UpstreamFault::Transport(format!("invalid endpoint {endpoint}: {e}")))
    }

    async fn request_poem(
        &self,
        instruction: &str,
        image: &ImageDataUri,
    ) -> Result<PoemReply, UpstreamFault> {
        let payload = request_body(instruction, image);

        info!(model = %self.model, "sending poem request to Gemini");

        let response = self
            .http
            .post(self.endpoint()?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let preview: String = body.chars().take(500).collect();
        debug!(%status, body = %preview, "Gemini response");

        if !status.is_success() {
            return Err(UpstreamFault::Status {
                status: status.as_u16(),
                message: extract_api_error(&body),
            });
        }

        parse_reply(&body)
    }
}

impl PoemBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn compose<'a>(&'a self, instruction: &'a str, image: &'a ImageDataUri) -> BackendFuture<'a> {
        Box::pin(self.request_poem(instruction, image))
    }
}

fn request_body(instruction: &str, image: &ImageDataUri) -> serde_json::Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": instruction },
                {
                    "inline_data": {
                        "mime_type": image.mime_type(),
                        "data": image.payload()
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "poem": {
                        "type": "STRING",
                        "description": "The generated poem based on the photo."
                    }
                },
                "required": ["poem"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// A response with no candidate text is an empty reply, not a fault.
fn parse_reply(body: &str) -> Result<PoemReply, UpstreamFault> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamFault::Malformed(format!("response JSON: {e}")))?;

    let text = parsed
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.iter().find_map(|part| part.text.as_deref()));

    match text {
        Some(text) => serde_json::from_str::<PoemReply>(text)
            .map_err(|e| UpstreamFault::Malformed(format!("poem JSON: {e}"))),
        None => Ok(PoemReply::default()),
    }
}

fn extract_api_error(body: &str) -> String {
    #[derive(Debug, Deserialize)]
    struct Envelope {
        error: Option<ApiError>,
    }
    #[derive(Debug, Deserialize)]
    struct ApiError {
        message: Option<String>,
        status: Option<String>,
        code: Option<i64>,
    }

    if let Ok(Envelope { error: Some(err) }) = serde_json::from_str::<Envelope>(body) {
        let message = err.message.unwrap_or_else(|| "unknown error".to_string());
        let status = err.status.unwrap_or_else(|| "unknown".to_string());
        let code = err
            .code
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".to_string());
        return format!("{} (status={}, code={})", message, status, code);
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };

    use super::*;
    use crate::data_uri;

    #[derive(Debug, Clone)]
    struct Received {
        api_key: Option<String>,
        query: Option<String>,
        body: serde_json::Value,
    }

    type Captured = Arc<Mutex<Option<Received>>>;

    async fn serve(status: StatusCode, reply: serde_json::Value) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route(
                "/v1beta/models/:call",
                post(
                    move |State(captured): State<Captured>,
                          uri: axum::http::Uri,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| {
                        let reply = reply.clone();
                        async move {
                            *captured.lock().unwrap() = Some(Received {
                                api_key: headers
                                    .get(API_KEY_HEADER)
                                    .and_then(|value| value.to_str().ok())
                                    .map(str::to_string),
                                query: uri.query().map(str::to_string),
                                body,
                            });
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1beta"), captured)
    }

    fn backend(base_url: String) -> GeminiBackend {
        GeminiBackend::new(&GeminiConfig {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url,
        })
    }

    fn image() -> ImageDataUri {
        data_uri::validate("data:image/jpeg;base64,aGVsbG8=").unwrap()
    }

    fn candidate(text: &str) -> serde_json::Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[tokio::test]
    async fn sends_inline_image_and_reads_poem() {
        let (base, captured) = serve(StatusCode::OK, candidate(r#"{"poem":"Quiet lake"}"#)).await;

        let reply = backend(base).request_poem("write", &image()).await.unwrap();
        assert_eq!(reply, PoemReply::poem("Quiet lake"));

        let received = captured.lock().unwrap().clone().unwrap();
        assert_eq!(received.api_key.as_deref(), Some("test-key"));
        assert_eq!(received.query, None);

        let body = received.body;
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "write");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "aGVsbG8=");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn error_status_is_summarized() {
        let (base, _) = serve(
            StatusCode::FORBIDDEN,
            json!({ "error": { "message": "API key invalid", "status": "PERMISSION_DENIED", "code": 403 } }),
        )
        .await;

        match backend(base).request_poem("write", &image()).await {
            Err(UpstreamFault::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key invalid (status=PERMISSION_DENIED, code=403)");
            }
            other => panic!("expected status fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_fault() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fault = backend(format!("http://{addr}/v1beta"))
            .request_poem("write", &image())
            .await
            .unwrap_err();
        assert!(matches!(fault, UpstreamFault::Transport(_)));
        assert!(!fault.to_string().contains("test-key"), "key leaked: {fault}");
    }

    #[tokio::test]
    async fn transport_fault_omits_request_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::get(format!("http://{addr}/v1beta?key=test-key"))
            .await
            .unwrap_err();
        let fault = UpstreamFault::from(err);
        assert!(!fault.to_string().contains("test-key"), "key leaked: {fault}");
    }

    #[test]
    fn missing_candidates_is_empty_reply() {
        assert_eq!(parse_reply(r#"{"candidates":[]}"#).unwrap(), PoemReply::default());
        assert_eq!(parse_reply("{}").unwrap(), PoemReply::default());
    }

    #[test]
    fn non_json_candidate_text_is_malformed() {
        let body = candidate("just some words").to_string();
        assert!(matches!(parse_reply(&body), Err(UpstreamFault::Malformed(_))));
    }

    #[test]
    fn plain_error_body_is_passed_through() {
        assert_eq!(extract_api_error("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn model_prefix_is_not_doubled() {
        let mut gemini = backend("https://example.test/v1beta/".into());
        gemini.model = "models/gemini-test".into();
        let url = gemini.endpoint().unwrap();
        assert_eq!(url.path(), "/v1beta/models/gemini-test:generateContent");
        assert_eq!(url.query(), None);
    }
}
