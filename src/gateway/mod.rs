//! The outbound poem-generation call.
//!
//! [`PoemGenerationGateway`] turns whatever the model service does into a
//! [`GenerationResult`]; the wire details live behind [`PoemBackend`].

pub mod gemini;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data_uri::{self, ImageDataUri};
use crate::error::ErrorKind;
use crate::session::{GenerationResult, PoemSuccess};

pub use gemini::GeminiBackend;

pub const POEM_INSTRUCTION: &str = "You are a poet laureate, skilled at interpreting images and creating evocative poetry.\n\nBased on the visual elements and mood of the following photo, write a short poem.";

/// Structured reply expected from the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemReply {
    #[serde(default)]
    pub poem: Option<String>,
}

impl PoemReply {
    pub fn poem(text: impl Into<String>) -> Self {
        Self {
            poem: Some(text.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamFault {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for UpstreamFault {
    fn from(err: reqwest::Error) -> Self {
        UpstreamFault::Transport(err.without_url().to_string())
    }
}

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<PoemReply, UpstreamFault>> + Send + 'a>>;

/// A hosted model able to write a poem about an image.
pub trait PoemBackend: Send + Sync {
    fn name(&self) -> &str;

    fn compose<'a>(&'a self, instruction: &'a str, image: &'a ImageDataUri) -> BackendFuture<'a>;
}

#[derive(Clone)]
pub struct PoemGenerationGateway {
    backend: Arc<dyn PoemBackend>,
    timeout: Duration,
}

impl PoemGenerationGateway {
    pub fn new(backend: Arc<dyn PoemBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Performs exactly one backend call. Failure messages here are
    /// diagnostic; the session controller picks the user-facing text.
    pub async fn generate(&self, image: &ImageDataUri) -> GenerationResult {
        let image = match data_uri::validate(image.as_str()) {
            Ok(image) => image,
            Err(kind) => return GenerationResult::failure(kind, "image failed revalidation"),
        };

        debug!(
            backend = self.backend.name(),
            mime = image.mime_type(),
            payload_len = image.payload().len(),
            "requesting poem"
        );

        let reply = match tokio::time::timeout(
            self.timeout,
            self.backend.compose(POEM_INSTRUCTION, &image),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(fault)) => {
                warn!(backend = self.backend.name(), error = %fault, "poem request failed");
                return GenerationResult::failure(ErrorKind::UpstreamError, fault.to_string());
            }
            Err(_) => {
                let fault = UpstreamFault::Timeout(self.timeout);
                warn!(backend = self.backend.name(), error = %fault, "poem request timed out");
                return GenerationResult::failure(ErrorKind::UpstreamError, fault.to_string());
            }
        };

        match reply.poem {
            Some(poem) if !poem.trim().is_empty() => {
                GenerationResult::Success(PoemSuccess { poem, image })
            }
            _ => {
                warn!(backend = self.backend.name(), "model returned no poem");
                GenerationResult::failure(ErrorKind::EmptyResponse, "response had no poem text")
            }
        }
    }
}
