use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::data_uri::ImageDataUri;
use crate::error::ErrorKind;

/// Per-session identifier of one generation attempt. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn next(self) -> Self {
        RequestId(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One submitted input, alive for a single generation attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub id: RequestId,
    pub raw_input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoemSuccess {
    pub poem: String,
    pub image: ImageDataUri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(PoemSuccess),
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        GenerationResult::Failure(GenerationFailure::new(kind, message))
    }
}

/// The single current value of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading { request: RequestId },
    Success(Arc<PoemSuccess>),
    Error(GenerationFailure),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }

    pub fn success(&self) -> Option<&Arc<PoemSuccess>> {
        match self {
            SessionState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            SessionState::Error(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading { .. } => "loading",
            SessionState::Success(_) => "success",
            SessionState::Error(_) => "error",
        }
    }
}
