use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy shared by the validator, the gateway and the exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("input is not a well-formed image data URI")]
    InvalidFormat,
    #[error("the model returned no poem")]
    EmptyResponse,
    #[error("the poem service failed or could not be reached")]
    UpstreamError,
    #[error("the result could not be saved or shared")]
    ExportFailure,
}

impl ErrorKind {
    /// Text shown to the user for a failed generation.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidFormat => "Photo must be a valid data URI for an image.",
            ErrorKind::EmptyResponse => "Failed to generate poem. The AI did not return a poem.",
            ErrorKind::UpstreamError => "An unexpected error occurred while generating the poem.",
            ErrorKind::ExportFailure => "Could not save or share the result.",
        }
    }
}

/// Local save failures. These never touch the session state.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("image payload could not be decoded: {0}")]
    Decode(#[from] base64::DecodeError),
}
