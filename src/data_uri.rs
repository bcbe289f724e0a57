//! Image data URIs (`data:image/<subtype>;base64,<payload>`).
//!
//! An [`ImageDataUri`] can only be obtained through [`validate`], so holding
//! one means the structure has already been checked.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use serde::{Serialize, Serializer};

use crate::error::ErrorKind;

const SCHEME_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";
const DEFAULT_EXTENSION: &str = "png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUri {
    raw: String,
    // byte offsets into `raw`
    subtype_end: usize,
    payload_start: usize,
}

/// Checks that `candidate` is an image data URI with a non-empty base64 payload.
pub fn validate(candidate: &str) -> Result<ImageDataUri, ErrorKind> {
    let rest = candidate
        .strip_prefix(SCHEME_PREFIX)
        .ok_or(ErrorKind::InvalidFormat)?;
    let marker = rest.find(BASE64_MARKER).ok_or(ErrorKind::InvalidFormat)?;
    let subtype = &rest[..marker];
    let payload = &rest[marker + BASE64_MARKER.len()..];

    if !is_valid_subtype(subtype) || !is_valid_payload(payload) {
        return Err(ErrorKind::InvalidFormat);
    }

    let subtype_end = SCHEME_PREFIX.len() + marker;
    Ok(ImageDataUri {
        raw: candidate.to_string(),
        subtype_end,
        payload_start: subtype_end + BASE64_MARKER.len(),
    })
}

fn is_valid_subtype(subtype: &str) -> bool {
    !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// The payload must be canonical standard base64 that actually decodes.
fn is_valid_payload(payload: &str) -> bool {
    !payload.is_empty()
        && payload.len() % 4 == 0
        && general_purpose::STANDARD.decode(payload).is_ok()
}

impl ImageDataUri {
    /// Encodes raw image bytes under the given `image/*` MIME type.
    pub fn from_image_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, ErrorKind> {
        let encoded = general_purpose::STANDARD.encode(bytes);
        validate(&format!("data:{mime_type};base64,{encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// e.g. `image/png`
    pub fn mime_type(&self) -> &str {
        &self.raw["data:".len()..self.subtype_end]
    }

    /// e.g. `png`
    pub fn subtype(&self) -> &str {
        &self.raw[SCHEME_PREFIX.len()..self.subtype_end]
    }

    pub fn payload(&self) -> &str {
        &self.raw[self.payload_start..]
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(self.payload())
    }

    /// Extension used for saved files. Structured suffixes are dropped, so
    /// `svg+xml` saves as `svg`.
    pub fn file_extension(&self) -> &str {
        match self.subtype().split('+').next() {
            Some(ext) if !ext.is_empty() => ext,
            _ => DEFAULT_EXTENSION,
        }
    }
}

impl fmt::Display for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ImageDataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
