//! Request bodies the pipeline can replay.

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// Body of an outbound API request.
///
/// Cloning is cheap (`Bytes`), which lets the pipeline replay a request
/// after a token refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ApiBody {
    /// No body.
    #[default]
    Empty,
    /// A serialized JSON document.
    Json(Bytes),
    /// A pre-encoded multipart form. `content_type` carries the boundary.
    Multipart {
        /// Full `multipart/form-data; boundary=...` value.
        content_type: String,
        /// Encoded form.
        bytes: Bytes,
    },
}

impl ApiBody {
    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(Bytes::from(serde_json::to_vec(value)?)))
    }

    /// Wrap an already encoded multipart form.
    pub fn multipart(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Multipart {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns `true` for multipart bodies.
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    /// Payload bytes, if any.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Empty => None,
            Self::Json(bytes) | Self::Multipart { bytes, .. } => Some(bytes),
        }
    }
}
