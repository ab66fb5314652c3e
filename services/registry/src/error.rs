//! Error types for the registry

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::chart::SynthesisError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Request path does not name a repository, object type and reference
    #[error("path must be /v2/<name>/<type>/<reference>: {0}")]
    PathTooShort(String),

    /// Invalid repository name
    #[error("invalid repository name: {0:?}")]
    InvalidRepository(String),

    /// Object type other than `manifests` or `blobs`
    #[error("unknown request type: {0}")]
    UnknownObjectType(String),

    /// Blob not found
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// Digest mismatch
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Expected digest
        expected: String,
        /// Actual digest
        actual: String,
    },

    /// Blob upload invalid
    #[error("blob upload invalid: {0}")]
    BlobUploadInvalid(String),

    /// Chart content could not be built
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// A response body could not be encoded
    #[error("encoding response: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl RegistryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::BlobNotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::PathTooShort(_)
            | RegistryError::InvalidRepository(_)
            | RegistryError::UnknownObjectType(_)
            | RegistryError::DigestMismatch { .. }
            | RegistryError::BlobUploadInvalid(_) => StatusCode::BAD_REQUEST,
            RegistryError::Synthesis(_) | RegistryError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for OCI error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::PathTooShort(_) | RegistryError::InvalidRepository(_) => "NAME_INVALID",
            RegistryError::UnknownObjectType(_) => "UNSUPPORTED",
            RegistryError::BlobNotFound(_) => "BLOB_UNKNOWN",
            RegistryError::DigestMismatch { .. } => "DIGEST_INVALID",
            RegistryError::BlobUploadInvalid(_) => "BLOB_UPLOAD_INVALID",
            RegistryError::Synthesis(_) | RegistryError::Encoding(_) => "UNKNOWN",
        }
    }

    fn detail(&self) -> Option<serde_json::Value> {
        match self {
            RegistryError::DigestMismatch { expected, actual } => Some(serde_json::json!({
                "expected": expected,
                "actual": actual,
            })),
            _ => None,
        }
    }
}

/// OCI error response format
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, serde::Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "rejected request");
            self.to_string()
        };

        let body = ErrorResponse {
            errors: vec![ErrorDetail {
                code,
                message,
                detail: self.detail(),
            }],
        };

        (status, axum::Json(body)).into_response()
    }
}
