//! Blob operations for the registry

use axum::body::Body;
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::api::{DOCKER_CONTENT_DIGEST, Registry};
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};

const DOCKER_UPLOAD_UUID: HeaderName = HeaderName::from_static("docker-upload-uuid");

/// Get a blob
///
/// A reference that is not a well-formed digest can never have been stored,
/// so it is reported the same way as any other unknown blob.
#[tracing::instrument(skip(registry))]
pub(crate) async fn get_blob(
    registry: &Registry,
    name: &str,
    reference: &str,
) -> RegistryResult<Response> {
    let digest: Digest = reference
        .parse()
        .map_err(|_| RegistryError::BlobNotFound(reference.to_string()))?;

    let data = registry
        .store()
        .get(&digest)
        .await
        .ok_or_else(|| RegistryError::BlobNotFound(reference.to_string()))?;

    tracing::debug!(size = data.len(), "serving blob");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (DOCKER_CONTENT_DIGEST, digest.to_string()),
        ],
        data,
    )
        .into_response())
}

/// Start a blob upload session
pub(crate) fn start_blob_upload(registry: &Registry) -> Response {
    let uuid = uuid::Uuid::new_v4().to_string();
    let location = format!("{}/v2/blobs/put/{}", registry.config().base_url(), uuid);

    tracing::debug!(%uuid, "started blob upload");

    (
        StatusCode::ACCEPTED,
        [
            (header::LOCATION, location),
            (header::RANGE, "0-0".to_string()),
            (DOCKER_UPLOAD_UUID, uuid),
        ],
    )
        .into_response()
}

/// Complete a blob upload
///
/// The body is always drained and stored under its computed digest. The
/// response echoes the digest the client supplied, or the computed one when
/// none was given.
#[tracing::instrument(skip(registry, body))]
pub(crate) async fn complete_blob_upload(
    registry: &Registry,
    supplied: Option<String>,
    body: Body,
) -> RegistryResult<Response> {
    let data = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|err| RegistryError::BlobUploadInvalid(err.to_string()))?;

    if registry.config().verify_uploads {
        let computed = Digest::from_bytes(&data);
        if let Some(expected) = supplied.as_deref().filter(|s| *s != computed.as_str()) {
            return Err(RegistryError::DigestMismatch {
                expected: expected.to_string(),
                actual: computed.to_string(),
            });
        }
    }

    let size = data.len();
    let stored = registry.store().put(data).await;
    tracing::debug!(%stored, size, "completed blob upload");

    let digest = supplied.unwrap_or_else(|| stored.to_string());
    let location = format!("{}/v2/blobs/{}", registry.config().base_url(), digest);

    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, location),
            (DOCKER_CONTENT_DIGEST, digest),
        ],
    )
        .into_response())
}
