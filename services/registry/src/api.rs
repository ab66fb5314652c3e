//! API server builder and request dispatcher

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::any;
use serde::Deserialize;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::chart::ChartSynthesizer;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::store::{ArcStore, MemoryStore};
use crate::target::{ObjectType, Target};

pub(crate) const DOCKER_CONTENT_DIGEST: HeaderName =
    HeaderName::from_static("docker-content-digest");

/// Shared state handed to every request.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    store: ArcStore,
    synthesizer: ChartSynthesizer,
    config: Arc<RegistryConfig>,
}

impl Registry {
    pub(crate) fn store(&self) -> &ArcStore {
        &self.store
    }

    pub(crate) fn synthesizer(&self) -> &ChartSynthesizer {
        &self.synthesizer
    }

    pub(crate) fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

/// Registry builder for configuring and creating the registry service
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    store: Option<ArcStore>,
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// Create a new registry builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content store. Defaults to an empty [`MemoryStore`].
    pub fn store(mut self, store: ArcStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the registry configuration
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the registry service
    ///
    /// Returns a Router that can be served with any tower-compatible server
    pub fn build(self) -> Router {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as ArcStore);
        let timeout = self.config.timeout();

        tracing::debug!(
            store = store.name(),
            mode = ?self.config.manifest_mode,
            verify_uploads = self.config.verify_uploads,
            "building registry"
        );

        let registry = Registry {
            store,
            synthesizer: ChartSynthesizer::new(self.config.manifest_mode),
            config: Arc::new(self.config),
        };

        let router = Router::new()
            .route("/v2", any(dispatch))
            .route("/v2/", any(dispatch))
            .route("/v2/{*path}", any(dispatch))
            .with_state(registry)
            .layer(TraceLayer::new_for_http());

        match timeout {
            Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
            None => router,
        }
    }
}

/// What a request asks the registry to do.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    StartUpload,
    CompleteUpload,
    Probe,
    VersionCheck,
    Resolve(Target),
}

/// Classify a request by method, then by path shape.
fn classify(method: &Method, path: &str) -> RegistryResult<Action> {
    match *method {
        Method::POST => Ok(Action::StartUpload),
        Method::PUT => Ok(Action::CompleteUpload),
        Method::HEAD => Ok(Action::Probe),
        _ if matches!(path, "/v2" | "/v2/") => Ok(Action::VersionCheck),
        _ => Target::parse(path).map(Action::Resolve),
    }
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    digest: Option<String>,
}

/// Single entry point for every `/v2/` request.
#[tracing::instrument(skip_all, fields(%method, path = uri.path()))]
async fn dispatch(
    State(registry): State<Registry>,
    method: Method,
    uri: Uri,
    body: Body,
) -> RegistryResult<Response> {
    match classify(&method, uri.path())? {
        Action::StartUpload => Ok(crate::blob::start_blob_upload(&registry)),
        Action::CompleteUpload => {
            let Query(params) = Query::<UploadParams>::try_from_uri(&uri)
                .map_err(|err| RegistryError::BlobUploadInvalid(err.body_text()))?;
            crate::blob::complete_blob_upload(&registry, params.digest, body).await
        }
        Action::Probe => Ok(StatusCode::OK.into_response()),
        Action::VersionCheck => Ok(api_version_check().into_response()),
        Action::Resolve(target) => match target.object {
            ObjectType::Manifests => {
                crate::manifest::get_manifest(&registry, &target.name, &target.reference).await
            }
            ObjectType::Blobs => {
                crate::blob::get_blob(&registry, &target.name, &target.reference).await
            }
        },
    }
}

/// API version check endpoint
///
/// Returns 200 OK to indicate the registry is available
fn api_version_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let _registry = RegistryBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .config(RegistryConfig::default())
            .build();
    }

    #[test]
    fn test_classify_by_method_first() {
        // Upload verbs win regardless of path shape.
        assert_eq!(
            classify(&Method::POST, "/v2/onlyone").unwrap(),
            Action::StartUpload
        );
        assert_eq!(
            classify(&Method::PUT, "/v2/name/blobs/uploads/x").unwrap(),
            Action::CompleteUpload
        );
        assert_eq!(
            classify(&Method::HEAD, "/v2/whatever/tags/list").unwrap(),
            Action::Probe
        );
    }

    #[test]
    fn test_classify_get() {
        assert_eq!(classify(&Method::GET, "/v2/").unwrap(), Action::VersionCheck);

        let Action::Resolve(target) = classify(&Method::GET, "/v2/a/b/c/manifests/v1").unwrap()
        else {
            panic!("expected a resolve action");
        };
        assert_eq!(target.name, "a/b/c");
        assert_eq!(target.object, ObjectType::Manifests);
        assert_eq!(target.reference, "v1");

        assert!(matches!(
            classify(&Method::GET, "/v2/onlyone"),
            Err(RegistryError::PathTooShort(_))
        ));
    }
}
