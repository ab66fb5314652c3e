//! Manifest operations for the registry

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::api::{DOCKER_CONTENT_DIGEST, Registry};
use crate::digest::Digest;
use crate::error::RegistryResult;

/// Media type of the manifests served by the registry.
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type of a Helm chart config blob.
pub const HELM_CONFIG_MEDIA_TYPE: &str = "application/vnd.cncf.helm.config.v1+json";

/// Media type of a Helm chart content layer.
pub const HELM_CHART_CONTENT_MEDIA_TYPE: &str =
    "application/vnd.cncf.helm.chart.content.v1.tar+gzip";

/// A reference from a manifest to a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced blob
    pub media_type: String,
    /// Digest of the referenced blob
    pub digest: String,
    /// Size of the referenced blob in bytes
    pub size: u64,
}

impl Descriptor {
    fn new(media_type: &str, digest: &Digest, size: usize) -> Self {
        Self {
            media_type: media_type.to_string(),
            digest: digest.to_string(),
            size: size as u64,
        }
    }
}

/// An OCI image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Always 2
    pub schema_version: u32,
    /// The config blob
    pub config: Descriptor,
    /// Layer blobs, in order
    pub layers: Vec<Descriptor>,
}

/// Synthesize a chart for `name`, store its blobs and respond with the
/// manifest that references them.
#[tracing::instrument(skip(registry))]
pub(crate) async fn get_manifest(
    registry: &Registry,
    name: &str,
    reference: &str,
) -> RegistryResult<Response> {
    let synthesizer = registry.synthesizer();

    // Both blobs are built before either is stored, so a failure leaves the
    // store untouched.
    let chart = synthesizer.synthesize_descriptor(name, reference)?;
    let package = synthesizer.synthesize_package(name, reference)?;
    let (chart_size, package_size) = (chart.len(), package.len());

    let store = registry.store();
    let config_digest = store.put(chart).await;
    let layer_digest = store.put(package).await;

    let manifest = Manifest {
        schema_version: 2,
        config: Descriptor::new(HELM_CONFIG_MEDIA_TYPE, &config_digest, chart_size),
        layers: vec![Descriptor::new(
            HELM_CHART_CONTENT_MEDIA_TYPE,
            &layer_digest,
            package_size,
        )],
    };

    tracing::debug!(config = %config_digest, layer = %layer_digest, "synthesized manifest");

    let body = serde_json::to_vec(&manifest)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, OCI_MANIFEST_MEDIA_TYPE.to_string()),
            (DOCKER_CONTENT_DIGEST, config_digest.to_string()),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let config = Digest::from_bytes(b"config");
        let layer = Digest::from_bytes(b"layer");
        let manifest = Manifest {
            schema_version: 2,
            config: Descriptor::new(HELM_CONFIG_MEDIA_TYPE, &config, 6),
            layers: vec![Descriptor::new(HELM_CHART_CONTENT_MEDIA_TYPE, &layer, 5)],
        };

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "schemaVersion": 2,
                "config": {
                    "mediaType": "application/vnd.cncf.helm.config.v1+json",
                    "digest": config.to_string(),
                    "size": 6
                },
                "layers": [{
                    "mediaType": "application/vnd.cncf.helm.chart.content.v1.tar+gzip",
                    "digest": layer.to_string(),
                    "size": 5
                }]
            })
        );
    }
}
