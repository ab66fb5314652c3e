//! Synthetic Helm chart content
//!
//! Every manifest served by the registry points at two blobs built here: a
//! chart descriptor (the config blob) and a packaged chart (the single layer).

use std::io::Write;

use bytes::Bytes;
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::config::ManifestMode;

const CHART_API_VERSION: &str = "v2";
const CHART_DESCRIPTION: &str = "A dynamically generated chart";
const CHART_TYPE: &str = "application";
const CHART_VERSION: &str = "0.1.0";

const README_PATH: &str = "README.md";
const README_CONTENT: &[u8] = b"Hello helm!";

/// Errors raised while building chart content.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// Encoding the descriptor failed.
    #[error("encoding chart descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// Writing the tar or gzip stream failed.
    #[error("packaging chart: {0}")]
    Archive(#[from] std::io::Error),
}

/// The `Chart.yaml`-equivalent record stored as a manifest's config blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    /// Chart API version
    pub api_version: String,
    /// Chart name
    pub name: String,
    /// Human readable description
    pub description: String,
    /// Chart type
    #[serde(rename = "type")]
    pub chart_type: String,
    /// Chart version
    pub version: String,
    /// Version of the packaged application
    pub app_version: String,
}

/// Builds chart descriptors and packages for a repository name and reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartSynthesizer {
    mode: ManifestMode,
}

impl ChartSynthesizer {
    /// Create a synthesizer for the given mode.
    pub fn new(mode: ManifestMode) -> Self {
        Self { mode }
    }

    /// The mode this synthesizer runs in.
    pub fn mode(&self) -> ManifestMode {
        self.mode
    }

    /// Build the descriptor record.
    pub fn descriptor(&self, name: &str, reference: &str) -> ChartDescriptor {
        let app_version = match self.mode {
            ManifestMode::Regenerate => Utc::now().format("%d %b %y %H:%M UTC").to_string(),
            ManifestMode::Stable => reference.to_string(),
        };

        ChartDescriptor {
            api_version: CHART_API_VERSION.to_string(),
            name: name.to_string(),
            description: CHART_DESCRIPTION.to_string(),
            chart_type: CHART_TYPE.to_string(),
            version: CHART_VERSION.to_string(),
            app_version,
        }
    }

    /// Build the descriptor and encode it as JSON.
    #[tracing::instrument(skip(self), fields(mode = ?self.mode))]
    pub fn synthesize_descriptor(
        &self,
        name: &str,
        reference: &str,
    ) -> Result<Bytes, SynthesisError> {
        let descriptor = self.descriptor(name, reference);
        Ok(serde_json::to_vec(&descriptor)?.into())
    }

    /// Build the chart package: a gzip-compressed tar holding a single
    /// `README.md`.
    #[tracing::instrument(skip(self), fields(mode = ?self.mode))]
    pub fn synthesize_package(
        &self,
        name: &str,
        reference: &str,
    ) -> Result<Bytes, SynthesisError> {
        let mtime = match self.mode {
            ManifestMode::Regenerate => u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
            ManifestMode::Stable => 0,
        };

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(README_CONTENT.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);

        let mut builder = tar::Builder::new(Vec::new());
        builder.append_data(&mut header, README_PATH, README_CONTENT)?;

        // into_inner writes the two-block trailer before handing back the buffer.
        let tarball = builder.into_inner()?;
        tracing::trace!(size = tarball.len(), "built tarball");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tarball)?;
        let package = encoder.finish()?;

        tracing::debug!(size = package.len(), "packaged chart");
        Ok(package.into())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::path::Path;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn test_descriptor_fields() {
        let synthesizer = ChartSynthesizer::new(ManifestMode::Stable);
        let json = synthesizer.synthesize_descriptor("myname", "latest").unwrap();

        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["apiVersion"], "v2");
        assert_eq!(value["name"], "myname");
        assert_eq!(value["description"], "A dynamically generated chart");
        assert_eq!(value["type"], "application");
        assert_eq!(value["version"], "0.1.0");
        assert_eq!(value["appVersion"], "latest");
    }

    #[test]
    fn test_regenerate_stamps_time() {
        let synthesizer = ChartSynthesizer::new(ManifestMode::Regenerate);
        let descriptor = synthesizer.descriptor("myname", "latest");
        assert!(descriptor.app_version.ends_with(" UTC"));
        assert_ne!(descriptor.app_version, "latest");
    }

    #[test]
    fn test_package_contents() {
        let synthesizer = ChartSynthesizer::default();
        let package = synthesizer.synthesize_package("myname", "latest").unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(&package[..]));
        let mut seen = 0;
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            seen += 1;

            assert_eq!(entry.path().unwrap(), Path::new("README.md"));
            assert!(entry.header().entry_type().is_file());
            assert_eq!(entry.header().mode().unwrap(), 0o644);

            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            assert_eq!(body, "Hello helm!");
        }
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_stable_output_is_deterministic() {
        let synthesizer = ChartSynthesizer::new(ManifestMode::Stable);

        assert_eq!(
            synthesizer.synthesize_package("org/chart", "v1").unwrap(),
            synthesizer.synthesize_package("org/chart", "v1").unwrap()
        );
        assert_eq!(
            synthesizer.synthesize_descriptor("org/chart", "v1").unwrap(),
            synthesizer.synthesize_descriptor("org/chart", "v1").unwrap()
        );
        assert_ne!(
            synthesizer.synthesize_descriptor("org/chart", "v1").unwrap(),
            synthesizer.synthesize_descriptor("org/chart", "v2").unwrap()
        );
    }
}
