//! Registry configuration

use std::net::SocketAddr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// How manifests are synthesized across repeated requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestMode {
    /// Every request builds fresh content stamped with the current time, so
    /// the digests change on each call.
    #[default]
    Regenerate,

    /// Content is a pure function of the repository name and reference, so
    /// repeated requests resolve to the same digests.
    Stable,
}

/// Configuration for the registry service and server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Address the server listens on.
    pub bind: SocketAddr,

    /// Base URL used when building `Location` headers.
    pub public_url: String,

    /// Manifest synthesis mode.
    pub manifest_mode: ManifestMode,

    /// Reject blob uploads whose supplied digest does not match the body.
    pub verify_uploads: bool,

    /// Per-request timeout in seconds. Zero disables the timeout.
    pub request_timeout: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            public_url: "http://localhost:5000".to_string(),
            manifest_mode: ManifestMode::default(),
            verify_uploads: false,
            request_timeout: 30,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading config from {path}")]
    Io {
        /// Path of the config file
        path: Utf8PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration.
    #[error("parsing config from {path}")]
    Parse {
        /// Path of the config file
        path: Utf8PathBuf,
        /// Underlying error
        #[source]
        source: toml_edit::de::Error,
    },
}

impl RegistryConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml(document: &str) -> Result<Self, toml_edit::de::Error> {
        toml_edit::de::from_str(document)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::from_toml(&document).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }

    /// `public_url` without any trailing slash.
    pub(crate) fn base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}
