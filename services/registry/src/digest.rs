//! Content digests

use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

const ALGORITHM: &str = "sha256";
const HEX_LEN: usize = 64;

/// A `sha256:<hex>` content digest.
///
/// The only key into the content store. A `Digest` is always well formed:
/// the algorithm is `sha256` and the encoded part is exactly 64 lowercase
/// hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    /// Compute the digest of a payload.
    pub fn from_bytes(data: &[u8]) -> Self {
        Digest(format!("{ALGORITHM}:{}", hex::encode(Sha256::digest(data))))
    }

    /// The full `sha256:<hex>` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex-encoded part, without the algorithm prefix.
    pub fn encoded(&self) -> &str {
        &self.0[ALGORITHM.len() + 1..]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a well-formed digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest: {0:?}")]
pub struct InvalidDigest(String);

impl FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDigest(s.to_string());

        let (algorithm, encoded) = s.split_once(':').ok_or_else(invalid)?;
        if algorithm != ALGORITHM || encoded.len() != HEX_LEN {
            return Err(invalid());
        }

        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Digest(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(digest: &Digest) {
        let encoded = digest
            .as_str()
            .strip_prefix("sha256:")
            .expect("sha256 prefix");
        assert_eq!(encoded.len(), 64);
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_empty_payload_digest() {
        let digest = Digest::from_bytes(b"");
        assert_eq!(
            digest.as_str(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_well_formed(&digest);
    }

    #[test]
    fn test_digest_format() {
        for payload in [&b"a"[..], &b"Hello helm!"[..], &[0u8; 4096][..]] {
            assert_well_formed(&Digest::from_bytes(payload));
        }
    }

    #[test]
    fn test_same_bytes_same_digest() {
        assert_eq!(Digest::from_bytes(b"chart"), Digest::from_bytes(b"chart"));
        assert_ne!(Digest::from_bytes(b"chart"), Digest::from_bytes(b"chart2"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let digest = Digest::from_bytes(b"payload");
        let parsed: Digest = digest.as_str().parse().unwrap();
        assert_eq!(parsed, digest);
        assert_eq!(parsed.encoded().len(), 64);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let short = format!("sha256:{}", "0".repeat(61));
        let upper = format!("sha256:{}", "A".repeat(64));
        let other = format!("sha512:{}", "0".repeat(64));

        for bad in [
            "",
            "sha256",
            "sha256:",
            "sha256:abc",
            "nonexistent",
            short.as_str(),
            upper.as_str(),
            other.as_str(),
        ] {
            assert!(bad.parse::<Digest>().is_err(), "accepted {bad:?}");
        }
    }
}
