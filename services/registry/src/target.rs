//! Request targets parsed from `/v2/` paths

use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, RegistryResult};

const API_PREFIX: &str = "/v2/";

/// Kind of object a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// `/v2/<name>/manifests/<reference>`
    Manifests,
    /// `/v2/<name>/blobs/<digest>`
    Blobs,
}

impl FromStr for ObjectType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manifests" => Ok(ObjectType::Manifests),
            "blobs" => Ok(ObjectType::Blobs),
            other => Err(RegistryError::UnknownObjectType(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Manifests => f.write_str("manifests"),
            ObjectType::Blobs => f.write_str("blobs"),
        }
    }
}

/// The repository, object type and reference named by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Repository name; may span several segments, e.g. `org/project/chart`
    pub name: String,
    /// Object type
    pub object: ObjectType,
    /// Tag or digest
    pub reference: String,
}

impl Target {
    /// Parse a request path such as `/v2/org/chart/manifests/latest`.
    ///
    /// The last segment is the reference, the one before it the object type,
    /// and everything between the `/v2/` prefix and those two is the name.
    pub fn parse(path: &str) -> RegistryResult<Self> {
        let rest = path.strip_prefix(API_PREFIX).unwrap_or(path);
        let segments: Vec<&str> = rest.split('/').collect();

        let [name @ .., object, reference] = segments.as_slice() else {
            return Err(RegistryError::PathTooShort(path.to_string()));
        };
        if name.is_empty() {
            return Err(RegistryError::PathTooShort(path.to_string()));
        }

        let name = name.join("/");
        validate_repository(&name)?;

        Ok(Target {
            object: object.parse()?,
            name,
            reference: reference.to_string(),
        })
    }
}

/// Validate repository name
fn validate_repository(name: &str) -> RegistryResult<()> {
    if name.split('/').any(|segment| segment.is_empty()) || name.contains("..") {
        return Err(RegistryError::InvalidRepository(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment_name() {
        let target = Target::parse("/v2/myname/manifests/latest").unwrap();
        assert_eq!(target.name, "myname");
        assert_eq!(target.object, ObjectType::Manifests);
        assert_eq!(target.reference, "latest");
    }

    #[test]
    fn test_multi_segment_name() {
        let target = Target::parse("/v2/a/b/c/manifests/v1").unwrap();
        assert_eq!(target.name, "a/b/c");
        assert_eq!(target.object, ObjectType::Manifests);
        assert_eq!(target.reference, "v1");
    }

    #[test]
    fn test_blob_target() {
        let target = Target::parse("/v2/org/chart/blobs/sha256:abc").unwrap();
        assert_eq!(target.name, "org/chart");
        assert_eq!(target.object, ObjectType::Blobs);
        assert_eq!(target.reference, "sha256:abc");
    }

    #[test]
    fn test_too_short() {
        for path in ["/v2/onlyone", "/v2/name/manifests", "/v2/"] {
            assert!(
                matches!(Target::parse(path), Err(RegistryError::PathTooShort(_))),
                "accepted {path:?}"
            );
        }
    }

    #[test]
    fn test_unknown_object_type() {
        let err = Target::parse("/v2/myname/tags/list").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownObjectType(ref t) if t == "tags"));
    }

    #[test]
    fn test_invalid_repository() {
        assert!(matches!(
            Target::parse("/v2/a//b/manifests/v1"),
            Err(RegistryError::InvalidRepository(_))
        ));
        assert!(matches!(
            Target::parse("/v2/../secret/blobs/x"),
            Err(RegistryError::InvalidRepository(_))
        ));
    }
}
