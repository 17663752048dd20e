//! # Content Hash
//!
//! Fingerprint of the desired state of an ApiEndpoints. Only the spec is
//! hashed, so status writes and metadata churn never look like a change.

use crate::crd::ApiEndpointsSpec;
use crate::Error;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the JSON encoding of the spec
///
/// Struct fields serialize in declaration order, so equal specs always
/// produce equal bytes.
pub fn content_hash(spec: &ApiEndpointsSpec) -> Result<String, Error> {
    let bytes = serde_json::to_vec(spec)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
