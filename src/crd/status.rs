//! # ApiEndpoints Status
//!
//! Observed synchronization state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of the ApiEndpoints resource
///
/// Records when the declaration was last merged into the partials ConfigMap
/// and the content hash of the spec that was merged. Failures are not
/// recorded here: the timestamp and hash simply stop advancing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointsStatus {
    /// Time of the last successful synchronization (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronization_timestamp: Option<String>,
    /// Content hash of the spec at the last successful synchronization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronization_hash: Option<String>,
}

impl ApiEndpointsStatus {
    /// Build the status recorded after a successful synchronization
    #[must_use]
    pub fn synchronized(hash: &str, at: DateTime<Utc>) -> Self {
        Self {
            synchronization_timestamp: Some(at.to_rfc3339()),
            synchronization_hash: Some(hash.to_string()),
        }
    }

    /// Parsed last synchronization time; `None` if never synchronized or unparsable
    #[must_use]
    pub fn last_synchronized(&self) -> Option<DateTime<Utc>> {
        self.synchronization_timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}
