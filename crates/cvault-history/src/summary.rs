use chrono::{DateTime, Utc};
use cvault_types::{relative_age, to_iso_millis, CvVersion, VersionId};
use serde::{Deserialize, Serialize};

/// Title shown for versions generated without a job target.
pub const DEFAULT_JOB_TITLE: &str = "General CV";

/// Lightweight projection of a version for history listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: VersionId,
    pub timestamp: String,
    pub relative_age: String,
    pub style: String,
    pub job_title: String,
    pub sections_count: usize,
}

impl VersionSummary {
    pub fn from_version(version: &CvVersion, now: DateTime<Utc>) -> Self {
        Self {
            id: version.id,
            timestamp: to_iso_millis(&version.timestamp),
            relative_age: relative_age(version.timestamp, now),
            style: version.metadata.style.clone(),
            job_title: version
                .metadata
                .job_title
                .clone()
                .unwrap_or_else(|| DEFAULT_JOB_TITLE.to_string()),
            sections_count: version.metadata.sections.len(),
        }
    }
}

/// Footprint of the persisted history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_versions: usize,
    pub max_versions: usize,
    /// Size of the obfuscated stored string in KiB, two decimals.
    #[serde(rename = "storageUsedKB")]
    pub storage_used_kb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_timestamp: Option<String>,
}

impl StorageStats {
    pub(crate) fn compute(versions: &[CvVersion], max_versions: usize, stored_len: usize) -> Self {
        Self {
            total_versions: versions.len(),
            max_versions,
            storage_used_kb: kib_two_decimals(stored_len),
            oldest_timestamp: versions.last().map(|v| to_iso_millis(&v.timestamp)),
            newest_timestamp: versions.first().map(|v| to_iso_millis(&v.timestamp)),
        }
    }
}

/// `len / 1024` with two decimals, halves rounded up.
fn kib_two_decimals(len: usize) -> String {
    let hundredths = (len as u128 * 100 + 512) / 1024;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
