use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::TypeError;

/// Style applied when the caller does not name one.
pub const DEFAULT_STYLE: &str = "professional";

/// Identifier of a saved CV version.
///
/// The value is the creation time in milliseconds since the UNIX epoch, so
/// ids sort the same way versions were created.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// The creation instant encoded in this id.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TypeError> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(TypeError::TimestampOutOfRange(self.0))
    }
}

impl fmt::Debug for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionId({})", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidVersionId(s.to_string()))
    }
}

impl From<u64> for VersionId {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

/// Job posting reference; callers pass either a numeric or a textual id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Number(Number),
    Text(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// Descriptive metadata stored next to each CV snapshot.
///
/// Unknown keys supplied by the caller land in `extra` and are written back
/// verbatim next to the known fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl Default for VersionMetadata {
    fn default() -> Self {
        Self {
            style: default_style(),
            job_title: None,
            job_id: None,
            sections: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl VersionMetadata {
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_job_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = Some(title.into());
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a caller-defined key. Keys that collide with the typed fields
    /// are dropped by [`VersionMetadata::normalized`].
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Drop extras that shadow typed fields. Typed values, including an
    /// empty `style`, are kept as supplied.
    pub fn normalized(mut self) -> Self {
        for key in ["style", "jobTitle", "jobId", "sections"] {
            self.extra.remove(key);
        }
        self
    }
}

/// One saved CV generation result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvVersion {
    pub id: VersionId,
    #[serde(with = "crate::temporal::iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cv_content: Value,
    #[serde(default)]
    pub metadata: VersionMetadata,
}

impl CvVersion {
    /// Name under which this version is exported: `cv_{style}_{id}.json`.
    pub fn export_file_name(&self) -> String {
        format!("cv_{}_{}.json", self.metadata.style, self.id)
    }
}
