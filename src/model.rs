//! Core data types: issue records, categories, priority buckets and the
//! metric names that index the report.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used by the search API (`2024-01-05T00:00:00.000+0000`).
const TRACKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// An issue record as returned by the search API.
///
/// Only the fields the report reads are typed; the record is otherwise
/// opaque. `defect_age` is an annotation computed during a run and is never
/// read from or written back to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub key: Option<String>,
    pub fields: IssueFields,
    #[serde(skip)]
    pub defect_age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub priority: Option<PriorityField>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub resolutiondate: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityField {
    pub name: String,
}

impl Issue {
    /// Raw priority name, empty when the tracker sent none.
    #[must_use]
    pub fn priority_name(&self) -> &str {
        self.fields
            .priority
            .as_ref()
            .map_or("", |priority| priority.name.as_str())
    }

    #[must_use]
    pub fn bucket(&self) -> PriorityBucket {
        PriorityBucket::classify(self.priority_name())
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.fields.created.as_deref().and_then(parse_timestamp)
    }

    #[must_use]
    pub fn resolved_at(&self) -> Option<DateTime<FixedOffset>> {
        self.fields.resolutiondate.as_deref().and_then(parse_timestamp)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<FixedOffset>> {
        self.fields.updated.as_deref().and_then(parse_timestamp)
    }
}

/// Parse a tracker timestamp, accepting RFC 3339 as a fallback.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    DateTime::parse_from_str(trimmed, TRACKER_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .ok()
}

/// Top-level test classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Regression,
    Exploratory,
}

impl Category {
    pub const ALL: [Self; 2] = [Self::Regression, Self::Exploratory];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regression => "Regression",
            Self::Exploratory => "Exploratory",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority classification used for every column of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityBucket {
    Blocker,
    Critical,
    Others,
}

impl PriorityBucket {
    pub const ALL: [Self; 3] = [Self::Blocker, Self::Critical, Self::Others];

    /// Bucket a raw priority name. Anything that is not exactly `Blocker`
    /// or `Critical` lands in `Others`, for counts and ages alike.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        match name {
            "Blocker" => Self::Blocker,
            "Critical" => Self::Critical,
            _ => Self::Others,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocker => "Blocker",
            Self::Critical => "Critical",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for PriorityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog query names (keys of the configuration document).
pub mod query {
    pub const BUGS_RAISED: &str = "BugsRaised";
    pub const RESOLVED: &str = "Resolved";
    pub const FIXED: &str = "Fixed";
    pub const GERRIT_FIX: &str = "GerritFix";
    pub const NOISE: &str = "Noise";
    pub const RESOLUTION: &str = "Resolution";
    pub const RESOLVED_DEFECT: &str = "Resolved_Defect";
    pub const UNRESOLVED_DEFECT: &str = "Un-Resolved_Defect";

    /// Queries fetched for every category and bucketed into count rows.
    pub const COMMON: [&str; 6] = [BUGS_RAISED, RESOLVED, FIXED, GERRIT_FIX, NOISE, RESOLUTION];

    /// Category-agnostic defect-set queries, read from the `Regression` entry.
    pub const DEFECT_SETS: [&str; 2] = [RESOLVED_DEFECT, UNRESOLVED_DEFECT];
}

/// Report row labels.
pub mod row {
    pub const BUGS_RAISED: &str = "BugsRaised";
    pub const RESOLVED: &str = "Resolved";
    pub const FIXED: &str = "Fixed";
    pub const GERRIT_FIX: &str = "GerritFix";
    pub const NOISE: &str = "Noise";
    pub const RESOLUTION: &str = "Resolution";
    pub const NOISE_PCT: &str = "Noise%";
    pub const FIXED_PCT: &str = "Fixed%";
    pub const GERRIT_PCT: &str = "Gerrit%";
    pub const RESOLUTION_PCT: &str = "Resolution%";
    pub const RESOLVED_DEFECT: &str = "Resolved-Defect";
    pub const UNRESOLVED_DEFECT: &str = "Un-Resolved-Defect";

    /// Rows holding integer counts.
    pub const COUNTS: [&str; 6] = [BUGS_RAISED, RESOLVED, FIXED, GERRIT_FIX, NOISE, RESOLUTION];

    /// Every row in display order. `Resolution` is transient and dropped
    /// before export.
    pub const ALL: [&str; 12] = [
        BUGS_RAISED,
        RESOLVED,
        FIXED,
        GERRIT_FIX,
        NOISE,
        RESOLUTION,
        NOISE_PCT,
        FIXED_PCT,
        GERRIT_PCT,
        RESOLUTION_PCT,
        RESOLVED_DEFECT,
        UNRESOLVED_DEFECT,
    ];
}
