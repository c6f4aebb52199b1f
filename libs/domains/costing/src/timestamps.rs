//! Actual-cost window resolution and confidence classification.
//!
//! Resolution priority:
//! 1. explicit start and end
//! 2. explicit start, end defaults to now
//! 3. start from the `pulumi:created` tag, end explicit or now
//! 4. otherwise the request fails with "start time required"
//!
//! The `pulumi:modified` tag is never used as a start: the last state drift
//! says nothing about when billing began.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use strum::Display;

use crate::attributes;
use crate::error::{CostError, CostResult};

pub const CREATED_TAG: &str = "pulumi:created";
pub const MODIFIED_TAG: &str = "pulumi:modified";
pub const IMPORTED_TAG: &str = "pulumi:imported";

/// Where the resolved window came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum TimestampSource {
    #[strum(serialize = "explicit")]
    #[serde(rename = "explicit")]
    Explicit,
    #[strum(serialize = "pulumi:created")]
    #[serde(rename = "pulumi:created")]
    CreatedTag,
    #[strum(serialize = "mixed")]
    #[serde(rename = "mixed")]
    Mixed,
}

/// Resolved actual-cost window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampResolution {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: TimestampSource,
    pub is_imported: bool,
}

impl TimestampResolution {
    pub fn runtime_hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }

    pub fn is_zero_length(&self) -> bool {
        self.end == self.start
    }
}

/// How trustworthy a resolved window is for billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Explicit windows are always High. Derived windows are High for
    /// natively managed resources and Medium for imported ones. No window is Low.
    pub fn derive(resolution: Option<&TimestampResolution>) -> Self {
        match resolution {
            None => ConfidenceLevel::Low,
            Some(r) if r.source == TimestampSource::Explicit => ConfidenceLevel::High,
            Some(r) if r.is_imported => ConfidenceLevel::Medium,
            Some(_) => ConfidenceLevel::High,
        }
    }
}

fn created_at(tags: &HashMap<String, String>) -> Option<DateTime<Utc>> {
    let raw = tags.get(CREATED_TAG)?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

/// Resolve the window for an actual-cost request.
pub fn resolve_timestamps(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    tags: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> CostResult<TimestampResolution> {
    let is_imported = attributes::flag(tags, IMPORTED_TAG);

    let (start, end, source) = match (start, end) {
        (Some(start), Some(end)) => (start, end, TimestampSource::Explicit),
        (Some(start), None) => (start, now, TimestampSource::Mixed),
        (None, end) => {
            let created = created_at(tags).ok_or(CostError::StartTimeRequired)?;
            match end {
                Some(end) => (created, end, TimestampSource::Mixed),
                None => (created, now, TimestampSource::CreatedTag),
            }
        }
    };

    if end < start {
        return Err(CostError::InvalidTimeRange(format!(
            "end {} is before start {} (source: {source})",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }

    Ok(TimestampResolution {
        start,
        end,
        source,
        is_imported,
    })
}
