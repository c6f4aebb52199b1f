use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Result type for costing operations
pub type CostResult<T> = Result<T, CostError>;

/// Errors that can occur in the costing domain.
///
/// Only malformed input and region mismatches are errors. A SKU missing from
/// the pricing source is reported inside the estimate, never through this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CostError {
    /// Missing or malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A numeric tag supplied by the caller could not be parsed
    #[error("Invalid numeric value for tag '{key}': '{value}'")]
    InvalidNumericTag { key: String, value: String },

    /// Resource belongs to a different region than this instance serves
    #[error("Region mismatch: this instance serves '{expected}', resource is in '{actual}'")]
    RegionMismatch { expected: String, actual: String },

    /// Actual-cost window has no start and no usable creation tag
    #[error("start time required: provide an explicit start or a valid pulumi:created tag")]
    StartTimeRequired,

    /// End precedes start
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Recommendation batch exceeds the configured limit
    #[error("Batch of {size} resources exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

/// Coarse error category surfaced to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    RegionMismatch,
}

/// Structured error payload (kind + correlation id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl CostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CostError::RegionMismatch { .. } => ErrorKind::RegionMismatch,
            _ => ErrorKind::InvalidInput,
        }
    }

    /// Build the structured payload for this error, tagged with the
    /// caller's resource id when one is known.
    pub fn detail(&self, correlation_id: Option<&str>) -> ErrorDetail {
        ErrorDetail {
            kind: self.kind(),
            message: self.to_string(),
            correlation_id: correlation_id.map(str::to_string),
        }
    }
}

impl From<CostError> for tonic::Status {
    fn from(err: CostError) -> Self {
        match err.kind() {
            ErrorKind::InvalidInput => tonic::Status::invalid_argument(err.to_string()),
            ErrorKind::RegionMismatch => tonic::Status::failed_precondition(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_mismatch_is_distinct_kind() {
        let err = CostError::RegionMismatch {
            expected: "us-east-1".to_string(),
            actual: "eu-west-1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::RegionMismatch);

        let status: tonic::Status = err.into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
    }

    #[test]
    fn test_detail_carries_correlation_id() {
        let err = CostError::InvalidNumericTag {
            key: "data_processed_gb".to_string(),
            value: "lots".to_string(),
        };
        let detail = err.detail(Some("i-0abc"));

        assert_eq!(detail.kind, ErrorKind::InvalidInput);
        assert_eq!(detail.correlation_id.as_deref(), Some("i-0abc"));
        assert!(detail.message.contains("data_processed_gb"));
    }

    #[test]
    fn test_start_time_message() {
        assert!(CostError::StartTimeRequired.to_string().contains("start time required"));
        let status: tonic::Status = CostError::StartTimeRequired.into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
