//! Shared error type across vumetrics crates.

use thiserror::Error;

/// Stable error codes, used as drop reasons in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// Name registered with another kind or value type.
    DuplicateMetric,
    /// Metric was never registered.
    NotFound,
    /// NaN, infinite, or negative where disallowed.
    InvalidValue,
    /// Metric name fails validation.
    InvalidName,
    /// Percentile outside 0..=100.
    InvalidPercentile,
    /// Report style not known.
    UnsupportedFormat,
    /// Router no longer accepts samples.
    Closed,
    /// Bad configuration.
    Config,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    /// String representation used in reports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateMetric => "DUPLICATE_METRIC",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::InvalidName => "INVALID_NAME",
            ErrorCode::InvalidPercentile => "INVALID_PERCENTILE",
            ErrorCode::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and harness.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric {name:?} already registered as {existing}, requested {requested}")]
    DuplicateMetric {
        name: String,
        existing: String,
        requested: String,
    },
    #[error("metric not found: {0}")]
    NotFound(String),
    #[error("invalid value {value} for metric {metric:?}: {reason}")]
    InvalidValue {
        metric: String,
        value: f64,
        reason: &'static str,
    },
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid percentile: {0}")]
    InvalidPercentile(f64),
    #[error("unsupported report style: {0}")]
    UnsupportedFormat(String),
    #[error("router closed")]
    Closed,
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricsError::DuplicateMetric { .. } => ErrorCode::DuplicateMetric,
            MetricsError::NotFound(_) => ErrorCode::NotFound,
            MetricsError::InvalidValue { .. } => ErrorCode::InvalidValue,
            MetricsError::InvalidName(_) => ErrorCode::InvalidName,
            MetricsError::InvalidPercentile(_) => ErrorCode::InvalidPercentile,
            MetricsError::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            MetricsError::Closed => ErrorCode::Closed,
            MetricsError::Config(_) => ErrorCode::Config,
            MetricsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
