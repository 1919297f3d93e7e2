//! Error types for reading validation

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a reading was refused by the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    /// The reading violates a structural invariant
    #[error("invalid reading: {reason}")]
    InvalidReading { reason: String },

    /// The reading regresses relative to the previous one in the session
    #[error("out of order reading: {reason}")]
    OutOfOrderReading {
        reason: String,
        previous: DateTime<Utc>,
        received: DateTime<Utc>,
    },
}

impl TelemetryError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        TelemetryError::InvalidReading {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryError::InvalidReading { .. } => "invalid_reading",
            TelemetryError::OutOfOrderReading { .. } => "out_of_order_reading",
        }
    }

    pub fn is_out_of_order(&self) -> bool {
        matches!(self, TelemetryError::OutOfOrderReading { .. })
    }
}
