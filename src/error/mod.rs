//! Error types for conversion and metering

use crate::codec::Format;
use crate::metering::{AccountId, PlanTier};
use std::fmt;

/// Malformed input in the declared source format
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub format: Format,
    pub message: String,
    pub location: Option<(usize, usize)>,
}

impl DecodeError {
    pub fn new(format: Format, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.location = Some((line, column));
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.format, self.message)?;
        if let Some((line, col)) = self.location {
            write!(f, " at line {}, column {}", line, col)?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

/// Valid input that cannot be expressed in the target's required shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("shape error: {message}")]
pub struct ShapeError {
    pub message: String,
}

impl ShapeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by the conversion pipeline
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("unsupported conversion: {from} to {to}")]
    UnsupportedPair { from: Format, to: Format },

    #[error("{format} encoding failed: {message}")]
    Encode { format: Format, message: String },

    #[error("input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },
}

impl ConversionError {
    pub fn decode(format: Format, message: impl Into<String>) -> Self {
        Self::Decode(DecodeError::new(format, message))
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(ShapeError::new(message))
    }

    pub fn encode(format: Format, message: impl fmt::Display) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Create a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(err) => match err.location {
                Some((line, col)) => format!(
                    "Could not read {} input at line {}, column {}: {}",
                    err.format, line, col, err.message
                ),
                None => format!("Could not read {} input: {}", err.format, err.message),
            },
            Self::Shape(err) => format!(
                "Input cannot be represented in the target format: {}",
                err.message
            ),
            Self::UnsupportedPair { from, to } => {
                let targets = from
                    .supported_targets()
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>();
                if targets.is_empty() {
                    format!("{} cannot be used as a source format", from)
                } else {
                    format!(
                        "Cannot convert {} to {}; supported targets: {}",
                        from,
                        to,
                        targets.join(", ")
                    )
                }
            }
            Self::Encode { format, message } => {
                format!("Failed to write {} output: {}", format, message)
            }
            Self::InputTooLarge { size, limit } => {
                format!("Input too large: {} bytes (limit: {} bytes)", size, limit)
            }
        }
    }
}

/// Errors raised by the quota gate and the metering ledger
#[derive(Debug, thiserror::Error)]
pub enum MeteringError {
    #[error("{plan} plan limit ({limit}/month) reached: {used} conversions used")]
    QuotaExceeded {
        plan: PlanTier,
        limit: u64,
        used: u64,
    },

    #[error("ledger write conflict for account {account}: {message}")]
    LedgerWriteConflict { account: AccountId, message: String },

    #[error("event store failure: {message}")]
    Store { message: String },
}

/// Top-level error for gated, metered conversions
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Metering(#[from] MeteringError),
}

impl ServiceError {
    /// Whether re-submitting the same request can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conversion(ConversionError::Decode(_))
                | Self::Metering(MeteringError::LedgerWriteConflict { .. })
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Conversion(err) => err.user_message(),
            Self::Metering(MeteringError::QuotaExceeded { plan, limit, .. }) => format!(
                "{} limit ({}/month) reached. Upgrade your plan or wait for next month.",
                plan, limit
            ),
            Self::Metering(err) => err.to_string(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for metering operations
pub type MeteringResult<T> = Result<T, MeteringError>;
