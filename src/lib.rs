//! Data format converter
//!
//! Converts tabular and structured data between CSV, JSON, XML, YAML,
//! SQL INSERT statements and XLSX spreadsheets through a shared value model,
//! and meters conversions per account against monthly plan quotas.

pub mod cli;
pub mod codec;
pub mod conversion;
pub mod error;
pub mod metering;
pub mod service;
pub mod value;

// Re-export commonly used types
pub use codec::{supported_pairs, ConversionKind, Format};
pub use conversion::{ConversionConfig, ConversionEngine, ConvertedData};
pub use error::{
    ConversionError, ConversionResult, DecodeError, MeteringError, ServiceError, ShapeError,
};
pub use metering::{Account, AccountId, Cents, MeteringLedger, PlanTier};
pub use service::{BillingSummary, ConversionOutcome, ConverterService};
pub use value::{Record, RecordSet, Value};

/// Convert `input` with the default configuration
pub fn convert(from: Format, to: Format, input: &[u8]) -> ConversionResult<ConvertedData> {
    ConversionEngine::default().convert(from, to, input)
}
