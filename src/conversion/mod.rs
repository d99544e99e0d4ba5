//! Format conversion module
//!
//! This module contains the conversion pipeline, its configuration, and
//! input limits.

pub mod config;
pub mod engine;
pub mod limits;

pub use config::{parse_size, ConversionConfig};

pub use engine::{convert, ConversionEngine, ConversionMetadata, ConvertedData};

pub use crate::error::ConversionResult;
