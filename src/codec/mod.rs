//! Format codecs and the supported conversion table
//!
//! Each codec converts between raw text and the [`Value`](crate::value::Value)
//! model. SQL and XLSX are write-only.

pub mod markup;
pub mod spreadsheet;
pub mod sql;
pub mod tabular;
pub mod tree;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange formats known to the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    Json,
    Xml,
    Yaml,
    Sql,
    Xlsx,
}

const CSV_TARGETS: &[Format] = &[
    Format::Json,
    Format::Xml,
    Format::Yaml,
    Format::Sql,
    Format::Xlsx,
];
const JSON_TARGETS: &[Format] = &[Format::Csv, Format::Xml, Format::Yaml];
const XML_TARGETS: &[Format] = &[Format::Json, Format::Csv];
const YAML_TARGETS: &[Format] = &[Format::Json, Format::Csv];

impl Format {
    pub const ALL: [Format; 6] = [
        Format::Csv,
        Format::Json,
        Format::Xml,
        Format::Yaml,
        Format::Sql,
        Format::Xlsx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Yaml => "yaml",
            Format::Sql => "sql",
            Format::Xlsx => "xlsx",
        }
    }

    /// Default file extension
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Csv => "text/csv",
            Format::Json => "application/json",
            Format::Xml => "application/xml",
            Format::Yaml => "application/yaml",
            Format::Sql => "application/sql",
            Format::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Formats this one can be converted into
    pub fn supported_targets(&self) -> &'static [Format] {
        match self {
            Format::Csv => CSV_TARGETS,
            Format::Json => JSON_TARGETS,
            Format::Xml => XML_TARGETS,
            Format::Yaml => YAML_TARGETS,
            Format::Sql | Format::Xlsx => &[],
        }
    }

    pub fn can_convert_to(&self, target: Format) -> bool {
        self.supported_targets().contains(&target)
    }

    /// Targets that need a flat list of records
    pub fn requires_records(&self) -> bool {
        matches!(self, Format::Csv | Format::Sql | Format::Xlsx)
    }

    /// Infer a format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "yaml" | "yml" => Ok(Format::Yaml),
            "sql" => Ok(Format::Sql),
            "xlsx" => Ok(Format::Xlsx),
            other => Err(format!(
                "Unknown format '{}'. Use csv, json, xml, yaml, sql or xlsx",
                other
            )),
        }
    }
}

/// Ordered pair of formats, e.g. `csv_to_json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionKind {
    pub from: Format,
    pub to: Format,
}

impl ConversionKind {
    pub fn new(from: Format, to: Format) -> Self {
        Self { from, to }
    }

    pub fn is_supported(&self) -> bool {
        self.from.can_convert_to(self.to)
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_to_{}", self.from, self.to)
    }
}

/// Every supported directed pair
pub fn supported_pairs() -> Vec<ConversionKind> {
    Format::ALL
        .iter()
        .flat_map(|from| {
            from.supported_targets()
                .iter()
                .map(move |to| ConversionKind::new(*from, *to))
        })
        .collect()
}
