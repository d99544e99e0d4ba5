//! Conversion pipeline: decode source bytes, re-encode to the target format

use crate::codec::markup::{decode_xml, encode_xml, items_to_records};
use crate::codec::spreadsheet::encode_xlsx;
use crate::codec::sql::encode_sql;
use crate::codec::tabular::{decode_tabular, encode_tabular};
use crate::codec::tree::{decode_json, decode_yaml, encode_json, encode_yaml};
use crate::codec::{ConversionKind, Format};
use crate::conversion::config::ConversionConfig;
use crate::conversion::limits;
use crate::conversion::ConversionResult;
use crate::error::ConversionError;
use crate::value::{RecordSet, Value};
use std::time::Instant;
use tracing::debug;

/// Converted output
#[derive(Debug, Clone)]
pub struct ConvertedData {
    pub content: Vec<u8>,
    pub metadata: ConversionMetadata,
}

impl ConvertedData {
    pub fn new(content: Vec<u8>, metadata: ConversionMetadata) -> Self {
        Self { content, metadata }
    }

    /// Output as text; `None` for binary formats
    pub fn as_text(&self) -> Option<&str> {
        if self.metadata.kind.to == Format::Xlsx {
            return None;
        }
        std::str::from_utf8(&self.content).ok()
    }

    /// Get the length of the output in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if the output is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content
    }
}

/// Metadata about the conversion process
#[derive(Debug, Clone)]
pub struct ConversionMetadata {
    pub kind: ConversionKind,
    pub input_size: u64,
    pub output_size: u64,
    pub processing_time_ms: u64,
    /// Rows written, for tabular targets
    pub record_count: Option<usize>,
}

/// Main conversion engine
///
/// Stateless apart from its configuration; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct ConversionEngine {
    config: ConversionConfig,
}

impl ConversionEngine {
    /// Create a new conversion engine
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `input` from one format to another
    ///
    /// Fails without producing output when the pair is unsupported, the input
    /// does not parse, or the decoded data does not fit the target's shape.
    pub fn convert(
        &self,
        from: Format,
        to: Format,
        input: &[u8],
    ) -> ConversionResult<ConvertedData> {
        let start_time = Instant::now();
        let kind = ConversionKind::new(from, to);

        if !kind.is_supported() {
            return Err(ConversionError::UnsupportedPair { from, to });
        }
        limits::check_input_size(input, &self.config)?;

        let text = limits::input_text(input, from)?;
        let value = self.decode(from, text)?;
        debug!(%kind, input_size = input.len(), "decoded input");

        let (content, record_count) = self.encode(from, to, value)?;

        let metadata = ConversionMetadata {
            kind,
            input_size: input.len() as u64,
            output_size: content.len() as u64,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            record_count,
        };
        debug!(
            %kind,
            output_size = metadata.output_size,
            records = ?metadata.record_count,
            "encoded output"
        );

        Ok(ConvertedData::new(content, metadata))
    }

    /// Convert text input and return text output
    pub fn convert_str(&self, from: Format, to: Format, input: &str) -> ConversionResult<String> {
        if to == Format::Xlsx {
            return Err(ConversionError::encode(to, "output is binary; use convert instead"));
        }
        let converted = self.convert(from, to, input.as_bytes())?;
        String::from_utf8(converted.into_bytes()).map_err(|e| ConversionError::encode(to, e))
    }

    fn decode(&self, from: Format, text: &str) -> ConversionResult<Value> {
        let value = match from {
            Format::Csv => {
                Value::from_record_set(decode_tabular(text, self.config.csv_has_header)?)
            }
            Format::Json => decode_json(text)?,
            Format::Yaml => decode_yaml(text)?,
            Format::Xml => decode_xml(text)?,
            Format::Sql | Format::Xlsx => {
                return Err(ConversionError::UnsupportedPair { from, to: from });
            }
        };
        Ok(value)
    }

    fn encode(
        &self,
        from: Format,
        to: Format,
        value: Value,
    ) -> ConversionResult<(Vec<u8>, Option<usize>)> {
        if to.requires_records() {
            let records = self.records(from, value)?;
            let count = records.len();
            let content = match to {
                Format::Csv => encode_tabular(&records)?.into_bytes(),
                Format::Sql => encode_sql(&records, &self.config.sql_table).into_bytes(),
                _ => encode_xlsx(&records)?,
            };
            return Ok((content, Some(count)));
        }

        let content = match to {
            Format::Json => encode_json(&value, self.config.pretty_json)?,
            Format::Yaml => encode_yaml(&value)?,
            _ => encode_xml(
                &value,
                &self.config.xml_root,
                &self.config.xml_item_tag,
                self.config.xml_indent,
            )?,
        };
        Ok((content.into_bytes(), None))
    }

    /// Tabular view of decoded data; XML rows follow the item convention
    fn records(&self, from: Format, value: Value) -> ConversionResult<RecordSet> {
        let records = match from {
            Format::Xml => items_to_records(value, &self.config.xml_item_tag)?,
            _ => value.into_record_set()?,
        };
        Ok(records)
    }
}

/// Convert with the given configuration
pub fn convert(
    from: Format,
    to: Format,
    input: &[u8],
    config: &ConversionConfig,
) -> ConversionResult<ConvertedData> {
    ConversionEngine::new(config.clone()).convert(from, to, input)
}
