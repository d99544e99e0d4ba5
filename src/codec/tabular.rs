//! CSV codec
//!
//! Decoding is header driven: the first line names the columns and every
//! following line is mapped onto them by position. Short rows are padded with
//! empty strings, surplus fields are dropped. Encoding takes its header from
//! the first record and projects every record onto those columns.

use crate::codec::Format;
use crate::error::{ConversionError, ConversionResult, DecodeError};
use crate::value::{Record, RecordSet, Value};
use tracing::debug;

/// Parse CSV text into records
///
/// When `has_header` is false the columns are named `col0`, `col1`, ... from
/// the width of the first row.
pub fn decode_tabular(text: &str, has_header: bool) -> Result<RecordSet, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = reader.records();
    let first = match rows.next() {
        Some(row) => row.map_err(csv_decode_error)?,
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    let columns: Vec<String> = if has_header {
        first.iter().map(|name| name.to_string()).collect()
    } else {
        let columns: Vec<String> = (0..first.len()).map(|i| format!("col{i}")).collect();
        records.push(build_record(&columns, &first));
        columns
    };

    for row in rows {
        let row = row.map_err(csv_decode_error)?;
        if row.len() > columns.len() {
            debug!(
                line = row.position().map(|p| p.line()).unwrap_or_default(),
                extra = row.len() - columns.len(),
                "dropping fields beyond header width"
            );
        }
        records.push(build_record(&columns, &row));
    }

    Ok(records)
}

fn build_record(columns: &[String], row: &csv::StringRecord) -> Record {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| (column.clone(), Value::text(row.get(i).unwrap_or(""))))
        .collect()
}

fn csv_decode_error(err: csv::Error) -> DecodeError {
    let line = err.position().map(|p| p.line() as usize);
    let decode = DecodeError::new(Format::Csv, err.to_string());
    match line {
        Some(line) => decode.with_location(line, 1),
        None => decode,
    }
}

/// Column names used when writing `records`: the first record's keys
pub fn header_of(records: &[Record]) -> Option<Vec<&str>> {
    records.first().map(|first| first.keys().collect())
}

/// Cell texts of `record` for the given columns; missing keys yield `""`
pub fn project_row<'a>(record: &'a Record, header: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
    header
        .iter()
        .map(move |column| record.get(column).and_then(Value::leaf_text).unwrap_or(""))
}

/// Render records as CSV text with a header line
///
/// An empty record set renders as the empty string.
pub fn encode_tabular(records: &[Record]) -> ConversionResult<String> {
    let header = match header_of(records) {
        Some(header) => header,
        None => return Ok(String::new()),
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(&header)
        .map_err(|e| ConversionError::encode(Format::Csv, e))?;
    for record in records {
        writer
            .write_record(project_row(record, &header))
            .map_err(|e| ConversionError::encode(Format::Csv, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConversionError::encode(Format::Csv, e.error()))?;
    String::from_utf8(bytes).map_err(|e| ConversionError::encode(Format::Csv, e))
}
