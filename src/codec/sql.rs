//! SQL INSERT emitter
//!
//! Write-only. Each record produces one statement using that record's own
//! column order. Values are single-quoted with embedded quotes escaped as
//! `\'`, which MySQL accepts but standard SQL does not; existing consumers
//! depend on this exact output.

use crate::value::{Record, Value};

/// One `INSERT` statement per record; an empty record set yields none
pub fn encode_inserts(records: &[Record], table: &str) -> Vec<String> {
    records
        .iter()
        .map(|record| insert_statement(record, table))
        .collect()
}

fn insert_statement(record: &Record, table: &str) -> String {
    let columns = record.keys().collect::<Vec<_>>().join(", ");
    let values = record.values().map(sql_literal).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO {} ({}) VALUES ({});", table, columns, values)
}

fn sql_literal(value: &Value) -> String {
    match value.leaf_text() {
        Some(text) if !value.is_null() => format!("'{}'", text.replace('\'', "\\'")),
        _ => "NULL".to_string(),
    }
}

/// Statements joined by newlines, the emitter's text output
pub fn encode_sql(records: &[Record], table: &str) -> String {
    encode_inserts(records, table).join("\n")
}
