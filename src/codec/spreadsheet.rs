//! XLSX writer for tabular data
//!
//! Same projection as the CSV encoder: a bold header row from the first
//! record's keys, then one row per record. Cells whose text is a finite
//! number are written as numeric cells; empty cells are left blank.

use crate::codec::tabular::{header_of, project_row};
use crate::codec::Format;
use crate::error::{ConversionError, ConversionResult};
use crate::value::Record;
use rust_xlsxwriter::{Format as CellFormat, Workbook, XlsxError};

/// Render records as an XLSX workbook with a single worksheet
pub fn encode_xlsx(records: &[Record]) -> ConversionResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = CellFormat::new().set_bold();
    let worksheet = workbook.add_worksheet();

    if let Some(header) = header_of(records) {
        for (col, name) in header.iter().enumerate() {
            worksheet
                .write_string_with_format(0, column_index(col)?, *name, &header_format)
                .map_err(xlsx_error)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = u32::try_from(index + 1)
                .map_err(|_| ConversionError::encode(Format::Xlsx, "too many rows"))?;
            for (col, cell) in project_row(record, &header).enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let col = column_index(col)?;
                match numeric_cell(cell) {
                    Some(number) => worksheet.write_number(row, col, number),
                    None => worksheet.write_string(row, col, cell),
                }
                .map_err(xlsx_error)?;
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn column_index(col: usize) -> ConversionResult<u16> {
    u16::try_from(col).map_err(|_| ConversionError::encode(Format::Xlsx, "too many columns"))
}

fn numeric_cell(text: &str) -> Option<f64> {
    if text.trim() != text {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn xlsx_error(err: XlsxError) -> ConversionError {
    ConversionError::encode(Format::Xlsx, err)
}
