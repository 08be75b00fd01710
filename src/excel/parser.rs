//! Spreadsheet parser: uploaded bytes → ordered row records.
//!
//! The first worksheet's first row supplies the column keys; every following
//! row becomes a [`Row`] seeded with a freshly generated unique id. Cell
//! values are reduced to display strings by a single exhaustive match over
//! the reader's cell variants.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use chrono::{NaiveDate, Utc};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::error::{RowcastError, RowcastResult};
use crate::types::Row;

/// Parse an uploaded workbook into rows.
///
/// Reads the first worksheet only. Fails when the buffer is not a readable
/// workbook, the workbook is password-protected, it has no worksheet, or no
/// data rows survive (rows with zero populated cells are dropped).
pub fn parse(bytes: &[u8], filename: &str) -> RowcastResult<Vec<Row>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(map_open_error)?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| RowcastError::Parse("workbook has no worksheet".to_string()))?;

    let range = workbook.worksheet_range(first_sheet).map_err(|e| {
        RowcastError::Parse(format!("unreadable worksheet '{first_sheet}': {e}"))
    })?;

    let mut sheet_rows = range.rows();
    let header_cells = sheet_rows
        .next()
        .ok_or_else(|| RowcastError::Parse("spreadsheet has no header row".to_string()))?;
    let headers = derive_headers(header_cells);

    let mut rows = Vec::new();
    for (index, cells) in sheet_rows.enumerate() {
        let mut row = Row::new(generate_row_id(index));
        for (key, cell) in headers.iter().zip(cells) {
            if let Some(value) = cell_display(cell) {
                row.insert(key.clone(), value);
            }
        }
        // A row with zero populated cells is dropped, not kept as a placeholder
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(RowcastError::Parse(
            "spreadsheet has no data rows".to_string(),
        ));
    }

    debug!(rows = rows.len(), filename, "parsed spreadsheet");
    Ok(rows)
}

/// Structural sanity check on a parsed batch: non-empty, and at least one row
/// carries a data column besides its id. Any non-empty shape passes; this is
/// not a schema check.
pub fn validate(rows: &[Row]) -> bool {
    !rows.is_empty() && rows.iter().any(|row| !row.is_empty())
}

fn map_open_error(e: calamine::Error) -> RowcastError {
    let msg = e.to_string();
    if msg.to_lowercase().contains("password") {
        RowcastError::Parse("workbook is password-protected".to_string())
    } else {
        RowcastError::Parse(format!("unreadable spreadsheet container: {msg}"))
    }
}

/// Derive one column key per header cell.
///
/// Unusable cells (empty, error, normalizes to nothing) and the reserved key
/// `id` fall back to the positional placeholder `Column<N>`. Duplicate keys
/// are kept as-is: for such columns the rightmost cell wins per row.
fn derive_headers(cells: &[Data]) -> Vec<String> {
    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            cell_display(cell)
                .and_then(|raw| normalize_key(&raw))
                .filter(|key| key != "id")
                .unwrap_or_else(|| format!("Column{}", idx + 1))
        })
        .collect()
}

/// Normalize a raw header into a column key: trim, strip diacritics (NFD,
/// combining marks dropped), then collapse each run of non-alphanumeric
/// characters into a single underscore.
fn normalize_key(raw: &str) -> Option<String> {
    let folded: String = raw
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut key = String::with_capacity(folded.len());
    let mut in_gap = false;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            key.push(c);
            in_gap = false;
        } else if !in_gap {
            key.push('_');
            in_gap = true;
        }
    }

    if key.chars().all(|c| c == '_') {
        None
    } else {
        Some(key)
    }
}

/// Reduce one cell to its display string, or `None` when the cell resolves
/// to nothing (empty cells, error cells, empty strings).
///
/// Formula cells need no separate arm: the reader yields their cached result
/// in the data range, so they arrive here as the computed variant. Rich-text
/// and hyperlink cells arrive flattened to their display text.
fn cell_display(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_date(dt),
        Data::DateTimeIso(s) => format_iso_date(s),
        Data::DurationIso(s) => s.clone(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Integral floats render without a trailing `.0` (Excel stores most numbers
/// as floats).
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Date cells render as `DD/MM/YYYY` from their local calendar fields.
fn format_date(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(naive) => naive.format("%d/%m/%Y").to_string(),
        // Out-of-range serial: keep the raw number
        None => format_number(dt.as_f64()),
    }
}

fn format_iso_date(s: &str) -> String {
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| s.to_string())
}

/// Batch-unique, practically process-unique row id: 1-based position plus the
/// import timestamp and a random suffix.
fn generate_row_id(index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "row_{}_{}_{}",
        index + 1,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
