//! First-sheet reader for spreadsheet workbooks (xlsx, xlsm, xlsb, xls, ods).
//!
//! Cells are rendered to the same strings a CSV export would contain, so a
//! workbook flows through the rest of the pipeline exactly like a text source.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::Timelike;

/// Reads the first worksheet as rows of cell text, header row first.
pub fn read_first_sheet(path: &Path) -> Result<Vec<Vec<String>>, calamine::Error> {
    let mut workbook = open_workbook_auto(path)?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => match value.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => value.as_f64().to_string(),
        },
    }
}
