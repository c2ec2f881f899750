#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

use sales_dash::{
    clean::Cleaner,
    derive::{SalesTable, derive_calendar_features},
    loader::RawTable,
};

pub const HEADERS: &[&str] = &["Date", "Category", "Size", "Qty", "Amount"];

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn write_sales(&self, name: &str, sales: &SalesCsv) -> PathBuf {
        self.write(name, &sales.to_csv())
    }

    /// Writes `sales` as the first sheet of an xlsx workbook; numeric cells
    /// are stored as numbers.
    pub fn write_sales_workbook(&self, name: &str, sales: &SalesCsv) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in HEADERS.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }
        for (row, cells) in sales.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32 + 1, col as u16);
                match cell.parse::<f64>() {
                    Ok(number) => sheet.write_number(row, col, number),
                    Err(_) => sheet.write_string(row, col, cell.as_str()),
                }
                .expect("write cell");
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// Builder for small sales exports with the five required columns.
#[derive(Debug, Clone, Default)]
pub struct SalesCsv {
    rows: Vec<[String; 5]>,
}

impl SalesCsv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, date: &str, category: &str, size: &str, qty: &str, amount: &str) -> Self {
        self.rows.push([date, category, size, qty, amount].map(str::to_string));
        self
    }

    /// One row per day from `start` for `days` days.
    pub fn daily(mut self, start: NaiveDate, days: i64, category: &str, amount: &str) -> Self {
        for offset in 0..days {
            let date = (start + Duration::days(offset)).format("%Y-%m-%d").to_string();
            self = self.row(&date, category, "M", "1", amount);
        }
        self
    }

    pub fn to_csv(&self) -> String {
        let mut out = HEADERS.join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    pub fn raw(&self) -> RawTable {
        RawTable::new(
            HEADERS.iter().map(|s| s.to_string()).collect(),
            self.rows.iter().map(|r| r.to_vec()).collect(),
        )
        .expect("raw table")
    }

    pub fn table(&self) -> Arc<SalesTable> {
        Arc::new(derive_calendar_features(Cleaner::default().clean(&self.raw())))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
