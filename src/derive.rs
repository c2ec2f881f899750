use chrono::{Datelike, Month, NaiveDate};
use itertools::Itertools;
use rust_decimal::Decimal;

use crate::{
    clean::{CleanRecord, CleanTable},
    schema::{self, MONTH, YEAR},
};

/// Label under which rows without a `Category` are listed and selected.
pub const MISSING_CATEGORY: &str = "(none)";

/// A cleaned row enriched with calendar columns derived from its `Date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    fields: Vec<String>,
    date: NaiveDate,
    amount: Decimal,
    category: Option<String>,
    size: Option<String>,
    qty: Option<u64>,
    month: Month,
    year: i32,
}

impl SalesRecord {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The category as a selectable label; blank categories read as [`MISSING_CATEGORY`].
    pub fn category_label(&self) -> &str {
        self.category().unwrap_or(MISSING_CATEGORY)
    }

    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }

    pub fn qty(&self) -> Option<u64> {
        self.qty
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Cells aligned with [`SalesTable::headers`], including `Month` and `Year`.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// The canonical, immutable table every view and aggregate is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalesTable {
    headers: Vec<String>,
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct category labels in order of first appearance, with
    /// [`MISSING_CATEGORY`] standing in for rows that have none.
    pub fn categories(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(SalesRecord::category_label)
            .unique()
            .collect()
    }
}

pub fn month_of(date: &NaiveDate) -> Month {
    Month::try_from(date.month() as u8)
        .unwrap_or_else(|_| unreachable!("chrono months are always 1..=12"))
}

/// Adds `Month` (full month name) and `Year` to every row.
///
/// Existing columns with those names are overwritten in place; otherwise the
/// two columns are appended after the source columns.
pub fn derive_calendar_features(table: CleanTable) -> SalesTable {
    let (mut headers, _, records) = table.into_parts();
    let month_idx = position_or_append(&mut headers, MONTH);
    let year_idx = position_or_append(&mut headers, YEAR);
    let width = headers.len();

    let records = records
        .into_iter()
        .map(|record| {
            let CleanRecord {
                mut fields,
                date,
                amount,
                category,
                size,
                qty,
            } = record;
            let month = month_of(&date);
            let year = date.year();
            fields.resize(width, String::new());
            fields[month_idx] = month.name().to_string();
            fields[year_idx] = year.to_string();
            SalesRecord {
                fields,
                date,
                amount,
                category,
                size,
                qty,
                month,
                year,
            }
        })
        .collect();

    SalesTable { headers, records }
}

fn position_or_append(headers: &mut Vec<String>, name: &str) -> usize {
    schema::column_index(headers, name).unwrap_or_else(|| {
        headers.push(name.to_string());
        headers.len() - 1
    })
}
