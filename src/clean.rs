use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::{
    data::{format_date, parse_amount, parse_label, parse_naive_date, parse_quantity},
    loader::RawTable,
    schema::{self, DEFAULT_DROPPED_COLUMNS, SalesColumns},
};

/// A row that passed cleaning: `Date` and `Amount` are guaranteed present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRecord {
    /// Every retained cell in header order, `Date` rewritten as `YYYY-MM-DD`.
    pub fields: Vec<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: Option<String>,
    pub size: Option<String>,
    pub qty: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTable {
    headers: Vec<String>,
    columns: SalesColumns,
    records: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> SalesColumns {
        self.columns
    }

    pub fn records(&self) -> &[CleanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, SalesColumns, Vec<CleanRecord>) {
        (self.headers, self.columns, self.records)
    }

    /// Renders the cleaned rows back into an untyped table.
    pub fn to_raw(&self) -> RawTable {
        RawTable::new(
            self.headers.clone(),
            self.records.iter().map(|r| r.fields.clone()).collect(),
        )
        .unwrap_or_else(|_| unreachable!("cleaned headers retain every required column"))
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    dropped_columns: Vec<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Cleaner::new(DEFAULT_DROPPED_COLUMNS.iter().copied())
    }
}

impl Cleaner {
    pub fn new<I, S>(dropped_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dropped_columns = dropped_columns
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        for name in dropped_columns.iter().filter(|n| schema::is_required(n)) {
            warn!("Ignoring request to drop required column '{name}'");
        }
        Cleaner { dropped_columns }
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    pub fn clean(&self, raw: &RawTable) -> CleanTable {
        let retained = schema::retained_indices(raw.headers(), &self.dropped_columns);
        let headers = retained
            .iter()
            .map(|&idx| raw.headers()[idx].clone())
            .collect::<Vec<_>>();
        let columns = SalesColumns::resolve(&headers)
            .unwrap_or_else(|_| unreachable!("required columns are never dropped"));
        if headers.len() < raw.headers().len() {
            debug!(
                "Dropped {} artifact column(s)",
                raw.headers().len() - headers.len()
            );
        }

        let source = raw.columns();
        let mut missing_date = 0usize;
        let mut missing_amount = 0usize;
        let mut records = Vec::with_capacity(raw.len());
        for row in raw.rows() {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
            let date = parse_naive_date(cell(source.date));
            let amount = parse_amount(cell(source.amount));
            let (Some(date), Some(amount)) = (date, amount) else {
                missing_date += usize::from(date.is_none());
                missing_amount += usize::from(amount.is_none());
                continue;
            };
            let mut fields = retained
                .iter()
                .map(|&idx| cell(idx).to_string())
                .collect::<Vec<_>>();
            fields[columns.date] = format_date(&date);
            records.push(CleanRecord {
                fields,
                date,
                amount,
                category: parse_label(cell(source.category)),
                size: parse_label(cell(source.size)),
                qty: parse_quantity(cell(source.qty)),
            });
        }

        let dropped = raw.len() - records.len();
        if dropped > 0 {
            debug!(
                "Excluded {dropped} row(s): {missing_date} without a valid Date, {missing_amount} without an Amount"
            );
        }
        CleanTable {
            headers,
            columns,
            records,
        }
    }
}
