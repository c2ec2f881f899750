//! Column layout of a sales source.
//!
//! Five columns are required by the pipeline and are matched by exact,
//! case-sensitive header name. Everything else passes through untouched,
//! except for a configurable list of artifact columns (a pandas-style `index`
//! and a stray `Unnamed: N` column by default) which are removed when present
//! and silently ignored when absent.

use crate::error::MissingRequiredColumn;

pub const AMOUNT: &str = "Amount";
pub const DATE: &str = "Date";
pub const CATEGORY: &str = "Category";
pub const SIZE: &str = "Size";
pub const QTY: &str = "Qty";
pub const MONTH: &str = "Month";
pub const YEAR: &str = "Year";

pub const REQUIRED_COLUMNS: &[&str] = &[AMOUNT, DATE, CATEGORY, SIZE, QTY];

pub const DEFAULT_DROPPED_COLUMNS: &[&str] = &["index", "Unnamed: 22"];

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesColumns {
    pub amount: usize,
    pub date: usize,
    pub category: usize,
    pub size: usize,
    pub qty: usize,
}

impl SalesColumns {
    pub fn resolve(headers: &[String]) -> Result<Self, MissingRequiredColumn> {
        let find = |name: &str| {
            column_index(headers, name).ok_or_else(|| MissingRequiredColumn {
                column: name.to_string(),
            })
        };
        Ok(SalesColumns {
            amount: find(AMOUNT)?,
            date: find(DATE)?,
            category: find(CATEGORY)?,
            size: find(SIZE)?,
            qty: find(QTY)?,
        })
    }
}

pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

pub fn is_required(name: &str) -> bool {
    REQUIRED_COLUMNS.contains(&name)
}

/// Indices of the columns that survive removal of `dropped`, in source order.
pub fn retained_indices(headers: &[String], dropped: &[String]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| is_required(header) || !dropped.iter().any(|d| d == *header))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_finds_required_columns_in_any_order() {
        let cols = SalesColumns::resolve(&headers(&[
            "index", "Qty", "Date", "Status", "Category", "Size", "Amount",
        ]))
        .expect("resolve");
        assert_eq!(
            cols,
            SalesColumns {
                amount: 6,
                date: 2,
                category: 4,
                size: 5,
                qty: 1,
            }
        );
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let err = SalesColumns::resolve(&headers(&["amount", "Date", "Category", "Size", "Qty"]))
            .expect_err("lowercase amount must not match");
        assert_eq!(err.column, AMOUNT);
    }

    #[test]
    fn retained_indices_skips_artifacts_but_never_required_columns() {
        let names = headers(&["index", "Date", "Amount", "Unnamed: 22", "ship-city"]);
        let dropped = headers(&["index", "Unnamed: 22", "Amount", "not-present"]);
        assert_eq!(retained_indices(&names, &dropped), vec![1, 2, 4]);
    }
}
