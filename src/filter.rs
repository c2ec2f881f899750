use std::collections::BTreeSet;

use crate::derive::{SalesRecord, SalesTable};

/// The set of categories a caller wants to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    categories: BTreeSet<String>,
}

impl Selection {
    pub fn none() -> Self {
        Selection::default()
    }

    pub fn all(table: &SalesTable) -> Self {
        table.categories().into_iter().collect()
    }

    /// The first `count` categories in order of appearance.
    pub fn first(table: &SalesTable, count: usize) -> Self {
        table.categories().into_iter().take(count).collect()
    }

    /// Parses comma-separated labels; blank entries are ignored.
    pub fn parse_list(values: &[String]) -> Self {
        values
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.contains(record.category_label())
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Selection {
            categories: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rows of a [`SalesTable`] whose category is selected, in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    headers: &'a [String],
    rows: Vec<&'a SalesRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn new(table: &'a SalesTable, selection: &Selection) -> Self {
        let rows = if selection.is_empty() {
            Vec::new()
        } else {
            table
                .records()
                .iter()
                .filter(|record| selection.matches(record))
                .collect()
        };
        FilteredView {
            headers: table.headers(),
            rows,
        }
    }

    pub fn headers(&self) -> &'a [String] {
        self.headers
    }

    pub fn rows(&self) -> &[&'a SalesRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `limit` rows, for tabular display.
    pub fn head(&self, limit: usize) -> &[&'a SalesRecord] {
        &self.rows[..self.rows.len().min(limit)]
    }
}

pub fn filter_by_category<'a>(table: &'a SalesTable, selection: &Selection) -> FilteredView<'a> {
    FilteredView::new(table, selection)
}
