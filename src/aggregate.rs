//! KPIs and chart series computed from a [`FilteredView`].
//!
//! Everything here is a pure function of the view: nothing is cached and
//! nothing can fail. Sums cannot overflow because the cleaner only admits
//! amounts below [`crate::data::MAX_AMOUNT`]. Grouping is done with explicit
//! key → accumulator maps; groups remember the order in which their key was
//! first seen so that output order is deterministic for a given input.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    derive::{SalesRecord, SalesTable},
    filter::{FilteredView, Selection},
};

pub const DEFAULT_TREND_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total_revenue: Decimal,
    pub order_count: usize,
    /// `None` when no orders are selected.
    pub average_order_value: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
    /// Trailing moving average; `None` until a full window is available.
    pub trend: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeQuantity {
    pub size: String,
    pub quantity: u64,
}

pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    let total_revenue = view.rows().iter().map(|r| r.amount()).sum::<Decimal>();
    let order_count = view.len();
    let average_order_value = if order_count == 0 {
        None
    } else {
        total_revenue.checked_div(Decimal::from(order_count))
    };
    Kpis {
        total_revenue,
        order_count,
        average_order_value,
    }
}

/// Revenue per distinct date, ascending.
pub fn daily_revenue(view: &FilteredView<'_>) -> Vec<DailyRevenue> {
    let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for record in view.rows() {
        *totals.entry(record.date()).or_default() += record.amount();
    }
    totals
        .into_iter()
        .map(|(date, revenue)| DailyRevenue { date, revenue })
        .collect()
}

/// Simple trailing moving average over `window` entries of `series`.
///
/// Entries are positions in the series, not calendar days: gaps between dates
/// do not count toward the window.
pub fn moving_average(series: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; series.len()];
    }
    let divisor = Decimal::from(window);
    let mut running = Decimal::ZERO;
    series
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            running += *value;
            if idx >= window {
                running -= series[idx - window];
            }
            (idx + 1 >= window).then(|| running / divisor)
        })
        .collect()
}

pub fn trend_series(daily: &[DailyRevenue], window: usize) -> Vec<TrendPoint> {
    let revenue = daily.iter().map(|d| d.revenue).collect::<Vec<_>>();
    daily
        .iter()
        .zip(moving_average(&revenue, window))
        .map(|(day, trend)| TrendPoint {
            date: day.date,
            revenue: day.revenue,
            trend,
        })
        .collect()
}

/// Revenue per category, highest first; ties keep first-seen order.
pub fn category_revenue(view: &FilteredView<'_>) -> Vec<CategoryRevenue> {
    let mut groups = GroupAccumulator::<Decimal>::default();
    for record in view.rows() {
        groups.add(record.category_label(), record.amount());
    }
    let mut totals = groups.into_entries();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue { category, revenue })
        .collect()
}

/// Quantity per size in first-seen order; rows lacking `Size` or `Qty` are skipped.
pub fn size_quantity(view: &FilteredView<'_>) -> Vec<SizeQuantity> {
    let mut groups = GroupAccumulator::<u64>::default();
    for record in view.rows() {
        if let (Some(size), Some(qty)) = (record.size(), record.qty()) {
            groups.add(size, qty);
        }
    }
    groups
        .into_entries()
        .into_iter()
        .map(|(size, quantity)| SizeQuantity { size, quantity })
        .collect()
}

struct GroupAccumulator<T> {
    positions: HashMap<String, usize>,
    entries: Vec<(String, T)>,
}

impl<T> Default for GroupAccumulator<T> {
    fn default() -> Self {
        GroupAccumulator {
            positions: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> GroupAccumulator<T>
where
    T: Default + std::ops::AddAssign,
{
    fn add(&mut self, key: &str, value: T) {
        let idx = match self.positions.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.to_string(), T::default()));
                self.positions
                    .insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1 += value;
    }

    fn into_entries(self) -> Vec<(String, T)> {
        self.entries
    }
}

/// Everything the dashboard shows for one category selection.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub view: FilteredView<'a>,
    pub kpis: Kpis,
    pub trend: Vec<TrendPoint>,
    pub categories: Vec<CategoryRevenue>,
    pub sizes: Vec<SizeQuantity>,
}

impl<'a> DashboardView<'a> {
    pub fn compute(table: &'a SalesTable, selection: &Selection, window: usize) -> Self {
        let view = FilteredView::new(table, selection);
        let kpis = kpis(&view);
        let trend = trend_series(&daily_revenue(&view), window);
        let categories = category_revenue(&view);
        let sizes = size_quantity(&view);
        DashboardView {
            view,
            kpis,
            trend,
            categories,
            sizes,
        }
    }

    pub fn rows(&self) -> &[&'a SalesRecord] {
        self.view.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clean::Cleaner,
        derive::{MISSING_CATEGORY, derive_calendar_features},
        loader::RawTable,
    };

    fn sales(rows: &[[&str; 5]]) -> SalesTable {
        let raw = RawTable::new(
            ["Date", "Category", "Size", "Qty", "Amount"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .expect("raw");
        derive_calendar_features(Cleaner::default().clean(&raw))
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn kpis_average_is_undefined_without_orders() {
        let table = sales(&[["2022-04-01", "Set", "S", "1", "100"]]);
        let view = FilteredView::new(&table, &Selection::none());
        let kpis = kpis(&view);
        assert_eq!(kpis.total_revenue, Decimal::ZERO);
        assert_eq!(kpis.order_count, 0);
        assert_eq!(kpis.average_order_value, None);
    }

    #[test]
    fn kpis_sum_count_and_average() {
        let table = sales(&[
            ["2022-04-01", "A", "S", "1", "100"],
            ["2022-04-01", "B", "M", "2", "200"],
        ]);
        let view = FilteredView::new(&table, &Selection::all(&table));
        let kpis = kpis(&view);
        assert_eq!(kpis.total_revenue, dec(300));
        assert_eq!(kpis.order_count, 2);
        assert_eq!(kpis.average_order_value, Some(dec(150)));
    }

    #[test]
    fn daily_revenue_groups_by_date_ascending() {
        let table = sales(&[
            ["2022-04-03", "A", "S", "1", "5"],
            ["2022-04-01", "A", "S", "1", "10"],
            ["2022-04-03", "A", "S", "1", "7"],
        ]);
        let view = FilteredView::new(&table, &Selection::all(&table));
        let daily = daily_revenue(&view);
        assert_eq!(
            daily,
            vec![
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(),
                    revenue: dec(10),
                },
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2022, 4, 3).unwrap(),
                    revenue: dec(12),
                },
            ]
        );
    }

    #[test]
    fn moving_average_is_undefined_before_full_window() {
        let series = [1, 2, 3, 4, 5].map(dec);
        let averaged = moving_average(&series, 3);
        assert_eq!(
            averaged,
            vec![None, None, Some(dec(2)), Some(dec(3)), Some(dec(4))]
        );
    }

    #[test]
    fn moving_average_shorter_than_window_has_no_values() {
        let series = [10, 20].map(dec);
        assert_eq!(moving_average(&series, 30), vec![None, None]);
        assert!(moving_average(&[], 30).is_empty());
    }

    #[test]
    fn moving_average_window_of_one_is_identity() {
        let series = [3, 9, 27].map(dec);
        assert_eq!(
            moving_average(&series, 1),
            series.iter().copied().map(Some).collect::<Vec<_>>()
        );
    }

    #[test]
    fn category_revenue_sorts_descending_with_stable_ties() {
        let table = sales(&[
            ["2022-04-01", "A", "S", "1", "100"],
            ["2022-04-01", "B", "S", "1", "300"],
            ["2022-04-01", "C", "S", "1", "100"],
            ["2022-04-02", "A", "S", "1", "50"],
        ]);
        let view = FilteredView::new(&table, &Selection::all(&table));
        let totals = category_revenue(&view)
            .into_iter()
            .map(|c| (c.category, c.revenue))
            .collect::<Vec<_>>();
        assert_eq!(
            totals,
            vec![
                ("B".to_string(), dec(300)),
                ("A".to_string(), dec(150)),
                ("C".to_string(), dec(100)),
            ]
        );
    }

    #[test]
    fn category_revenue_groups_missing_categories_under_their_label() {
        let table = sales(&[
            ["2022-04-01", "A", "S", "1", "100"],
            ["2022-04-01", "", "S", "1", "200"],
        ]);
        let view = FilteredView::new(&table, &Selection::all(&table));
        let totals = category_revenue(&view)
            .into_iter()
            .map(|c| (c.category, c.revenue))
            .collect::<Vec<_>>();
        assert_eq!(
            totals,
            vec![
                (MISSING_CATEGORY.to_string(), dec(200)),
                ("A".to_string(), dec(100)),
            ]
        );
        assert_eq!(kpis(&view).total_revenue, dec(300));
    }

    #[test]
    fn size_quantity_skips_rows_missing_size_or_qty() {
        let table = sales(&[
            ["2022-04-01", "A", "S", "1", "100"],
            ["2022-04-01", "A", "", "4", "100"],
            ["2022-04-01", "A", "M", "", "100"],
            ["2022-04-02", "A", "S", "2", "100"],
        ]);
        let view = FilteredView::new(&table, &Selection::all(&table));
        assert_eq!(
            size_quantity(&view),
            vec![
                SizeQuantity {
                    size: "S".to_string(),
                    quantity: 3,
                },
            ]
        );
    }

    #[test]
    fn dashboard_view_for_empty_selection_is_empty() {
        let table = sales(&[["2022-04-01", "A", "S", "1", "100"]]);
        let dashboard = DashboardView::compute(&table, &Selection::none(), DEFAULT_TREND_WINDOW);
        assert!(dashboard.rows().is_empty());
        assert!(dashboard.trend.is_empty());
        assert!(dashboard.categories.is_empty());
        assert!(dashboard.sizes.is_empty());
        assert_eq!(dashboard.kpis.average_order_value, None);
    }
}
