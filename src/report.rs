//! Terminal and JSON presentation of a [`DashboardView`].

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    aggregate::{CategoryRevenue, DashboardView, Kpis, SizeQuantity, TrendPoint},
    config::DashboardConfig,
    data::format_date,
    filter::Selection,
    table::TextTable,
};

pub const UNDEFINED: &str = "n/a";

/// Which part of the dashboard a command renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Trend,
    Rows,
}

/// Formats `amount` with `places` decimals and comma thousands separators.
pub fn format_decimal(amount: Decimal, places: u32) -> String {
    let rounded = amount.round_dp(places);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", places as usize, rounded.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };
    let mut out = String::with_capacity(text.len() + integer.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let formatted = format_decimal(amount, 0);
    match formatted.strip_prefix('-') {
        Some(magnitude) => format!("-{symbol}{magnitude}"),
        None => format!("{symbol}{formatted}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// KPI values ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiDisplay {
    pub total_revenue: String,
    pub order_count: String,
    pub average_order_value: String,
}

impl KpiDisplay {
    pub fn new(kpis: &Kpis, currency_symbol: &str) -> Self {
        KpiDisplay {
            total_revenue: format_currency(kpis.total_revenue, currency_symbol),
            order_count: kpis.order_count.to_string(),
            average_order_value: kpis
                .average_order_value
                .map(|avg| format_currency(avg, currency_symbol))
                .unwrap_or_else(|| UNDEFINED.to_string()),
        }
    }
}

pub fn render_text(view: &DashboardView<'_>, config: &DashboardConfig, section: Section) -> String {
    match section {
        Section::Summary => render_summary(view, config),
        Section::Trend => render_trend(&view.trend, config.trend_window),
        Section::Rows => render_rows(view, config.preview_rows),
    }
}

fn render_summary(view: &DashboardView<'_>, config: &DashboardConfig) -> String {
    let symbol = config.currency_symbol.as_str();
    let display = KpiDisplay::new(&view.kpis, symbol);
    let mut kpis = TextTable::new(["Metric", "Value"]).right_align(&[1]);
    kpis.push_row(["Total Revenue", display.total_revenue.as_str()]);
    kpis.push_row(["Total Orders", display.order_count.as_str()]);
    kpis.push_row(["Avg Order Value", display.average_order_value.as_str()]);

    let mut output = kpis.render();
    output.push('\n');
    output.push_str("Top Selling Categories\n");
    output.push_str(&render_categories(&view.categories, symbol));
    output.push('\n');
    output.push_str("Sales by Size\n");
    output.push_str(&render_sizes(&view.sizes));
    if let Some(latest) = view.trend.iter().rev().find_map(|point| point.trend) {
        output.push('\n');
        output.push_str(&format!(
            "Latest {}-entry trend: {}\n",
            config.trend_window,
            format_currency(latest, symbol)
        ));
    }
    output
}

fn render_categories(categories: &[CategoryRevenue], symbol: &str) -> String {
    let mut table = TextTable::new(["Category", "Amount"]).right_align(&[1]);
    for entry in categories {
        table.push_row([
            entry.category.clone(),
            format_currency(entry.revenue, symbol),
        ]);
    }
    table.render()
}

fn render_sizes(sizes: &[SizeQuantity]) -> String {
    let total = sizes.iter().map(|s| s.quantity).sum::<u64>();
    let mut table = TextTable::new(["Size", "Qty", "Share"]).right_align(&[1, 2]);
    for entry in sizes {
        let share = if total > 0 {
            format!("{:.2}%", entry.quantity as f64 / total as f64 * 100.0)
        } else {
            UNDEFINED.to_string()
        };
        table.push_row([entry.size.clone(), entry.quantity.to_string(), share]);
    }
    table.render()
}

fn render_trend(trend: &[TrendPoint], window: usize) -> String {
    let mut table = TextTable::new(["Date", "Amount", format!("Trend ({window})").as_str()])
        .right_align(&[1, 2]);
    for point in trend {
        table.push_row([
            format_date(&point.date),
            format_decimal(point.revenue, 2),
            point
                .trend
                .map(|t| format_decimal(t, 2))
                .unwrap_or_default(),
        ]);
    }
    table.render()
}

fn render_rows(view: &DashboardView<'_>, limit: usize) -> String {
    let mut table = TextTable::new(view.view.headers().iter().cloned());
    for record in view.view.head(limit) {
        table.push_row(record.fields().iter().cloned());
    }
    table.render()
}

#[derive(Debug, Serialize)]
struct JsonReport<'v> {
    selection: Vec<&'v str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kpis: Option<JsonKpis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<&'v [CategoryRevenue]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sizes: Option<&'v [SizeQuantity]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend: Option<&'v [TrendPoint]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<Map<String, JsonValue>>>,
}

#[derive(Debug, Serialize)]
struct JsonKpis {
    #[serde(flatten)]
    values: Kpis,
    display: KpiDisplay,
}

pub fn render_json(
    view: &DashboardView<'_>,
    selection: &Selection,
    config: &DashboardConfig,
    section: Section,
) -> Result<String> {
    let mut report = JsonReport {
        selection: selection.iter().collect(),
        kpis: None,
        categories: None,
        sizes: None,
        trend: None,
        rows: None,
    };
    match section {
        Section::Summary => {
            report.kpis = Some(JsonKpis {
                values: view.kpis,
                display: KpiDisplay::new(&view.kpis, &config.currency_symbol),
            });
            report.categories = Some(&view.categories);
            report.sizes = Some(&view.sizes);
        }
        Section::Trend => report.trend = Some(&view.trend),
        Section::Rows => {
            let headers = view.view.headers();
            report.rows = Some(
                view.view
                    .head(config.preview_rows)
                    .iter()
                    .map(|record| {
                        headers
                            .iter()
                            .cloned()
                            .zip(record.fields().iter().cloned().map(JsonValue::String))
                            .collect()
                    })
                    .collect(),
            );
        }
    }
    serde_json::to_string_pretty(&report).context("Serializing dashboard report")
}
