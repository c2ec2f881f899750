use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{aggregate::DEFAULT_TREND_WINDOW, schema::DEFAULT_DROPPED_COLUMNS};

pub const DEFAULT_CATEGORY_COUNT: usize = 3;
pub const DEFAULT_PREVIEW_ROWS: usize = 100;
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Dashboard settings, read from an optional YAML file and overridden by flags.
///
/// ```yaml
/// trend_window: 30
/// default_category_count: 3
/// preview_rows: 100
/// currency_symbol: "₹"
/// dropped_columns: [index, "Unnamed: 22"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Number of daily entries averaged by the trend line.
    pub trend_window: usize,
    /// How many categories are selected when the caller names none.
    pub default_category_count: usize,
    /// Rows shown in the raw data table.
    pub preview_rows: usize,
    pub currency_symbol: String,
    /// Artifact columns removed during cleaning when present.
    pub dropped_columns: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            trend_window: DEFAULT_TREND_WINDOW,
            default_category_count: DEFAULT_CATEGORY_COUNT,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            dropped_columns: DEFAULT_DROPPED_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: DashboardConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: DashboardConfig =
            serde_yaml::from_str(input).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.trend_window > 0, "trend_window must be at least 1");
        Ok(())
    }
}
