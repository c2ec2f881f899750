use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Interactive sales analytics over a tabular export", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the distinct categories available for filtering
    Categories(CategoriesArgs),
    /// Show revenue, order and size KPIs for the selected categories
    Summary(ViewArgs),
    /// Show daily revenue with its trailing moving-average trend
    Trend(ViewArgs),
    /// Show the first rows of the filtered data
    Rows(ViewArgs),
    /// Re-render the summary for each category selection read from stdin
    Explore(ExploreArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Sales CSV/TSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file with dashboard settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Trailing window, in distinct dates, for the trend line
    #[arg(long)]
    pub window: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Categories to include (comma-separated or repeated)
    #[arg(short = 'c', long = "category", action = clap::ArgAction::Append, conflicts_with = "all_categories")]
    pub categories: Vec<String>,
    /// Include every category present in the data
    #[arg(long = "all-categories")]
    pub all_categories: bool,
}

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Number of raw rows to display
    #[arg(long)]
    pub rows: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
