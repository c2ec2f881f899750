pub mod aggregate;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod derive;
pub mod error;
pub mod filter;
pub mod io_utils;
pub mod loader;
pub mod report;
pub mod schema;
pub mod session;
pub mod table;
pub mod workbook;

use std::{
    env,
    io::{self, BufRead, Write},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, OutputFormat, SelectionArgs, SourceArgs},
    config::DashboardConfig,
    filter::Selection,
    loader::Loader,
    report::Section,
    session::{Dashboard, TableCache},
    table::TextTable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_dash", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let cache = TableCache::new();
    match cli.command {
        Commands::Categories(args) => handle_categories(&cache, &args),
        Commands::Summary(args) => handle_view(&cache, &args, Section::Summary),
        Commands::Trend(args) => handle_view(&cache, &args, Section::Trend),
        Commands::Rows(args) => handle_view(&cache, &args, Section::Rows),
        Commands::Explore(args) => handle_explore(&cache, &args),
    }
}

fn open_dashboard(cache: &TableCache, args: &SourceArgs) -> Result<Dashboard> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Loading dashboard config from {path:?}"))?,
        None => DashboardConfig::default(),
    };
    if let Some(window) = args.window {
        config.trend_window = window;
    }
    config.validate()?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Opening '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(&args.input, args.delimiter))
    );
    let loader = Loader::new(args.delimiter, encoding);
    Dashboard::open(cache, &args.input, loader, config)
        .with_context(|| format!("Error loading file {:?}", args.input))
}

fn handle_categories(cache: &TableCache, args: &cli::CategoriesArgs) -> Result<()> {
    let dashboard = open_dashboard(cache, &args.source)?;
    let categories = dashboard.categories();
    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&categories)
                .context("Serializing category list")?;
            println!("{json}");
        }
        OutputFormat::Table => {
            let default = dashboard.default_selection();
            let mut table = TextTable::new(["Category", "Default"]);
            for category in &categories {
                let marker = if default.contains(category) { "yes" } else { "" };
                table.push_row([*category, marker]);
            }
            print!("{}", table.render());
        }
    }
    info!("Listed {} category(ies)", categories.len());
    Ok(())
}

fn handle_view(cache: &TableCache, args: &cli::ViewArgs, section: Section) -> Result<()> {
    let mut dashboard = open_dashboard(cache, &args.source)?;
    if let Some(rows) = args.rows {
        dashboard.config_mut().preview_rows = rows;
    }
    let selection = resolve_selection(&dashboard, &args.selection);
    debug!("Selected categories: {:?}", selection.iter().collect::<Vec<_>>());
    let view = dashboard.view(&selection);
    match args.format {
        OutputFormat::Table => print!("{}", report::render_text(&view, dashboard.config(), section)),
        OutputFormat::Json => println!(
            "{}",
            report::render_json(&view, &selection, dashboard.config(), section)?
        ),
    }
    info!(
        "Rendered {} order(s) across {} selected category(ies)",
        view.kpis.order_count,
        selection.len()
    );
    Ok(())
}

/// An explicit `-c ""` selects nothing; no flag at all selects the default.
fn resolve_selection(dashboard: &Dashboard, args: &SelectionArgs) -> Selection {
    if args.all_categories {
        Selection::all(dashboard.table())
    } else if args.categories.is_empty() {
        dashboard.default_selection()
    } else {
        Selection::parse_list(&args.categories)
    }
}

fn handle_explore(cache: &TableCache, args: &cli::ExploreArgs) -> Result<()> {
    if io_utils::is_dash(&args.source.input) {
        anyhow::bail!("explore reads selections from stdin; the input must be a file");
    }
    let dashboard = open_dashboard(cache, &args.source)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Categories: {}",
        dashboard.categories().join(", ")
    )?;
    let initial = dashboard.default_selection();
    render_selection(&mut stdout, &dashboard, &initial)?;

    for line in stdin.lock().lines() {
        let line = line.context("Reading selection from stdin")?;
        let trimmed = line.trim();
        if matches!(trimmed, "quit" | "exit") {
            break;
        }
        let selection = if trimmed == "*" {
            Selection::all(dashboard.table())
        } else {
            Selection::parse_list(&[trimmed.to_string()])
        };
        render_selection(&mut stdout, &dashboard, &selection)?;
    }
    Ok(())
}

fn render_selection(out: &mut impl Write, dashboard: &Dashboard, selection: &Selection) -> Result<()> {
    let view = dashboard.view(selection);
    writeln!(
        out,
        "\n== Selection: [{}] ==",
        selection.iter().collect::<Vec<_>>().join(", ")
    )?;
    write!(
        out,
        "{}",
        report::render_text(&view, dashboard.config(), Section::Summary)
    )?;
    out.flush()?;
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
