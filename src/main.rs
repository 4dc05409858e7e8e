use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use aegis::chart::{build_chart_spec, ChartKind, ChartOptions, ChartSpec};
use aegis::config::Config;
use aegis::data::{base_table, Category, Department, Priority};
use aegis::figure::{render_chart, render_request, Figure};
use aegis::filter::{filter_rows, FilterSet, Preset};
use aegis::logging::{log, obj, run_id, v_str, Domain, Level};
use aegis::metrics::PortfolioSummary;
use aegis::query::{interpret_query, QueryOutcome};
use aegis::report::Dashboard;
use aegis::schema::{ColorBy, Field};
use aegis::table::{Column, DisplayTable, SortOrder};

#[derive(Parser)]
#[command(name = "aegis")]
#[command(about = "Equipment upgrade portfolio analyzer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filtered table, sorted
    Table {
        #[command(flatten)]
        filters: FilterArgs,
        /// Column to sort by (default: Value)
        #[arg(long)]
        sort: Option<Column>,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the summary cards for the filtered rows
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Render a chart over the filtered rows as JSON
    Chart {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        chart: ChartArgs,
        /// Emit plotly figure JSON instead of computed traces
        #[arg(long)]
        plotly: bool,
    },
    /// Interpret a JSON chart configuration or a plain-English request
    Query {
        text: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Also render the resulting chart
        #[arg(long)]
        render: bool,
    },
    /// Write the HTML dashboard
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        chart: ChartArgs,
        /// Output directory (default: $REPORT_DIR or out/dashboard)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the dataset manifest (row count, columns, sha256)
    Manifest,
    /// List the filter presets
    Presets,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Keep only these departments (repeatable)
    #[arg(long = "department")]
    departments: Vec<Department>,
    /// Keep only these categories (repeatable)
    #[arg(long = "category")]
    categories: Vec<Category>,
    /// Keep only these priorities (repeatable)
    #[arg(long = "priority")]
    priorities: Vec<Priority>,
    /// Maximum initial cost in $M (inclusive)
    #[arg(long)]
    max_budget: Option<f64>,
    /// Minimum ROI multiple (inclusive)
    #[arg(long)]
    min_roi: Option<f64>,
    /// Start from a preset: full, budget, value
    #[arg(long, value_parser = Preset::parse)]
    preset: Option<Preset>,
}

impl FilterArgs {
    fn resolve(&self, cfg: &Config) -> FilterSet {
        let mut filters = match self.preset {
            Some(preset) => preset.filters(),
            None => cfg.default_filters(),
        };
        if !self.departments.is_empty() {
            filters = filters.with_departments(self.departments.iter().copied());
        }
        if !self.categories.is_empty() {
            filters = filters.with_categories(self.categories.iter().copied());
        }
        if !self.priorities.is_empty() {
            filters = filters.with_priorities(self.priorities.iter().copied());
        }
        if let Some(v) = self.max_budget {
            filters = filters.with_max_budget(v);
        }
        if let Some(v) = self.min_roi {
            filters = filters.with_min_roi(v);
        }
        filters
    }
}

#[derive(Args, Debug, Clone)]
struct ChartArgs {
    /// Bar Chart, Scatter Plot, Box Plot or Histogram
    #[arg(long = "type", default_value = "Bar Chart")]
    kind: ChartKind,
    #[arg(long, default_value = "department")]
    x: Field,
    #[arg(long, default_value = "cost_m")]
    y: Field,
    /// None, department, category or priority
    #[arg(long, default_value = "category")]
    color: ColorBy,
    /// OLS trendline (scatter plots)
    #[arg(long)]
    trendline: bool,
    /// Histogram bins (default: $HIST_BINS or 15)
    #[arg(long)]
    bins: Option<usize>,
}

impl ChartArgs {
    fn options(&self, cfg: &Config) -> ChartOptions {
        ChartOptions::default()
            .with_trendline(self.trendline)
            .with_bins(self.bins.unwrap_or(cfg.hist_bins))
    }

    fn spec(&self, cfg: &Config) -> Result<ChartSpec> {
        Ok(build_chart_spec(
            self.kind,
            self.x,
            self.y,
            self.color,
            self.options(cfg),
        )?)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::from_env();
    log(
        Level::Debug,
        Domain::System,
        "start",
        obj(&[("run_id", v_str(run_id()))]),
    );
    let table = base_table();

    match cli.command {
        Commands::Table {
            filters,
            sort,
            asc,
            json,
        } => {
            let rows = filter_rows(&table, &filters.resolve(&cfg));
            let order = SortOrder {
                column: sort.unwrap_or(Column::Value),
                descending: !asc,
            };
            let display = DisplayTable::build(&rows, order);
            if json {
                print_json(&display)?;
            } else {
                print!("{}", display.to_text());
            }
        }
        Commands::Summary { filters, json } => {
            let rows = filter_rows(&table, &filters.resolve(&cfg));
            let summary = PortfolioSummary::from_table(&rows);
            if json {
                print_json(&json!({"summary": summary, "cards": summary.cards()}))?;
            } else {
                for card in summary.cards() {
                    println!("{:<16} {}", card.label, card.value);
                }
            }
        }
        Commands::Chart {
            filters,
            chart,
            plotly,
        } => {
            let rows = filter_rows(&table, &filters.resolve(&cfg));
            let figure = render_request(
                &rows,
                chart.kind,
                chart.x,
                chart.y,
                chart.color,
                chart.options(&cfg),
            );
            if plotly {
                print_json(&figure.to_plotly())?;
            } else {
                print_json(&figure)?;
            }
        }
        Commands::Query {
            text,
            filters,
            render,
        } => {
            let outcome = interpret_query(&text);
            print_json(&outcome)?;
            if let (true, Some(request)) = (render, outcome.request()) {
                let rows = filter_rows(&table, &filters.resolve(&cfg));
                let figure = match request.to_spec(cfg.hist_bins) {
                    Ok(spec) => render_chart(&rows, &spec),
                    Err(err) => Figure::error(err.to_string()),
                };
                print_json(&figure)?;
            }
            if let QueryOutcome::Invalid { .. } = outcome {
                std::process::exit(2);
            }
        }
        Commands::Report {
            filters,
            chart,
            out,
        } => {
            let spec = chart.spec(&cfg)?;
            let dashboard = Dashboard::build(&table, &filters.resolve(&cfg), &spec);
            let dir = out.unwrap_or_else(|| PathBuf::from(&cfg.report_dir));
            let written = dashboard
                .write_to(&dir)
                .with_context(|| format!("writing dashboard to {}", dir.display()))?;
            for path in written {
                println!("  {} written", path.display());
            }
        }
        Commands::Manifest => print_json(&table.manifest())?,
        Commands::Presets => {
            for preset in Preset::ALL {
                let f = preset.filters();
                let rows = filter_rows(&table, &f);
                println!(
                    "{:<8} {:<20} max_budget={:<6} min_roi={:<4} rows={}",
                    preset.slug(),
                    preset.label(),
                    f.max_budget,
                    f.min_roi,
                    rows.len()
                );
            }
        }
    }
    Ok(())
}
