/// GridView Inspector
///
/// Loads a CSV or JSON file, applies filter lines, sort clicks and a column
/// projection, then prints the visible grid (or the filtered snapshot as JSON).

use clap::Parser;
use gridview::{
    load, parse_predicate, DataSource, FilterCondition, GridResult, GridView, ViewConfig, ViewEvent,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about = "Filter, sort and inspect a table file")]
struct Args {
    /// CSV or JSON (array of objects) file
    path: PathBuf,

    /// Filter line as COLUMN:EXPRESSION, e.g. "price:> 10". Repeatable.
    /// Column names may contain ':'; the split is made at the first ':' that
    /// is followed by a valid expression.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<FilterCondition>,

    /// Click a column header. Repeat the same column to flip direction.
    #[arg(long = "sort")]
    sort: Vec<String>,

    /// Visible columns in display order
    #[arg(long = "columns", value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// View configuration file (JSON)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Print at most this many rows
    #[arg(long = "limit", default_value_t = 20)]
    limit: usize,

    /// Print the filtered snapshot as JSON instead of the grid
    #[arg(long = "json", action)]
    json: bool,

    /// Print a histogram of this numeric column over the filtered rows
    #[arg(long = "histogram")]
    histogram: Option<String>,

    /// Number of histogram bins
    #[arg(long = "bins", default_value_t = 10)]
    bins: usize,
}

fn parse_filter(s: &str) -> Result<FilterCondition, String> {
    let splits: Vec<usize> = s.match_indices(':').map(|(i, _)| i).collect();
    let first = *splits
        .first()
        .ok_or_else(|| format!("expected COLUMN:EXPRESSION, got '{}'", s))?;
    // With no parseable split, keep the first one and let the view report it
    let at = splits
        .iter()
        .copied()
        .find(|&i| parse_predicate(&s[i + 1..]).is_ok())
        .unwrap_or(first);
    Ok(FilterCondition::new(s[..at].trim(), s[at + 1..].trim()))
}

fn print_grid(view: &GridView, limit: usize) {
    let header: Vec<&str> = (0..DataSource::column_count(view))
        .filter_map(|col| view.column_name(col))
        .collect();
    println!("{}", header.join("\t"));

    let shown = view.visible_row_count().min(limit);
    for row in 0..shown {
        let cells: Vec<String> = (0..header.len())
            .map(|col| view.cell_text(row, col))
            .collect();
        println!("{}", cells.join("\t"));
    }
    if shown < view.visible_row_count() {
        println!("... {} more rows", view.visible_row_count() - shown);
    }
}

fn run(args: &Args) -> GridResult<()> {
    let config = match &args.config {
        Some(path) => ViewConfig::from_json_file(path)?,
        None => ViewConfig::default(),
    };
    let store = Arc::new(load::from_path(&args.path, config.intern_strings)?);
    log::info!(
        "loaded '{}': {} rows, {} columns",
        store.name(),
        store.len(),
        store.column_count()
    );

    let mut view = GridView::with_config(store, config);
    view.subscribe(|event| {
        if let ViewEvent::ConditionFailed { line, column, message } = event {
            log::warn!("filter {} on '{}' ignored: {}", line, column, message);
        }
    });

    let report = view.apply_filter(&args.filters);
    log::info!("{} rows match", report.match_count);

    for column in &args.sort {
        let state = view.request_sort(column)?;
        log::debug!("sort: {:?}", state);
    }
    if let Some(columns) = &args.columns {
        view.set_visible_columns(columns)?;
    }

    if let Some(column) = &args.histogram {
        let histogram = view.filtered_snapshot().histogram(column, args.bins)?;
        for (i, count) in histogram.counts.iter().enumerate() {
            println!(
                "[{:>12.4}, {:>12.4}) {}",
                histogram.edges[i],
                histogram.edges[i + 1],
                count
            );
        }
    } else if args.json {
        println!("{}", view.filtered_snapshot().to_json());
    } else {
        print_grid(&view, args.limit);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
