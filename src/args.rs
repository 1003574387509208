use crate::{
    DEFAULT_CSV_DELIMITER, DEFAULT_DEMO_ROWS, DEFAULT_PAGE_SIZE, DataGridError, DataGridResult,
    SortBy,
};

use clap::Parser;
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" data-grid people.csv"#;
const EX2: &str = r#" data-grid people.csv -f age=28 -f state=CA,TX --sort age:desc"#;
const EX3: &str = r#" data-grid -f "age=20..30" -s smith --page 2 --save-filters"#;
const EX4: &str = r#" data-grid --reset"#;

/// `KEY=VALUE` with a column-key-like left-hand side.
static FILTER_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^=\s][^=]*?)\s*=(.*)$").expect("filter argument regex is valid")
});

/// One `--filter KEY=VALUE` argument, before the column's filter type is known.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArgument {
    pub column: String,
    pub expression: String,
}

/// Command-line arguments for the data grid.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}\n{EX4}")
)]
pub struct Arguments {
    /// CSV delimiter character. [Default: ',']
    #[arg(
        short = 'd',
        long,
        default_value = DEFAULT_CSV_DELIMITER,
        help = "CSV delimiter character",
        long_help = "Sets the CSV delimiter.\n\
        Falls back to common separators (, ; | \\t) if the file parses as a single column.",
        requires = "path"
    )]
    pub delimiter: String,

    /// Filter a column, e.g. `age=28`, `age=20..30`, `state=CA,TX`, `name=ali`.
    #[arg(
        short = 'f',
        long = "filter",
        value_name = "KEY=VALUE",
        help = "Filter a column (repeatable)",
        long_help = "\
Filters the rows by one column. Repeat the flag to combine filters (all must match).

VALUE depends on the column's filter type:
- numeric:     '28' (at least 28), '20..30', '..30', '20..'
- categorical: comma-separated selection, e.g. 'CA,TX'
- text:        case-insensitive substring

An empty VALUE removes the column's filter.
",
        value_parser = validate_filter_argument
    )]
    pub filters: Vec<FilterArgument>,

    /// Column whose values identify the rows.
    #[arg(
        short = 'i',
        long,
        value_name = "COLUMN",
        help = "Column holding the row ids; rows without it are numbered [Default: id]",
        requires = "path"
    )]
    pub id_field: Option<String>,

    /// Rows per page.
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_PAGE_SIZE,
        help = "Rows per page",
        value_parser = validate_positive_number
    )]
    pub page_size: usize,

    /// Page to print, 1-based.
    #[arg(
        short = 'p',
        long,
        value_name = "N",
        default_value_t = 1,
        help = "Page to print (1-based; clamped to the last page)",
        value_parser = validate_positive_number
    )]
    pub page: usize,

    /// Optional path to the data file (CSV, XLSX, XLS).
    #[arg(
        value_name = "FILE_PATH",
        required = false,
        help = "Path to data file (CSV/XLSX/XLS) [Optional]",
        long_help = "Path to the input data file. It replaces the stored dataset.\n\
        If omitted, the stored dataset is shown, or demo data when nothing is stored."
    )]
    pub path: Option<PathBuf>,

    /// Hide a column from the printed table.
    #[arg(long, value_name = "COLUMN", help = "Hide a column (repeatable)")]
    pub hide: Vec<String>,

    /// Delete the stored dataset and filters before anything else.
    #[arg(
        long,
        help = "Delete the stored dataset and filters",
        action = clap::ArgAction::SetTrue
    )]
    pub reset: bool,

    /// Case-insensitive search across all filterable columns.
    #[arg(short = 's', long, value_name = "TEXT", help = "Search all columns")]
    pub search: Option<String>,

    /// Store the active filters so the next run starts with them.
    #[arg(
        long,
        help = "Persist the active filters for the next run",
        action = clap::ArgAction::SetTrue
    )]
    pub save_filters: bool,

    /// Sort by a column, e.g. `age:desc`. Repeat for secondary keys.
    #[arg(
        long,
        value_name = "COLUMN[:asc|:desc]",
        help = "Sort by a column (repeatable; earlier flags take precedence)",
        value_parser = validate_sort_argument
    )]
    pub sort: Vec<SortBy>,

    /// Directory of the persisted state.
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory of the stored data [Default: platform data directory]"
    )]
    pub store_dir: Option<PathBuf>,

    /// Number of generated people shown when nothing is stored.
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_DEMO_ROWS,
        help = "Rows of demo data when nothing is stored"
    )]
    pub demo_rows: usize,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }
}

// --- Validation Functions ---

/// clap validator for `--filter KEY=VALUE`.
fn validate_filter_argument(s: &str) -> DataGridResult<FilterArgument> {
    let captures = FILTER_ARGUMENT
        .captures(s)
        .ok_or_else(|| DataGridError::InvalidArgument {
            arg_name: "--filter".to_string(),
            reason: format!("'{s}' must have the form KEY=VALUE"),
        })?;

    Ok(FilterArgument {
        column: captures[1].to_string(),
        expression: captures[2].trim().to_string(),
    })
}

/// clap validator for `--sort COLUMN[:asc|:desc]`.
fn validate_sort_argument(s: &str) -> DataGridResult<SortBy> {
    s.parse()
}

/// clap validator for page numbers and sizes.
fn validate_positive_number(s: &str) -> DataGridResult<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DataGridError::InvalidArgument {
            arg_name: "--page/--page-size".to_string(),
            reason: format!("'{s}' is not a positive whole number"),
        }),
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
