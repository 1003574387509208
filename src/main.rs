#![warn(clippy::all)]

use data_grid::{
    Arguments, ClassifierSettings, DataGridError, DataGridResult, Dataset, FileStore,
    FilterValue, GridOptions, GridView, KeyValueStore, LoadOptions, MemoryStore, Session,
    Uploader,
};
use std::{process::ExitCode, sync::Arc};
use tracing::error;

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_filter_state
cargo run -- --help
cargo run -- people.csv -f age=28 --sort age:desc
cargo doc --open
cargo b -r && cargo install --path=.
*/

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("data-grid failed: {}", err);
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Arguments) -> DataGridResult<()> {
    let store = open_store(&args);

    if args.reset {
        Dataset::clear(store.as_ref())?;
        println!("Stored data and filters deleted.");
    }

    let mut session = Session::open(store.clone(), ClassifierSettings::default(), args.demo_rows);

    // A file on the command line replaces the stored dataset.
    if let Some(options) = LoadOptions::new(&args) {
        // RUST_LOG=debug cargo run -- data.csv
        tracing::debug!("run()\nLoadOptions: {options:#?}");

        let uploader = Uploader::new(store, session.settings().clone());
        let dataset = uploader.upload(options).await?;
        session.load(dataset);
    }

    for filter in &args.filters {
        if filter.expression.is_empty() {
            session.filters_mut().clear_value(&filter.column);
            continue;
        }
        let filter_type = session
            .dataset()
            .filter_type(&filter.column)
            .ok_or_else(|| DataGridError::UnknownColumn(filter.column.clone()))?;
        let value = FilterValue::parse(filter_type, &filter.expression)?;
        session.filters_mut().set_value(&filter.column, value)?;
    }

    if let Some(search) = &args.search {
        session.filters_mut().set_global_filter(search.as_str());
    }

    if args.save_filters {
        session.filters().persist()?;
    }

    let mut options = GridOptions::new();
    for sort_by in &args.sort {
        options.add_sort(sort_by.clone());
    }
    for column in &args.hide {
        options.hide(column);
    }
    options.set_page_size(args.page_size);
    options.set_page(args.page.saturating_sub(1));

    if session.is_demo() {
        println!("Showing demo data. Pass a CSV or Excel file to load your own.\n");
    }
    for filter in session.filters().active_filters() {
        println!("Filter: {} = {}", filter.column, filter.value.to_json());
    }

    let view = GridView::build(session.filters(), &options);
    print!("{view}");
    Ok(())
}

/// The file store under `--store-dir` or the platform data directory.
/// Falls back to memory, which forgets everything on exit.
fn open_store(args: &Arguments) -> Arc<dyn KeyValueStore> {
    let store = match &args.store_dir {
        Some(dir) => Ok(FileStore::with_dir(dir)),
        None => FileStore::new(),
    };

    match store {
        Ok(store) => {
            tracing::debug!("Using store directory {}", store.dir().display());
            Arc::new(store)
        }
        Err(err) => {
            tracing::warn!("{}; nothing will be kept after this run.", err);
            Arc::new(MemoryStore::new())
        }
    }
}
