use polars::prelude::PolarsError;
use std::{io, path::PathBuf};
use thiserror::Error;
use tokio::task::JoinError;

/**
Result type to simplify function signatures.

This is a custom result type that uses our custom `DataGridError` for the error type.

Functions can return `DataGridResult<T>` and then use `?` to automatically propagate errors.
*/
pub type DataGridResult<T> = Result<T, DataGridError>;

/**
Custom error type for the data grid.

This enum defines all the possible errors that can occur while loading a file,
building a dataset, filtering it or persisting its state.

We use the `thiserror` crate to derive the `Error` trait and automatically
implement `Display` using the `#[error(...)]` attribute.
*/
#[derive(Error, Debug)]
pub enum DataGridError {
    // Wrapper for standard IO errors.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Wrapper for Polars errors raised by the CSV reader.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    // Wrapper for calamine errors raised while opening a workbook.
    #[error("Excel error: {0}")]
    Calamine(#[from] calamine::Error),

    // Wrapper for JSON (de)serialization errors of persisted state.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Wrapper for Tokio JoinErrors, occurring when the blocking parse task fails.
    #[error("Tokio JoinError: {0}")]
    TokioJoin(#[from] JoinError),

    // Errors encountered while parsing CSV data (e.g., no usable delimiter).
    #[error("CSV parsing error: {0}")]
    CsvParsing(String),

    // Errors encountered while reading the first worksheet of a workbook.
    #[error("Excel parsing error: {0}")]
    ExcelParsing(String),

    // Indicates that a specified file could not be found, storing the attempted path.
    #[error("File not found: {0:#?}")]
    FileNotFound(PathBuf),

    // Indicates an invalid CSV delimiter was provided (empty or multi-byte).
    #[error("Invalid CSV delimiter: '{0}'")]
    InvalidDelimiter(String),

    // The file extension is not one of csv, xlsx, xls.
    #[error("Unsupported file format '{0}'. Please upload a CSV or Excel file.")]
    UnsupportedFileType(String),

    #[error("Missing file extension for '{0}'. Please upload a CSV or Excel file.")]
    MissingExtension(PathBuf),

    /// A second upload was requested while a previous one is still being parsed.
    #[error("An upload is already in progress: {0}")]
    UploadInProgress(String),

    /// The parsed source contained no rows.
    #[error("The dataset is empty")]
    EmptyDataset,

    // --- Filter Errors ---
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' is not filterable")]
    ColumnNotFilterable(String),

    /// The filter value shape does not fit the column's filter type.
    #[error("Filter for column '{column}' expects a {expected} value, got {found}")]
    FilterTypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// A textual filter expression (CLI or persisted) could not be interpreted.
    #[error("Invalid filter expression '{expression}': {reason}")]
    InvalidFilter { expression: String, reason: String },
    // --- End Filter Errors ---

    // The durable key-value store could not be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid value for command-line argument '{arg_name}': {reason}")]
    InvalidArgument {
        arg_name: String, // Context about *which* argument failed
        reason: String,   // The specific error reason
    },

    // A catch-all for other, less specific errors not covered by specific variants.
    #[error("Other error: {0}")]
    Other(String),
}

// Implementation of the From trait to convert a String into a DataGridError.
impl From<String> for DataGridError {
    fn from(err: String) -> DataGridError {
        // Prefer using specific error variants when possible, fallback to Other.
        DataGridError::Other(err)
    }
}
