//! File readers: the boundary with the CSV (polars) and Excel (calamine) parsers.
//!
//! Both readers return a `ParsedFile`: the header names in file order plus one
//! `RawRow` per data row, with numbers and booleans already coerced.

use crate::{
    Arguments, DataGridError, DataGridResult, FileExtension, ID_FIELD, RawRow, Scalar,
    UniqueElements,
};

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use tokio::task::spawn_blocking;

use std::{
    collections::HashSet,
    fmt::Debug,
    path::{Path, PathBuf},
};

// --- Constants ---

/// Default delimiter used for CSV parsing if not specified.
pub static DEFAULT_CSV_DELIMITER: &str = ",";

/// Delimiters tried, in order, when the configured one yields a single column.
const FALLBACK_DELIMITERS: [u8; 4] = [b',', b';', b'|', b'\t'];

/// Prefix of the generated name of a blank Excel header cell.
const BLANK_HEADER_PREFIX: &str = "column_";

// --- LoadOptions Struct ---

/// Holds configuration parameters related to **loading** a file.
///
/// Instances are created from `Arguments` in `main.rs` (or with `Default` in
/// tests) and handed to the `Uploader`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Path of the file to read.
    pub path: PathBuf,
    /// The character used to separate columns in a CSV file.
    pub csv_delimiter: String,
    /// Field whose value becomes the row id (`id` by default). Rows are
    /// numbered when `None` or when a row lacks the field.
    pub id_field: Option<String>,
    /// Rows scanned for CSV type inference. `None` scans the whole file.
    pub infer_schema_rows: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            path: PathBuf::new(),
            csv_delimiter: DEFAULT_CSV_DELIMITER.to_string(),
            id_field: Some(ID_FIELD.to_string()),
            infer_schema_rows: None,
        }
    }
}

impl LoadOptions {
    /// Creates `LoadOptions` from the command-line `Arguments`.
    /// Returns `None` when no file was given.
    pub fn new(args: &Arguments) -> Option<Self> {
        let path = args.path.clone()?;
        Some(LoadOptions {
            path,
            csv_delimiter: args.delimiter.clone(),
            id_field: args.id_field.clone().or_else(|| Some(ID_FIELD.to_string())),
            ..Default::default()
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        LoadOptions {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Retrieves the CSV separator byte from the `csv_delimiter` configuration.
    ///
    /// ### Returns
    /// `Ok(u8)` for a single-byte delimiter, or `Err(DataGridError::InvalidDelimiter)`.
    fn csv_separator(&self) -> DataGridResult<u8> {
        match self.csv_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(DataGridError::InvalidDelimiter(self.csv_delimiter.clone())),
        }
    }
}

/// What a reader hands over to the dataset builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    /// Header names in file order.
    pub headers: Vec<String>,
    /// One record per non-blank data row.
    pub rows: Vec<RawRow>,
    pub extension: FileExtension,
}

/// Checks that the path names a supported file and returns its extension.
///
/// Runs before any reading so that unsupported uploads never touch state.
pub fn check_extension(path: &Path) -> DataGridResult<FileExtension> {
    let extension = FileExtension::from_path(path);
    match &extension {
        FileExtension::Csv | FileExtension::Xlsx | FileExtension::Xls => Ok(extension),
        FileExtension::Unknown(ext) => Err(DataGridError::UnsupportedFileType(ext.clone())),
        FileExtension::Missing => Err(DataGridError::MissingExtension(path.to_path_buf())),
    }
}

/// Reads a CSV or Excel file. Blocking; see `read_file_async`.
pub fn read_file(options: &LoadOptions) -> DataGridResult<ParsedFile> {
    let extension = check_extension(&options.path)?;
    if !options.path.is_file() {
        return Err(DataGridError::FileNotFound(options.path.clone()));
    }

    let parsed = if extension.is_excel() {
        read_excel(&options.path)?
    } else {
        read_csv(options)?
    };

    tracing::debug!(
        "fn read_file(): {} file, {} headers, {} rows from {}",
        extension.kind(),
        parsed.headers.len(),
        parsed.rows.len(),
        options.path.display()
    );
    Ok(parsed)
}

/// Reads a file on a blocking worker thread so the caller stays responsive.
pub async fn read_file_async(options: LoadOptions) -> DataGridResult<ParsedFile> {
    execute_blocking(move || read_file(&options)).await
}

// --- CSV ---

/// Reads a CSV file with the configured delimiter, falling back to other
/// common delimiters when the result has a single column.
fn read_csv(options: &LoadOptions) -> DataGridResult<ParsedFile> {
    let initial_separator = options.csv_separator()?;

    let mut delimiters_to_try = vec![initial_separator];
    delimiters_to_try.extend(FALLBACK_DELIMITERS);
    delimiters_to_try.unique();

    let mut iterator = delimiters_to_try.iter().peekable();
    let mut last_error = None;

    while let Some(&delimiter) = iterator.next() {
        let is_last_element = iterator.peek().is_none();

        match read_csv_with_delimiter(&options.path, delimiter, options.infer_schema_rows) {
            Ok(df) if df.width() <= 1 && !is_last_element => {
                tracing::debug!(
                    "Delimiter '{}' resulted in {} columns; trying the next one.",
                    delimiter as char,
                    df.width()
                );
            }
            Ok(df) => {
                if delimiter != initial_separator {
                    tracing::warn!(
                        "Read CSV with fallback delimiter '{}' instead of '{}'.",
                        delimiter as char,
                        initial_separator as char
                    );
                }
                return dataframe_to_parsed(&df);
            }
            Err(e) => {
                tracing::debug!("CSV read with delimiter '{}' failed: {}", delimiter as char, e);
                last_error = Some(e);
            }
        }
    }

    let error = DataGridError::CsvParsing(match last_error {
        Some(e) => format!("Error parsing CSV '{}': {e}", options.path.display()),
        None => format!("Could not parse CSV '{}'.", options.path.display()),
    });
    tracing::error!("{}", error);
    Err(error)
}

/// Reads the whole file with one delimiter.
///
/// - header row required;
/// - empty fields become null;
/// - numeric and boolean columns are inferred from `infer_schema_rows` rows.
fn read_csv_with_delimiter(
    path: &Path,
    delimiter: u8,
    infer_schema_rows: Option<usize>,
) -> DataGridResult<DataFrame> {
    let csv_parse_options = CsvParseOptions::default()
        .with_encoding(CsvEncoding::LossyUtf8) // Handle potentially non-strict UTF8
        .with_missing_is_null(true) // Treat empty fields as nulls
        .with_separator(delimiter);

    let df = CsvReadOptions::default()
        .with_parse_options(csv_parse_options)
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_rows)
        .with_raise_if_empty(false)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    tracing::debug!("CSV read complete. Shape: {:?}", df.shape());
    Ok(df)
}

/// Converts a DataFrame into header order plus raw rows.
fn dataframe_to_parsed(df: &DataFrame) -> DataGridResult<ParsedFile> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let columns = headers
        .iter()
        .map(|name| df.column(name))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for index in 0..df.height() {
        let mut row = RawRow::with_capacity(headers.len());
        for (name, column) in headers.iter().zip(&columns) {
            row.insert(name.clone(), any_value_to_scalar(column.get(index)?));
        }
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(ParsedFile {
        headers,
        rows,
        extension: FileExtension::Csv,
    })
}

fn any_value_to_scalar(value: AnyValue<'_>) -> Scalar {
    match value {
        AnyValue::Null => Scalar::Null,
        AnyValue::Boolean(b) => Scalar::Bool(b),
        AnyValue::String(s) => Scalar::from(s),
        AnyValue::StringOwned(s) => Scalar::from(s.as_str()),
        other => match other.extract::<f64>() {
            Some(n) => Scalar::Number(n),
            None => Scalar::Text(other.to_string()),
        },
    }
}

// --- Excel ---

/// Reads the first worksheet of a workbook; its first row is the header.
fn read_excel(path: &Path) -> DataGridResult<ParsedFile> {
    let mut workbook = open_workbook_auto(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataGridError::ExcelParsing("the workbook has no worksheets".to_string()))?
        .map_err(|e| DataGridError::ExcelParsing(e.to_string()))?;

    let cells: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    let mut parsed = cells_to_parsed(&cells);
    parsed.extension = FileExtension::from_path(path);
    Ok(parsed)
}

/// Turns a grid of worksheet cells into headers and rows.
///
/// Blank header cells are named `column_N` (1-based); repeated names get a
/// `_1`, `_2`, ... suffix so no column is lost. Cells beyond the header width
/// are ignored; missing trailing cells are null.
fn cells_to_parsed(cells: &[Vec<Data>]) -> ParsedFile {
    let Some((header_row, data_rows)) = cells.split_first() else {
        return ParsedFile {
            headers: Vec::new(),
            rows: Vec::new(),
            extension: FileExtension::Xlsx,
        };
    };

    let names: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(index, cell)| match cell_to_scalar(cell).display_text().trim() {
            "" => format!("{BLANK_HEADER_PREFIX}{}", index + 1),
            name => name.to_string(),
        })
        .collect();
    let headers = disambiguate_headers(names);

    let rows = data_rows
        .iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(index, name)| {
                    let value = cells.get(index).map_or(Scalar::Null, cell_to_scalar);
                    (name.clone(), value)
                })
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_blank())
        .collect();

    ParsedFile {
        headers,
        rows,
        extension: FileExtension::Xlsx,
    }
}

/// Keeps the first occurrence of each name and renames later ones `name_1`,
/// `name_2`, ..., skipping suffixes already taken by another header.
fn disambiguate_headers(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());

    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut suffix = 1;
            let renamed = loop {
                let candidate = format!("{name}_{suffix}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            tracing::warn!("Duplicate header renamed to '{}'.", renamed);
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}

fn cell_to_scalar(cell: &Data) -> Scalar {
    use calamine::DataType;

    match cell {
        Data::Int(i) => Scalar::from(*i),
        Data::Float(f) => Scalar::Number(*f),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Scalar::Null,
        Data::String(s) => Scalar::from(s.as_str()),
        Data::Empty | Data::Error(_) => Scalar::Null,
        other => match other.as_datetime() {
            Some(datetime) => Scalar::Text(datetime.to_string()),
            None => Scalar::Text(other.to_string()),
        },
    }
}

// --- Blocking helper ---

/// Executes a potentially blocking read on a separate Tokio blocking thread.
///
/// Maps the `JoinError` of a panicked or cancelled task to `DataGridError::TokioJoin`.
async fn execute_blocking<T, F>(op: F) -> DataGridResult<T>
where
    F: FnOnce() -> DataGridResult<T> + Send + 'static,
    T: Debug + Send + 'static,
{
    spawn_blocking(op).await.map_err(DataGridError::from)?
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_reader
#[cfg(test)]
mod tests_reader {
    use super::*;
    use std::{fs::File, io::Write};
    use tempfile::TempDir;

    // Writes `content` to `<dir>/<name>` and returns options pointing at it.
    fn setup_file(dir: &TempDir, name: &str, content: &str) -> DataGridResult<LoadOptions> {
        let path = dir.path().join(name);
        let mut file = File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(LoadOptions::with_path(path))
    }

    #[tokio::test]
    async fn test_csv_header_order_and_coercion() -> DataGridResult<()> {
        let dir = TempDir::new()?;
        let csv_content = "\
id,name,age,member
1,Alice,30,true
2,Bob,25.5,false
3,,,
";
        let options = setup_file(&dir, "people.csv", csv_content)?;
        let parsed = read_file_async(options).await?;

        assert_eq!(parsed.headers, vec!["id", "name", "age", "member"]);
        assert_eq!(parsed.extension, FileExtension::Csv);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].get("name"), Some(&Scalar::from("Alice")));
        assert_eq!(parsed.rows[0].get("age"), Some(&Scalar::Number(30.0)));
        assert_eq!(parsed.rows[1].get("age"), Some(&Scalar::Number(25.5)));
        assert_eq!(parsed.rows[1].get("member"), Some(&Scalar::Bool(false)));
        assert_eq!(parsed.rows[2].get("name"), Some(&Scalar::Null));
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_semicolon_fallback() -> DataGridResult<()> {
        let dir = TempDir::new()?;
        let options = setup_file(&dir, "euro.csv", "city;state\nDallas;TX\nChicago;IL\n")?;
        let parsed = read_file_async(options).await?;

        assert_eq!(parsed.headers, vec!["city", "state"]);
        assert_eq!(parsed.rows[1].get("state"), Some(&Scalar::from("IL")));
        Ok(())
    }

    #[tokio::test]
    async fn test_header_only_csv_has_no_rows() -> DataGridResult<()> {
        let dir = TempDir::new()?;
        let options = setup_file(&dir, "empty.csv", "id,name,age\n")?;
        let parsed = read_file_async(options).await?;
        assert!(parsed.rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_unsupported_and_missing_extensions() {
        assert!(matches!(
            check_extension(Path::new("notes.txt")),
            Err(DataGridError::UnsupportedFileType(ext)) if ext == "txt"
        ));
        assert!(matches!(
            check_extension(Path::new("data")),
            Err(DataGridError::MissingExtension(_))
        ));
        assert!(check_extension(Path::new("Book1.XLSX")).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let options = LoadOptions::with_path("/definitely/not/here.csv");
        assert!(matches!(read_file(&options), Err(DataGridError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_delimiter() {
        let options = LoadOptions {
            csv_delimiter: "::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            options.csv_separator(),
            Err(DataGridError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_excel_cells_to_rows() {
        let cells = vec![
            vec![
                Data::String("firstName".to_string()),
                Data::Empty,
                Data::String("age".to_string()),
            ],
            vec![Data::String("Ana".to_string()), Data::Int(7), Data::Float(31.0)],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![Data::String("Bea".to_string()), Data::Bool(true)],
        ];

        let parsed = cells_to_parsed(&cells);
        assert_eq!(parsed.headers, vec!["firstName", "column_2", "age"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("column_2"), Some(&Scalar::Number(7.0)));
        assert_eq!(parsed.rows[0].get("age"), Some(&Scalar::Number(31.0)));
        assert_eq!(parsed.rows[1].get("column_2"), Some(&Scalar::Bool(true)));
        assert_eq!(parsed.rows[1].get("age"), Some(&Scalar::Null));
    }

    #[test]
    fn test_duplicate_excel_headers_keep_every_column() {
        let cells = vec![
            vec![
                Data::String("a".to_string()),
                Data::String("b".to_string()),
                Data::String("a".to_string()),
                Data::String("a_1".to_string()),
            ],
            vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4)],
        ];

        let parsed = cells_to_parsed(&cells);
        assert_eq!(parsed.headers, vec!["a", "b", "a_2", "a_1"]);
        assert_eq!(parsed.rows[0].get("a"), Some(&Scalar::Number(1.0)));
        assert_eq!(parsed.rows[0].get("a_2"), Some(&Scalar::Number(3.0)));
        assert_eq!(parsed.rows[0].get("a_1"), Some(&Scalar::Number(4.0)));

        let cells = vec![
            vec![
                Data::String("a".to_string()),
                Data::String("b".to_string()),
                Data::String("a".to_string()),
            ],
            vec![Data::Int(1), Data::Int(2), Data::Int(3)],
        ];
        let parsed = cells_to_parsed(&cells);
        assert_eq!(parsed.headers, vec!["a", "b", "a_1"]);
        assert_eq!(parsed.rows[0].get("a"), Some(&Scalar::Number(1.0)));
        assert_eq!(parsed.rows[0].get("a_1"), Some(&Scalar::Number(3.0)));
    }

    #[test]
    fn test_read_xlsx_workbook() -> DataGridResult<()> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/people.xlsx");
        let parsed = read_file(&LoadOptions::with_path(path))?;

        assert_eq!(parsed.extension, FileExtension::Xlsx);
        assert_eq!(parsed.headers, vec!["id", "name", "age"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("id"), Some(&Scalar::Number(1.0)));
        assert_eq!(parsed.rows[0].get("name"), Some(&Scalar::from("Alice")));
        assert_eq!(parsed.rows[1].get("age"), Some(&Scalar::Number(25.0)));
        Ok(())
    }

    #[test]
    fn test_text_file_named_xlsx_is_an_error() -> DataGridResult<()> {
        let dir = TempDir::new()?;
        let options = setup_file(&dir, "fake.xlsx", "id,name\n1,Alice\n")?;
        assert!(read_file(&options).is_err());
        Ok(())
    }

    #[test]
    fn test_load_options_default_to_id_field() {
        assert_eq!(LoadOptions::default().id_field.as_deref(), Some(ID_FIELD));
    }

    #[test]
    fn test_empty_sheet() {
        let parsed = cells_to_parsed(&[]);
        assert!(parsed.headers.is_empty());
        assert!(parsed.rows.is_empty());
    }
}
