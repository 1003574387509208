//! Column definitions and the schema inferencer.

use crate::{Row, UniqueElements};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

/// Key of the synthetic identity field. Never shown as a column.
pub const ID_FIELD: &str = "id";

/// Lower-to-upper case boundary: `firstName` -> `first Name`.
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel boundary regex is valid"));

/// End of an acronym followed by a word: `XMLHttp` -> `XML Http`.
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym regex is valid"));

/// Word separators of snake_case and kebab-case keys.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]+").expect("separator regex is valid"));

/// Which predicate and input widget apply to a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Text,
    Numeric,
    Categorical,
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterType::Text => "text",
            FilterType::Numeric => "numeric",
            FilterType::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

/// How a text filter compares against a cell. Always case-insensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMatchMode {
    #[default]
    Contains,
    StartsWith,
    Equals,
}

/// A named, orderable field definition plus its filter metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub key: String,
    pub label: String,
    /// Classified filter type. Set by the classifier on dataset load.
    #[serde(default)]
    pub filter_type: FilterType,
    /// Explicit filter type that wins over every heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_override: Option<FilterType>,
    #[serde(default)]
    pub text_mode: TextMatchMode,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    /// Creates a visible, filterable text column with a label derived from `key`.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Column {
            label: humanize_label(&key),
            key,
            filter_type: FilterType::Text,
            filter_override: None,
            text_mode: TextMatchMode::Contains,
            filterable: true,
            visible: true,
        }
    }

    pub fn with_override(mut self, filter_type: FilterType) -> Self {
        self.filter_override = Some(filter_type);
        self
    }

    pub fn with_text_mode(mut self, mode: TextMatchMode) -> Self {
        self.text_mode = mode;
        self
    }
}

/// Converts a camelCase, snake_case or kebab-case key into a capitalized phrase.
///
/// `firstName` -> `First Name`, `last_name` -> `Last Name`, `userID` -> `User ID`.
pub fn humanize_label(key: &str) -> String {
    let spaced = ACRONYM_BOUNDARY.replace_all(key, "$1 $2");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");

    SEPARATORS
        .split(spaced.trim())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derives the column list of a dataset.
///
/// With `header_order` the columns follow it exactly, minus `exclude`.
/// Without it the key order of the first row is used, which is only as stable
/// as the source's key enumeration.
///
/// An empty `rows` slice yields no columns.
pub fn infer_columns(rows: &[Row], header_order: Option<&[String]>, exclude: &[&str]) -> Vec<Column> {
    let Some(first) = rows.first() else {
        tracing::debug!("No rows: no columns derivable.");
        return Vec::new();
    };

    let mut keys: Vec<&str> = match header_order {
        Some(headers) => headers.iter().map(String::as_str).collect(),
        None => {
            tracing::debug!("No header order supplied; using the first row's key order.");
            first.fields.keys().collect()
        }
    };

    keys.retain(|key| !exclude.contains(key));
    keys.unique();

    keys.into_iter().map(Column::new).collect()
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_schema {
    use super::*;
    use crate::{RawRow, RowId, Scalar};

    fn row(pairs: &[(&str, Scalar)]) -> Row {
        Row {
            id: RowId::Number(1),
            fields: pairs.iter().cloned().collect(),
        }
    }

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("firstName"), "First Name");
        assert_eq!(humanize_label("last_name"), "Last Name");
        assert_eq!(humanize_label("order-date"), "Order Date");
        assert_eq!(humanize_label("userID"), "User ID");
        assert_eq!(humanize_label("XMLHttpRequest"), "XML Http Request");
        assert_eq!(humanize_label("age"), "Age");
        assert_eq!(humanize_label("First Name"), "First Name");
    }

    #[test]
    fn test_header_order_minus_excluded() {
        let rows = vec![row(&[
            ("age", Scalar::from(30i64)),
            ("id", Scalar::from(1i64)),
            ("name", Scalar::from("Alice")),
        ])];
        let headers: Vec<String> = ["id", "name", "age"].map(String::from).to_vec();

        let columns = infer_columns(&rows, Some(headers.as_slice()), &[ID_FIELD]);
        let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "age"]);
        assert_eq!(columns[0].label, "Name");
    }

    #[test]
    fn test_first_row_order_without_headers() {
        let rows = vec![row(&[
            ("firstName", Scalar::from("Ana")),
            ("id", Scalar::from(1i64)),
            ("city", Scalar::from("Chicago")),
        ])];
        let columns = infer_columns(&rows, None, &[ID_FIELD]);
        let labels: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["First Name", "City"]);
    }

    #[test]
    fn test_empty_rows_yield_no_columns() {
        let headers = vec!["a".to_string()];
        assert!(infer_columns(&[], Some(headers.as_slice()), &[]).is_empty());
    }

    #[test]
    fn test_duplicate_headers_keep_first() {
        let rows = vec![Row {
            id: RowId::Number(1),
            fields: RawRow::new(),
        }];
        let headers: Vec<String> = ["a", "b", "a"].map(String::from).to_vec();
        let columns = infer_columns(&rows, Some(headers.as_slice()), &[]);
        assert_eq!(columns.len(), 2);
    }
}
