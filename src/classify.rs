//! Filter-type classification of columns.
//!
//! The classification runs once per dataset load; `FilterTypeCache` keeps the
//! result per column key so that filtering never re-inspects values.

use crate::{Column, FilterType, Row, Scalar};

use std::collections::{HashMap, HashSet};

/// Field names always treated as numeric, compared case-insensitively.
pub const KNOWN_NUMERIC_FIELDS: [&str; 4] = ["age", "price", "amount", "quantity"];

/// Default maximum distinct count for a categorical column.
pub const DEFAULT_CATEGORICAL_MAX_DISTINCT: usize = 20;

/// Default maximum distinct/row ratio for a categorical column.
pub const DEFAULT_CATEGORICAL_MAX_RATIO: f64 = 0.2;

/// Tunables of the classifier heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub numeric_fields: Vec<String>,
    pub categorical_max_distinct: usize,
    pub categorical_max_ratio: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        ClassifierSettings {
            numeric_fields: KNOWN_NUMERIC_FIELDS.map(String::from).to_vec(),
            categorical_max_distinct: DEFAULT_CATEGORICAL_MAX_DISTINCT,
            categorical_max_ratio: DEFAULT_CATEGORICAL_MAX_RATIO,
        }
    }
}

/// Classifies `column` against the dataset `rows`.
///
/// Rules, first match wins:
/// 1. the column's explicit override;
/// 2. a known numeric field name;
/// 3. a number in the first non-empty row;
/// 4. text with few distinct values (absolute or relative to the row count) is categorical;
/// 5. everything else is text.
pub fn classify(column: &Column, rows: &[Row], settings: &ClassifierSettings) -> FilterType {
    if let Some(filter_type) = column.filter_override {
        return filter_type;
    }

    if settings
        .numeric_fields
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&column.key))
    {
        return FilterType::Numeric;
    }

    let Some(sample) = rows.iter().find(|row| !row.fields.is_empty()) else {
        return FilterType::Text;
    };

    match sample.value(&column.key) {
        Scalar::Number(_) => FilterType::Numeric,
        Scalar::Text(_) => {
            let distinct = distinct_count(&column.key, rows);
            let ratio_limit = rows.len() as f64 * settings.categorical_max_ratio;
            if distinct <= settings.categorical_max_distinct || distinct as f64 <= ratio_limit {
                FilterType::Categorical
            } else {
                FilterType::Text
            }
        }
        _ => FilterType::Text,
    }
}

/// Number of distinct non-null values of `key` across `rows`.
// Counted by display text: `Number(1)` and `Text("1")` are the same value.
fn distinct_count(key: &str, rows: &[Row]) -> usize {
    rows.iter()
        .map(|row| row.value(key))
        .filter(|value| !value.is_null())
        .map(Scalar::display_text)
        .collect::<HashSet<_>>()
        .len()
}

/// Filter types of one dataset, computed once and looked up per column key.
#[derive(Debug, Clone, Default)]
pub struct FilterTypeCache {
    types: HashMap<String, FilterType>,
}

impl FilterTypeCache {
    /// Classifies every column of a freshly loaded dataset and records the
    /// result on the columns themselves.
    pub fn build(columns: &mut [Column], rows: &[Row], settings: &ClassifierSettings) -> Self {
        let mut types = HashMap::with_capacity(columns.len());
        for column in columns.iter_mut() {
            let filter_type = classify(column, rows, settings);
            column.filter_type = filter_type;
            types.insert(column.key.clone(), filter_type);
        }

        tracing::debug!(
            classified = ?columns.iter().map(|c| (&c.key, c.filter_type)).collect::<Vec<_>>(),
            "Filter types computed for {} columns.",
            columns.len()
        );

        FilterTypeCache { types }
    }

    /// Rebuilds the cache from columns that were already classified (e.g. restored from storage).
    pub fn from_columns(columns: &[Column]) -> Self {
        let types = columns
            .iter()
            .map(|c| (c.key.clone(), c.filter_type))
            .collect();
        FilterTypeCache { types }
    }

    pub fn get(&self, key: &str) -> Option<FilterType> {
        self.types.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
