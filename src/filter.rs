//! Per-column filter values and their row predicates.

use crate::{Column, DataGridError, DataGridResult, FilterType, Scalar, TextMatchMode};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric filter of a `Numeric` column.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericFilter {
    /// Row value must be greater than or equal to the threshold.
    AtLeast(f64),
    /// Inclusive range; a `None` bound is open.
    Between { min: Option<f64>, max: Option<f64> },
}

impl NumericFilter {
    fn matches(&self, value: f64) -> bool {
        match self {
            NumericFilter::AtLeast(threshold) => value >= *threshold,
            NumericFilter::Between { min, max } => {
                min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
            }
        }
    }
}

/// The active filter of one column. Its shape follows the column's `FilterType`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Numeric(NumericFilter),
    Categorical(Vec<Scalar>),
}

impl FilterValue {
    /// Filter type this value belongs to.
    pub fn filter_type(&self) -> FilterType {
        match self {
            FilterValue::Text(_) => FilterType::Text,
            FilterValue::Numeric(_) => FilterType::Numeric,
            FilterValue::Categorical(_) => FilterType::Categorical,
        }
    }

    /// `false` for blank text, a range without bounds and an empty selection.
    /// An inactive value is the same as no filter at all.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Text(query) => !query.trim().is_empty(),
            FilterValue::Numeric(NumericFilter::AtLeast(t)) => !t.is_nan(),
            FilterValue::Numeric(NumericFilter::Between { min, max }) => {
                min.is_some() || max.is_some()
            }
            FilterValue::Categorical(selected) => !selected.is_empty(),
        }
    }

    /// Row-visibility predicate for a single cell of `column`.
    ///
    /// Numeric filters let non-numeric cells through so that missing or
    /// malformed data never disappears silently.
    pub fn matches(&self, column: &Column, cell: &Scalar) -> bool {
        if !self.is_active() {
            return true;
        }

        match (column.filter_type, self) {
            (FilterType::Text, FilterValue::Text(query)) => {
                text_matches(column.text_mode, query, cell)
            }
            (FilterType::Numeric, FilterValue::Numeric(filter)) => {
                cell.as_number().is_none_or(|value| filter.matches(value))
            }
            // Compared by display text, so a typed `10` selects the text cell "10".
            (FilterType::Categorical, FilterValue::Categorical(selected)) => {
                let shown = cell.display_text();
                selected.iter().any(|s| s.display_text() == shown)
            }
            // Shapes are checked on insertion; a stale mismatch filters nothing.
            _ => true,
        }
    }

    /// JSON form used by the persisted filter list.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Text(query) => Value::from(query.as_str()),
            FilterValue::Numeric(NumericFilter::AtLeast(threshold)) => Value::from(*threshold),
            FilterValue::Numeric(NumericFilter::Between { min, max }) => {
                Value::Array(vec![Value::from(*min), Value::from(*max)])
            }
            FilterValue::Categorical(selected) => Value::Array(
                selected
                    .iter()
                    .map(|s| serde_json::to_value(s).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }

    /// Interprets a persisted JSON value as a filter of `filter_type`.
    pub fn from_json(filter_type: FilterType, value: &Value) -> DataGridResult<FilterValue> {
        let invalid = |reason: &str| DataGridError::InvalidFilter {
            expression: value.to_string(),
            reason: format!("{reason} for a {filter_type} filter"),
        };

        match filter_type {
            FilterType::Text => match value {
                Value::String(query) => Ok(FilterValue::Text(query.clone())),
                Value::Number(n) => Ok(FilterValue::Text(n.to_string())),
                _ => Err(invalid("expected a string")),
            },
            FilterType::Numeric => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(|t| FilterValue::Numeric(NumericFilter::AtLeast(t)))
                    .ok_or_else(|| invalid("expected a finite number")),
                Value::Array(bounds) if bounds.len() == 2 => {
                    let bound = |v: &Value| match v {
                        Value::Null => Ok(None),
                        Value::Number(n) => Ok(n.as_f64()),
                        Value::String(s) if s.trim().is_empty() => Ok(None),
                        Value::String(s) => s
                            .trim()
                            .parse::<f64>()
                            .map(Some)
                            .map_err(|_| invalid("range bounds must be numbers")),
                        _ => Err(invalid("range bounds must be numbers")),
                    };
                    Ok(FilterValue::Numeric(NumericFilter::Between {
                        min: bound(&bounds[0])?,
                        max: bound(&bounds[1])?,
                    }))
                }
                _ => Err(invalid("expected a number or a [min, max] pair")),
            },
            FilterType::Categorical => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| serde_json::from_value::<Scalar>(item.clone()))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FilterValue::Categorical)
                    .map_err(DataGridError::from),
                Value::Null => Err(invalid("expected a selection")),
                scalar => serde_json::from_value::<Scalar>(scalar.clone())
                    .map(|s| FilterValue::Categorical(vec![s]))
                    .map_err(DataGridError::from),
            },
        }
    }

    /// Parses a command-line filter expression for a column of `filter_type`.
    ///
    /// * text: the substring itself;
    /// * numeric: `28` (at least), `20..30`, `..30` or `20..`;
    /// * categorical: comma-separated values, numbers matched as numbers.
    pub fn parse(filter_type: FilterType, expression: &str) -> DataGridResult<FilterValue> {
        let invalid = |reason: String| DataGridError::InvalidFilter {
            expression: expression.to_string(),
            reason,
        };

        match filter_type {
            FilterType::Text => Ok(FilterValue::Text(expression.to_string())),
            FilterType::Numeric => {
                let number = |s: &str| -> DataGridResult<Option<f64>> {
                    let s = s.trim();
                    if s.is_empty() {
                        return Ok(None);
                    }
                    s.parse::<f64>()
                        .map(Some)
                        .map_err(|e| invalid(format!("'{s}' is not a number: {e}")))
                };

                match expression.split_once("..") {
                    Some((min, max)) => Ok(FilterValue::Numeric(NumericFilter::Between {
                        min: number(min)?,
                        max: number(max)?,
                    })),
                    None => number(expression)?
                        .map(|t| FilterValue::Numeric(NumericFilter::AtLeast(t)))
                        .ok_or_else(|| invalid("a numeric filter needs a value".to_string())),
                }
            }
            FilterType::Categorical => {
                let selected = expression
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| match s.parse::<f64>() {
                        Ok(n) => Scalar::Number(n),
                        Err(_) => Scalar::from(s),
                    })
                    .collect();
                Ok(FilterValue::Categorical(selected))
            }
        }
    }
}

fn text_matches(mode: TextMatchMode, query: &str, cell: &Scalar) -> bool {
    let needle = query.trim().to_lowercase();
    let haystack = cell.display_text().to_lowercase();
    match mode {
        TextMatchMode::Contains => haystack.contains(&needle),
        TextMatchMode::StartsWith => haystack.starts_with(&needle),
        TextMatchMode::Equals => haystack.trim() == needle,
    }
}

/// One entry of the persisted filter list: `{ "id": columnKey, "value": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedFilter {
    pub id: String,
    pub value: Value,
}

/// An active filter together with its column key.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: FilterValue,
}

impl ColumnFilter {
    pub fn to_persisted(&self) -> PersistedFilter {
        PersistedFilter {
            id: self.column.clone(),
            value: self.value.to_json(),
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_filter
#[cfg(test)]
mod tests_filter {
    use super::*;
    use serde_json::json;

    fn numeric_column(key: &str) -> Column {
        let mut column = Column::new(key);
        column.filter_type = FilterType::Numeric;
        column
    }

    #[test]
    fn test_numeric_range_inclusive() {
        let column = numeric_column("age");
        let filter = FilterValue::Numeric(NumericFilter::Between {
            min: Some(20.0),
            max: Some(30.0),
        });

        let visible: Vec<i64> = [15, 20, 25, 31]
            .into_iter()
            .filter(|age| filter.matches(&column, &Scalar::from(*age)))
            .collect();
        assert_eq!(visible, vec![20, 25]);
    }

    #[test]
    fn test_numeric_threshold_passes_non_numeric_cells() {
        let column = numeric_column("age");
        let filter = FilterValue::Numeric(NumericFilter::AtLeast(28.0));

        assert!(filter.matches(&column, &Scalar::from(30i64)));
        assert!(!filter.matches(&column, &Scalar::from(25i64)));
        assert!(filter.matches(&column, &Scalar::from("28.5")));
        assert!(filter.matches(&column, &Scalar::Null));
        assert!(filter.matches(&column, &Scalar::from("unknown")));
    }

    #[test]
    fn test_text_modes_are_case_insensitive() {
        let contains = Column::new("name");
        let starts = Column::new("name").with_text_mode(TextMatchMode::StartsWith);
        let equals = Column::new("name").with_text_mode(TextMatchMode::Equals);
        let filter = FilterValue::Text("LI".to_string());
        let alice = Scalar::from("Alice");

        assert!(filter.matches(&contains, &alice));
        assert!(!filter.matches(&starts, &alice));
        assert!(FilterValue::Text("ali".into()).matches(&starts, &alice));
        assert!(FilterValue::Text("alice".into()).matches(&equals, &alice));
        assert!(!FilterValue::Text("alic".into()).matches(&equals, &alice));
        assert!(!filter.matches(&contains, &Scalar::Null));
    }

    #[test]
    fn test_categorical_membership() {
        let mut column = Column::new("state");
        column.filter_type = FilterType::Categorical;
        let filter = FilterValue::Categorical(vec![Scalar::from("CA"), Scalar::from("TX")]);

        assert!(filter.matches(&column, &Scalar::from("TX")));
        assert!(!filter.matches(&column, &Scalar::from("NY")));
        assert!(FilterValue::Categorical(vec![]).matches(&column, &Scalar::from("NY")));
    }

    #[test]
    fn test_inactive_values() {
        assert!(!FilterValue::Text("   ".into()).is_active());
        assert!(!FilterValue::Categorical(vec![]).is_active());
        assert!(
            !FilterValue::Numeric(NumericFilter::Between {
                min: None,
                max: None
            })
            .is_active()
        );
        assert!(FilterValue::Numeric(NumericFilter::AtLeast(0.0)).is_active());
    }

    #[test]
    fn test_json_forms() -> DataGridResult<()> {
        let range = FilterValue::Numeric(NumericFilter::Between {
            min: None,
            max: Some(30.0),
        });
        assert_eq!(range.to_json(), json!([null, 30.0]));
        assert_eq!(FilterValue::from_json(FilterType::Numeric, &range.to_json())?, range);

        let single = FilterValue::from_json(FilterType::Categorical, &json!("CA"))?;
        assert_eq!(single, FilterValue::Categorical(vec![Scalar::from("CA")]));

        let mismatch = FilterValue::from_json(FilterType::Numeric, &json!("abc"));
        assert!(matches!(mismatch, Err(DataGridError::InvalidFilter { .. })));
        Ok(())
    }

    #[test]
    fn test_parse_expressions() -> DataGridResult<()> {
        assert_eq!(
            FilterValue::parse(FilterType::Numeric, "28")?,
            FilterValue::Numeric(NumericFilter::AtLeast(28.0))
        );
        assert_eq!(
            FilterValue::parse(FilterType::Numeric, "20..30")?,
            FilterValue::Numeric(NumericFilter::Between {
                min: Some(20.0),
                max: Some(30.0)
            })
        );
        assert_eq!(
            FilterValue::parse(FilterType::Numeric, "..30")?,
            FilterValue::Numeric(NumericFilter::Between {
                min: None,
                max: Some(30.0)
            })
        );
        assert_eq!(
            FilterValue::parse(FilterType::Categorical, "CA, TX,")?,
            FilterValue::Categorical(vec![Scalar::from("CA"), Scalar::from("TX")])
        );
        assert!(FilterValue::parse(FilterType::Numeric, "old").is_err());
        Ok(())
    }
}
