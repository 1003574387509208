//! The tagged scalar carried by every cell of a dataset.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A single untyped cell value, as produced by the file readers.
///
/// Serialized as the natural JSON scalar: string, number, boolean or `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Null,
}

impl Scalar {
    /// Returns `true` for `Null` and for text that is empty after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value.
    ///
    /// Numbers are returned as is and numeric-looking text is parsed.
    /// Booleans and null have no numeric view.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text shown in a grid cell. `Null` displays as an empty string.
    pub fn display_text(&self) -> String {
        self.to_string()
    }

    /// Orders two scalars for sorting.
    ///
    /// Nulls are not handled here (see `SortBy`); between kinds the order is
    /// `Bool < Number < Text`. Text compares case-insensitively.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        fn rank(value: &Scalar) -> u8 {
            match value {
                Scalar::Bool(_) => 0,
                Scalar::Number(_) => 1,
                Scalar::Text(_) => 2,
                Scalar::Null => 3,
            }
        }

        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Number(a), Scalar::Number(b)) => a.total_cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            // Bitwise equality keeps NaN == NaN, so a NaN stays selectable.
            (Scalar::Number(a), Scalar::Number(b)) => a == b || a.to_bits() == b.to_bits(),
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Null, Scalar::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            // Integral numbers print without a trailing ".0".
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Null => Ok(()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
