//! Row model and the row normalizer.
//!
//! Readers produce `RawRow`s: ordered key/value records without identity.
//! `normalize` turns them into `Row`s carrying a stable `RowId`.

use crate::{DataGridError, DataGridResult, Scalar};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use std::{
    collections::HashSet,
    fmt::{self, Display},
};

/// An ordered mapping from column key to `Scalar`.
///
/// Keys keep the order in which the source enumerated them. Inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, Scalar)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RawRow {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `true` when every value is null or blank text.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

// Serialized as a JSON object, keys written in source order.
impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawRowVisitor;

        impl<'de> Visitor<'de> for RawRowVisitor {
            type Value = RawRow;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of column keys to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRow, A::Error> {
                let mut row = RawRow::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Scalar>()? {
                    row.insert(key, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RawRowVisitor)
    }
}

/// Identity of a row within its dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{n}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl RowId {
    /// Converts a source value into an id. Null and blank values have no id.
    fn from_scalar(value: &Scalar) -> Option<RowId> {
        match value {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Some(RowId::Number(*n as i64))
            }
            v if v.is_empty() => None,
            v => Some(RowId::Text(v.to_string())),
        }
    }

    fn into_text(self) -> RowId {
        match self {
            RowId::Number(n) => RowId::Text(n.to_string()),
            text => text,
        }
    }
}

/// A normalized row: a stable id plus the source fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub fields: RawRow,
}

impl Row {
    /// Value of `key`, or `Scalar::Null` when the row doesn't carry it.
    pub fn value(&self, key: &str) -> &Scalar {
        static NULL: Scalar = Scalar::Null;
        self.fields.get(key).unwrap_or(&NULL)
    }
}

/// Assigns a stable identity to each raw row.
///
/// When `id_field` names a non-empty value on a row, that value becomes the id;
/// otherwise the id is the 1-based position of the row. If the resulting ids
/// mix numbers and text, every id is converted to text so that all rows share
/// one id type.
///
/// Duplicate explicit ids are kept; lookups by id resolve to the last row.
///
/// ### Errors
/// `DataGridError::EmptyDataset` when `raw_rows` is empty.
pub fn normalize(raw_rows: Vec<RawRow>, id_field: Option<&str>) -> DataGridResult<Vec<Row>> {
    if raw_rows.is_empty() {
        return Err(DataGridError::EmptyDataset);
    }

    let mut rows: Vec<Row> = raw_rows
        .into_iter()
        .enumerate()
        .map(|(index, fields)| {
            let explicit = id_field
                .and_then(|field| fields.get(field))
                .and_then(RowId::from_scalar);
            let id = explicit.unwrap_or(RowId::Number(index as i64 + 1));
            Row { id, fields }
        })
        .collect();

    let has_text = rows.iter().any(|r| matches!(r.id, RowId::Text(_)));
    let has_number = rows.iter().any(|r| matches!(r.id, RowId::Number(_)));
    if has_text && has_number {
        tracing::debug!("Mixed id types found; converting every row id to text.");
        for row in &mut rows {
            row.id = std::mem::replace(&mut row.id, RowId::Number(0)).into_text();
        }
    }

    if id_field.is_some() {
        let mut seen = HashSet::with_capacity(rows.len());
        let duplicates = rows.iter().filter(|r| !seen.insert(&r.id)).count();
        if duplicates > 0 {
            tracing::warn!(
                "{} rows share an id with an earlier row (id field: {:?}).",
                duplicates,
                id_field
            );
        }
    }

    tracing::debug!("Normalized {} rows.", rows.len());
    Ok(rows)
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
