//! The dataset unit: rows plus columns, and its persistence.

use crate::{
    COLUMNS_KEY, ClassifierSettings, Column, DATA_KEY, DataGridError, DataGridResult,
    FILTERS_KEY, FilterType, FilterTypeCache, ID_FIELD, KeyValueStore, ParsedFile, Row, RowId,
    SCHEMA_VERSION, VERSION_KEY, infer_columns, normalize,
};

use std::collections::HashMap;

/// The rows and columns currently loaded into the grid.
///
/// Filter types are classified once, when the dataset is built, and kept in
/// `filter_types` for the lifetime of the dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    columns: Vec<Column>,
    filter_types: FilterTypeCache,
    index_by_id: HashMap<RowId, usize>,
}

impl Dataset {
    /// Builds a dataset from normalized rows and inferred columns, classifying every column.
    pub fn new(rows: Vec<Row>, mut columns: Vec<Column>, settings: &ClassifierSettings) -> Self {
        let filter_types = FilterTypeCache::build(&mut columns, &rows, settings);
        Self::assemble(rows, columns, filter_types)
    }

    /// Rebuilds a dataset whose columns already carry their filter types.
    fn from_classified(rows: Vec<Row>, columns: Vec<Column>) -> Self {
        let filter_types = FilterTypeCache::from_columns(&columns);
        Self::assemble(rows, columns, filter_types)
    }

    fn assemble(rows: Vec<Row>, columns: Vec<Column>, filter_types: FilterTypeCache) -> Self {
        // Later rows overwrite earlier ones: id lookups are last-write-wins.
        let index_by_id = rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.id.clone(), index))
            .collect();

        Dataset {
            rows,
            columns,
            filter_types,
            index_by_id,
        }
    }

    /// Normalizes parsed rows, infers the columns in header order and classifies them.
    ///
    /// A source without rows produces an empty dataset rather than an error.
    pub fn from_parsed(
        parsed: ParsedFile,
        id_field: Option<&str>,
        settings: &ClassifierSettings,
    ) -> DataGridResult<Self> {
        let rows = match normalize(parsed.rows, id_field) {
            Ok(rows) => rows,
            Err(DataGridError::EmptyDataset) => {
                tracing::warn!("Parsed file has no rows; loading an empty dataset.");
                return Ok(Dataset::default());
            }
            Err(e) => return Err(e),
        };

        let columns = infer_columns(&rows, Some(parsed.headers.as_slice()), &[ID_FIELD]);
        Ok(Dataset::new(rows, columns, settings))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Cached filter type of a column.
    pub fn filter_type(&self, key: &str) -> Option<FilterType> {
        self.filter_types.get(key)
    }

    pub fn row_by_id(&self, id: &RowId) -> Option<&Row> {
        self.index_by_id.get(id).map(|&index| &self.rows[index])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when there is nothing to show: no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    // --- Persistence ---

    /// Writes rows, columns and the layout version to `store`.
    pub fn save(&self, store: &dyn KeyValueStore) -> DataGridResult<()> {
        store.set(DATA_KEY, &serde_json::to_string(&self.rows)?)?;
        store.set(COLUMNS_KEY, &serde_json::to_string(&self.columns)?)?;
        store.set(VERSION_KEY, &SCHEMA_VERSION.to_string())?;
        tracing::debug!(
            "Saved dataset: {} rows, {} columns.",
            self.rows.len(),
            self.columns.len()
        );
        Ok(())
    }

    /// Reads a previously saved dataset.
    ///
    /// Missing keys, a different layout version, corrupt JSON and an
    /// unavailable store all yield `None`; only the log tells them apart.
    pub fn restore(store: &dyn KeyValueStore) -> Option<Self> {
        let read = |key: &str| match store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read '{}': {}", key, e);
                None
            }
        };

        let version = read(VERSION_KEY)?;
        if version.trim() != SCHEMA_VERSION.to_string() {
            tracing::warn!(
                "Discarding stored dataset with layout version '{}' (expected {}).",
                version.trim(),
                SCHEMA_VERSION
            );
            return None;
        }

        let data = read(DATA_KEY)?;
        let columns = read(COLUMNS_KEY)?;

        let rows: Vec<Row> = serde_json::from_str(&data)
            .inspect_err(|e| tracing::warn!("Stored rows are corrupt: {}", e))
            .ok()?;
        let columns: Vec<Column> = serde_json::from_str(&columns)
            .inspect_err(|e| tracing::warn!("Stored columns are corrupt: {}", e))
            .ok()?;

        tracing::info!(
            "Restored dataset: {} rows, {} columns.",
            rows.len(),
            columns.len()
        );
        Some(Dataset::from_classified(rows, columns))
    }

    /// Deletes the stored dataset together with its filters.
    pub fn clear(store: &dyn KeyValueStore) -> DataGridResult<()> {
        for key in [DATA_KEY, COLUMNS_KEY, VERSION_KEY, FILTERS_KEY] {
            store.remove(key)?;
        }
        tracing::debug!("Stored dataset cleared.");
        Ok(())
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_dataset {
    use super::*;
    use crate::{FileExtension, MemoryStore, RawRow, Scalar};

    fn parsed() -> ParsedFile {
        ParsedFile {
            headers: ["id", "name", "age"].map(String::from).to_vec(),
            rows: vec![
                RawRow::from_iter([
                    ("id", Scalar::from(1i64)),
                    ("name", Scalar::from("Alice")),
                    ("age", Scalar::from(30i64)),
                ]),
                RawRow::from_iter([
                    ("id", Scalar::from(2i64)),
                    ("name", Scalar::from("Bob")),
                    ("age", Scalar::from(25i64)),
                ]),
            ],
            extension: FileExtension::Csv,
        }
    }

    #[test]
    fn test_from_parsed_excludes_id_and_classifies() -> DataGridResult<()> {
        let dataset = Dataset::from_parsed(parsed(), None, &ClassifierSettings::default())?;

        let keys: Vec<&str> = dataset.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "age"]);
        assert_eq!(dataset.filter_type("age"), Some(FilterType::Numeric));
        assert_eq!(dataset.filter_type("name"), Some(FilterType::Categorical));
        assert_eq!(dataset.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_parse_gives_empty_dataset() -> DataGridResult<()> {
        let mut empty = parsed();
        empty.rows.clear();
        let dataset = Dataset::from_parsed(empty, None, &ClassifierSettings::default())?;
        assert!(dataset.is_empty());
        assert!(dataset.columns().is_empty());
        Ok(())
    }

    #[test]
    fn test_save_restore_round_trip() -> DataGridResult<()> {
        let store = MemoryStore::new();
        let dataset = Dataset::from_parsed(parsed(), Some("id"), &ClassifierSettings::default())?;
        dataset.save(&store)?;

        let restored = Dataset::restore(&store).ok_or("dataset was not restored".to_string())?;
        assert_eq!(restored.rows(), dataset.rows());
        assert_eq!(restored.columns(), dataset.columns());
        assert_eq!(restored.filter_type("age"), Some(FilterType::Numeric));
        assert_eq!(
            restored
                .row_by_id(&RowId::Number(2))
                .map(|r| r.value("name").clone()),
            Some(Scalar::from("Bob"))
        );
        Ok(())
    }

    #[test]
    fn test_corrupt_or_outdated_state_is_discarded() -> DataGridResult<()> {
        let store = MemoryStore::new();
        let dataset = Dataset::from_parsed(parsed(), None, &ClassifierSettings::default())?;
        dataset.save(&store)?;

        store.set(DATA_KEY, "{not json")?;
        assert!(Dataset::restore(&store).is_none());

        dataset.save(&store)?;
        store.set(VERSION_KEY, "0")?;
        assert!(Dataset::restore(&store).is_none());

        Dataset::clear(&store)?;
        assert_eq!(store.get(DATA_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_duplicate_ids_resolve_to_last_row() -> DataGridResult<()> {
        let mut source = parsed();
        source.rows[1].insert("id", 1i64);
        let dataset = Dataset::from_parsed(source, Some("id"), &ClassifierSettings::default())?;
        let row = dataset.row_by_id(&RowId::Number(1)).map(|r| r.value("name").clone());
        assert_eq!(row, Some(Scalar::from("Bob")));
        Ok(())
    }
}
