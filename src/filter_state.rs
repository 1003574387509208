//! Active filters of the loaded dataset and the rows they leave visible.

use crate::{
    ColumnFilter, DataGridError, DataGridResult, Dataset, FILTERS_KEY, FilterValue,
    KeyValueStore, PersistedFilter, Row,
};

use std::sync::Arc;

/// Holds one filter value per column plus an optional global search.
///
/// Every mutation recomputes the visible rows before returning, so readers
/// never observe a stale row set.
pub struct FilterState {
    dataset: Arc<Dataset>,
    store: Arc<dyn KeyValueStore>,
    /// Active filters in the order they were first set.
    values: Vec<ColumnFilter>,
    global_filter: Option<String>,
    /// Indexes into `dataset.rows()` of the rows passing every filter.
    visible: Vec<usize>,
}

impl std::fmt::Debug for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterState")
            .field("values", &self.values)
            .field("global_filter", &self.global_filter)
            .field("visible", &self.visible.len())
            .finish()
    }
}

impl FilterState {
    /// Creates an unfiltered state over `dataset`: every row is visible.
    pub fn new(dataset: Arc<Dataset>, store: Arc<dyn KeyValueStore>) -> Self {
        let visible = (0..dataset.len()).collect();
        FilterState {
            dataset,
            store,
            values: Vec::new(),
            global_filter: None,
            visible,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn get_value(&self, column_key: &str) -> Option<&FilterValue> {
        self.values
            .iter()
            .find(|f| f.column == column_key)
            .map(|f| &f.value)
    }

    /// Active filters, in the order they were first set.
    pub fn active_filters(&self) -> &[ColumnFilter] {
        &self.values
    }

    pub fn global_filter(&self) -> Option<&str> {
        self.global_filter.as_deref()
    }

    /// Sets the filter of one column and recomputes the visible rows.
    ///
    /// An inactive value (blank text, unbounded range, empty selection)
    /// removes the column's filter.
    ///
    /// ### Errors
    /// `UnknownColumn`, `ColumnNotFilterable` or `FilterTypeMismatch`; the
    /// state is left untouched in each case.
    pub fn set_value(&mut self, column_key: &str, value: FilterValue) -> DataGridResult<()> {
        self.check_value(column_key, &value)?;

        let position = self.values.iter().position(|f| f.column == column_key);
        match (position, value.is_active()) {
            (Some(index), true) => self.values[index].value = value,
            (Some(index), false) => {
                self.values.remove(index);
            }
            (None, true) => self.values.push(ColumnFilter {
                column: column_key.to_string(),
                value,
            }),
            (None, false) => {}
        }

        self.recompute();
        Ok(())
    }

    /// Removes the filter of one column, if any.
    pub fn clear_value(&mut self, column_key: &str) {
        let before = self.values.len();
        self.values.retain(|f| f.column != column_key);
        if self.values.len() != before {
            self.recompute();
        }
    }

    /// Sets the case-insensitive search applied across all searchable columns.
    /// A blank search clears it.
    pub fn set_global_filter(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.global_filter = match search.trim() {
            "" => None,
            trimmed => Some(trimmed.to_string()),
        };
        self.recompute();
    }

    /// Clears every filter and the global search, and forgets the persisted filters.
    ///
    /// The in-memory state is cleared even when the store cannot be written.
    pub fn reset(&mut self) -> DataGridResult<()> {
        self.values.clear();
        self.global_filter = None;
        self.recompute();
        tracing::debug!("Filters reset; {} rows visible.", self.visible.len());
        self.store.remove(FILTERS_KEY)
    }

    /// Writes the active filters as `[{ "id": key, "value": ... }]`.
    pub fn persist(&self) -> DataGridResult<()> {
        let persisted: Vec<PersistedFilter> =
            self.values.iter().map(ColumnFilter::to_persisted).collect();
        self.store
            .set(FILTERS_KEY, &serde_json::to_string(&persisted)?)?;
        tracing::debug!("Persisted {} filters.", persisted.len());
        Ok(())
    }

    /// Re-applies the persisted filters and returns those that were applied.
    ///
    /// Entries naming a missing or non-filterable column, or whose value does
    /// not fit the column's filter type, are skipped. Corrupt JSON and an
    /// unavailable store yield an empty list.
    pub fn restore(&mut self) -> Vec<ColumnFilter> {
        let json = match self.store.get(FILTERS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read stored filters: {}", e);
                return Vec::new();
            }
        };

        let persisted: Vec<PersistedFilter> = match serde_json::from_str(&json) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!("Stored filters are corrupt and were ignored: {}", e);
                return Vec::new();
            }
        };

        let mut restored = Vec::with_capacity(persisted.len());
        for entry in persisted {
            let applied = self
                .dataset
                .filter_type(&entry.id)
                .ok_or_else(|| DataGridError::UnknownColumn(entry.id.clone()))
                .and_then(|filter_type| FilterValue::from_json(filter_type, &entry.value))
                .and_then(|value| self.check_value(&entry.id, &value).map(|()| value));

            match applied {
                Ok(value) if value.is_active() => {
                    // A later entry for the same column wins.
                    self.values.retain(|f| f.column != entry.id);
                    restored.retain(|f: &ColumnFilter| f.column != entry.id);
                    restored.push(ColumnFilter {
                        column: entry.id,
                        value,
                    });
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping stored filter '{}': {}", entry.id, e),
            }
        }

        self.values.extend(restored.iter().cloned());
        self.recompute();
        tracing::debug!("Restored {} filters.", restored.len());
        restored
    }

    /// Rows passing every active filter, in dataset order.
    pub fn visible_rows(&self) -> Vec<&Row> {
        let rows = self.dataset.rows();
        self.visible.iter().map(|&index| &rows[index]).collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    fn check_value(&self, column_key: &str, value: &FilterValue) -> DataGridResult<()> {
        let column = self
            .dataset
            .column(column_key)
            .ok_or_else(|| DataGridError::UnknownColumn(column_key.to_string()))?;

        if !column.filterable {
            return Err(DataGridError::ColumnNotFilterable(column_key.to_string()));
        }

        let expected = self
            .dataset
            .filter_type(column_key)
            .unwrap_or(column.filter_type);
        if value.filter_type() != expected {
            return Err(DataGridError::FilterTypeMismatch {
                column: column_key.to_string(),
                expected: expected.to_string(),
                found: value.filter_type().to_string(),
            });
        }
        Ok(())
    }

    fn recompute(&mut self) {
        let columns = self.dataset.columns();

        // Resolve column keys once instead of per row.
        let filters: Vec<_> = self
            .values
            .iter()
            .filter_map(|f| {
                columns
                    .iter()
                    .find(|c| c.key == f.column)
                    .map(|c| (c, &f.value))
            })
            .collect();

        let search = self.global_filter.as_ref().map(|s| s.to_lowercase());
        let searchable: Vec<_> = columns
            .iter()
            .filter(|c| c.visible && c.filterable)
            .collect();

        self.visible = self
            .dataset
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                filters
                    .iter()
                    .all(|(column, value)| value.matches(column, row.value(&column.key)))
            })
            .filter(|(_, row)| {
                search.as_ref().is_none_or(|needle| {
                    searchable.iter().any(|column| {
                        row.value(&column.key)
                            .display_text()
                            .to_lowercase()
                            .contains(needle.as_str())
                    })
                })
            })
            .map(|(index, _)| index)
            .collect();

        tracing::trace!(
            "{} of {} rows visible.",
            self.visible.len(),
            self.dataset.len()
        );
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
