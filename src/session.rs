//! The running session: the store, the current dataset and its filters.

use crate::{
    ClassifierSettings, DataGridResult, Dataset, FilterState, ID_FIELD, KeyValueStore,
    infer_columns, normalize, person_rows,
};

use std::sync::Arc;

/// Seed of the demo dataset, so that every fresh start shows the same people.
const DEMO_SEED: u64 = 42;

/// Owns everything that lives as long as one loaded dataset.
///
/// The dataset is replaced wholesale on upload and dropped on reset; its
/// filter state is rebuilt each time.
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    settings: ClassifierSettings,
    dataset: Arc<Dataset>,
    filters: FilterState,
    demo_rows: usize,
    is_demo: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("rows", &self.dataset.len())
            .field("columns", &self.dataset.columns().len())
            .field("filters", &self.filters)
            .field("is_demo", &self.is_demo)
            .finish()
    }
}

impl Session {
    /// Restores the stored dataset and its filters, or falls back to
    /// `demo_rows` generated people when nothing usable is stored.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        settings: ClassifierSettings,
        demo_rows: usize,
    ) -> Self {
        let (dataset, is_demo) = match Dataset::restore(store.as_ref()) {
            Some(dataset) => (dataset, false),
            None => {
                tracing::info!("No stored dataset; showing {} demo rows.", demo_rows);
                (demo_dataset(demo_rows, &settings), true)
            }
        };

        let mut session = Session {
            filters: FilterState::new(Arc::new(Dataset::default()), store.clone()),
            dataset: Arc::new(Dataset::default()),
            store,
            settings,
            demo_rows,
            is_demo,
        };
        session.install(dataset);
        session
    }

    /// Replaces the current dataset, e.g. after an upload, and re-applies
    /// the stored filters that still fit it.
    pub fn load(&mut self, dataset: Dataset) {
        self.is_demo = false;
        self.install(dataset);
    }

    /// Deletes the stored dataset and filters and falls back to demo data.
    pub fn reset_data(&mut self) -> DataGridResult<()> {
        Dataset::clear(self.store.as_ref())?;
        self.is_demo = true;
        let demo = demo_dataset(self.demo_rows, &self.settings);
        self.install(demo);
        tracing::info!("Stored data cleared.");
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// `true` while the generated demo dataset is shown.
    pub fn is_demo(&self) -> bool {
        self.is_demo
    }

    fn install(&mut self, dataset: Dataset) {
        self.dataset = Arc::new(dataset);
        self.filters = FilterState::new(self.dataset.clone(), self.store.clone());
        self.filters.restore();
    }
}

/// Builds the demo dataset. It is never written to the store.
fn demo_dataset(count: usize, settings: &ClassifierSettings) -> Dataset {
    match normalize(person_rows(count, DEMO_SEED), Some(ID_FIELD)) {
        Ok(rows) => {
            let columns = infer_columns(&rows, None, &[ID_FIELD]);
            Dataset::new(rows, columns, settings)
        }
        Err(_) => Dataset::default(),
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_session
#[cfg(test)]
mod tests_session {
    use super::*;
    use crate::{
        DATA_KEY, FilterType, FilterValue, GridOptions, GridView, LoadOptions, MemoryStore,
        NumericFilter, Uploader,
    };
    use std::fs;
    use tempfile::TempDir;

    fn memory_store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_empty_store_falls_back_to_demo_data() {
        let session = Session::open(memory_store(), ClassifierSettings::default(), 100);
        assert!(session.is_demo());
        assert_eq!(session.dataset().len(), 100);

        let keys: Vec<&str> = session
            .dataset()
            .columns()
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(
            keys,
            vec!["firstName", "lastName", "email", "age", "city", "state"]
        );
        assert_eq!(session.dataset().filter_type("age"), Some(FilterType::Numeric));
        assert_eq!(
            session.dataset().filter_type("state"),
            Some(FilterType::Categorical)
        );
    }

    #[tokio::test]
    async fn test_upload_filter_and_restart() -> DataGridResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("people.csv");
        fs::write(&path, "id,name,age\n1,Alice,30\n2,Bob,25\n")?;

        let store = memory_store();
        let mut session = Session::open(store.clone(), ClassifierSettings::default(), 10);

        let uploader = Uploader::new(store.clone(), session.settings().clone());
        let mut options = LoadOptions::with_path(&path);
        options.id_field = Some("id".to_string());
        let dataset = uploader.upload(options).await?;
        session.load(dataset);

        let keys: Vec<&str> = session
            .dataset()
            .columns()
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(keys, vec!["name", "age"]);
        assert_eq!(session.dataset().filter_type("age"), Some(FilterType::Numeric));

        session
            .filters_mut()
            .set_value("age", FilterValue::Numeric(NumericFilter::AtLeast(28.0)))?;
        session.filters().persist()?;

        let view = GridView::build(session.filters(), &GridOptions::new());
        let names: Vec<String> = view
            .rows
            .iter()
            .map(|r| r.value("name").display_text())
            .collect();
        assert_eq!(names, vec!["Alice"]);

        // A new session over the same store sees the same data and filters.
        let restarted = Session::open(store, ClassifierSettings::default(), 10);
        assert!(!restarted.is_demo());
        assert_eq!(restarted.filters().visible_count(), 1);
        Ok(())
    }

    #[test]
    fn test_reset_data_clears_store() -> DataGridResult<()> {
        let store = memory_store();
        let mut session = Session::open(store.clone(), ClassifierSettings::default(), 5);
        session.dataset().save(store.as_ref())?;
        session.load(Dataset::restore(store.as_ref()).unwrap_or_default());
        assert!(!session.is_demo());

        session.reset_data()?;
        assert!(session.is_demo());
        assert_eq!(store.get(DATA_KEY)?, None);
        assert_eq!(session.dataset().len(), 5);
        Ok(())
    }
}
