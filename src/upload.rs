//! Asynchronous upload of a file into a new dataset.

use crate::{
    ClassifierSettings, DataGridError, DataGridResult, Dataset, KeyValueStore, LoadOptions,
    check_extension, read_file_async,
};

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

/// Progress of the most recent upload, as shown to the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Loading { file_name: String },
    Loaded { file_name: String, rows: usize },
    Failed(String),
}

/// Accepts one upload at a time and turns it into a `Dataset`.
///
/// A successfully parsed dataset is saved to the store before it is returned.
pub struct Uploader {
    store: Arc<dyn KeyValueStore>,
    settings: ClassifierSettings,
    in_flight: AtomicBool,
    status: Mutex<UploadStatus>,
}

/// Clears the in-flight flag when the upload ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Uploader {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: ClassifierSettings) -> Self {
        Uploader {
            store,
            settings,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(UploadStatus::Idle),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_status(&self, status: UploadStatus) {
        match self.status.lock() {
            Ok(mut current) => *current = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    /// Parses the file named by `options`, builds and saves the dataset.
    ///
    /// ### Errors
    /// * `UnsupportedFileType` / `MissingExtension`: rejected before anything
    ///   else happens; the status is left as it was.
    /// * `UploadInProgress`: another upload has not finished yet.
    /// * Parse and storage failures: the status becomes `Failed` and another
    ///   upload may be attempted.
    pub async fn upload(&self, options: LoadOptions) -> DataGridResult<Dataset> {
        check_extension(&options.path)?;

        let file_name = options
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.path.display().to_string());

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DataGridError::UploadInProgress(file_name));
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.set_status(UploadStatus::Loading {
            file_name: file_name.clone(),
        });
        tracing::debug!("Upload of '{}' started.", file_name);

        match self.load(options).await {
            Ok(dataset) => {
                tracing::info!(
                    "Loaded '{}': {} rows, {} columns.",
                    file_name,
                    dataset.len(),
                    dataset.columns().len()
                );
                self.set_status(UploadStatus::Loaded {
                    file_name,
                    rows: dataset.len(),
                });
                Ok(dataset)
            }
            Err(e) => {
                tracing::error!("Error parsing '{}': {}", file_name, e);
                self.set_status(UploadStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn load(&self, options: LoadOptions) -> DataGridResult<Dataset> {
        let id_field = options.id_field.clone();
        let parsed = read_file_async(options).await?;
        let dataset = Dataset::from_parsed(parsed, id_field.as_deref(), &self.settings)?;
        dataset.save(self.store.as_ref())?;
        Ok(dataset)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
