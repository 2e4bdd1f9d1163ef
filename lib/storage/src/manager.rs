use crate::dataset::Dataset;
use crate::loader::load_dataset;
use homeprice_core::{Error, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the store obtains the dataset for each estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Parse once at startup and serve the cached snapshot.
    #[default]
    Cached,
    /// Parse the file again for every request.
    PerRequest,
}

impl FromStr for LoadMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cached" | "Cached" => Ok(LoadMode::Cached),
            "per-request" | "per_request" | "PerRequest" => Ok(LoadMode::PerRequest),
            other => Err(Error::InvalidConfig(format!("unknown load mode '{}'", other))),
        }
    }
}

/// Configuration for the dataset store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dataset_path: PathBuf,
    pub load_mode: LoadMode,
    /// Reload interval for the cached snapshot. `None` disables background refresh.
    pub refresh_interval: Option<Duration>,
    /// Upper bound on a per-request load.
    pub load_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./dataset/datasetprice.csv"),
            load_mode: LoadMode::Cached,
            refresh_interval: None,
            load_timeout: Duration::from_secs(5),
        }
    }
}

/// Holds the current dataset snapshot and replaces it on reload.
///
/// Readers clone the inner `Arc<Dataset>` and keep using it even if a reload
/// publishes a newer snapshot meanwhile.
pub struct DatasetStore {
    config: StoreConfig,
    current: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl DatasetStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let store = Self {
            config,
            current: Arc::new(RwLock::new(None)),
        };

        if store.config.load_mode == LoadMode::Cached {
            store.reload()?;
            if let Some(interval) = store.config.refresh_interval {
                store.start_background_refresh(interval);
            }
        }

        Ok(store)
    }

    /// Cached store serving an already parsed dataset.
    pub fn with_dataset(dataset: Dataset) -> Self {
        let config = StoreConfig {
            dataset_path: PathBuf::from(dataset.source()),
            ..StoreConfig::default()
        };
        Self {
            config,
            current: Arc::new(RwLock::new(Some(Arc::new(dataset)))),
        }
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[inline]
    pub fn dataset_path(&self) -> &Path {
        &self.config.dataset_path
    }

    /// The most recently published snapshot, if any.
    #[inline]
    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        self.current.read().clone()
    }

    /// Load the file again and publish it. On failure the previous snapshot stays.
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        Self::refresh(&self.config.dataset_path, &self.current)
    }

    fn refresh(path: &Path, slot: &RwLock<Option<Arc<Dataset>>>) -> Result<Arc<Dataset>> {
        match load_dataset(path) {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                *slot.write() = Some(dataset.clone());
                info!("Loaded {} comparables from {}", dataset.len(), path.display());
                Ok(dataset)
            }
            Err(e) => {
                warn!("Dataset reload failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// Start background refresh thread. It exits once the store is dropped.
    fn start_background_refresh(&self, interval: Duration) {
        let slot = Arc::downgrade(&self.current);
        let path = self.config.dataset_path.clone();

        std::thread::spawn(move || loop {
            std::thread::sleep(interval);

            let Some(slot) = slot.upgrade() else {
                debug!("Dataset store dropped, stopping refresh");
                break;
            };
            let _ = Self::refresh(&path, &slot);
        });
    }

    /// Dataset to use for one estimation, according to the load mode.
    pub async fn current(&self) -> Result<Arc<Dataset>> {
        match self.config.load_mode {
            LoadMode::Cached => self
                .snapshot()
                .ok_or_else(|| Error::DatasetLoad("no dataset loaded".to_string())),
            LoadMode::PerRequest => {
                let dataset =
                    Arc::new(load_with_timeout(self.config.dataset_path.clone(), self.config.load_timeout).await?);
                *self.current.write() = Some(dataset.clone());
                Ok(dataset)
            }
        }
    }
}

/// Load the dataset on a blocking thread, giving up after `timeout`.
pub async fn load_with_timeout(path: PathBuf, timeout: Duration) -> Result<Dataset> {
    let label = path.display().to_string();
    run_with_timeout(&label, timeout, move || load_dataset(&path)).await
}

async fn run_with_timeout<F>(label: &str, timeout: Duration, load: F) -> Result<Dataset>
where
    F: FnOnce() -> Result<Dataset> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(load)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::DatasetLoad(format!("{}: load task failed: {}", label, e))),
        Err(_) => Err(Error::DatasetLoad(format!(
            "{}: load timed out after {}ms",
            label,
            timeout.as_millis()
        ))),
    }
}
