use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, OnceCell};

use crate::config::DatasetConfig;
use crate::data::analytics::{self, Analytics, DecadeSummary, MakeStatistics, TopCriteria};
use crate::data::compare::{self, Comparison};
use crate::data::filter::{self, SearchFilters, SearchResult};
use crate::data::loader;
use crate::data::model::{LoadReport, VehicleDataset, VehicleRecord};
use crate::error::{DatasetError, DatasetLoadError, Result};

// ---------------------------------------------------------------------------
// Load lifecycle
// ---------------------------------------------------------------------------

/// `Unloaded → Loading → Loaded | Failed`. A failed load may be retried by
/// calling [`VehicleDatasetService::load`] again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    /// Rendered error of the last attempt.
    Failed(String),
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed(_) => "failed",
        }
    }
}

struct LoadedDataset {
    dataset: VehicleDataset,
    report: LoadReport,
}

/// Snapshot for a status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStatus {
    pub state: &'static str,
    pub loaded: bool,
    pub total_cars: usize,
    pub dataset_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadReport>,
}

// ---------------------------------------------------------------------------
// VehicleDatasetService
// ---------------------------------------------------------------------------

/// State shared with the spawned load task.
struct Shared {
    config: DatasetConfig,
    loaded: OnceCell<LoadedDataset>,
    state: watch::Sender<LoadState>,
}

impl Shared {
    /// One load attempt. Owns the `Loading → Loaded | Failed` transition, so
    /// it completes even if every caller of [`VehicleDatasetService::load`]
    /// has gone away.
    async fn run_load(self: Arc<Self>) -> Result<(), DatasetLoadError> {
        match read_source(&self.config).await {
            Ok(loaded) => {
                // At most one attempt runs, and none after a success.
                let _ = self.loaded.set(loaded);
                self.state.send_replace(LoadState::Loaded);
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading dataset: {e}");
                self.state.send_replace(LoadState::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

async fn read_source(config: &DatasetConfig) -> Result<LoadedDataset, DatasetLoadError> {
    let path = config.dataset_path.clone();
    let max_skip_samples = config.max_skip_samples;
    log::info!("Loading vehicle dataset from {}", path.display());

    let (dataset, report) =
        tokio::task::spawn_blocking(move || loader::load_file(&path, max_skip_samples))
            .await
            .map_err(|e| DatasetLoadError::TaskFailed(e.to_string()))??;

    log::info!("Loaded {} cars from dataset", dataset.len());
    if report.skipped_total > 0 {
        let by = &report.skipped_by_reason;
        log::warn!(
            "Skipped {} of {} rows ({} missing make, {} missing model, {} malformed)",
            report.skipped_total,
            report.rows_read,
            by.missing_make,
            by.missing_model,
            by.malformed,
        );
    }
    Ok(LoadedDataset { dataset, report })
}

/// Owns one vehicle working set: loads it once, then answers read-only
/// queries. Independent instances share nothing.
pub struct VehicleDatasetService {
    shared: Arc<Shared>,
}

impl VehicleDatasetService {
    pub fn new(config: DatasetConfig) -> Self {
        let (state, _) = watch::channel(LoadState::Unloaded);
        Self {
            shared: Arc::new(Shared {
                config,
                loaded: OnceCell::new(),
                state,
            }),
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.shared.config
    }

    /// Load the dataset if it is not loaded yet.
    ///
    /// The first caller starts a load task; callers arriving while it runs
    /// wait for that same attempt and share its outcome. Once loaded, further
    /// calls return immediately; after a failure the next call retries.
    /// Dropping the returned future does not cancel the attempt.
    pub async fn load(&self) -> Result<&LoadReport> {
        if let Some(loaded) = self.shared.loaded.get() {
            return Ok(&loaded.report);
        }

        let started = self.shared.state.send_if_modified(|state| match state {
            LoadState::Loading | LoadState::Loaded => false,
            _ => {
                *state = LoadState::Loading;
                true
            }
        });

        if started {
            tokio::spawn(Arc::clone(&self.shared).run_load())
                .await
                .map_err(|e| DatasetLoadError::TaskFailed(e.to_string()))??;
        } else {
            self.ready().await?;
        }
        self.report().ok_or(DatasetError::NotLoaded)
    }

    /// Resolve once the current or next load attempt finishes.
    ///
    /// Never resolves if nobody calls [`load`](Self::load).
    pub async fn ready(&self) -> Result<()> {
        let mut rx = self.shared.state.subscribe();
        let state = rx
            .wait_for(|s| matches!(s, LoadState::Loaded | LoadState::Failed(_)))
            .await
            .map_err(|_| DatasetError::NotLoaded)?;
        match &*state {
            LoadState::Failed(msg) => Err(DatasetError::LoadFailed(msg.clone())),
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> LoadState {
        self.shared.state.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.loaded.initialized()
    }

    /// Records in the working set, `0` before load.
    pub fn len(&self) -> usize {
        self.shared.loaded.get().map_or(0, |l| l.dataset.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report(&self) -> Option<&LoadReport> {
        self.shared.loaded.get().map(|l| &l.report)
    }

    pub fn status(&self) -> DatasetStatus {
        let state = self.state();
        DatasetStatus {
            state: state.as_str(),
            loaded: self.is_loaded(),
            total_cars: self.len(),
            dataset_path: self.shared.config.dataset_path.display().to_string(),
            error: match state {
                LoadState::Failed(msg) => Some(msg),
                _ => None,
            },
            report: self.report().cloned(),
        }
    }

    /// The loaded working set, or why there is none.
    pub fn dataset(&self) -> Result<&VehicleDataset> {
        match self.shared.loaded.get() {
            Some(l) => Ok(&l.dataset),
            None => match &*self.shared.state.borrow() {
                LoadState::Failed(msg) => Err(DatasetError::LoadFailed(msg.clone())),
                _ => Err(DatasetError::NotLoaded),
            },
        }
    }

    // -- Queries: synchronous reads over the loaded set --

    /// Search with the configured page size as default `limit`.
    pub fn search(&self, filters: &SearchFilters) -> Result<SearchResult<'_>> {
        let dataset = self.dataset()?;
        if filters.limit.is_some() {
            return Ok(filter::search(dataset, filters));
        }
        let filters = SearchFilters {
            limit: Some(self.shared.config.default_page_limit),
            ..filters.clone()
        };
        Ok(filter::search(dataset, &filters))
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<&VehicleRecord>> {
        Ok(self.dataset()?.get_by_id(id))
    }

    pub fn analytics(&self) -> Result<Analytics> {
        Ok(analytics::analytics(self.dataset()?))
    }

    pub fn makes(&self) -> Result<Vec<String>> {
        Ok(analytics::makes(self.dataset()?))
    }

    pub fn top_cars(&self, criteria: TopCriteria, limit: Option<usize>) -> Result<Vec<&VehicleRecord>> {
        let limit = limit.unwrap_or(self.shared.config.default_top_limit);
        Ok(analytics::top_cars(self.dataset()?, criteria, limit))
    }

    pub fn cars_by_decade(&self) -> Result<Vec<DecadeSummary>> {
        Ok(analytics::cars_by_decade(self.dataset()?))
    }

    pub fn make_statistics(&self, make: &str) -> Result<Option<MakeStatistics<'_>>> {
        Ok(analytics::make_statistics(self.dataset()?, make))
    }

    pub fn random_cars(&self, count: Option<usize>) -> Result<Vec<&VehicleRecord>> {
        let count = count.unwrap_or(self.shared.config.default_random_count);
        Ok(analytics::random_cars(self.dataset()?, count))
    }

    pub fn compare<S: AsRef<str>>(&self, ids: &[S]) -> Result<Comparison> {
        Ok(compare::compare(self.dataset()?, ids)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_before_load_report_not_loaded() {
        let svc = VehicleDatasetService::new(DatasetConfig::with_path("unused.csv"));
        assert_eq!(svc.state(), LoadState::Unloaded);
        assert!(!svc.is_loaded());
        assert_eq!(svc.len(), 0);
        assert!(matches!(svc.analytics(), Err(DatasetError::NotLoaded)));
        assert!(matches!(svc.get_by_id("1"), Err(DatasetError::NotLoaded)));

        let status = svc.status();
        assert_eq!(status.state, "unloaded");
        assert!(status.report.is_none());
    }
}
