//! Runtime configuration for the dataset service.
//!
//! Precedence, lowest first: built-in defaults, an optional JSON file, then
//! whatever the caller overrides (the CLI maps its flags and the
//! `VEHICLE_DATASET_PATH` environment variable onto these fields).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::filter::DEFAULT_PAGE_LIMIT;
use crate::error::DatasetLoadError;

pub const DEFAULT_DATASET_PATH: &str = "datasets/Car Dataset 1945-2020.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Source file; the extension selects the reader.
    pub dataset_path: PathBuf,
    /// Page size for searches that do not specify one.
    pub default_page_limit: usize,
    /// `limit` for top-N when the caller gives none.
    pub default_top_limit: usize,
    /// `count` for random sampling when the caller gives none.
    pub default_random_count: usize,
    /// How many skipped rows the load report keeps verbatim.
    pub max_skip_samples: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            default_page_limit: DEFAULT_PAGE_LIMIT,
            default_top_limit: 10,
            default_random_count: 5,
            max_skip_samples: 100,
        }
    }
}

impl DatasetConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: path.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, DatasetLoadError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DatasetLoadError::NotFound(path.to_path_buf()),
            _ => DatasetLoadError::Io(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
