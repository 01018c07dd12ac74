//! In-memory vehicle specification dataset.
//!
//! Load a tabular vehicle file once with [`VehicleDatasetService::load`], then
//! search, rank, sample and aggregate it without further I/O.

pub mod config;
pub mod data;
pub mod error;
pub mod service;

pub use config::DatasetConfig;
pub use data::analytics::{Analytics, DecadeSummary, MakeStatistics, TopCriteria, YearRange};
pub use data::compare::Comparison;
pub use data::filter::{Pagination, SearchFilters, SearchResult, SortField, SortOrder};
pub use data::model::{LoadReport, SkipReason, VehicleDataset, VehicleRecord};
pub use error::{CompareError, DatasetError, DatasetLoadError};
pub use service::{DatasetStatus, LoadState, VehicleDatasetService};
