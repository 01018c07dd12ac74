//! Dataset-wide aggregations, rankings and sampling.
//!
//! All averages only consider records that carry the averaged field and are
//! `None` when no such record exists.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::model::{VehicleDataset, VehicleRecord};
use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `min(yearFrom)` / `max(yearTo)` over the records that have them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl YearRange {
    fn of<'a>(cars: impl IntoIterator<Item = &'a VehicleRecord>) -> Self {
        cars.into_iter().fold(YearRange::default(), |acc, car| YearRange {
            from: min_opt(acc.from, car.year_from),
            to: max_opt(acc.to, car.year_to),
        })
    }
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

/// Mean of the present values, rounded to the nearest integer.
fn rounded_mean(values: impl Iterator<Item = Option<f64>>) -> Option<i64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| (sum / n as f64).round() as i64)
}

/// Distinct values in first-seen order.
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_cars: usize,
    pub total_makes: usize,
    pub total_countries: usize,
    pub total_body_types: usize,
    pub year_range: YearRange,
    pub average_horsepower: Option<i64>,
    pub makes: Vec<String>,
    pub countries: Vec<String>,
    pub body_types: Vec<String>,
}

/// Whole-dataset summary. Distinct sets are case-sensitive and sorted.
pub fn analytics(dataset: &VehicleDataset) -> Analytics {
    let cars = &dataset.records;
    let makes: BTreeSet<&str> = cars.iter().map(|c| c.make.as_str()).collect();
    let countries: BTreeSet<&str> = cars
        .iter()
        .filter_map(|c| c.country_of_origin.as_deref())
        .collect();
    let body_types: BTreeSet<&str> = cars.iter().filter_map(|c| c.body_type.as_deref()).collect();

    let owned = |set: BTreeSet<&str>| set.into_iter().map(str::to_string).collect::<Vec<_>>();

    Analytics {
        total_cars: cars.len(),
        total_makes: makes.len(),
        total_countries: countries.len(),
        total_body_types: body_types.len(),
        year_range: YearRange::of(cars),
        average_horsepower: rounded_mean(cars.iter().map(|c| c.engine.horsepower)),
        makes: owned(makes),
        countries: owned(countries),
        body_types: owned(body_types),
    }
}

/// Sorted distinct makes.
pub fn makes(dataset: &VehicleDataset) -> Vec<String> {
    let set: BTreeSet<&str> = dataset.records.iter().map(|c| c.make.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// By-decade rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecadeSummary {
    pub decade: i64,
    pub count: usize,
    /// Distinct makes in the decade.
    pub makes: usize,
    pub avg_horsepower: Option<i64>,
    pub avg_max_speed: Option<i64>,
    pub body_types: Vec<String>,
}

/// Group records by `floor(yearFrom / 10) * 10`, ascending. Records without
/// `yearFrom`, or whose decade does not fit in an `i64`, are left out.
pub fn cars_by_decade(dataset: &VehicleDataset) -> Vec<DecadeSummary> {
    let mut buckets: BTreeMap<i64, Vec<&VehicleRecord>> = BTreeMap::new();
    for car in &dataset.records {
        let decade = car.year_from.and_then(|y| y.div_euclid(10).checked_mul(10));
        if let Some(decade) = decade {
            buckets.entry(decade).or_default().push(car);
        }
    }

    buckets
        .into_iter()
        .map(|(decade, cars)| {
            let makes: HashSet<&str> = cars.iter().map(|c| c.make.as_str()).collect();
            DecadeSummary {
                decade,
                count: cars.len(),
                makes: makes.len(),
                avg_horsepower: rounded_mean(cars.iter().map(|c| c.engine.horsepower)),
                avg_max_speed: rounded_mean(cars.iter().map(|c| c.performance.max_speed)),
                body_types: distinct_in_order(cars.iter().filter_map(|c| c.body_type.as_deref())),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-make statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeStatistics<'a> {
    /// The make as requested.
    pub make: String,
    pub total_models: usize,
    pub year_range: YearRange,
    pub models: Vec<String>,
    pub body_types: Vec<String>,
    pub avg_horsepower: Option<i64>,
    pub avg_max_speed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_powerful: Option<&'a VehicleRecord>,
}

/// Statistics for one make (case-insensitive exact match), `None` if the make
/// has no records.
pub fn make_statistics<'a>(dataset: &'a VehicleDataset, make: &str) -> Option<MakeStatistics<'a>> {
    let wanted = make.to_lowercase();
    let cars: Vec<&VehicleRecord> = dataset
        .records
        .iter()
        .filter(|c| c.make.to_lowercase() == wanted)
        .collect();

    if cars.is_empty() {
        return None;
    }

    // First record wins on equal horsepower.
    let most_powerful = cars
        .iter()
        .copied()
        .filter_map(|c| c.engine.horsepower.map(|hp| (hp, c)))
        .fold(None::<(f64, &VehicleRecord)>, |best, (hp, c)| match best {
            Some((best_hp, _)) if best_hp >= hp => best,
            _ => Some((hp, c)),
        })
        .map(|(_, c)| c);

    Some(MakeStatistics {
        make: make.to_string(),
        total_models: cars.len(),
        year_range: YearRange::of(cars.iter().copied()),
        models: distinct_in_order(cars.iter().map(|c| c.model.as_str())),
        body_types: distinct_in_order(cars.iter().filter_map(|c| c.body_type.as_deref())),
        avg_horsepower: rounded_mean(cars.iter().map(|c| c.engine.horsepower)),
        avg_max_speed: rounded_mean(cars.iter().map(|c| c.performance.max_speed)),
        most_powerful,
    })
}

// ---------------------------------------------------------------------------
// Top-N ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopCriteria {
    /// Highest horsepower first.
    Horsepower,
    /// Highest max speed first.
    Speed,
    /// Quickest 0–100 first.
    Acceleration,
    /// Lowest mixed fuel consumption first.
    Efficient,
}

impl TopCriteria {
    fn key(self, car: &VehicleRecord) -> Option<f64> {
        match self {
            TopCriteria::Horsepower => car.engine.horsepower,
            TopCriteria::Speed => car.performance.max_speed,
            TopCriteria::Acceleration => car.performance.acceleration_0_100,
            TopCriteria::Efficient => car.performance.mixed_fuel_consumption,
        }
    }

    fn higher_is_better(self) -> bool {
        matches!(self, TopCriteria::Horsepower | TopCriteria::Speed)
    }
}

impl FromStr for TopCriteria {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horsepower" => Ok(TopCriteria::Horsepower),
            "speed" => Ok(TopCriteria::Speed),
            "acceleration" => Ok(TopCriteria::Acceleration),
            "efficient" => Ok(TopCriteria::Efficient),
            other => Err(DatasetError::UnknownCriteria(other.to_string())),
        }
    }
}

/// The best `limit` records for `criteria`. Records missing the ranked field
/// are not ranked at all.
pub fn top_cars(dataset: &VehicleDataset, criteria: TopCriteria, limit: usize) -> Vec<&VehicleRecord> {
    let mut ranked: Vec<(f64, &VehicleRecord)> = dataset
        .records
        .iter()
        .filter_map(|c| criteria.key(c).map(|k| (k, c)))
        .collect();

    if criteria.higher_is_better() {
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    } else {
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    ranked.into_iter().take(limit).map(|(_, c)| c).collect()
}

// ---------------------------------------------------------------------------
// Random sampling
// ---------------------------------------------------------------------------

/// Up to `count` distinct records, freshly shuffled from OS entropy.
pub fn random_cars(dataset: &VehicleDataset, count: usize) -> Vec<&VehicleRecord> {
    let mut rng = StdRng::from_os_rng();
    random_cars_with(dataset, count, &mut rng)
}

/// Shuffle-then-slice sampling over record positions.
pub fn random_cars_with<'a, R: Rng + ?Sized>(
    dataset: &'a VehicleDataset,
    count: usize,
    rng: &mut R,
) -> Vec<&'a VehicleRecord> {
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    indices.shuffle(rng);
    indices.truncate(count.min(dataset.len()));
    indices.into_iter().map(|i| &dataset.records[i]).collect()
}
