use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Nested semantic groups
// ---------------------------------------------------------------------------

/// Body dimensions, all in millimetres.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub wheelbase: Option<f64>,
    pub front_track: Option<f64>,
    pub rear_track: Option<f64>,
    pub ground_clearance: Option<f64>,
}

/// Masses in kilograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    pub curb: Option<f64>,
    /// Gross vehicle weight.
    pub full: Option<f64>,
    pub payload: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    #[serde(rename = "type")]
    pub engine_type: Option<String>,
    /// Displacement in cm³.
    pub capacity: Option<f64>,
    pub horsepower: Option<f64>,
    pub horsepower_rpm: Option<f64>,
    /// kW.
    pub max_power: Option<f64>,
    /// N·m.
    pub max_torque: Option<f64>,
    pub torque_rpm: Option<f64>,
    pub cylinders: Option<i64>,
    pub cylinder_layout: Option<String>,
    pub valves_per_cylinder: Option<i64>,
    pub compression_ratio: Option<f64>,
    /// Bore in mm.
    pub cylinder_bore: Option<f64>,
    /// Stroke in mm.
    pub stroke_cycle: Option<f64>,
    pub injection_type: Option<String>,
    pub boost_type: Option<String>,
    pub fuel_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// 0–100 km/h in seconds.
    #[serde(rename = "acceleration0_100")]
    pub acceleration_0_100: Option<f64>,
    /// km/h.
    pub max_speed: Option<f64>,
    /// Combined cycle, L/100km.
    pub mixed_fuel_consumption: Option<f64>,
    pub city_fuel_consumption: Option<f64>,
    pub highway_fuel_consumption: Option<f64>,
    /// g/km.
    #[serde(rename = "co2Emissions")]
    pub co2_emissions: Option<f64>,
    pub fuel_grade: Option<String>,
    pub fuel_tank_capacity: Option<f64>,
    pub range: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transmission {
    #[serde(rename = "type")]
    pub transmission_type: Option<String>,
    pub gears: Option<i64>,
    /// Free text such as "front", "rear", "all".
    pub drive_wheels: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chassis {
    pub front_suspension: Option<String>,
    pub rear_suspension: Option<String>,
    pub front_brakes: Option<String>,
    pub rear_brakes: Option<String>,
    pub steering_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cargo {
    /// Litres.
    pub min_trunk_capacity: Option<f64>,
    /// Litres.
    pub max_trunk_capacity: Option<f64>,
    /// m³.
    pub cargo_volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Electric {
    /// kWh.
    pub battery_capacity: Option<f64>,
    /// km.
    pub electric_range: Option<f64>,
    /// Hours.
    pub charging_time: Option<f64>,
}

// ---------------------------------------------------------------------------
// VehicleRecord – one normalized trim-level row
// ---------------------------------------------------------------------------

/// A single vehicle trim. `make` and `model` are always non-empty; everything
/// else may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    /// Trim-level identifier, taken verbatim from the source.
    pub id: String,
    pub make: String,
    pub model: String,
    pub generation: Option<String>,
    pub series: Option<String>,
    pub trim: Option<String>,
    pub body_type: Option<String>,
    pub number_of_seats: Option<i64>,
    pub number_of_doors: Option<i64>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,

    pub dimensions: Dimensions,
    pub weight: Weight,
    pub engine: Engine,
    pub performance: Performance,
    pub transmission: Transmission,
    pub chassis: Chassis,
    pub cargo: Cargo,

    pub car_class: Option<String>,
    pub country_of_origin: Option<String>,
    pub safety_rating: Option<String>,
    pub emission_standards: Option<String>,
    /// Metres.
    pub turning_circle: Option<f64>,
    pub electric: Electric,
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Source file format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Parquet,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Json => write!(f, "json"),
            SourceFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Why a source row did not make it into the working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum SkipReason {
    MissingMake,
    MissingModel,
    /// The row could not be decoded at all (bad UTF-8, not an object, ...).
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingMake => write!(f, "missing make"),
            SkipReason::MissingModel => write!(f, "missing model"),
            SkipReason::Malformed(msg) => write!(f, "malformed row: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub reason: SkipReason,
}

/// Per-reason skip counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub missing_make: usize,
    pub missing_model: usize,
    pub malformed: usize,
}

/// Outcome of a completed load: what was read, kept, and dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub source: String,
    pub format: SourceFormat,
    pub rows_read: usize,
    pub records_loaded: usize,
    pub skipped_total: usize,
    pub skipped_by_reason: SkipCounts,
    /// First `max_skip_samples` skipped rows, in source order.
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn new(source: impl Into<String>, format: SourceFormat) -> Self {
        LoadReport {
            source: source.into(),
            format,
            rows_read: 0,
            records_loaded: 0,
            skipped_total: 0,
            skipped_by_reason: SkipCounts::default(),
            skipped: Vec::new(),
        }
    }

    /// Count a skipped row, keeping at most `max_samples` of them verbatim.
    pub fn record_skip(&mut self, row: usize, reason: SkipReason, max_samples: usize) {
        self.skipped_total += 1;
        match reason {
            SkipReason::MissingMake => self.skipped_by_reason.missing_make += 1,
            SkipReason::MissingModel => self.skipped_by_reason.missing_model += 1,
            SkipReason::Malformed(_) => self.skipped_by_reason.malformed += 1,
        }
        if self.skipped.len() < max_samples {
            self.skipped.push(SkippedRow { row, reason });
        }
    }
}

// ---------------------------------------------------------------------------
// VehicleDataset – the complete loaded working set
// ---------------------------------------------------------------------------

/// The immutable working set plus a first-occurrence id index.
#[derive(Debug, Clone, Default)]
pub struct VehicleDataset {
    /// All records in load order.
    pub records: Vec<VehicleRecord>,
    id_index: HashMap<String, usize>,
}

impl VehicleDataset {
    /// Build the id index from the loaded records. Duplicate ids keep the
    /// position of their first occurrence.
    pub fn from_records(records: Vec<VehicleRecord>) -> Self {
        let mut id_index = HashMap::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            id_index.entry(rec.id.clone()).or_insert(i);
        }
        VehicleDataset { records, id_index }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record (in load order) whose id equals `id` exactly.
    pub fn get_by_id(&self, id: &str) -> Option<&VehicleRecord> {
        self.id_index.get(id).map(|&i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, make: &str, model: &str) -> VehicleRecord {
        VehicleRecord {
            id: id.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_ids_resolve_to_first_in_load_order() {
        let ds = VehicleDataset::from_records(vec![
            rec("1", "Ford", "Mustang"),
            rec("2", "Audi", "A4"),
            rec("1", "Ford", "Falcon"),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get_by_id("1").map(|r| r.model.as_str()), Some("Mustang"));
        assert!(ds.get_by_id("3").is_none());
        assert!(ds.get_by_id(" 1").is_none());
    }

    #[test]
    fn skip_samples_are_capped_but_counted() {
        let mut report = LoadReport::new("cars.csv", SourceFormat::Csv);
        report.record_skip(0, SkipReason::MissingMake, 2);
        report.record_skip(3, SkipReason::MissingModel, 2);
        report.record_skip(7, SkipReason::Malformed("bad utf-8".into()), 2);

        assert_eq!(report.skipped_total, 3);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped_by_reason.malformed, 1);
        assert_eq!(report.skipped[1].row, 3);
    }

    #[test]
    fn record_serializes_with_nested_camel_case_groups() {
        let mut r = rec("42", "Toyota", "Supra");
        r.engine.horsepower = Some(320.0);
        r.performance.acceleration_0_100 = Some(4.3);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["engine"]["horsepower"], 320.0);
        assert!(json["engine"]["type"].is_null());
        assert_eq!(json["performance"]["acceleration0_100"], 4.3);
        assert!(json["yearFrom"].is_null());
    }
}
