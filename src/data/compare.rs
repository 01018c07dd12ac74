use serde::Serialize;

use super::model::VehicleDataset;
use crate::error::CompareError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedCar {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub body_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub engine_type: Option<String>,
    pub capacity: Option<f64>,
    pub horsepower: Option<f64>,
    pub torque: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSpec {
    pub id: String,
    pub acceleration: Option<f64>,
    pub max_speed: Option<f64>,
    pub fuel_consumption: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSpec {
    pub id: String,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Curb weight.
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSpecs {
    pub engine: Vec<EngineSpec>,
    pub performance: Vec<PerformanceSpec>,
    pub dimensions: Vec<DimensionSpec>,
}

/// Side-by-side view of several records, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub cars: Vec<ComparedCar>,
    pub specs: ComparisonSpecs,
}

/// Compare the records named by `ids`. Unknown ids are dropped; at least two
/// ids must be given and at least two must resolve.
pub fn compare<S: AsRef<str>>(dataset: &VehicleDataset, ids: &[S]) -> Result<Comparison, CompareError> {
    if ids.len() < 2 {
        return Err(CompareError::TooFewIds(ids.len()));
    }

    let cars: Vec<_> = ids
        .iter()
        .filter_map(|id| dataset.get_by_id(id.as_ref()))
        .collect();
    if cars.len() < 2 {
        return Err(CompareError::TooFewFound(cars.len()));
    }

    Ok(Comparison {
        cars: cars
            .iter()
            .map(|c| ComparedCar {
                id: c.id.clone(),
                make: c.make.clone(),
                model: c.model.clone(),
                year: c.year_from,
                body_type: c.body_type.clone(),
            })
            .collect(),
        specs: ComparisonSpecs {
            engine: cars
                .iter()
                .map(|c| EngineSpec {
                    id: c.id.clone(),
                    engine_type: c.engine.engine_type.clone(),
                    capacity: c.engine.capacity,
                    horsepower: c.engine.horsepower,
                    torque: c.engine.max_torque,
                })
                .collect(),
            performance: cars
                .iter()
                .map(|c| PerformanceSpec {
                    id: c.id.clone(),
                    acceleration: c.performance.acceleration_0_100,
                    max_speed: c.performance.max_speed,
                    fuel_consumption: c.performance.mixed_fuel_consumption,
                })
                .collect(),
            dimensions: cars
                .iter()
                .map(|c| DimensionSpec {
                    id: c.id.clone(),
                    length: c.dimensions.length,
                    width: c.dimensions.width,
                    height: c.dimensions.height,
                    weight: c.weight.curb,
                })
                .collect(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::VehicleRecord;

    fn dataset() -> VehicleDataset {
        let mk = |id: &str, make: &str, hp: f64| {
            let mut r = VehicleRecord {
                id: id.into(),
                make: make.into(),
                model: "M".into(),
                ..Default::default()
            };
            r.engine.horsepower = Some(hp);
            r.weight.curb = Some(1200.0);
            r
        };
        VehicleDataset::from_records(vec![mk("1", "Ford", 100.0), mk("2", "Audi", 200.0)])
    }

    #[test]
    fn compares_in_request_order_dropping_unknown_ids() {
        let ds = dataset();
        let cmp = compare(&ds, &["2", "nope", "1"]).unwrap();
        let ids: Vec<&str> = cmp.cars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(cmp.specs.engine[0].horsepower, Some(200.0));
        assert_eq!(cmp.specs.dimensions[1].weight, Some(1200.0));
    }

    #[test]
    fn needs_two_ids_and_two_matches() {
        let ds = dataset();
        assert_eq!(compare(&ds, &["1"]), Err(CompareError::TooFewIds(1)));
        assert_eq!(compare(&ds, &["1", "9"]), Err(CompareError::TooFewFound(1)));
    }
}
