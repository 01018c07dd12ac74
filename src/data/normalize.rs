//! Row normalization: raw text cells → [`VehicleRecord`].
//!
//! Every source format is reduced to something implementing [`RowSource`]
//! (column name → cell text) so that coercion rules live in one place.

use std::collections::BTreeMap;

use super::model::{
    Cargo, Chassis, Dimensions, Electric, Engine, Performance, SkipReason, Transmission,
    VehicleRecord, Weight,
};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

/// Header names of the upstream vehicle dataset, one per leaf field.
pub mod columns {
    pub const ID: &str = "id_trim";
    pub const MAKE: &str = "Make";
    /// The upstream header carries this misspelling.
    pub const MODEL_UPSTREAM: &str = "Modle";
    pub const MODEL: &str = "Model";
    pub const GENERATION: &str = "Generation";
    pub const YEAR_FROM: &str = "Year_from";
    pub const YEAR_TO: &str = "Year_to";
    pub const SERIES: &str = "Series";
    pub const TRIM: &str = "Trim";
    pub const BODY_TYPE: &str = "Body_type";
    pub const SEATS: &str = "number_of_seats";
    pub const DOORS: &str = "number_of_doors";

    pub const LENGTH: &str = "length_mm";
    pub const WIDTH: &str = "width_mm";
    pub const HEIGHT: &str = "height_mm";
    pub const WHEELBASE: &str = "wheelbase_mm";
    pub const FRONT_TRACK: &str = "front_track_mm";
    pub const REAR_TRACK: &str = "rear_track_mm";
    pub const GROUND_CLEARANCE: &str = "ground_clearance_mm";

    pub const CURB_WEIGHT: &str = "curb_weight_kg";
    pub const FULL_WEIGHT: &str = "full_weight_kg";
    pub const PAYLOAD: &str = "payload_kg";

    pub const ENGINE_TYPE: &str = "engine_type";
    pub const CAPACITY: &str = "capacity_cm3";
    pub const HORSEPOWER: &str = "engine_hp";
    pub const HORSEPOWER_RPM: &str = "engine_hp_rpm";
    pub const MAX_POWER: &str = "max_power_kw";
    pub const MAX_TORQUE: &str = "maximum_torque_n_m";
    pub const TORQUE_RPM: &str = "turnover_of_maximum_torque_rpm";
    pub const CYLINDERS: &str = "number_of_cylinders";
    pub const CYLINDER_LAYOUT: &str = "cylinder_layout";
    pub const VALVES_PER_CYLINDER: &str = "valves_per_cylinder";
    pub const COMPRESSION_RATIO: &str = "compression_ratio";
    pub const CYLINDER_BORE: &str = "cylinder_bore_mm";
    pub const STROKE_CYCLE: &str = "stroke_cycle_mm";
    pub const INJECTION_TYPE: &str = "injection_type";
    pub const BOOST_TYPE: &str = "boost_type";

    pub const ACCELERATION: &str = "acceleration_0_100_km/h_s";
    pub const MAX_SPEED: &str = "max_speed_km_per_h";
    pub const MIXED_FUEL: &str = "mixed_fuel_consumption_per_100_km_l";
    pub const CITY_FUEL: &str = "city_fuel_per_100km_l";
    pub const HIGHWAY_FUEL: &str = "highway_fuel_per_100km_l";
    pub const CO2: &str = "CO2_emissions_g_km";
    pub const FUEL_GRADE: &str = "fuel_grade";
    pub const FUEL_TANK: &str = "fuel_tank_capacity_l";
    pub const RANGE: &str = "range_km";

    pub const TRANSMISSION: &str = "transmission";
    pub const GEARS: &str = "number_of_gears";
    pub const DRIVE_WHEELS: &str = "drive_wheels";

    pub const FRONT_SUSPENSION: &str = "front_suspension";
    pub const REAR_SUSPENSION: &str = "back_suspension";
    pub const FRONT_BRAKES: &str = "front_brakes";
    pub const REAR_BRAKES: &str = "rear_brakes";
    pub const STEERING: &str = "steering_type";

    pub const MIN_TRUNK: &str = "minimum_trunk_capacity_l";
    pub const MAX_TRUNK: &str = "max_trunk_capacity_l";
    pub const CARGO_VOLUME: &str = "cargo_volume_m3";

    pub const CAR_CLASS: &str = "car_class";
    pub const COUNTRY: &str = "country_of_origin";
    pub const SAFETY: &str = "safety_assessment";
    pub const EMISSION_STANDARDS: &str = "emission_standards";
    pub const TURNING_CIRCLE: &str = "turning_circle_m";

    pub const BATTERY_CAPACITY: &str = "battery_capacity_KW_per_h";
    pub const ELECTRIC_RANGE: &str = "electric_range_km";
    pub const CHARGING_TIME: &str = "charging_time_h";

    /// Every column the normalizer reads, in the upstream header order.
    /// `MODEL_UPSTREAM` stands in for the model column.
    pub const ALL: &[&str] = &[
        ID, MAKE, MODEL_UPSTREAM, GENERATION, YEAR_FROM, YEAR_TO, SERIES, TRIM, BODY_TYPE,
        SEATS, DOORS, LENGTH, WIDTH, HEIGHT, WHEELBASE, FRONT_TRACK, REAR_TRACK,
        GROUND_CLEARANCE, CURB_WEIGHT, FULL_WEIGHT, PAYLOAD, ENGINE_TYPE, CAPACITY, HORSEPOWER,
        HORSEPOWER_RPM, MAX_POWER, MAX_TORQUE, TORQUE_RPM, CYLINDERS, CYLINDER_LAYOUT,
        VALVES_PER_CYLINDER, COMPRESSION_RATIO, CYLINDER_BORE, STROKE_CYCLE, INJECTION_TYPE,
        BOOST_TYPE, ACCELERATION, MAX_SPEED, MIXED_FUEL, CITY_FUEL, HIGHWAY_FUEL, CO2,
        FUEL_GRADE, FUEL_TANK, RANGE, TRANSMISSION, GEARS, DRIVE_WHEELS, FRONT_SUSPENSION,
        REAR_SUSPENSION, FRONT_BRAKES, REAR_BRAKES, STEERING, MIN_TRUNK, MAX_TRUNK,
        CARGO_VOLUME, CAR_CLASS, COUNTRY, SAFETY, EMISSION_STANDARDS, TURNING_CIRCLE,
        BATTERY_CAPACITY, ELECTRIC_RANGE, CHARGING_TIME,
    ];
}

/// Pick the header that holds model names. The upstream spelling wins when
/// both are present.
pub fn resolve_model_column<'a>(mut headers: impl Iterator<Item = &'a str>) -> Option<&'static str> {
    let mut found_plain = false;
    let found_upstream = headers.any(|h| {
        found_plain |= h == columns::MODEL;
        h == columns::MODEL_UPSTREAM
    });
    if found_upstream {
        Some(columns::MODEL_UPSTREAM)
    } else if found_plain {
        Some(columns::MODEL)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// RowSource – column lookup abstraction over every input format
// ---------------------------------------------------------------------------

/// A single source row addressable by column name.
pub trait RowSource {
    /// Raw cell text, or `None` if the column does not exist for this row.
    fn cell(&self, column: &str) -> Option<&str>;
}

impl RowSource for BTreeMap<String, String> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.get(column).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse a finite number. Blank, unparseable, NaN and infinite cells are `None`.
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a number and floor it. Values outside the `i64` range are `None`.
pub fn parse_int(cell: Option<&str>) -> Option<i64> {
    let v = parse_number(cell)?.floor();
    (v >= i64::MIN as f64 && v < i64::MAX as f64).then(|| v as i64)
}

/// Trimmed text; whitespace-only cells are `None`.
pub fn parse_text(cell: Option<&str>) -> Option<String> {
    let s = cell?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Row → record
// ---------------------------------------------------------------------------

/// Normalize one row. `model_column` is the header resolved by
/// [`resolve_model_column`].
pub fn normalize_row<R: RowSource + ?Sized>(
    row: &R,
    model_column: &str,
) -> Result<VehicleRecord, SkipReason> {
    use columns as c;

    let num = |col: &str| parse_number(row.cell(col));
    let int = |col: &str| parse_int(row.cell(col));
    let text = |col: &str| parse_text(row.cell(col));

    let make = text(c::MAKE).ok_or(SkipReason::MissingMake)?;
    let model = text(model_column).ok_or(SkipReason::MissingModel)?;

    let engine_type = text(c::ENGINE_TYPE);

    Ok(VehicleRecord {
        id: row.cell(c::ID).unwrap_or_default().to_string(),
        make,
        model,
        generation: text(c::GENERATION),
        series: text(c::SERIES),
        trim: text(c::TRIM),
        body_type: text(c::BODY_TYPE),
        number_of_seats: int(c::SEATS),
        number_of_doors: int(c::DOORS),
        year_from: int(c::YEAR_FROM),
        year_to: int(c::YEAR_TO),

        dimensions: Dimensions {
            length: num(c::LENGTH),
            width: num(c::WIDTH),
            height: num(c::HEIGHT),
            wheelbase: num(c::WHEELBASE),
            front_track: num(c::FRONT_TRACK),
            rear_track: num(c::REAR_TRACK),
            ground_clearance: num(c::GROUND_CLEARANCE),
        },
        weight: Weight {
            curb: num(c::CURB_WEIGHT),
            full: num(c::FULL_WEIGHT),
            payload: num(c::PAYLOAD),
        },
        engine: Engine {
            fuel_type: engine_type.clone(),
            engine_type,
            capacity: num(c::CAPACITY),
            horsepower: num(c::HORSEPOWER),
            horsepower_rpm: num(c::HORSEPOWER_RPM),
            max_power: num(c::MAX_POWER),
            max_torque: num(c::MAX_TORQUE),
            torque_rpm: num(c::TORQUE_RPM),
            cylinders: int(c::CYLINDERS),
            cylinder_layout: text(c::CYLINDER_LAYOUT),
            valves_per_cylinder: int(c::VALVES_PER_CYLINDER),
            compression_ratio: num(c::COMPRESSION_RATIO),
            cylinder_bore: num(c::CYLINDER_BORE),
            stroke_cycle: num(c::STROKE_CYCLE),
            injection_type: text(c::INJECTION_TYPE),
            boost_type: text(c::BOOST_TYPE),
        },
        performance: Performance {
            acceleration_0_100: num(c::ACCELERATION),
            max_speed: num(c::MAX_SPEED),
            mixed_fuel_consumption: num(c::MIXED_FUEL),
            city_fuel_consumption: num(c::CITY_FUEL),
            highway_fuel_consumption: num(c::HIGHWAY_FUEL),
            co2_emissions: num(c::CO2),
            fuel_grade: text(c::FUEL_GRADE),
            fuel_tank_capacity: num(c::FUEL_TANK),
            range: num(c::RANGE),
        },
        transmission: Transmission {
            transmission_type: text(c::TRANSMISSION),
            gears: int(c::GEARS),
            drive_wheels: text(c::DRIVE_WHEELS),
        },
        chassis: Chassis {
            front_suspension: text(c::FRONT_SUSPENSION),
            rear_suspension: text(c::REAR_SUSPENSION),
            front_brakes: text(c::FRONT_BRAKES),
            rear_brakes: text(c::REAR_BRAKES),
            steering_type: text(c::STEERING),
        },
        cargo: Cargo {
            min_trunk_capacity: num(c::MIN_TRUNK),
            max_trunk_capacity: num(c::MAX_TRUNK),
            cargo_volume: num(c::CARGO_VOLUME),
        },

        car_class: text(c::CAR_CLASS),
        country_of_origin: text(c::COUNTRY),
        safety_rating: text(c::SAFETY),
        emission_standards: text(c::EMISSION_STANDARDS),
        turning_circle: num(c::TURNING_CIRCLE),
        electric: Electric {
            battery_capacity: num(c::BATTERY_CAPACITY),
            electric_range: num(c::ELECTRIC_RANGE),
            charging_time: num(c::CHARGING_TIME),
        },
    })
}
