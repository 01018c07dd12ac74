use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use vehicle_dataset::data::normalize::columns as col;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

struct MakeProfile {
    make: &'static str,
    country: &'static str,
    models: &'static [&'static str],
}

const MAKES: &[MakeProfile] = &[
    MakeProfile { make: "Ford", country: "USA", models: &["Mustang", "Focus", "F-150", "Fiesta"] },
    MakeProfile { make: "Toyota", country: "Japan", models: &["Corolla", "Supra", "Land Cruiser", "Prius"] },
    MakeProfile { make: "BMW", country: "Germany", models: &["3 Series", "M3", "X5"] },
    MakeProfile { make: "Lada", country: "Russia", models: &["Niva", "2107", "Vesta"] },
    MakeProfile { make: "Fiat", country: "Italy", models: &["500", "Panda", "Uno"] },
    MakeProfile { make: "Tesla", country: "USA", models: &["Model S", "Model 3"] },
];

const BODY_TYPES: &[&str] = &["Sedan", "Hatchback", "Coupe", "SUV", "Wagon", "Pickup", "Cabriolet"];
const DRIVE_WHEELS: &[&str] = &["Front wheel drive", "Rear wheel drive", "All wheel drive (AWD)"];
const TRANSMISSIONS: &[&str] = &["Manual", "Automatic", "Robot", "Variator"];
const INJECTION: &[&str] = &["Multi-point fuel injection", "direct injection", "Carburetor"];
const BOOST: &[&str] = &["Turbo", "none", "Compressor"];
const LAYOUT: &[&str] = &["Inline", "V-type", "Opposite"];

/// One synthetic trim. Roughly one cell in ten is left blank on purpose.
fn generate_row(id: usize, rng: &mut SimpleRng) -> BTreeMap<&'static str, String> {
    let profile = rng.pick(MAKES);
    let electric = profile.make == "Tesla";
    let year_from = rng.range(1945.0, 2020.0).floor();
    let hp = if electric { rng.range(250.0, 800.0) } else { rng.range(40.0, 600.0) }.round();
    let accel = (2500.0 / hp).clamp(2.5, 25.0);

    let mut row = BTreeMap::new();
    let mut put = |key: &'static str, value: String| {
        row.insert(key, value);
    };

    put(col::ID, (id + 1).to_string());
    put(col::MAKE, profile.make.to_string());
    put(col::MODEL_UPSTREAM, rng.pick(profile.models).to_string());
    put(col::GENERATION, format!("{} generation", 1 + id % 5));
    put(col::YEAR_FROM, format!("{year_from}"));
    put(col::YEAR_TO, format!("{}", (year_from + rng.range(2.0, 12.0)).floor().min(2020.0)));
    put(col::SERIES, format!("Series {}", 1 + id % 3));
    put(col::TRIM, format!("{:.1} {}", rng.range(1.0, 5.0), rng.pick(TRANSMISSIONS)));
    put(col::BODY_TYPE, rng.pick(BODY_TYPES).to_string());
    put(col::SEATS, format!("{}", 2 + rng.next_u64() % 6));
    put(col::DOORS, format!("{}", 2 + rng.next_u64() % 4));

    put(col::LENGTH, format!("{:.0}", rng.range(3500.0, 5500.0)));
    put(col::WIDTH, format!("{:.0}", rng.range(1500.0, 2100.0)));
    put(col::HEIGHT, format!("{:.0}", rng.range(1200.0, 2000.0)));
    put(col::WHEELBASE, format!("{:.0}", rng.range(2200.0, 3300.0)));
    put(col::FRONT_TRACK, format!("{:.0}", rng.range(1300.0, 1700.0)));
    put(col::REAR_TRACK, format!("{:.0}", rng.range(1300.0, 1700.0)));
    put(col::GROUND_CLEARANCE, format!("{:.0}", rng.range(100.0, 250.0)));

    let curb = rng.range(800.0, 2500.0).round();
    put(col::CURB_WEIGHT, format!("{curb}"));
    put(col::FULL_WEIGHT, format!("{}", curb + 450.0));
    put(col::PAYLOAD, "450".to_string());

    put(col::ENGINE_TYPE, if electric { "Electric" } else { *rng.pick(&["Gasoline", "Diesel"]) }.to_string());
    if !electric {
        let cylinders = *rng.pick(&[3u32, 4, 6, 8, 12]);
        put(col::CAPACITY, format!("{:.0}", rng.range(900.0, 6500.0)));
        put(col::CYLINDERS, cylinders.to_string());
        put(col::CYLINDER_LAYOUT, rng.pick(LAYOUT).to_string());
        put(col::VALVES_PER_CYLINDER, rng.pick(&["2", "4"]).to_string());
        put(col::COMPRESSION_RATIO, format!("{:.1}", rng.range(8.0, 18.0)));
        put(col::CYLINDER_BORE, format!("{:.1}", rng.range(70.0, 100.0)));
        put(col::STROKE_CYCLE, format!("{:.1}", rng.range(70.0, 100.0)));
        put(col::INJECTION_TYPE, rng.pick(INJECTION).to_string());
        put(col::BOOST_TYPE, rng.pick(BOOST).to_string());
        put(col::MIXED_FUEL, format!("{:.1}", rng.range(4.0, 16.0)));
        put(col::CITY_FUEL, format!("{:.1}", rng.range(6.0, 20.0)));
        put(col::HIGHWAY_FUEL, format!("{:.1}", rng.range(3.5, 12.0)));
        put(col::CO2, format!("{:.0}", rng.range(90.0, 350.0)));
        put(col::FUEL_GRADE, rng.pick(&["92", "95", "98", "DT"]).to_string());
        put(col::FUEL_TANK, format!("{:.0}", rng.range(35.0, 100.0)));
    } else {
        put(col::BATTERY_CAPACITY, format!("{:.0}", rng.range(50.0, 100.0)));
        put(col::ELECTRIC_RANGE, format!("{:.0}", rng.range(300.0, 650.0)));
        put(col::CHARGING_TIME, format!("{:.1}", rng.range(4.0, 12.0)));
    }
    put(col::HORSEPOWER, format!("{hp}"));
    put(col::HORSEPOWER_RPM, format!("{:.0}", rng.range(4000.0, 8000.0)));
    put(col::MAX_POWER, format!("{:.0}", hp * 0.7355));
    put(col::MAX_TORQUE, format!("{:.0}", hp * rng.range(1.2, 2.0)));
    put(col::TORQUE_RPM, format!("{:.0}", rng.range(1500.0, 5000.0)));

    put(col::ACCELERATION, format!("{accel:.1}"));
    put(col::MAX_SPEED, format!("{:.0}", (120.0 + hp * 0.35).min(350.0)));
    put(col::RANGE, format!("{:.0}", rng.range(400.0, 1200.0)));

    put(col::TRANSMISSION, rng.pick(TRANSMISSIONS).to_string());
    put(col::GEARS, format!("{}", 4 + rng.next_u64() % 5));
    put(col::DRIVE_WHEELS, rng.pick(DRIVE_WHEELS).to_string());

    put(col::FRONT_SUSPENSION, "Independent, spring, anti-roll bar".to_string());
    put(col::REAR_SUSPENSION, rng.pick(&["Dependent, spring", "Independent, multi-link"]).to_string());
    put(col::FRONT_BRAKES, "ventilated disc".to_string());
    put(col::REAR_BRAKES, rng.pick(&["Disc", "Drum"]).to_string());
    put(col::STEERING, rng.pick(&["Rack and pinion", "Screw", "Electric power steering"]).to_string());

    put(col::MIN_TRUNK, format!("{:.0}", rng.range(150.0, 600.0)));
    put(col::MAX_TRUNK, format!("{:.0}", rng.range(600.0, 1800.0)));
    put(col::CAR_CLASS, rng.pick(&["A", "B", "C", "D", "E", "F", "J"]).to_string());
    put(col::COUNTRY, profile.country.to_string());
    put(col::SAFETY, rng.pick(&["Euro NCAP 5 stars", "Euro NCAP 4 stars"]).to_string());
    put(col::EMISSION_STANDARDS, rng.pick(&["Euro 4", "Euro 5", "Euro 6"]).to_string());
    put(col::TURNING_CIRCLE, format!("{:.1}", rng.range(9.5, 13.0)));

    // Blank out some cells, never the id.
    row.retain(|k, _| *k == col::ID || !rng.chance(0.1));
    row
}

fn write_csv(path: &Path, rows: &[BTreeMap<&'static str, String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(col::ALL)?;
    for row in rows {
        writer.write_record(col::ALL.iter().map(|c| row.get(c).map_or("", String::as_str)))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[BTreeMap<&'static str, String>]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        col::ALL
            .iter()
            .map(|c| Field::new(*c, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = col::ALL
        .iter()
        .map(|c| {
            let values: Vec<Option<&str>> = rows.iter().map(|r| r.get(c).map(String::as_str)).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_cars.csv".to_string());
    let output_path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let mut rows: Vec<_> = (0..500).map(|i| generate_row(i, &mut rng)).collect();

    // A few rows the loader must reject.
    rows[17].remove(col::MAKE);
    rows[42].insert(col::MODEL_UPSTREAM, "   ".to_string());

    let is_parquet = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(output_path, &rows)?;
    } else {
        write_csv(output_path, &rows)?;
    }

    println!("Wrote {} vehicle rows ({} columns) to {output}", rows.len(), col::ALL.len());
    Ok(())
}
