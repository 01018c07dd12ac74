use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use vehicle_dataset::{DatasetConfig, SearchFilters, TopCriteria, VehicleDatasetService};

#[derive(Parser, Debug)]
#[command(name = "vehicle-dataset", version)]
#[command(about = "Search, rank and summarise a vehicle specification dataset")]
struct Cli {
    /// Dataset file (.csv, .json or .parquet)
    #[arg(long, env = "VEHICLE_DATASET_PATH")]
    dataset: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load state, record count and load report
    Status,
    /// Filtered, sorted, paginated search
    Search(SearchArgs),
    /// One record by trim id
    Get { id: String },
    /// Dataset-wide totals and distinct value lists
    Analytics,
    /// All distinct makes
    Makes,
    /// Statistics for one make
    Make { make: String },
    /// Per-decade rollup
    Decades,
    /// Top records by horsepower, speed, acceleration or efficient
    Top {
        #[arg(long, default_value = "horsepower")]
        criteria: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Random sample
    Random {
        #[arg(long)]
        count: Option<usize>,
    },
    /// Side-by-side comparison of two or more ids
    Compare {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Raw search flags; parsed leniently, so a bad number just drops that filter.
#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    year_from: Option<String>,
    #[arg(long)]
    year_to: Option<String>,
    #[arg(long)]
    body_type: Option<String>,
    #[arg(long)]
    engine_type: Option<String>,
    #[arg(long)]
    min_horsepower: Option<String>,
    #[arg(long)]
    max_horsepower: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    drive_wheels: Option<String>,
    /// year, horsepower, speed or make
    #[arg(long)]
    sort_by: Option<String>,
    /// asc or desc
    #[arg(long)]
    sort_order: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    limit: Option<String>,
}

impl SearchArgs {
    fn filters(&self) -> SearchFilters {
        let params = [
            ("query", &self.query),
            ("make", &self.make),
            ("model", &self.model),
            ("yearFrom", &self.year_from),
            ("yearTo", &self.year_to),
            ("bodyType", &self.body_type),
            ("engineType", &self.engine_type),
            ("minHorsepower", &self.min_horsepower),
            ("maxHorsepower", &self.max_horsepower),
            ("country", &self.country),
            ("driveWheels", &self.drive_wheels),
            ("sortBy", &self.sort_by),
            ("sortOrder", &self.sort_order),
            ("page", &self.page),
            ("limit", &self.limit),
        ];
        SearchFilters::from_params(
            params
                .into_iter()
                .filter_map(|(k, v)| v.as_deref().map(|v| (k, v))),
        )
    }
}

fn build_config(cli: &Cli) -> Result<DatasetConfig> {
    let mut config = match &cli.config {
        Some(path) => DatasetConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DatasetConfig::default(),
    };
    if let Some(path) = &cli.dataset {
        config.dataset_path = path.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let service = VehicleDatasetService::new(build_config(&cli)?);

    // A failed load is part of the status output, not a command failure.
    let loaded = service.load().await.map(|_| ());
    if !matches!(cli.command, Command::Status) {
        loaded.context("loading vehicle dataset")?;
    }

    run(&service, &cli.command)
}

fn run(service: &VehicleDatasetService, command: &Command) -> Result<()> {
    match command {
        Command::Status => print_json(&service.status()),
        Command::Search(args) => {
            let result = service.search(&args.filters())?;
            print_json(&json!({
                "count": result.data.len(),
                "pagination": result.pagination,
                "data": result.data,
            }))
        }
        Command::Get { id } => match service.get_by_id(id)? {
            Some(car) => print_json(car),
            None => bail!("Car not found with id {id}"),
        },
        Command::Analytics => print_json(&service.analytics()?),
        Command::Makes => {
            let makes = service.makes()?;
            print_json(&json!({ "count": makes.len(), "data": makes }))
        }
        Command::Make { make } => match service.make_statistics(make)? {
            Some(stats) => print_json(&stats),
            None => bail!("No data found for make: {make}"),
        },
        Command::Decades => {
            let decades = service.cars_by_decade()?;
            print_json(&json!({ "count": decades.len(), "data": decades }))
        }
        Command::Top { criteria, limit } => {
            let parsed: TopCriteria = criteria.parse()?;
            let cars = service.top_cars(parsed, *limit)?;
            print_json(&json!({ "criteria": criteria, "count": cars.len(), "data": cars }))
        }
        Command::Random { count } => {
            let cars = service.random_cars(*count)?;
            print_json(&json!({ "count": cars.len(), "data": cars }))
        }
        Command::Compare { ids } => print_json(&service.compare(ids.as_slice())?),
    }
}
