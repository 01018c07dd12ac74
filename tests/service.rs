use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use vehicle_dataset::{
    CompareError, DatasetConfig, DatasetError, DatasetLoadError, LoadState, SearchFilters,
    SortField, SortOrder, TopCriteria, VehicleDatasetService,
};

const HEADER: &str = "id_trim,Make,Modle,Generation,Year_from,Year_to,Series,Body_type,\
engine_type,engine_hp,max_speed_km_per_h,acceleration_0_100_km/h_s,\
mixed_fuel_consumption_per_100_km_l,drive_wheels,country_of_origin";

const ROWS: &[&str] = &[
    "1,Ford,Mustang,I,1965,1973,Fastback,Coupe,Gasoline,300,200,6.5,15.0,Rear wheel drive,USA",
    "2,Ford,Falcon,II,1975,1979,,Sedan,Gasoline,,160,,12.0,Rear wheel drive,USA",
    "3,Toyota,Corolla,E10,1966,1970,,Sedan,Gasoline,150,140,12.1,7.5,Front wheel drive,Japan",
    "4,Toyota,Supra,A80,1993,2002,RZ,Coupe,Gasoline,320,250,4.6,11.0,Rear wheel drive,Japan",
    "5,,Nameless,,2000,2001,,Sedan,,100,,,,,",
    "6,BMW,,,2010,2015,,SUV,Diesel,245,230,6.8,6.0,All wheel drive (AWD),Germany",
    "7,BMW,M3,E30,1986,1991,,Coupe,Gasoline,195,235,6.9,9.0,Rear wheel drive,Germany",
    "8,Tesla,Model S,,,,,Liftback,Electric,670,250,2.1,,All wheel drive (AWD),USA",
    "1,Ford,Duplicate,,1999,,,,,,,,,,",
];

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("cars.csv");
    let mut text = String::from(HEADER);
    for row in ROWS {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    std::fs::write(&path, text).unwrap();
    path
}

async fn loaded_service() -> (tempfile::TempDir, VehicleDatasetService) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path());
    let svc = VehicleDatasetService::new(DatasetConfig::with_path(path));
    svc.load().await.unwrap();
    (dir, svc)
}

fn ids(cars: &[&vehicle_dataset::VehicleRecord]) -> Vec<String> {
    cars.iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn load_reports_kept_and_skipped_rows() {
    let (_dir, svc) = loaded_service().await;

    assert!(svc.is_loaded());
    assert_eq!(svc.state(), LoadState::Loaded);
    assert_eq!(svc.len(), 7);

    let report = svc.report().unwrap();
    assert_eq!(report.rows_read, 9);
    assert_eq!(report.records_loaded, 7);
    assert_eq!(report.skipped_by_reason.missing_make, 1);
    assert_eq!(report.skipped_by_reason.missing_model, 1);

    for car in &svc.dataset().unwrap().records {
        assert!(!car.make.trim().is_empty());
        assert!(!car.model.trim().is_empty());
    }

    let status = svc.status();
    assert_eq!(status.state, "loaded");
    assert_eq!(status.total_cars, 7);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn second_load_is_a_no_op() {
    let (_dir, svc) = loaded_service().await;
    let first = svc.load().await.unwrap() as *const _;
    let again = svc.load().await.unwrap() as *const _;
    assert_eq!(first, again);
    assert_eq!(svc.len(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_loads_share_one_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let svc = Arc::new(VehicleDatasetService::new(DatasetConfig::with_path(write_dataset(
        dir.path(),
    ))));

    let waiter = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.ready().await })
    };

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.load().await.map(|r| r.records_loaded) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 7);
    }
    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_file_fails_and_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cars.csv");
    let svc = VehicleDatasetService::new(DatasetConfig::with_path(&path));

    let err = svc.load().await.unwrap_err();
    assert!(matches!(err, DatasetError::Load(DatasetLoadError::NotFound(_))));
    assert!(matches!(svc.state(), LoadState::Failed(_)));
    assert!(matches!(svc.search(&SearchFilters::default()), Err(DatasetError::LoadFailed(_))));
    assert!(matches!(svc.ready().await, Err(DatasetError::LoadFailed(_))));
    assert_eq!(svc.status().state, "failed");

    write_dataset(dir.path());
    svc.load().await.unwrap();
    assert_eq!(svc.len(), 7);
    svc.ready().await.unwrap();
}

#[tokio::test]
async fn dropped_load_still_finishes() {
    let dir = tempfile::tempdir().unwrap();
    let svc = VehicleDatasetService::new(DatasetConfig::with_path(write_dataset(dir.path())));

    // The first poll starts the attempt; the second branch then wins.
    tokio::select! {
        biased;
        _ = svc.load() => panic!("load cannot finish on its first poll"),
        _ = async {} => {}
    }

    tokio::time::timeout(Duration::from_secs(10), svc.ready())
        .await
        .expect("ready() hung after a dropped load")
        .unwrap();
    assert_eq!(svc.state(), LoadState::Loaded);
    assert_eq!(svc.status().state, "loaded");
    assert_eq!(svc.len(), 7);
    assert_eq!(svc.load().await.unwrap().records_loaded, 7);
}

#[tokio::test]
async fn callers_waiting_on_a_failed_load_share_its_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let svc = VehicleDatasetService::new(DatasetConfig::with_path(dir.path().join("cars.csv")));

    let (first, second) = tokio::join!(svc.load(), svc.load());
    assert!(matches!(first, Err(DatasetError::Load(DatasetLoadError::NotFound(_)))));
    assert!(matches!(second, Err(DatasetError::LoadFailed(_))));

    write_dataset(dir.path());
    assert_eq!(svc.load().await.unwrap().records_loaded, 7);
}

#[tokio::test]
async fn search_filters_sort_and_page() {
    let (_dir, svc) = loaded_service().await;

    let result = svc
        .search(&SearchFilters {
            make: Some("toyota".into()),
            min_horsepower: Some(200.0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&result.data), ["4"]);

    let result = svc
        .search(&SearchFilters {
            drive_wheels: Some("rear".into()),
            sort_by: Some(SortField::Horsepower),
            sort_order: SortOrder::Desc,
            limit: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&result.data), ["4", "1"]);
    assert_eq!(result.pagination.total, 4);
    assert_eq!(result.pagination.pages, 2);

    let beyond = svc
        .search(&SearchFilters {
            page: Some(5),
            limit: Some(3),
            ..Default::default()
        })
        .unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.pagination.total, 7);
    assert_eq!(beyond.pagination.pages, 3);
}

#[tokio::test]
async fn search_uses_configured_page_size() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig {
        default_page_limit: 3,
        ..DatasetConfig::with_path(write_dataset(dir.path()))
    };
    let svc = VehicleDatasetService::new(config);
    svc.load().await.unwrap();

    let result = svc
        .search(&SearchFilters::from_params([("sortBy", "year"), ("page", "abc")]))
        .unwrap();
    assert_eq!(result.pagination.limit, 3);
    assert_eq!(result.pagination.page, 1);
    // Tesla has no year and sorts as 0
    assert_eq!(ids(&result.data), ["8", "1", "3"]);
}

#[tokio::test]
async fn lookups_and_aggregations() {
    let (_dir, svc) = loaded_service().await;

    assert_eq!(svc.get_by_id("1").unwrap().unwrap().model, "Mustang");
    assert!(svc.get_by_id("99").unwrap().is_none());

    let analytics = svc.analytics().unwrap();
    assert_eq!(analytics.total_cars, 7);
    assert_eq!(analytics.makes, ["BMW", "Ford", "Tesla", "Toyota"]);
    assert_eq!(analytics.countries, ["Germany", "Japan", "USA"]);
    assert_eq!(analytics.year_range.from, Some(1965));
    assert_eq!(analytics.year_range.to, Some(2002));
    assert_eq!(svc.makes().unwrap(), analytics.makes);

    let decades = svc.cars_by_decade().unwrap();
    let keys: Vec<i64> = decades.iter().map(|d| d.decade).collect();
    assert_eq!(keys, [1960, 1970, 1980, 1990]);
    assert_eq!(decades[0].count, 2);
    assert_eq!(decades[0].avg_horsepower, Some(225));
    assert_eq!(decades[1].avg_horsepower, None);

    let ford = svc.make_statistics("FORD").unwrap().unwrap();
    assert_eq!(ford.total_models, 3);
    assert_eq!(ford.avg_horsepower, Some(300));
    assert_eq!(ford.models, ["Mustang", "Falcon", "Duplicate"]);
    assert!(svc.make_statistics("Lada").unwrap().is_none());

    let quickest = svc.top_cars(TopCriteria::Acceleration, Some(2)).unwrap();
    assert_eq!(ids(&quickest), ["8", "4"]);
    let strongest = svc.top_cars("horsepower".parse().unwrap(), None).unwrap();
    assert_eq!(strongest.len(), 5);
    assert_eq!(strongest[0].id, "8");

    assert_eq!(svc.random_cars(Some(100)).unwrap().len(), 7);
    assert_eq!(svc.random_cars(None).unwrap().len(), 5);
}

#[tokio::test]
async fn compare_requires_two_resolved_ids() {
    let (_dir, svc) = loaded_service().await;

    let cmp = svc.compare(&["4", "7"]).unwrap();
    assert_eq!(cmp.specs.performance[0].max_speed, Some(250.0));

    assert!(matches!(
        svc.compare(&["4", "nope"]),
        Err(DatasetError::Compare(CompareError::TooFewFound(1)))
    ));
}
