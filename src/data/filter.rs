use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use super::model::{VehicleDataset, VehicleRecord};
use super::normalize::{parse_int, parse_number};
use crate::error::DatasetError;

/// Page size used when the caller supplies none.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// `yearFrom`
    Year,
    Horsepower,
    /// `maxSpeed`
    Speed,
    Make,
}

impl FromStr for SortField {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(SortField::Year),
            "horsepower" => Ok(SortField::Horsepower),
            "speed" => Ok(SortField::Speed),
            "make" => Ok(SortField::Make),
            other => Err(DatasetError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    /// Anything other than `desc` sorts ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        })
    }
}

/// Rank two records on `field`. Missing numbers rank as `0`, a missing make
/// is impossible in the working set.
fn compare_by(a: &VehicleRecord, b: &VehicleRecord, field: SortField) -> Ordering {
    match field {
        SortField::Year => a.year_from.unwrap_or(0).cmp(&b.year_from.unwrap_or(0)),
        SortField::Horsepower => a
            .engine
            .horsepower
            .unwrap_or(0.0)
            .total_cmp(&b.engine.horsepower.unwrap_or(0.0)),
        SortField::Speed => a
            .performance
            .max_speed
            .unwrap_or(0.0)
            .total_cmp(&b.performance.max_speed.unwrap_or(0.0)),
        SortField::Make => a.make.cmp(&b.make),
    }
}

// ---------------------------------------------------------------------------
// Search filters
// ---------------------------------------------------------------------------

/// Optional, AND-combined search predicates plus sort and page selection.
///
/// Empty strings behave like `None`. A record whose field is absent never
/// matches a predicate on that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// Substring of make, model, series or body type.
    pub query: Option<String>,
    pub make: Option<String>,
    /// Substring of model.
    pub model: Option<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub body_type: Option<String>,
    /// Substring of engine type.
    pub engine_type: Option<String>,
    pub min_horsepower: Option<f64>,
    pub max_horsepower: Option<f64>,
    pub country: Option<String>,
    /// Substring of drive wheels.
    pub drive_wheels: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
    /// 1-indexed.
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl SearchFilters {
    /// Build filters from raw query-string pairs.
    ///
    /// Values that fail to parse leave the corresponding filter unset rather
    /// than failing the request; unknown keys are ignored.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut f = SearchFilters::default();
        for (key, value) in params {
            let v = value.as_ref();
            let text = || (!v.is_empty()).then(|| v.to_string());
            match key.as_ref() {
                "query" => f.query = text(),
                "make" => f.make = text(),
                "model" => f.model = text(),
                "yearFrom" => f.year_from = parse_int(Some(v)),
                "yearTo" => f.year_to = parse_int(Some(v)),
                "bodyType" => f.body_type = text(),
                "engineType" => f.engine_type = text(),
                "minHorsepower" => f.min_horsepower = parse_number(Some(v)),
                "maxHorsepower" => f.max_horsepower = parse_number(Some(v)),
                "country" => f.country = text(),
                "driveWheels" => f.drive_wheels = text(),
                "sortBy" => f.sort_by = v.parse().ok(),
                "sortOrder" => f.sort_order = v.parse().unwrap_or_default(),
                "page" => f.page = leading_count(v),
                "limit" => f.limit = leading_count(v),
                _ => {}
            }
        }
        f
    }
}

/// Positive integer at the start of `s`; trailing text is ignored, so `"2.5"`
/// reads as 2.
fn leading_count(s: &str) -> Option<usize> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok().filter(|&n| n > 0)
}

/// Lower-cased needles, computed once per search.
struct Predicates {
    query: Option<String>,
    make: Option<String>,
    model: Option<String>,
    body_type: Option<String>,
    engine_type: Option<String>,
    country: Option<String>,
    drive_wheels: Option<String>,
    year_from: Option<i64>,
    year_to: Option<i64>,
    min_hp: Option<f64>,
    max_hp: Option<f64>,
}

fn needle(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

fn equals_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase() == needle)
}

impl Predicates {
    fn new(f: &SearchFilters) -> Self {
        Predicates {
            query: needle(&f.query),
            make: needle(&f.make),
            model: needle(&f.model),
            body_type: needle(&f.body_type),
            engine_type: needle(&f.engine_type),
            country: needle(&f.country),
            drive_wheels: needle(&f.drive_wheels),
            year_from: f.year_from,
            year_to: f.year_to,
            min_hp: f.min_horsepower,
            max_hp: f.max_horsepower,
        }
    }

    fn matches(&self, car: &VehicleRecord) -> bool {
        if let Some(q) = &self.query {
            let hit = contains_ci(Some(&car.make), q)
                || contains_ci(Some(&car.model), q)
                || contains_ci(car.series.as_deref(), q)
                || contains_ci(car.body_type.as_deref(), q);
            if !hit {
                return false;
            }
        }
        if let Some(make) = &self.make {
            if !equals_ci(Some(&car.make), make) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !contains_ci(Some(&car.model), model) {
                return false;
            }
        }
        if let Some(min) = self.year_from {
            if !car.year_from.is_some_and(|y| y >= min) {
                return false;
            }
        }
        if let Some(max) = self.year_to {
            if !car.year_to.is_some_and(|y| y <= max) {
                return false;
            }
        }
        if let Some(body) = &self.body_type {
            if !equals_ci(car.body_type.as_deref(), body) {
                return false;
            }
        }
        if let Some(engine) = &self.engine_type {
            if !contains_ci(car.engine.engine_type.as_deref(), engine) {
                return false;
            }
        }
        if let Some(min) = self.min_hp {
            if !car.engine.horsepower.is_some_and(|hp| hp >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_hp {
            if !car.engine.horsepower.is_some_and(|hp| hp <= max) {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if !equals_ci(car.country_of_origin.as_deref(), country) {
                return false;
            }
        }
        if let Some(drive) = &self.drive_wheels {
            if !contains_ci(car.transmission.drive_wheels.as_deref(), drive) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Matches before slicing.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    pub data: Vec<&'a VehicleRecord>,
    pub pagination: Pagination,
}

/// Filter, sort (stable), then slice one page out of `dataset`.
///
/// A page past the end yields no data but still reports the real totals.
pub fn search<'a>(dataset: &'a VehicleDataset, filters: &SearchFilters) -> SearchResult<'a> {
    let predicates = Predicates::new(filters);
    let mut matched: Vec<&VehicleRecord> = dataset
        .records
        .iter()
        .filter(|car| predicates.matches(car))
        .collect();

    if let Some(field) = filters.sort_by {
        match filters.sort_order {
            SortOrder::Asc => matched.sort_by(|a, b| compare_by(a, b, field)),
            SortOrder::Desc => matched.sort_by(|a, b| compare_by(b, a, field)),
        }
    }

    let page = filters.page.filter(|&p| p > 0).unwrap_or(1);
    let limit = filters.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    let total = matched.len();
    let pages = total.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit).min(total);
    let end = start.saturating_add(limit).min(total);
    let data = matched[start..end].to_vec();

    SearchResult {
        data,
        pagination: Pagination {
            total,
            page,
            limit,
            pages,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(id: &str, make: &str, model: &str, hp: Option<f64>, year: Option<i64>) -> VehicleRecord {
        let mut r = VehicleRecord {
            id: id.into(),
            make: make.into(),
            model: model.into(),
            year_from: year,
            ..Default::default()
        };
        r.engine.horsepower = hp;
        r
    }

    fn dataset() -> VehicleDataset {
        let mut a = car("1", "Toyota", "Supra", Some(320.0), Some(1993));
        a.body_type = Some("Coupe".into());
        a.transmission.drive_wheels = Some("Rear wheel drive".into());
        a.country_of_origin = Some("Japan".into());
        let mut b = car("2", "toyota", "Corolla", Some(110.0), Some(1988));
        b.body_type = Some("Sedan".into());
        b.series = Some("E90".into());
        let c = car("3", "Toyota", "Land Cruiser", None, None);
        let mut d = car("4", "Ford", "Mustang", Some(450.0), Some(2015));
        d.performance.max_speed = Some(250.0);
        d.engine.engine_type = Some("Gasoline".into());
        VehicleDataset::from_records(vec![a, b, c, d])
    }

    fn ids(result: &SearchResult<'_>) -> Vec<String> {
        result.data.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn empty_filters_return_everything() {
        let ds = dataset();
        let result = search(&ds, &SearchFilters::default());
        assert_eq!(ids(&result), ["1", "2", "3", "4"]);
        assert_eq!(
            result.pagination,
            Pagination { total: 4, page: 1, limit: 50, pages: 1 }
        );
    }

    #[test]
    fn filters_combine_with_and() {
        let ds = dataset();
        let filters = SearchFilters {
            make: Some("TOYOTA".into()),
            min_horsepower: Some(200.0),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &filters)), ["1"]);
    }

    #[test]
    fn absent_fields_never_match() {
        let ds = dataset();
        let filters = SearchFilters {
            max_horsepower: Some(10_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &filters)), ["1", "2", "4"]);

        let filters = SearchFilters {
            year_from: Some(0),
            ..Default::default()
        };
        assert_eq!(search(&ds, &filters).pagination.total, 3);

        let filters = SearchFilters {
            country: Some("japan".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &filters)), ["1"]);
    }

    #[test]
    fn free_text_query_spans_four_fields() {
        let ds = dataset();
        let by = |q: &str| {
            let f = SearchFilters {
                query: Some(q.into()),
                ..Default::default()
            };
            ids(&search(&ds, &f))
        };
        assert_eq!(by("cruis"), ["3"]);
        assert_eq!(by("e90"), ["2"]);
        assert_eq!(by("COUPE"), ["1"]);
        assert_eq!(by("ford"), ["4"]);
    }

    #[test]
    fn substring_and_exact_text_filters() {
        let ds = dataset();
        let f = SearchFilters {
            body_type: Some("sed".into()),
            ..Default::default()
        };
        assert!(search(&ds, &f).data.is_empty());

        let f = SearchFilters {
            drive_wheels: Some("rear".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &f)), ["1"]);

        let f = SearchFilters {
            engine_type: Some("gas".into()),
            model: Some("stang".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &f)), ["4"]);
    }

    #[test]
    fn missing_sort_keys_rank_as_zero_and_ties_keep_load_order() {
        let ds = dataset();
        let f = SearchFilters {
            sort_by: Some(SortField::Horsepower),
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &f)), ["3", "2", "1", "4"]);

        let f = SearchFilters {
            sort_by: Some(SortField::Speed),
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(ids(&search(&ds, &f)), ["4", "1", "2", "3"]);
    }

    #[test]
    fn make_sort_is_case_sensitive() {
        let ds = dataset();
        let f = SearchFilters {
            sort_by: Some(SortField::Make),
            ..Default::default()
        };
        // uppercase sorts before lowercase
        assert_eq!(ids(&search(&ds, &f)), ["4", "1", "3", "2"]);
    }

    #[test]
    fn pagination_slices_after_sorting() {
        let ds = dataset();
        let f = SearchFilters {
            sort_by: Some(SortField::Year),
            sort_order: SortOrder::Desc,
            page: Some(2),
            limit: Some(3),
            ..Default::default()
        };
        let result = search(&ds, &f);
        assert_eq!(ids(&result), ["3"]);
        assert_eq!(result.pagination.pages, 2);

        let f = SearchFilters {
            page: Some(9),
            limit: Some(3),
            ..Default::default()
        };
        let result = search(&ds, &f);
        assert!(result.data.is_empty());
        assert_eq!(result.pagination.total, 4);
        assert_eq!(result.pagination.pages, 2);
    }

    #[test]
    fn params_are_parsed_tolerantly() {
        let f = SearchFilters::from_params([
            ("make", "Ford"),
            ("minHorsepower", "lots"),
            ("yearFrom", "1990"),
            ("model", ""),
            ("sortBy", "price"),
            ("sortOrder", "DESC"),
            ("page", "0"),
            ("limit", "20"),
            ("unknown", "x"),
        ]);
        assert_eq!(f.make.as_deref(), Some("Ford"));
        assert_eq!(f.min_horsepower, None);
        assert_eq!(f.year_from, Some(1990));
        assert_eq!(f.model, None);
        assert_eq!(f.sort_by, None);
        assert_eq!(f.sort_order, SortOrder::Desc);
        assert_eq!(f.page, None);
        assert_eq!(f.limit, Some(20));
    }

    #[test]
    fn page_and_limit_take_the_leading_integer() {
        let f = SearchFilters::from_params([("page", "2.5"), ("limit", "3abc")]);
        assert_eq!(f.page, Some(2));
        assert_eq!(f.limit, Some(3));

        let f = SearchFilters::from_params([("page", " +4"), ("limit", "abc")]);
        assert_eq!(f.page, Some(4));
        assert_eq!(f.limit, None);

        let f = SearchFilters::from_params([("page", "-1"), ("limit", "0.9")]);
        assert_eq!(f.page, None);
        assert_eq!(f.limit, None);
    }
}
