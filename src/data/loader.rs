use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use csv::StringRecord;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{LoadReport, SkipReason, SourceFormat, VehicleDataset, VehicleRecord};
use super::normalize::{columns, normalize_row, resolve_model_column, RowSource};
use crate::error::DatasetLoadError;

type Result<T> = std::result::Result<T, DatasetLoadError>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the vehicle dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming the upstream columns (recommended)
/// * `.json`    – `[{ "Make": "...", "Modle": "...", ... }, ...]`
/// * `.parquet` – one column per upstream header, any scalar type
///
/// Rows that cannot be decoded or lack make/model are skipped and counted in
/// the returned [`LoadReport`]; anything wrong at the file level is an error.
pub fn load_file(path: &Path, max_skip_samples: usize) -> Result<(VehicleDataset, LoadReport)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let source = path.display().to_string();
    match ext.as_str() {
        "csv" => load_csv(open(path)?, &source, max_skip_samples),
        "json" => load_json(open(path)?, &source, max_skip_samples),
        "parquet" | "pq" => load_parquet(open(path)?, &source, max_skip_samples),
        other => Err(DatasetLoadError::UnsupportedFormat(other.to_string())),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DatasetLoadError::NotFound(path.to_path_buf()),
        _ => DatasetLoadError::Io(e),
    })
}

/// Accumulates normalized rows and the report while a reader walks the source.
struct Collector {
    records: Vec<VehicleRecord>,
    report: LoadReport,
    max_skip_samples: usize,
}

impl Collector {
    fn new(source: &str, format: SourceFormat, max_skip_samples: usize) -> Self {
        Collector {
            records: Vec::new(),
            report: LoadReport::new(source, format),
            max_skip_samples,
        }
    }

    fn push(&mut self, row_no: usize, outcome: std::result::Result<VehicleRecord, SkipReason>) {
        self.report.rows_read += 1;
        match outcome {
            Ok(rec) => self.records.push(rec),
            Err(reason) => {
                log::debug!("{}: skipping row {row_no}: {reason}", self.report.source);
                self.report.record_skip(row_no, reason, self.max_skip_samples);
            }
        }
    }

    fn finish(mut self) -> (VehicleDataset, LoadReport) {
        self.report.records_loaded = self.records.len();
        (VehicleDataset::from_records(self.records), self.report)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header name → column position.
struct CsvRow<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl RowSource for CsvRow<'_> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.index.get(column).and_then(|&i| self.record.get(i))
    }
}

/// CSV layout: header row with the upstream column names, one row per trim.
/// Short rows are tolerated; missing trailing cells read as absent.
pub fn load_csv<R: Read>(
    reader: R,
    source: &str,
    max_skip_samples: usize,
) -> Result<(VehicleDataset, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(reader));

    let index: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    if !index.contains_key(columns::MAKE) {
        return Err(DatasetLoadError::MissingColumn(columns::MAKE.to_string()));
    }
    let model_column = resolve_model_column(index.keys().map(String::as_str))
        .ok_or_else(|| DatasetLoadError::MissingColumn(columns::MODEL_UPSTREAM.to_string()))?;

    let mut collector = Collector::new(source, SourceFormat::Csv, max_skip_samples);
    let mut record = StringRecord::new();
    let mut row_no = 0usize;

    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let row = CsvRow {
                    index: &index,
                    record: &record,
                };
                collector.push(row_no, normalize_row(&row, model_column));
            }
            // The stream itself broke: nothing after this point is trustworthy.
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => collector.push(row_no, Err(SkipReason::Malformed(e.to_string()))),
        }
        row_no += 1;
    }

    Ok(collector.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "id_trim": "1", "Make": "Ford", "Modle": "Mustang", "engine_hp": 271, ... },
///   ...
/// ]
/// ```
///
/// Non-object elements are skipped as malformed rows.
pub fn load_json<R: Read>(
    reader: R,
    source: &str,
    max_skip_samples: usize,
) -> Result<(VehicleDataset, LoadReport)> {
    let root: JsonValue = serde_json::from_reader(BufReader::new(reader))?;
    let rows = root
        .as_array()
        .ok_or_else(|| DatasetLoadError::NotTabular("expected top-level JSON array".into()))?;

    let mut collector = Collector::new(source, SourceFormat::Json, max_skip_samples);

    for (row_no, value) in rows.iter().enumerate() {
        let Some(obj) = value.as_object() else {
            collector.push(row_no, Err(SkipReason::Malformed("not a JSON object".into())));
            continue;
        };

        let cells: BTreeMap<String, String> = obj
            .iter()
            .filter_map(|(k, v)| json_cell(v).map(|text| (k.clone(), text)))
            .collect();
        let model_column = resolve_model_column(obj.keys().map(String::as_str))
            .unwrap_or(columns::MODEL_UPSTREAM);

        collector.push(row_no, normalize_row(&cells, model_column));
    }

    Ok(collector.finish())
}

fn json_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one column per upstream header.
///
/// Column types are free: every non-null cell is rendered to text and goes
/// through the same coercion as CSV input, so a file written by Pandas with
/// `Int64`/`Float64` columns and one written with all-`Utf8` columns load
/// identically.
pub fn load_parquet(
    file: File,
    source: &str,
    max_skip_samples: usize,
) -> Result<(VehicleDataset, LoadReport)> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if !field_names.iter().any(|n| n == columns::MAKE) {
        return Err(DatasetLoadError::MissingColumn(columns::MAKE.to_string()));
    }
    let model_column = resolve_model_column(field_names.iter().map(String::as_str))
        .ok_or_else(|| DatasetLoadError::MissingColumn(columns::MODEL_UPSTREAM.to_string()))?;

    let reader = builder.build()?;
    let mut collector = Collector::new(source, SourceFormat::Parquet, max_skip_samples);
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            let mut malformed = None;

            for (col_idx, field) in schema.fields().iter().enumerate() {
                match cell_text(batch.column(col_idx), row) {
                    Ok(Some(text)) => {
                        cells.insert(field.name().clone(), text);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        malformed = Some(format!("column '{}': {e}", field.name()));
                        break;
                    }
                }
            }

            let outcome = match malformed {
                Some(msg) => Err(SkipReason::Malformed(msg)),
                None => normalize_row(&cells, model_column),
            };
            collector.push(row_no, outcome);
            row_no += 1;
        }
    }

    Ok(collector.finish())
}

// -- Parquet / Arrow helpers --

/// Render a single Arrow cell as text, `None` for nulls.
fn cell_text(col: &ArrayRef, row: usize) -> std::result::Result<Option<String>, arrow::error::ArrowError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        _ => array_value_to_string(col, row)?,
    };
    Ok(Some(text))
}
