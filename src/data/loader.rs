use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CatchDataset, CatchRecord, ColumnCapabilities};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Accepted header spellings per logical column. Snapshot exports use the
/// raw snake_case names; analyst exports carry the display labels.
mod columns {
    pub const ARRIVAL_PORT: &[&str] = &["pelabuhan_kedatangan_id", "Pelabuhan Kedatangan"];
    pub const DEPARTURE_PORT: &[&str] = &["pelabuhan_keberangkatan_id", "Pelabuhan Keberangkatan"];
    pub const SPECIES: &[&str] = &["nama_ikan_id", "Nama Ikan"];
    pub const GEAR: &[&str] = &["jenis_api", "Alat Tangkap"];
    pub const DEPARTURE_DATE: &[&str] = &["tanggal_berangkat", "Tanggal Berangkat"];
    pub const ARRIVAL_DATE: &[&str] = &["tanggal_kedatangan", "Tanggal Kedatangan"];
    pub const WEIGHT: &[&str] = &["berat", "Berat"];
    pub const VALUE: &[&str] = &["nilai_produksi", "Nilai Produksi"];
    pub const TRIP_DAYS: &[&str] = &["jumlah_hari", "Jumlah Hari"];
    pub const YEAR: &[&str] = &["tahun", "Tahun"];
}

/// Resolved column positions for one source table. Only the weight column
/// is mandatory; everything else degrades per the capability flags.
#[derive(Debug, Clone)]
struct ColumnMap {
    arrival_port: Option<usize>,
    departure_port: Option<usize>,
    species: Option<usize>,
    gear: Option<usize>,
    departure_date: Option<usize>,
    arrival_date: Option<usize>,
    weight: usize,
    value: Option<usize>,
    trip_days: Option<usize>,
    year: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h == a))
        };
        let weight = find(columns::WEIGHT)
            .context("missing required column 'berat'")?;

        Ok(ColumnMap {
            arrival_port: find(columns::ARRIVAL_PORT),
            departure_port: find(columns::DEPARTURE_PORT),
            species: find(columns::SPECIES),
            gear: find(columns::GEAR),
            departure_date: find(columns::DEPARTURE_DATE),
            arrival_date: find(columns::ARRIVAL_DATE),
            weight,
            value: find(columns::VALUE),
            trip_days: find(columns::TRIP_DAYS),
            year: find(columns::YEAR),
        })
    }

    fn capabilities(&self) -> ColumnCapabilities {
        ColumnCapabilities {
            has_production_value: self.value.is_some(),
            has_gear: self.gear.is_some(),
            has_trip_days: self.trip_days.is_some(),
            has_year: self.arrival_date.is_some() || self.year.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a catch dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the snapshot/analyst column names
/// * `.json`    – records-oriented array of objects (same column names)
/// * `.parquet` – flat columns of strings/numbers/dates
pub fn load_file(path: &Path) -> Result<CatchDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Value coercion helpers
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y%m%d"];

/// Best-effort calendar date parse; anything unrecognised becomes `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn parse_f64(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Year cells come back as "2020" or "2020.0" depending on the export.
fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    parse_f64(s).map(|f| f as i32)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<CatchDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    load_csv_from_reader(file)
}

/// Parse CSV from any reader (file, upload buffer, test fixture).
pub fn load_csv_from_reader<R: Read>(rdr: R) -> Result<CatchDataset> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let map = ColumnMap::resolve(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("").trim();

        let mut rec = CatchRecord {
            arrival_port: cell(map.arrival_port).to_string(),
            departure_port: cell(map.departure_port).to_string(),
            species: cell(map.species).to_string(),
            gear: cell(map.gear).to_string(),
            departure_date: parse_date(cell(map.departure_date)),
            arrival_date: parse_date(cell(map.arrival_date)),
            year: None,
            weight_kg: parse_f64(cell(Some(map.weight))).unwrap_or(0.0),
            production_value: parse_f64(cell(map.value)),
            trip_days: parse_f64(cell(map.trip_days)),
        };
        rec.derive_year(parse_year(cell(map.year)));
        records.push(rec);
    }

    Ok(CatchDataset::from_records(records, map.capabilities()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "nama_ikan_id": "Kembung", "berat": 120.5, "tahun": 2021, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<CatchDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    // Capabilities come from the keys of the first row, like a header line.
    let header_keys: Vec<String> = rows
        .first()
        .and_then(|r| r.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    let map = ColumnMap::resolve(&header_keys)?;

    let field = |obj: &serde_json::Map<String, JsonValue>, aliases: &[&str]| {
        aliases.iter().find_map(|a| obj.get(*a).cloned())
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let text_of = |aliases: &[&str]| match field(obj, aliases) {
            Some(JsonValue::String(s)) => s,
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let num_of = |aliases: &[&str]| match field(obj, aliases) {
            Some(JsonValue::Number(n)) => n.as_f64(),
            Some(JsonValue::String(s)) => parse_f64(&s),
            _ => None,
        };

        let mut rec = CatchRecord {
            arrival_port: text_of(columns::ARRIVAL_PORT),
            departure_port: text_of(columns::DEPARTURE_PORT),
            species: text_of(columns::SPECIES),
            gear: text_of(columns::GEAR),
            departure_date: parse_date(&text_of(columns::DEPARTURE_DATE)),
            arrival_date: parse_date(&text_of(columns::ARRIVAL_DATE)),
            year: None,
            weight_kg: num_of(columns::WEIGHT).unwrap_or(0.0),
            production_value: num_of(columns::VALUE),
            trip_days: num_of(columns::TRIP_DAYS),
        };
        rec.derive_year(num_of(columns::YEAR).map(|f| f as i32));
        records.push(rec);
    }

    Ok(CatchDataset::from_records(records, map.capabilities()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet export of the same table: string columns for ports, species
/// and gear; string or date columns for the trip dates; numeric columns for
/// weight, value and trip days.
fn load_parquet(path: &Path) -> Result<CatchDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut capabilities = ColumnCapabilities::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let map = ColumnMap::resolve(&names)?;
        capabilities = map.capabilities();

        let col = |idx: Option<usize>| idx.map(|i| batch.column(i));
        for row in 0..batch.num_rows() {
            let mut rec = CatchRecord {
                arrival_port: col(map.arrival_port).map(|c| string_cell(c, row)).unwrap_or_default(),
                departure_port: col(map.departure_port).map(|c| string_cell(c, row)).unwrap_or_default(),
                species: col(map.species).map(|c| string_cell(c, row)).unwrap_or_default(),
                gear: col(map.gear).map(|c| string_cell(c, row)).unwrap_or_default(),
                departure_date: col(map.departure_date).and_then(|c| date_cell(c, row)),
                arrival_date: col(map.arrival_date).and_then(|c| date_cell(c, row)),
                year: None,
                weight_kg: f64_cell(batch.column(map.weight), row).unwrap_or(0.0),
                production_value: col(map.value).and_then(|c| f64_cell(c, row)),
                trip_days: col(map.trip_days).and_then(|c| f64_cell(c, row)),
            };
            rec.derive_year(col(map.year).and_then(|c| f64_cell(c, row)).map(|f| f as i32));
            records.push(rec);
        }
    }

    Ok(CatchDataset::from_records(records, capabilities))
}

// -- Arrow cell helpers --

fn string_cell(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn f64_cell(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| f64::from(a.value(row))),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| f64::from(a.value(row))),
        _ => None,
    }
}

fn date_cell(col: &Arc<dyn Array>, row: usize) -> Option<NaiveDate> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => parse_date(&string_cell(col, row)),
        DataType::Date32 => col
            .as_any()
            .downcast_ref::<Date32Array>()
            .and_then(|a| epoch_days_to_date(i64::from(a.value(row)))),
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => col
                    .as_any()
                    .downcast_ref::<TimestampSecondArray>()
                    .map(|a| a.value(row)),
                TimeUnit::Millisecond => col
                    .as_any()
                    .downcast_ref::<TimestampMillisecondArray>()
                    .map(|a| a.value(row) / 1_000),
                TimeUnit::Microsecond => col
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .map(|a| a.value(row) / 1_000_000),
                TimeUnit::Nanosecond => col
                    .as_any()
                    .downcast_ref::<TimestampNanosecondArray>()
                    .map(|a| a.value(row) / 1_000_000_000),
            };
            raw.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn epoch_days_to_date(days: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn date_coercion_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap();
        for raw in [
            "2023-05-14",
            "2023-05-14 00:00:00",
            "14/05/2023",
            "2023/05/14",
            "14-05-2023",
            "20230514",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "format {raw:?}");
        }
    }

    #[test]
    fn date_coercion_yields_none_instead_of_failing() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("bukan tanggal"), None);
        assert_eq!(parse_date("2023-13-40"), None);
    }

    #[test]
    fn snapshot_headers_resolve_fully() {
        let csv = "\
pelabuhan_kedatangan_id,pelabuhan_keberangkatan_id,nama_ikan_id,jenis_api,tanggal_berangkat,tanggal_kedatangan,berat,nilai_produksi,jumlah_hari
Karangantu,Karangantu,Kembung,Payang,2021-03-01,2021-03-04,120.5,1450000,3
Karangantu,Panimbang,Tongkol,Bagan,2021-04-02,tanggal rusak,80,960000,2
";
        let ds = load_csv_from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.capabilities,
            ColumnCapabilities {
                has_production_value: true,
                has_gear: true,
                has_trip_days: true,
                has_year: true,
            }
        );
        assert_eq!(ds.records[0].year, Some(2021));
        // Bad date coerces to None, so the row keeps no derived year.
        assert_eq!(ds.records[1].arrival_date, None);
        assert_eq!(ds.records[1].year, None);
    }

    #[test]
    fn display_headers_and_year_column_are_accepted() {
        let csv = "\
nama_ikan_id,jenis_api,tahun,berat,Nilai Produksi,Jumlah Hari
Kembung,Payang,2020,100,1200000,4
Kembung,Bagan,2021.0,50,,2
";
        let ds = load_csv_from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(ds.records[0].year, Some(2020));
        assert_eq!(ds.records[1].year, Some(2021));
        assert_eq!(ds.records[0].production_value, Some(1_200_000.0));
        assert_eq!(ds.records[1].production_value, None);
        assert!(ds.capabilities.has_production_value);
        assert!(ds.capabilities.has_trip_days);
    }

    #[test]
    fn optional_columns_gate_capabilities() {
        let csv = "nama_ikan_id,tahun,berat\nKembung,2020,100\n";
        let ds = load_csv_from_reader(Cursor::new(csv)).unwrap();
        let caps = ds.capabilities;
        assert!(!caps.has_production_value);
        assert!(!caps.has_gear);
        assert!(!caps.has_trip_days);
        assert!(caps.has_year);
    }

    #[test]
    fn weight_column_is_required() {
        let csv = "nama_ikan_id,tahun\nKembung,2020\n";
        let err = load_csv_from_reader(Cursor::new(csv)).unwrap_err();
        assert!(err.to_string().contains("berat"));
    }
}
