use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// CatchRecord – one landed fishing trip (one row of the source table)
// ---------------------------------------------------------------------------

/// A single catch record as landed at an arrival port.
///
/// Dates are best-effort: unparseable source values are coerced to `None`
/// rather than rejecting the row. `year` is derived from the arrival date,
/// never stored directly on the primary path.
#[derive(Debug, Clone, Default)]
pub struct CatchRecord {
    /// Arrival (landing) port id – `pelabuhan_kedatangan_id`.
    pub arrival_port: String,
    /// Departure port id – `pelabuhan_keberangkatan_id`.
    pub departure_port: String,
    /// Species id – `nama_ikan_id`.
    pub species: String,
    /// Gear type – `jenis_api`.
    pub gear: String,
    /// Trip start – `tanggal_berangkat`.
    pub departure_date: Option<NaiveDate>,
    /// Trip end / landing date – `tanggal_kedatangan`.
    pub arrival_date: Option<NaiveDate>,
    /// Calendar year of the landing, derived from `arrival_date`.
    pub year: Option<i32>,
    /// Landed weight in kilograms – `berat`.
    pub weight_kg: f64,
    /// Production value in IDR – `nilai_produksi` (absent in loose uploads).
    pub production_value: Option<f64>,
    /// Trip length in days – `jumlah_hari` (absent in loose uploads).
    pub trip_days: Option<f64>,
}

impl CatchRecord {
    /// Fill `year` from the arrival date. Uploads without dates may carry a
    /// literal year column instead; `fallback` covers that path.
    pub fn derive_year(&mut self, fallback: Option<i32>) {
        self.year = self.arrival_date.map(|d| d.year()).or(fallback);
    }
}

// ---------------------------------------------------------------------------
// ColumnCapabilities – which optional source columns were present
// ---------------------------------------------------------------------------

/// Presence flags for the optional columns of a loose upload, computed once
/// at load time. They gate which derived analyses run; a missing column
/// narrows the computation path instead of failing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnCapabilities {
    /// `nilai_produksi` / `Nilai Produksi` present.
    pub has_production_value: bool,
    /// `jenis_api` present.
    pub has_gear: bool,
    /// `jumlah_hari` / `Jumlah Hari` present.
    pub has_trip_days: bool,
    /// A year could be derived (arrival date or literal `tahun` column).
    pub has_year: bool,
}

// ---------------------------------------------------------------------------
// CatchDataset – the complete loaded record set
// ---------------------------------------------------------------------------

/// The full parsed dataset with indices computed once at load.
///
/// The record vector is immutable after construction; filters and
/// aggregations work on index lists into it.
#[derive(Debug, Clone)]
pub struct CatchDataset {
    /// All trip records (rows).
    pub records: Vec<CatchRecord>,
    /// Capability flags of the source columns.
    pub capabilities: ColumnCapabilities,
    /// Sorted unique arrival ports.
    pub ports: Vec<String>,
    /// Sorted unique species.
    pub species: Vec<String>,
    /// (min, max) derived year, when any record has one.
    pub year_range: Option<(i32, i32)>,
}

impl CatchDataset {
    /// Build the port/species/year indices from the loaded records.
    pub fn from_records(records: Vec<CatchRecord>, capabilities: ColumnCapabilities) -> Self {
        let mut ports: BTreeSet<String> = BTreeSet::new();
        let mut species: BTreeSet<String> = BTreeSet::new();
        let mut year_range: Option<(i32, i32)> = None;

        for rec in &records {
            if !rec.arrival_port.is_empty() {
                ports.insert(rec.arrival_port.clone());
            }
            if !rec.species.is_empty() {
                species.insert(rec.species.clone());
            }
            if let Some(y) = rec.year {
                year_range = Some(match year_range {
                    Some((lo, hi)) => (lo.min(y), hi.max(y)),
                    None => (y, y),
                });
            }
        }

        CatchDataset {
            records,
            capabilities,
            ports: ports.into_iter().collect(),
            species: species.into_iter().collect(),
            year_range,
        }
    }

    /// An empty dataset, used when the snapshot cannot be fetched.
    pub fn empty() -> Self {
        CatchDataset::from_records(Vec::new(), ColumnCapabilities::default())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(port: &str, species: &str, date: Option<NaiveDate>) -> CatchRecord {
        let mut r = CatchRecord {
            arrival_port: port.to_string(),
            species: species.to_string(),
            arrival_date: date,
            weight_kg: 1.0,
            ..CatchRecord::default()
        };
        r.derive_year(None);
        r
    }

    #[test]
    fn indices_are_sorted_and_deduplicated() {
        let d1 = NaiveDate::from_ymd_opt(2022, 3, 1);
        let d2 = NaiveDate::from_ymd_opt(2019, 7, 14);
        let ds = CatchDataset::from_records(
            vec![
                rec("Karangantu", "Kembung", d1),
                rec("Ambon", "Tongkol", d2),
                rec("Karangantu", "Kembung", d1),
            ],
            ColumnCapabilities::default(),
        );

        assert_eq!(ds.ports, vec!["Ambon", "Karangantu"]);
        assert_eq!(ds.species, vec!["Kembung", "Tongkol"]);
        assert_eq!(ds.year_range, Some((2019, 2022)));
    }

    #[test]
    fn year_comes_from_arrival_date_before_fallback() {
        let mut r = rec("P", "S", NaiveDate::from_ymd_opt(2021, 5, 2));
        r.derive_year(Some(1999));
        assert_eq!(r.year, Some(2021));

        let mut no_date = rec("P", "S", None);
        no_date.derive_year(Some(1999));
        assert_eq!(no_date.year, Some(1999));
    }

    #[test]
    fn empty_dataset_has_no_indices() {
        let ds = CatchDataset::empty();
        assert!(ds.is_empty());
        assert!(ds.ports.is_empty());
        assert_eq!(ds.year_range, None);
    }
}
