use std::collections::{BTreeMap, BTreeSet};

use super::filter::Granularity;
use super::model::{CatchDataset, CatchRecord};

// ---------------------------------------------------------------------------
// Group-by sums over the filtered record set
// ---------------------------------------------------------------------------
//
// Every operation reads the immutable dataset through an index list produced
// by the filter layer and returns a fresh derived table. Records lacking the
// group key (no derived year, blank category) fall out of that grouping
// instead of forming a phantom group, so an empty filter result degrades to
// empty output everywhere.

fn select<'a>(ds: &'a CatchDataset, idx: &'a [usize]) -> impl Iterator<Item = &'a CatchRecord> {
    idx.iter().map(|&i| &ds.records[i])
}

/// Σ weight per landing year, ascending year.
pub fn yearly_totals(ds: &CatchDataset, idx: &[usize]) -> Vec<(i32, f64)> {
    let mut sums: BTreeMap<i32, f64> = BTreeMap::new();
    for rec in select(ds, idx) {
        let Some(year) = rec.year else { continue };
        *sums.entry(year).or_insert(0.0) += rec.weight_kg;
    }
    sums.into_iter().collect()
}

/// Σ weight for a single landing year.
pub fn weight_for_year(ds: &CatchDataset, idx: &[usize], year: i32) -> f64 {
    select(ds, idx)
        .filter(|rec| rec.year == Some(year))
        .map(|rec| rec.weight_kg)
        .sum()
}

/// Σ weight per time bucket of the given granularity, ascending bucket key.
pub fn weight_by_bucket(ds: &CatchDataset, idx: &[usize], granularity: Granularity) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for rec in select(ds, idx) {
        let Some(date) = rec.arrival_date else { continue };
        *sums.entry(granularity.bucket_key(date)).or_insert(0.0) += rec.weight_kg;
    }
    sums.into_iter().collect()
}

fn top_weight_by<F>(ds: &CatchDataset, idx: &[usize], key: F, limit: usize) -> Vec<(String, f64)>
where
    F: Fn(&CatchRecord) -> &str,
{
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for rec in select(ds, idx) {
        let k = key(rec);
        if k.is_empty() {
            continue;
        }
        *sums.entry(k.to_string()).or_insert(0.0) += rec.weight_kg;
    }
    let mut out: Vec<(String, f64)> = sums.into_iter().collect();
    // Descending sum with the category id as tie-break keeps the ranking
    // reproducible when two groups weigh the same.
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out.truncate(limit);
    out
}

/// Top `limit` species by summed weight, heaviest first.
pub fn top_species(ds: &CatchDataset, idx: &[usize], limit: usize) -> Vec<(String, f64)> {
    top_weight_by(ds, idx, |rec| rec.species.as_str(), limit)
}

/// Top `limit` gear types by summed weight, heaviest first.
pub fn top_gears(ds: &CatchDataset, idx: &[usize], limit: usize) -> Vec<(String, f64)> {
    top_weight_by(ds, idx, |rec| rec.gear.as_str(), limit)
}

// ---------------------------------------------------------------------------
// Headline stats (dashboard metric boxes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlineStats {
    pub total_weight_kg: f64,
    pub total_value: f64,
    pub total_trip_days: f64,
    pub distinct_species: usize,
}

pub fn headline_stats(ds: &CatchDataset, idx: &[usize]) -> HeadlineStats {
    let mut stats = HeadlineStats::default();
    let mut species: BTreeSet<&str> = BTreeSet::new();
    for rec in select(ds, idx) {
        stats.total_weight_kg += rec.weight_kg;
        stats.total_value += rec.production_value.unwrap_or(0.0);
        stats.total_trip_days += rec.trip_days.unwrap_or(0.0);
        if !rec.species.is_empty() {
            species.insert(rec.species.as_str());
        }
    }
    stats.distinct_species = species.len();
    stats
}

// ---------------------------------------------------------------------------
// Pivot: gear × year with Total column and Jumlah row
// ---------------------------------------------------------------------------

/// Which measure the pivot sums per (gear, year) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotMeasure {
    WeightKg,
    TripDays,
}

/// Gear × year matrix with appended totals.
///
/// `cells[r][c]` is the summed measure for `categories[r]` in `years[c]`;
/// absent combinations hold 0.0. `row_totals` is the Total column,
/// `year_totals` the Jumlah row, and both sum to the same `grand_total`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotSummary {
    pub categories: Vec<String>,
    pub years: Vec<i32>,
    pub cells: Vec<Vec<f64>>,
    pub row_totals: Vec<f64>,
    pub year_totals: Vec<f64>,
    pub grand_total: f64,
}

impl PivotSummary {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

pub fn gear_year_pivot(ds: &CatchDataset, idx: &[usize], measure: PivotMeasure) -> PivotSummary {
    let mut sums: BTreeMap<(String, i32), f64> = BTreeMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();

    for rec in select(ds, idx) {
        let Some(year) = rec.year else { continue };
        if rec.gear.is_empty() {
            continue;
        }
        let value = match measure {
            PivotMeasure::WeightKg => rec.weight_kg,
            PivotMeasure::TripDays => rec.trip_days.unwrap_or(0.0),
        };
        *sums.entry((rec.gear.clone(), year)).or_insert(0.0) += value;
        categories.insert(rec.gear.clone());
        years.insert(year);
    }

    let categories: Vec<String> = categories.into_iter().collect();
    let years: Vec<i32> = years.into_iter().collect();

    let mut cells = Vec::with_capacity(categories.len());
    let mut row_totals = Vec::with_capacity(categories.len());
    let mut year_totals = vec![0.0; years.len()];
    let mut grand_total = 0.0;

    for cat in &categories {
        let mut row = Vec::with_capacity(years.len());
        let mut row_total = 0.0;
        for (c, year) in years.iter().enumerate() {
            let v = sums.get(&(cat.clone(), *year)).copied().unwrap_or(0.0);
            row.push(v);
            row_total += v;
            year_totals[c] += v;
            grand_total += v;
        }
        cells.push(row);
        row_totals.push(row_total);
    }

    PivotSummary {
        categories,
        years,
        cells,
        row_totals,
        year_totals,
        grand_total,
    }
}

// ---------------------------------------------------------------------------
// CPUE / FPI per gear
// ---------------------------------------------------------------------------

/// How many gears, ranked by total catch, enter the CPUE/FPI comparison.
/// Fixed survey policy, not a tunable.
pub const FLEET_REFERENCE_GEARS: usize = 2;

/// Catch-per-unit-effort summary for one gear type.
#[derive(Debug, Clone, PartialEq)]
pub struct CpueRow {
    pub gear: String,
    pub catch_tons: f64,
    pub effort_days: f64,
    /// catch_tons / effort_days; `None` when the gear logged no effort.
    pub cpue: Option<f64>,
    /// CPUE normalized by the best CPUE of the retained gears; the best
    /// row is pinned to exactly 1.0.
    pub fpi: Option<f64>,
}

/// CPUE and fishing power index over the top gears by catch.
///
/// Catch is converted to metric tons before the ratio. Only the
/// [`FLEET_REFERENCE_GEARS`] heaviest gears are retained; ranking ties
/// break on the gear id so the retained set is reproducible.
pub fn cpue_by_gear(ds: &CatchDataset, idx: &[usize]) -> Vec<CpueRow> {
    let mut sums: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for rec in select(ds, idx) {
        if rec.gear.is_empty() {
            continue;
        }
        let entry = sums.entry(rec.gear.clone()).or_insert((0.0, 0.0));
        entry.0 += rec.weight_kg;
        entry.1 += rec.trip_days.unwrap_or(0.0);
    }

    let mut rows: Vec<CpueRow> = sums
        .into_iter()
        .map(|(gear, (weight_kg, effort_days))| {
            let catch_tons = weight_kg / 1000.0;
            let cpue = (effort_days > 0.0).then(|| catch_tons / effort_days);
            CpueRow {
                gear,
                catch_tons,
                effort_days,
                cpue,
                fpi: None,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.catch_tons
            .total_cmp(&a.catch_tons)
            .then_with(|| a.gear.cmp(&b.gear))
    });
    rows.truncate(FLEET_REFERENCE_GEARS);

    let max_cpue = rows
        .iter()
        .filter_map(|r| r.cpue)
        .fold(f64::NEG_INFINITY, f64::max);
    for row in &mut rows {
        // Rows at the maximum pin to exactly 1.0, which also covers an
        // all-zero CPUE pair (zero landed weight over positive effort).
        // Non-max rows only exist when max_cpue > 0, so the division is
        // always against a positive maximum.
        row.fpi = row
            .cpue
            .map(|c| if c == max_cpue { 1.0 } else { c / max_cpue });
    }

    rows
}

// ---------------------------------------------------------------------------
// Per-year production / value summary
// ---------------------------------------------------------------------------

/// One year of the production table. The two value fields are `None` for
/// every year when the source had no production-value column; the year rows
/// themselves are never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct YearValueRow {
    pub year: i32,
    pub production_tons: f64,
    /// Average unit price, IDR per kg: Σ value / Σ weight.
    pub avg_unit_price: Option<f64>,
    /// Reconstructed value: production_tons × avg_unit_price.
    pub production_value: Option<f64>,
}

pub fn yearly_value_summary(ds: &CatchDataset, idx: &[usize]) -> Vec<YearValueRow> {
    let has_value = ds.capabilities.has_production_value;
    let mut per_year: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for rec in select(ds, idx) {
        let Some(year) = rec.year else { continue };
        let entry = per_year.entry(year).or_insert((0.0, 0.0));
        entry.0 += rec.weight_kg;
        entry.1 += rec.production_value.unwrap_or(0.0);
    }

    per_year
        .into_iter()
        .map(|(year, (weight_kg, value))| {
            let production_tons = weight_kg / 1000.0;
            let avg_unit_price = if has_value && weight_kg > 0.0 {
                Some(value / weight_kg)
            } else {
                None
            };
            YearValueRow {
                year,
                production_tons,
                avg_unit_price,
                production_value: avg_unit_price.map(|price| production_tons * price),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Analysis report for an uploaded dataset
// ---------------------------------------------------------------------------

/// All derived analyses for an upload, built once at load. Each section is
/// present only when the capability flags of the upload allow it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub per_year: Option<Vec<YearValueRow>>,
    pub top_gears: Option<Vec<(String, f64)>>,
    pub catch_pivot: Option<PivotSummary>,
    pub effort_pivot: Option<PivotSummary>,
    pub cpue: Option<Vec<CpueRow>>,
}

impl AnalysisReport {
    pub fn build(ds: &CatchDataset) -> Self {
        let caps = ds.capabilities;
        let idx: Vec<usize> = (0..ds.len()).collect();
        AnalysisReport {
            per_year: caps.has_year.then(|| yearly_value_summary(ds, &idx)),
            top_gears: caps.has_gear.then(|| top_gears(ds, &idx, 10)),
            catch_pivot: (caps.has_gear && caps.has_year)
                .then(|| gear_year_pivot(ds, &idx, PivotMeasure::WeightKg)),
            effort_pivot: (caps.has_gear && caps.has_year && caps.has_trip_days)
                .then(|| gear_year_pivot(ds, &idx, PivotMeasure::TripDays)),
            cpue: (caps.has_gear && caps.has_trip_days).then(|| cpue_by_gear(ds, &idx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnCapabilities;
    use chrono::NaiveDate;

    fn record(species: &str, gear: &str, year: i32, kg: f64, days: f64, value: f64) -> CatchRecord {
        let mut rec = CatchRecord {
            arrival_port: "Karangantu".to_string(),
            species: species.to_string(),
            gear: gear.to_string(),
            arrival_date: NaiveDate::from_ymd_opt(year, 6, 15),
            weight_kg: kg,
            production_value: Some(value),
            trip_days: Some(days),
            ..CatchRecord::default()
        };
        rec.derive_year(None);
        rec
    }

    fn dataset(records: Vec<CatchRecord>) -> CatchDataset {
        CatchDataset::from_records(
            records,
            ColumnCapabilities {
                has_production_value: true,
                has_gear: true,
                has_trip_days: true,
                has_year: true,
            },
        )
    }

    fn all(ds: &CatchDataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn yearly_totals_and_top_species_worked_example() {
        let ds = dataset(vec![
            record("A", "Payang", 2023, 100.0, 1.0, 0.0),
            record("B", "Payang", 2023, 50.0, 1.0, 0.0),
            record("A", "Payang", 2024, 30.0, 1.0, 0.0),
        ]);
        let idx = all(&ds);

        assert_eq!(yearly_totals(&ds, &idx), vec![(2023, 150.0), (2024, 30.0)]);
        assert_eq!(
            top_species(&ds, &idx, 10),
            vec![("A".to_string(), 130.0), ("B".to_string(), 50.0)]
        );
    }

    #[test]
    fn top_ranking_breaks_ties_on_category_id() {
        let ds = dataset(vec![
            record("Tongkol", "Payang", 2023, 40.0, 1.0, 0.0),
            record("Kembung", "Payang", 2023, 40.0, 1.0, 0.0),
            record("Layur", "Payang", 2023, 40.0, 1.0, 0.0),
        ]);
        let names: Vec<String> = top_species(&ds, &all(&ds), 10)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Kembung", "Layur", "Tongkol"]);
    }

    #[test]
    fn pivot_totals_agree_row_wise_and_column_wise() {
        let ds = dataset(vec![
            record("A", "Payang", 2020, 10.0, 1.0, 0.0),
            record("A", "Payang", 2021, 20.0, 1.0, 0.0),
            record("A", "Bagan", 2021, 5.0, 1.0, 0.0),
            record("A", "Bagan", 2022, 15.0, 1.0, 0.0),
        ]);
        let pivot = gear_year_pivot(&ds, &all(&ds), PivotMeasure::WeightKg);

        assert_eq!(pivot.categories, vec!["Bagan", "Payang"]);
        assert_eq!(pivot.years, vec![2020, 2021, 2022]);
        // Missing (gear, year) combinations are zero-filled, not null.
        assert_eq!(pivot.cells[0], vec![0.0, 5.0, 15.0]);
        assert_eq!(pivot.cells[1], vec![10.0, 20.0, 0.0]);

        for (r, row) in pivot.cells.iter().enumerate() {
            assert_eq!(row.iter().sum::<f64>(), pivot.row_totals[r]);
        }
        for c in 0..pivot.years.len() {
            let col_sum: f64 = pivot.cells.iter().map(|row| row[c]).sum();
            assert_eq!(col_sum, pivot.year_totals[c]);
        }
        assert_eq!(pivot.row_totals.iter().sum::<f64>(), pivot.grand_total);
        assert_eq!(pivot.year_totals.iter().sum::<f64>(), pivot.grand_total);
    }

    #[test]
    fn cpue_worked_example_pins_fpi_of_best_gear_to_one() {
        // X: 10 t over 5 days (CPUE 2.0); Y: 8 t over 2 days (CPUE 4.0).
        let ds = dataset(vec![
            record("A", "X", 2023, 10_000.0, 5.0, 0.0),
            record("A", "Y", 2023, 8_000.0, 2.0, 0.0),
        ]);
        let rows = cpue_by_gear(&ds, &all(&ds));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].gear, "X"); // heaviest catch first
        assert_eq!(rows[0].cpue, Some(2.0));
        assert_eq!(rows[0].fpi, Some(0.5));
        assert_eq!(rows[1].gear, "Y");
        assert_eq!(rows[1].cpue, Some(4.0));
        assert_eq!(rows[1].fpi, Some(1.0)); // exactly, by definition
    }

    #[test]
    fn cpue_retains_only_the_two_heaviest_gears() {
        assert_eq!(FLEET_REFERENCE_GEARS, 2);
        let ds = dataset(vec![
            record("A", "X", 2023, 9_000.0, 3.0, 0.0),
            record("A", "Y", 2023, 8_000.0, 2.0, 0.0),
            // Best CPUE of all, but third by catch – must not be retained.
            record("A", "Z", 2023, 1_000.0, 0.1, 0.0),
        ]);
        let rows = cpue_by_gear(&ds, &all(&ds));
        let gears: Vec<&str> = rows.iter().map(|r| r.gear.as_str()).collect();
        assert_eq!(gears, vec!["X", "Y"]);
    }

    #[test]
    fn zero_effort_yields_sentinels_not_panics() {
        let ds = dataset(vec![
            record("A", "X", 2023, 5_000.0, 0.0, 0.0),
            record("A", "Y", 2023, 4_000.0, 2.0, 0.0),
        ]);
        let rows = cpue_by_gear(&ds, &all(&ds));
        assert_eq!(rows[0].gear, "X");
        assert_eq!(rows[0].cpue, None);
        assert_eq!(rows[0].fpi, None);
        assert_eq!(rows[1].fpi, Some(1.0));
    }

    #[test]
    fn zero_weight_with_effort_still_pins_fpi() {
        // Nothing landed, but the trips happened: CPUE is a valid 0.0 for
        // both gears, so both sit at the maximum and take FPI = 1 exactly.
        let ds = dataset(vec![
            record("A", "X", 2023, 0.0, 5.0, 0.0),
            record("A", "Y", 2023, 0.0, 2.0, 0.0),
        ]);
        let rows = cpue_by_gear(&ds, &all(&ds));
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.cpue, Some(0.0));
            assert_eq!(row.fpi, Some(1.0));
        }
    }

    #[test]
    fn value_summary_reconstructs_from_average_unit_price() {
        let ds = dataset(vec![
            record("A", "X", 2020, 2_000.0, 1.0, 30_000_000.0),
            record("A", "X", 2020, 2_000.0, 1.0, 10_000_000.0),
        ]);
        let rows = yearly_value_summary(&ds, &all(&ds));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].production_tons, 4.0);
        // 40 M IDR over 4 000 kg → 10 000 IDR/kg → 4 t × 10 000.
        assert_eq!(rows[0].avg_unit_price, Some(10_000.0));
        assert_eq!(rows[0].production_value, Some(40_000.0));
    }

    #[test]
    fn value_summary_without_value_column_keeps_explicit_nulls() {
        let mut ds = dataset(vec![record("A", "X", 2020, 2_000.0, 1.0, 0.0)]);
        ds.capabilities.has_production_value = false;
        let rows = yearly_value_summary(&ds, &all(&ds));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].production_tons, 2.0);
        assert_eq!(rows[0].avg_unit_price, None);
        assert_eq!(rows[0].production_value, None);
    }

    #[test]
    fn empty_selection_degrades_to_empty_outputs() {
        let ds = dataset(vec![record("A", "X", 2023, 10.0, 1.0, 5.0)]);
        let idx: Vec<usize> = Vec::new();

        assert!(yearly_totals(&ds, &idx).is_empty());
        assert!(top_species(&ds, &idx, 10).is_empty());
        assert!(gear_year_pivot(&ds, &idx, PivotMeasure::WeightKg).is_empty());
        assert!(cpue_by_gear(&ds, &idx).is_empty());
        assert!(yearly_value_summary(&ds, &idx).is_empty());
        assert_eq!(headline_stats(&ds, &idx), HeadlineStats::default());
    }

    #[test]
    fn bucket_totals_sort_ascending() {
        let mut early = record("A", "X", 2023, 10.0, 1.0, 0.0);
        early.arrival_date = NaiveDate::from_ymd_opt(2023, 1, 10);
        let mut late = record("A", "X", 2023, 20.0, 1.0, 0.0);
        late.arrival_date = NaiveDate::from_ymd_opt(2023, 11, 3);
        let mut same_month = record("A", "X", 2023, 5.0, 1.0, 0.0);
        same_month.arrival_date = NaiveDate::from_ymd_opt(2023, 11, 28);

        let ds = dataset(vec![late, early, same_month]);
        let buckets = weight_by_bucket(&ds, &all(&ds), Granularity::Monthly);
        assert_eq!(
            buckets,
            vec![("2023-01".to_string(), 10.0), ("2023-11".to_string(), 25.0)]
        );
    }

    #[test]
    fn headline_stats_count_distinct_species() {
        let ds = dataset(vec![
            record("Kembung", "X", 2023, 10.0, 2.0, 100.0),
            record("Kembung", "X", 2023, 15.0, 1.0, 200.0),
            record("Layur", "Y", 2023, 5.0, 3.0, 50.0),
        ]);
        let stats = headline_stats(&ds, &all(&ds));
        assert_eq!(stats.total_weight_kg, 30.0);
        assert_eq!(stats.total_value, 350.0);
        assert_eq!(stats.total_trip_days, 6.0);
        assert_eq!(stats.distinct_species, 2);
    }

    #[test]
    fn report_sections_follow_upload_capabilities() {
        let mut ds = dataset(vec![record("A", "X", 2023, 10.0, 1.0, 5.0)]);
        ds.capabilities.has_trip_days = false;
        let report = AnalysisReport::build(&ds);
        assert!(report.per_year.is_some());
        assert!(report.top_gears.is_some());
        assert!(report.catch_pivot.is_some());
        assert!(report.effort_pivot.is_none());
        assert!(report.cpue.is_none());

        ds.capabilities.has_gear = false;
        let narrower = AnalysisReport::build(&ds);
        assert!(narrower.per_year.is_some());
        assert!(narrower.top_gears.is_none());
        assert!(narrower.catch_pivot.is_none());
    }
}
