use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use super::model::CatchDataset;

// ---------------------------------------------------------------------------
// Granularity – derived time bucket for the "Time Frame" selector
// ---------------------------------------------------------------------------

/// Bucket size for the derived `Periode` column of the filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Yearly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily",
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
            Granularity::Yearly => "Yearly",
        }
    }

    /// Bucket key for a landing date. Keys are zero-padded so that
    /// lexicographic order equals calendar order.
    ///
    /// * Daily   → `2023-05-14`
    /// * Weekly  → `2023-W19` (ISO week; the week's year, not the date's)
    /// * Monthly → `2023-05`
    /// * Yearly  → `2023`
    pub fn bucket_key(self, date: NaiveDate) -> String {
        match self {
            Granularity::Daily => date.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let iso = date.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Yearly => date.year().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// CatchFilter – the dashboard filter parameters
// ---------------------------------------------------------------------------

/// Filter parameters for the dashboard view.
///
/// * `port`: exact arrival-port match; `None` keeps all ports.
/// * `species`: membership test; an empty set keeps all species (the
///   usability convention of the selector, not the set-theoretic default).
/// * Year bounds are inclusive; either side may be open.
#[derive(Debug, Clone, Default)]
pub struct CatchFilter {
    pub port: Option<String>,
    pub species: BTreeSet<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub granularity: Granularity,
}

/// Return indices of records passing all active filters.
///
/// Records without a derived year fail any active year bound: an undated
/// trip cannot be shown to lie inside the requested range.
pub fn filtered_indices(dataset: &CatchDataset, filter: &CatchFilter) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if let Some(port) = &filter.port {
                if &rec.arrival_port != port {
                    return false;
                }
            }
            if !filter.species.is_empty() && !filter.species.contains(&rec.species) {
                return false;
            }
            if filter.start_year.is_some() || filter.end_year.is_some() {
                let Some(year) = rec.year else {
                    return false;
                };
                if filter.start_year.is_some_and(|lo| year < lo) {
                    return false;
                }
                if filter.end_year.is_some_and(|hi| year > hi) {
                    return false;
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CatchRecord, ColumnCapabilities};

    fn dataset() -> CatchDataset {
        let rows = [
            ("Karangantu", "Kembung", 2020),
            ("Karangantu", "Tongkol", 2021),
            ("Panimbang", "Kembung", 2021),
            ("Panimbang", "Layur", 2023),
        ];
        let records = rows
            .iter()
            .map(|(port, species, year)| {
                let mut rec = CatchRecord {
                    arrival_port: port.to_string(),
                    species: species.to_string(),
                    arrival_date: NaiveDate::from_ymd_opt(*year, 6, 15),
                    weight_kg: 10.0,
                    ..CatchRecord::default()
                };
                rec.derive_year(None);
                rec
            })
            .collect();
        CatchDataset::from_records(records, ColumnCapabilities::default())
    }

    #[test]
    fn no_constraints_keep_everything() {
        let ds = dataset();
        let idx = filtered_indices(&ds, &CatchFilter::default());
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_species_set_means_no_species_filter() {
        let ds = dataset();
        let filter = CatchFilter {
            port: Some("Karangantu".to_string()),
            ..CatchFilter::default()
        };
        assert_eq!(filtered_indices(&ds, &filter), vec![0, 1]);
    }

    #[test]
    fn each_added_constraint_narrows_the_result() {
        let ds = dataset();
        let mut filter = CatchFilter::default();
        let all = filtered_indices(&ds, &filter).len();

        filter.port = Some("Panimbang".to_string());
        let by_port = filtered_indices(&ds, &filter).len();

        filter.species = BTreeSet::from(["Kembung".to_string()]);
        let by_species = filtered_indices(&ds, &filter).len();

        filter.start_year = Some(2022);
        let by_year = filtered_indices(&ds, &filter).len();

        assert!(by_port <= all);
        assert!(by_species <= by_port);
        assert!(by_year <= by_species);
        assert_eq!(by_year, 0);
    }

    #[test]
    fn year_bounds_are_inclusive_and_optional() {
        let ds = dataset();
        let filter = CatchFilter {
            start_year: Some(2021),
            end_year: Some(2021),
            ..CatchFilter::default()
        };
        assert_eq!(filtered_indices(&ds, &filter), vec![1, 2]);

        let open_end = CatchFilter {
            start_year: Some(2021),
            ..CatchFilter::default()
        };
        assert_eq!(filtered_indices(&ds, &open_end), vec![1, 2, 3]);
    }

    #[test]
    fn undated_records_fail_active_year_bounds() {
        let mut ds = dataset();
        ds.records[0].arrival_date = None;
        ds.records[0].year = None;

        let filter = CatchFilter {
            start_year: Some(2000),
            ..CatchFilter::default()
        };
        assert!(!filtered_indices(&ds, &filter).contains(&0));
        // Without year bounds the undated record is kept.
        assert!(filtered_indices(&ds, &CatchFilter::default()).contains(&0));
    }

    #[test]
    fn filtered_result_is_subset_of_source() {
        let ds = dataset();
        let filter = CatchFilter {
            port: Some("Karangantu".to_string()),
            species: BTreeSet::from(["Kembung".to_string(), "Layur".to_string()]),
            start_year: Some(2019),
            end_year: Some(2022),
            ..CatchFilter::default()
        };
        for idx in filtered_indices(&ds, &filter) {
            assert!(idx < ds.len());
        }
    }

    #[test]
    fn filtering_empty_dataset_yields_empty_result() {
        let ds = CatchDataset::empty();
        let filter = CatchFilter {
            port: Some("Karangantu".to_string()),
            start_year: Some(2000),
            end_year: Some(2030),
            ..CatchFilter::default()
        };
        assert!(filtered_indices(&ds, &filter).is_empty());
    }

    #[test]
    fn bucket_keys_per_granularity() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap();
        assert_eq!(Granularity::Daily.bucket_key(date), "2023-05-14");
        assert_eq!(Granularity::Weekly.bucket_key(date), "2023-W19");
        assert_eq!(Granularity::Monthly.bucket_key(date), "2023-05");
        assert_eq!(Granularity::Yearly.bucket_key(date), "2023");
    }

    #[test]
    fn iso_week_uses_the_week_year_at_january_boundaries() {
        // 2021-01-01 belongs to ISO week 53 of 2020.
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(Granularity::Weekly.bucket_key(date), "2020-W53");
    }
}
