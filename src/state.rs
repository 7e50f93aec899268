use std::collections::BTreeSet;

use crate::advisor::{ChatSession, DataDigest};
use crate::color::ColorMap;
use crate::data::aggregate::{self, AnalysisReport, HeadlineStats};
use crate::data::filter::{filtered_indices, CatchFilter, Granularity};
use crate::data::model::CatchDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which page the top menu has selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Dashboard,
    Analysis,
    About,
}

impl View {
    pub const ALL: [View; 3] = [View::Dashboard, View::Analysis, View::About];

    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Analysis => "Analysis",
            View::About => "About",
        }
    }
}

/// Everything the dashboard view draws, rebuilt once per filter change
/// instead of once per frame.
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    pub stats: HeadlineStats,
    pub yearly: Vec<(i32, f64)>,
    /// Weight per time bucket of the selected granularity.
    pub buckets: Vec<(String, f64)>,
    pub top_species: Vec<(String, f64)>,
    pub gear_share: Vec<(String, f64)>,
    pub digest: DataDigest,
    /// Newest landing year of the full dataset and its filtered weight,
    /// for the completeness notice.
    pub newest_year: Option<i32>,
    pub newest_year_weight: f64,
}

impl DashboardSummary {
    fn build(ds: &CatchDataset, idx: &[usize], granularity: Granularity) -> Self {
        let newest_year = ds.year_range.map(|(_, max)| max);
        DashboardSummary {
            stats: aggregate::headline_stats(ds, idx),
            yearly: aggregate::yearly_totals(ds, idx),
            buckets: aggregate::weight_by_bucket(ds, idx, granularity),
            top_species: aggregate::top_species(ds, idx, 10),
            gear_share: aggregate::top_gears(ds, idx, 10),
            digest: DataDigest::from_filtered(ds, idx),
            newest_year,
            newest_year_weight: newest_year
                .map(|year| aggregate::weight_for_year(ds, idx, year))
                .unwrap_or(0.0),
        }
    }
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Curated snapshot (None until loading finished).
    pub dataset: Option<CatchDataset>,

    /// Current sidebar filter selections.
    pub filter: CatchFilter,

    /// Indices of records passing the current filter (cached).
    pub visible_indices: Vec<usize>,

    /// Derived dashboard tables for the current filter (cached).
    pub summary: DashboardSummary,

    /// Stable gear colours across all dashboard charts.
    pub gear_colors: ColorMap,

    pub view: View,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    // Chat assistant.
    pub chat: ChatSession,
    pub chat_input: String,

    // Analysis page: user upload and its derived report.
    pub upload: Option<CatchDataset>,
    pub upload_name: Option<String>,
    pub report: Option<AnalysisReport>,
    pub upload_colors: ColorMap,
    pub analysis_status: Option<String>,
}

impl AppState {
    /// Ingest the loaded snapshot and initialise filters to the full range.
    pub fn set_dataset(&mut self, dataset: CatchDataset) {
        self.filter = CatchFilter::default();
        if let Some((min, max)) = dataset.year_range {
            self.filter.start_year = Some(min);
            self.filter.end_year = Some(max);
        }
        self.gear_colors = ColorMap::new(gear_labels(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the dashboard summary.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filter);
            self.summary = DashboardSummary::build(ds, &self.visible_indices, self.filter.granularity);
        }
    }

    pub fn toggle_species(&mut self, name: &str) {
        if !self.filter.species.remove(name) {
            self.filter.species.insert(name.to_string());
        }
        self.refilter();
    }

    pub fn select_all_species(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filter.species = ds.species.iter().cloned().collect();
            self.refilter();
        }
    }

    /// An empty selection filters nothing, so this shows every species.
    pub fn select_no_species(&mut self) {
        self.filter.species.clear();
        self.refilter();
    }

    /// Ingest an uploaded file and build its analysis report.
    pub fn set_upload(&mut self, name: String, dataset: CatchDataset) {
        self.report = Some(AnalysisReport::build(&dataset));
        self.upload_colors = ColorMap::new(gear_labels(&dataset));
        self.upload_name = Some(name);
        self.upload = Some(dataset);
        self.analysis_status = None;
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear();
        self.chat_input.clear();
    }
}

fn gear_labels(ds: &CatchDataset) -> Vec<String> {
    let unique: BTreeSet<&str> = ds
        .records
        .iter()
        .map(|rec| rec.gear.as_str())
        .filter(|gear| !gear.is_empty())
        .collect();
    unique.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CatchRecord, ColumnCapabilities};
    use chrono::NaiveDate;

    fn record(species: &str, gear: &str, year: i32, kg: f64) -> CatchRecord {
        let mut rec = CatchRecord {
            arrival_port: "Karangantu".to_string(),
            species: species.to_string(),
            gear: gear.to_string(),
            arrival_date: NaiveDate::from_ymd_opt(year, 6, 1),
            weight_kg: kg,
            ..CatchRecord::default()
        };
        rec.derive_year(None);
        rec
    }

    fn dataset() -> CatchDataset {
        CatchDataset::from_records(
            vec![
                record("Kembung", "Payang", 2022, 100.0),
                record("Tongkol", "Bagan", 2023, 50.0),
                record("Kembung", "Payang", 2024, 25.0),
            ],
            ColumnCapabilities::default(),
        )
    }

    #[test]
    fn set_dataset_opens_the_full_year_range() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.filter.start_year, Some(2022));
        assert_eq!(state.filter.end_year, Some(2024));
        assert_eq!(state.visible_indices.len(), 3);
        assert_eq!(state.summary.stats.total_weight_kg, 175.0);
        assert_eq!(state.summary.newest_year, Some(2024));
        assert_eq!(state.summary.newest_year_weight, 25.0);
    }

    #[test]
    fn species_toggle_narrows_and_summary_follows() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.toggle_species("Kembung");
        assert_eq!(state.visible_indices.len(), 2);
        assert_eq!(state.summary.stats.total_weight_kg, 125.0);

        // Toggling the same species back off releases the filter entirely.
        state.toggle_species("Kembung");
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn select_none_means_no_species_filter() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.select_all_species();
        assert_eq!(state.visible_indices.len(), 3);
        state.select_no_species();
        assert_eq!(state.visible_indices.len(), 3);
        assert!(state.filter.species.is_empty());
    }

    #[test]
    fn upload_builds_a_report() {
        let mut state = AppState::default();
        let mut ds = dataset();
        ds.capabilities = ColumnCapabilities {
            has_production_value: false,
            has_gear: true,
            has_trip_days: false,
            has_year: true,
        };
        state.set_upload("sample.csv".to_string(), ds);
        let report = state.report.as_ref().unwrap();
        assert!(report.per_year.is_some());
        assert!(report.cpue.is_none());
    }
}
