use eframe::egui::{self, Color32, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ACCENT;
use crate::data::filter::Granularity;
use crate::data::model::CatchDataset;
use crate::format::thousands;
use crate::state::AppState;
use crate::ui::charts;

const PREVIEW_ROWS: usize = 200;
const SUCCESS_GREEN: Color32 = Color32::from_rgb(0x21, 0xba, 0x45);

// ---------------------------------------------------------------------------
// Dashboard view (central panel)
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Memuat data…");
        });
        return;
    };

    ui.heading("Dashboard");
    completeness_notice(ui, state);
    ui.add_space(8.0);
    metric_row(ui, state);
    ui.add_space(8.0);

    let summary = &state.summary;
    let yearly: Vec<(f64, f64)> = summary
        .yearly
        .iter()
        .map(|&(year, weight)| (f64::from(year), weight))
        .collect();
    charts::line_chart(ui, "yearly_weight", "TOTAL BERAT TANGKAPAN", &yearly, ACCENT);
    ui.add_space(8.0);

    ui.columns(2, |cols| {
        charts::category_bars(
            &mut cols[0],
            "top_species",
            "JENIS TANGKAPAN TERBANYAK",
            &summary.top_species,
            |_, _| ACCENT,
        );
        let gears: Vec<&str> = summary
            .gear_share
            .iter()
            .map(|(gear, _)| gear.as_str())
            .collect();
        let labeled = with_share_labels(&summary.gear_share);
        charts::category_bars(
            &mut cols[1],
            "gear_share",
            "ALAT TANGKAP DOMINAN",
            &labeled,
            |i, _| state.gear_colors.color_for(gears[i]),
        );
    });
    ui.add_space(8.0);

    egui::CollapsingHeader::new("Tangkapan per Periode")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let title = format!("Total per periode ({})", state.filter.granularity.label());
            charts::category_bars(ui, "bucket_weight", &title, &summary.buckets, |_, _| ACCENT);
        });

    egui::CollapsingHeader::new("VIEW DATASET")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            preview_table(ui, dataset, &state.visible_indices, state.filter.granularity);
        });
}

fn completeness_notice(ui: &mut Ui, state: &AppState) {
    let Some(year) = state.summary.newest_year else {
        return;
    };
    // Only warn while the filter window still covers the newest landing year.
    let covers_newest = !state.filter.start_year.is_some_and(|lo| lo > year)
        && !state.filter.end_year.is_some_and(|hi| hi < year);
    if !covers_newest {
        return;
    }
    if state.visible_indices.is_empty() {
        ui.colored_label(
            Color32::YELLOW,
            "Data tidak tersedia. Silahkan periksa kembali filter Anda.",
        );
    } else if state.summary.newest_year_weight == 0.0 {
        ui.colored_label(
            Color32::YELLOW,
            format!("⚠ Data tahun {year} belum lengkap. Mohon diperhatikan!"),
        );
    } else {
        ui.colored_label(SUCCESS_GREEN, format!("✔ Data tahun {year} sudah lengkap."));
    }
}

fn metric_row(ui: &mut Ui, state: &AppState) {
    let stats = &state.summary.stats;
    ui.columns(4, |cols| {
        metric_box(
            &mut cols[0],
            "🐟 Total Tangkapan",
            format!("{} Kg", thousands(stats.total_weight_kg, 0)),
        );
        metric_box(
            &mut cols[1],
            "💵 Nilai Produksi",
            format!("{} IDR", thousands(stats.total_value, 0)),
        );
        metric_box(&mut cols[2], "📅 Total Hari", thousands(stats.total_trip_days, 0));
        metric_box(&mut cols[3], "🎣 Jenis Ikan", stats.distinct_species.to_string());
    });
}

fn metric_box(ui: &mut Ui, title: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(title);
            ui.strong(value);
        });
    });
}

/// Appends the weight share of each gear to its label: `Payang (62.4%)`.
fn with_share_labels(entries: &[(String, f64)]) -> Vec<(String, f64)> {
    let total: f64 = entries.iter().map(|(_, weight)| weight).sum();
    entries
        .iter()
        .map(|(label, weight)| {
            let share = if total > 0.0 {
                weight / total * 100.0
            } else {
                0.0
            };
            (format!("{label} ({share:.1}%)"), *weight)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dataset preview table (display labels + derived Periode column)
// ---------------------------------------------------------------------------

const PREVIEW_HEADERS: [&str; 11] = [
    "Tahun",
    "Nama Ikan",
    "Alat Tangkap",
    "Pelabuhan Kedatangan",
    "Pelabuhan Keberangkatan",
    "Tanggal Berangkat",
    "Tanggal Kedatangan",
    "Berat (Kg)",
    "Nilai Produksi",
    "Jumlah Hari",
    "Periode",
];

/// Renders the first [`PREVIEW_ROWS`] filtered records. Column labels are
/// the analyst-facing display names; the source records stay untouched.
pub fn preview_table(ui: &mut Ui, ds: &CatchDataset, idx: &[usize], granularity: Granularity) {
    let shown = idx.len().min(PREVIEW_ROWS);
    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().resizable(true), PREVIEW_HEADERS.len())
        .header(20.0, |mut header| {
            for title in PREVIEW_HEADERS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for &i in &idx[..shown] {
                let rec = &ds.records[i];
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(rec.year.map_or_else(|| "-".to_string(), |y| y.to_string()));
                    });
                    row.col(|ui| {
                        ui.label(text_or_dash(&rec.species));
                    });
                    row.col(|ui| {
                        ui.label(text_or_dash(&rec.gear));
                    });
                    row.col(|ui| {
                        ui.label(text_or_dash(&rec.arrival_port));
                    });
                    row.col(|ui| {
                        ui.label(text_or_dash(&rec.departure_port));
                    });
                    row.col(|ui| {
                        ui.label(date_cell(rec.departure_date));
                    });
                    row.col(|ui| {
                        ui.label(date_cell(rec.arrival_date));
                    });
                    row.col(|ui| {
                        ui.label(thousands(rec.weight_kg, 1));
                    });
                    row.col(|ui| {
                        ui.label(opt_cell(rec.production_value, 0));
                    });
                    row.col(|ui| {
                        ui.label(opt_cell(rec.trip_days, 0));
                    });
                    row.col(|ui| {
                        ui.label(
                            rec.arrival_date
                                .map_or_else(|| "-".to_string(), |d| granularity.bucket_key(d)),
                        );
                    });
                });
            }
        });
    if idx.len() > shown {
        ui.label(format!("Menampilkan {shown} dari {} baris.", idx.len()));
    }
}

fn text_or_dash(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

fn date_cell(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn opt_cell(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| thousands(v, decimals))
}

#[cfg(test)]
mod tests {
    use super::with_share_labels;

    #[test]
    fn share_labels_carry_percentages() {
        let entries = vec![("Payang".to_string(), 75.0), ("Bagan".to_string(), 25.0)];
        let labeled = with_share_labels(&entries);
        assert_eq!(labeled[0].0, "Payang (75.0%)");
        assert_eq!(labeled[1].0, "Bagan (25.0%)");
        assert_eq!(labeled[0].1, 75.0);
    }

    #[test]
    fn zero_total_means_zero_shares() {
        let entries = vec![("Payang".to_string(), 0.0)];
        assert_eq!(with_share_labels(&entries)[0].0, "Payang (0.0%)");
    }
}
