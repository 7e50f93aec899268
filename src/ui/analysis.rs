use std::fs;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{ColorMap, ACCENT};
use crate::data::aggregate::{CpueRow, PivotSummary, YearValueRow};
use crate::data::filter::Granularity;
use crate::data::{loader, sample};
use crate::format::thousands;
use crate::state::AppState;
use crate::ui::{charts, dashboard};

// ---------------------------------------------------------------------------
// Analysis view (central panel): upload-driven derived tables
// ---------------------------------------------------------------------------

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analysis");
    ui.add_space(4.0);

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Download Sample CSV").clicked() {
            download_sample(state);
        }
        if ui.button("Upload file…").clicked() {
            upload_file(state);
        }
        if ui.button("Coba data sample").clicked() {
            load_bundled_sample(state);
        }
    });
    if let Some(msg) = &state.analysis_status {
        ui.label(RichText::new(msg).color(Color32::LIGHT_RED));
    }
    ui.add_space(8.0);

    let (Some(upload), Some(report)) = (&state.upload, &state.report) else {
        ui.label("Silahkan upload file CSV/JSON/Parquet untuk memulai analisis.");
        return;
    };

    if let Some(name) = &state.upload_name {
        ui.label(format!("File: {name} ({} baris)", upload.len()));
    }

    egui::CollapsingHeader::new("Your Dataset")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let all: Vec<usize> = (0..upload.len()).collect();
            dashboard::preview_table(ui, upload, &all, Granularity::Yearly);
        });
    ui.add_space(8.0);

    if let Some(rows) = &report.per_year {
        per_year_section(ui, rows);
        ui.add_space(8.0);
    }

    if let Some(gears) = &report.top_gears {
        charts::category_bars(ui, "upload_gears", "JENIS API DOMINAN", gears, |_, label| {
            state.upload_colors.color_for(label)
        });
        ui.add_space(8.0);
    }

    surplus_model_card(ui);
    ui.add_space(8.0);

    if let Some(pivot) = &report.catch_pivot {
        egui::CollapsingHeader::new("⬇ Hasil Tangkapan per Alat Tangkap")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                pivot_section(ui, "catch_pivot", pivot, &state.upload_colors);
            });
    }

    if let Some(pivot) = &report.effort_pivot {
        egui::CollapsingHeader::new("⬇ Jumlah Trip per Alat Tangkap")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                pivot_section(ui, "effort_pivot", pivot, &state.upload_colors);
            });
    }

    if let Some(rows) = &report.cpue {
        egui::CollapsingHeader::new("⬇ CPUE")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                cpue_section(ui, rows, &state.upload_colors);
            });
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Writes the bundled sample CSV, byte for byte, where the user asks.
fn download_sample(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Simpan sample CSV")
        .set_file_name(sample::SAMPLE_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };
    match fs::write(&path, sample::SAMPLE_CSV) {
        Ok(()) => {
            log::info!("Sample CSV written to {path:?}");
            state.analysis_status = Some(format!("Sample tersimpan di {}", path.display()));
        }
        Err(e) => {
            log::error!("Failed to write sample CSV: {e}");
            state.analysis_status = Some(format!("Error: {e}"));
        }
    }
}

/// Runs the analysis on the bundled sample without touching the disk.
fn load_bundled_sample(state: &mut AppState) {
    match sample::sample_dataset() {
        Ok(dataset) => state.set_upload(sample::SAMPLE_FILE_NAME.to_string(), dataset),
        Err(e) => {
            log::error!("Bundled sample failed to parse: {e:#}");
            state.analysis_status = Some(format!("Error: {e:#}"));
        }
    }
}

fn upload_file(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Choose a file")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
    else {
        return;
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    match loader::load_file(&path) {
        Ok(dataset) => {
            log::info!("Loaded {} records from {name}", dataset.len());
            state.set_upload(name, dataset);
        }
        Err(e) => {
            // A failed upload keeps the previous report on screen.
            log::error!("Failed to load upload: {e:#}");
            state.analysis_status = Some(format!("Error: {e:#}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn per_year_section(ui: &mut Ui, rows: &[YearValueRow]) {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (f64::from(r.year), r.production_tons))
        .collect();
    charts::line_chart(
        ui,
        "per_year_tons",
        "TOTAL BERAT TANGKAPAN PER TAHUN (Ton)",
        &points,
        ACCENT,
    );

    egui::CollapsingHeader::new("DATA PRODUKSI DAN NILAI PRODUKSI PER TAHUN")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .columns(Column::auto().resizable(true), 4)
                .header(20.0, |mut header| {
                    for title in [
                        "tahun",
                        "Produksi (Ton)",
                        "Harga rata-rata nilai produksi",
                        "Nilai Produksi",
                    ] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for r in rows {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.label(r.year.to_string());
                            });
                            row.col(|ui| {
                                ui.label(thousands(r.production_tons, 2));
                            });
                            row.col(|ui| {
                                ui.label(opt_cell(r.avg_unit_price, 2));
                            });
                            row.col(|ui| {
                                ui.label(opt_cell(r.production_value, 2));
                            });
                        });
                    }
                });
        });
}

/// Descriptive card only; the surplus production model itself is not
/// computed anywhere in the app.
fn surplus_model_card(ui: &mut Ui) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.strong(
            RichText::new("ANALISIS LANJUTAN: MODEL PRODUKSI SURPLUS")
                .color(Color32::from_rgb(0x00, 0x77, 0x10)),
        );
        ui.label(
            "Model Produksi Surplus adalah salah satu model yang digunakan dalam \
             analisis stok ikan untuk mengukur kelimpahan stok ikan dan hubungannya \
             dengan upaya penangkapan (effort). Model ini membantu memprediksi tingkat \
             eksploitasi optimal untuk menjaga keberlanjutan sumber daya perikanan.",
        );
    });
}

fn pivot_section(ui: &mut Ui, id: &str, pivot: &PivotSummary, colors: &ColorMap) {
    if pivot.is_empty() {
        ui.label("Tidak ada data untuk tabel ini.");
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().resizable(true), pivot.years.len() + 2)
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Alat Tangkap");
                });
                for year in &pivot.years {
                    header.col(|ui| {
                        ui.strong(year.to_string());
                    });
                }
                header.col(|ui| {
                    ui.strong("Total");
                });
            })
            .body(|mut body| {
                for (r, gear) in pivot.categories.iter().enumerate() {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(gear);
                        });
                        for value in &pivot.cells[r] {
                            row.col(|ui| {
                                ui.label(thousands(*value, 0));
                            });
                        }
                        row.col(|ui| {
                            ui.label(thousands(pivot.row_totals[r], 0));
                        });
                    });
                }
                // Jumlah row: column-wise totals plus the grand total.
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.strong("Jumlah");
                    });
                    for total in &pivot.year_totals {
                        row.col(|ui| {
                            ui.strong(thousands(*total, 0));
                        });
                    }
                    row.col(|ui| {
                        ui.strong(thousands(pivot.grand_total, 0));
                    });
                });
            });
    });

    ui.add_space(6.0);
    let totals: Vec<(String, f64)> = pivot
        .categories
        .iter()
        .cloned()
        .zip(pivot.row_totals.iter().copied())
        .collect();
    let chart_id = format!("{id}_chart");
    charts::category_bars(ui, &chart_id, "Total per Alat Tangkap", &totals, |_, label| {
        colors.color_for(label)
    });
}

fn cpue_section(ui: &mut Ui, rows: &[CpueRow], colors: &ColorMap) {
    if rows.is_empty() {
        ui.label("Tidak ada data CPUE.");
        return;
    }
    ui.push_id("cpue_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().resizable(true), 5)
            .header(20.0, |mut header| {
                for title in ["Alat Tangkap", "catch (ton)", "effort (hari)", "CPUE", "FPI"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for r in rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(&r.gear);
                        });
                        row.col(|ui| {
                            ui.label(thousands(r.catch_tons, 2));
                        });
                        row.col(|ui| {
                            ui.label(thousands(r.effort_days, 0));
                        });
                        row.col(|ui| {
                            ui.label(ratio_cell(r.cpue));
                        });
                        row.col(|ui| {
                            ui.label(ratio_cell(r.fpi));
                        });
                    });
                }
            });
    });

    ui.add_space(6.0);
    let cpue_bars: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|r| r.cpue.map(|c| (r.gear.clone(), c)))
        .collect();
    charts::category_bars(ui, "cpue_chart", "CPUE per Alat Tangkap", &cpue_bars, |_, label| {
        colors.color_for(label)
    });
}

fn opt_cell(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| thousands(v, decimals))
}

fn ratio_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
