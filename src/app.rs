use anyhow::Result;
use eframe::egui;

use crate::advisor::AdvisorClient;
use crate::data::model::CatchDataset;
use crate::data::{loader, snapshot};
use crate::state::{AppState, View};
use crate::ui::{analysis, dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SistokApp {
    state: AppState,
    advisor: AdvisorClient,
}

impl SistokApp {
    /// Loads the snapshot once at startup. A fetch or parse failure
    /// degrades to an empty dataset behind a visible warning; only the
    /// advisor credentials (checked before this) are fatal.
    pub fn new(advisor: AdvisorClient) -> Self {
        let mut state = AppState::default();
        match load_snapshot() {
            Ok(dataset) => {
                log::info!("Snapshot loaded: {} catch records", dataset.len());
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Snapshot unavailable: {e:#}");
                state.set_dataset(CatchDataset::empty());
                state.status_message = Some(format!("Data utama tidak tersedia: {e:#}"));
            }
        }
        SistokApp { state, advisor }
    }
}

fn load_snapshot() -> Result<CatchDataset> {
    let config = snapshot::SnapshotConfig::from_env();
    let path = snapshot::ensure_local(&config)?;
    loader::load_file(&path)
}

impl eframe::App for SistokApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title + view menu ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters + chat (dashboard only) ----
        if self.state.view == View::Dashboard {
            egui::SidePanel::left("filter_panel")
                .default_width(260.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state, &self.advisor);
                });
        }

        // ---- Central panel: the selected view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.view {
                    View::Dashboard => dashboard::show(ui, &self.state),
                    View::Analysis => analysis::show(ui, &mut self.state),
                    View::About => about(ui),
                });
        });
    }
}

fn about(ui: &mut egui::Ui) {
    ui.heading("About this App");
    ui.label(
        "Sistok adalah aplikasi untuk analisis data stok ikan: visualisasi data \
         tangkapan per pelabuhan, jenis ikan dan alat tangkap, serta perhitungan \
         CPUE dan FPI dari data yang diunggah.",
    );
}
