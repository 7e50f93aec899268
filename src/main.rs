mod advisor;
mod app;
mod color;
mod data;
mod format;
mod state;
mod ui;

use anyhow::{anyhow, Context, Result};
use app::SistokApp;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    // Missing credentials are the one fatal startup problem; everything
    // else degrades inside the session.
    let advisor = advisor::AdvisorClient::from_env()
        .context("Chat assistant cannot start (set OPENAI_API_KEY)")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SISTOK – Fish Stock Analysis Tools",
        options,
        Box::new(move |_cc| Ok(Box::new(SistokApp::new(advisor)))),
    )
    .map_err(|e| anyhow!("eframe: {e}"))
}
