use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::advisor::{AdvisorClient, Role};
use crate::data::filter::Granularity;
use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Top bar – title, view menu, record counts, status
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong("SISTOK");
        ui.label("Fish Stock Analysis Tools");
        ui.separator();

        for view in View::ALL {
            if ui.selectable_label(state.view == view, view.label()).clicked() {
                state.view = view;
            }
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} baris, {} tersaring",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets + chat assistant
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, state: &mut AppState, advisor: &AdvisorClient) {
    ui.heading("Filter Data");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("Data belum dimuat.");
        return;
    };

    // Clone what we need so we can mutate state inside the widgets.
    let ports = dataset.ports.clone();
    let species = dataset.species.clone();
    let year_range = dataset.year_range;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            port_filter(ui, state, &ports);
            ui.add_space(6.0);
            species_filter(ui, state, &species);
            ui.add_space(6.0);
            year_filter(ui, state, year_range);
            ui.add_space(6.0);
            granularity_filter(ui, state);

            ui.separator();
            chat_box(ui, state, advisor);
        });
}

fn port_filter(ui: &mut Ui, state: &mut AppState, ports: &[String]) {
    ui.strong("Pilih Pelabuhan");
    let selected_text = state
        .filter
        .port
        .clone()
        .unwrap_or_else(|| "Semua".to_string());
    egui::ComboBox::from_id_salt("port_filter")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(state.filter.port.is_none(), "Semua")
                .clicked()
            {
                state.filter.port = None;
                state.refilter();
            }
            for port in ports {
                if ui
                    .selectable_label(state.filter.port.as_deref() == Some(port.as_str()), port)
                    .clicked()
                {
                    state.filter.port = Some(port.clone());
                    state.refilter();
                }
            }
        });
}

fn species_filter(ui: &mut Ui, state: &mut AppState, species: &[String]) {
    let header = format!(
        "Pilih Jenis Ikan  ({}/{})",
        state.filter.species.len(),
        species.len()
    );
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("species_filter")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_species();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_species();
                }
            });
            for name in species {
                let mut checked = state.filter.species.contains(name);
                if ui.checkbox(&mut checked, name).changed() {
                    state.toggle_species(name);
                }
            }
        });
}

fn year_filter(ui: &mut Ui, state: &mut AppState, year_range: Option<(i32, i32)>) {
    let Some((min, max)) = year_range else {
        return;
    };
    let mut start = state.filter.start_year.unwrap_or(min);
    let mut end = state.filter.end_year.unwrap_or(max);
    let mut changed = false;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Start Year");
        changed |= ui
            .add(egui::DragValue::new(&mut start).range(min..=max))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("End Year");
        changed |= ui
            .add(egui::DragValue::new(&mut end).range(start..=max))
            .changed();
    });

    if changed {
        state.filter.start_year = Some(start);
        state.filter.end_year = Some(end.max(start));
        state.refilter();
    }
}

fn granularity_filter(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Time Frame");
    let current = state.filter.granularity;
    egui::ComboBox::from_id_salt("time_frame")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for granularity in Granularity::ALL {
                if ui
                    .selectable_label(current == granularity, granularity.label())
                    .clicked()
                    && current != granularity
                {
                    state.filter.granularity = granularity;
                    state.refilter();
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Chat assistant
// ---------------------------------------------------------------------------

fn chat_box(ui: &mut Ui, state: &mut AppState, advisor: &AdvisorClient) {
    ui.heading("Chat with Sistok Assistant");
    ui.add_space(4.0);

    ScrollArea::vertical()
        .id_salt("chat_history")
        .max_height(220.0)
        .auto_shrink([false, true])
        .stick_to_bottom(true)
        .show(ui, |ui: &mut Ui| {
            if state.chat.is_empty() {
                ui.weak("Riwayat chat kosong.");
            }
            for turn in state.chat.turns() {
                let who = match turn.role {
                    Role::User => "Anda",
                    Role::Assistant => "Assistant",
                };
                ui.label(RichText::new(who).strong());
                ui.label(&turn.content);
                ui.separator();
            }
        });

    ui.add_space(4.0);
    let input = ui.add(
        egui::TextEdit::singleline(&mut state.chat_input)
            .hint_text("Ask about the Data:")
            .desired_width(f32::INFINITY),
    );
    let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Kirim").clicked() || submitted {
            send_question(state, advisor);
        }
        if ui.button("Hapus Riwayat Chat").clicked() {
            state.clear_chat();
        }
    });
}

/// Blocking round-trip to the advisory service. Errors land in the
/// conversation as the assistant's turn so the session keeps going.
fn send_question(state: &mut AppState, advisor: &AdvisorClient) {
    let question = state.chat_input.trim().to_string();
    if question.is_empty() {
        return;
    }
    let answer = match advisor.ask(&question, &state.summary.digest, &state.chat) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Advisory call failed: {e}");
            format!("Error: {e}")
        }
    };
    state.chat.push_user(question);
    state.chat.push_assistant(answer);
    state.chat_input.clear();
}
