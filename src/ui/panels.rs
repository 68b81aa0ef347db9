use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, ColumnPanel, PanelAction};

// ---------------------------------------------------------------------------
// Left side panel – column filter buttons and panels
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        let active = state.table.as_ref().map_or(0, |t| t.active_count());
        if ui
            .add_enabled(active > 0, egui::Button::new("Clear all").small())
            .clicked()
        {
            state.clear_all_filters();
        }
    });
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };

    let columns: Vec<String> = table.columns().as_slice().to_vec();
    // Collected while drawing, dispatched once the borrows are released.
    let mut toggles: Vec<String> = Vec::new();
    let mut actions: Vec<(String, PanelAction)> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &columns {
                let button_text = match table.column_filter(col) {
                    Some(values) => RichText::new(format!("▼ {} sel", values.len()))
                        .color(Color32::LIGHT_BLUE)
                        .strong(),
                    None => RichText::new("▼ All"),
                };

                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new(col).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(button_text).clicked() {
                            toggles.push(col.clone());
                        }
                    });
                });

                if state.open_panel.as_deref() == Some(col.as_str()) {
                    if let Some(panel) = state.panels.get(col) {
                        for action in column_panel(ui, col, panel) {
                            actions.push((col.clone(), action));
                        }
                    }
                }
            }
        });

    for col in toggles {
        state.toggle_panel(&col);
    }
    for (col, action) in actions {
        state.panel_action(&col, action);
    }
}

/// Draw one open column panel and return the commands the user issued.
fn column_panel(ui: &mut Ui, col: &str, panel: &ColumnPanel) -> Vec<PanelAction> {
    let mut actions = Vec::new();
    let mut search = panel.search.clone();

    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.add(egui::TextEdit::singleline(&mut search).hint_text("Search values…"));

        ui.horizontal(|ui: &mut Ui| {
            if ui.small_button("Select All").clicked() {
                actions.push(PanelAction::SelectAllVisible);
            }
            if ui.small_button("Deselect All").clicked() {
                actions.push(PanelAction::DeselectAllVisible);
            }
        });

        ScrollArea::vertical()
            .id_salt(("cf-list", col))
            .max_height(240.0)
            .show(ui, |ui: &mut Ui| {
                for i in panel.visible() {
                    let mut checked = panel.checked[i];
                    let label = ColumnPanel::label(&panel.choices[i]);
                    if ui.checkbox(&mut checked, label).changed() {
                        actions.push(PanelAction::Toggle(i));
                    }
                }
            });

        ui.horizontal(|ui: &mut Ui| {
            let (checked, total) = panel.counts();
            ui.label(format!("{checked} / {total}"));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Apply").clicked() {
                    actions.push(PanelAction::Apply);
                }
                if ui.button("Clear").clicked() {
                    actions.push(PanelAction::ClearColumn);
                }
            });
        });
    });

    if search != panel.search {
        actions.push(PanelAction::Search(search));
    }
    actions
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} rows loaded, {} visible",
                table.raw_data().len(),
                table.visible_rows().len()
            ));

            ui.separator();

            let mut text = state.quick_filter.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut text)
                    .hint_text("Quick filter…")
                    .desired_width(180.0),
            );
            if response.changed() {
                state.set_quick_filter(&text);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open table")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        open_path(state, &path);
    }
}

pub fn open_path(state: &mut AppState, path: &std::path::Path) {
    match facet_grid::data::loader::load_file(path) {
        Ok(raw) => state.set_dataset(raw),
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
