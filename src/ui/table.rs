use eframe::egui::{self, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Paged grid (central panel)
// ---------------------------------------------------------------------------

/// Render the current page of visible rows.
pub fn data_grid(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to browse rows  (File → Open…)");
        });
        return;
    };

    let rows = table.visible_rows();
    if rows.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No matching rows.");
        });
        return;
    }

    let columns = table.columns();
    let page = state.pager.borrow().range(rows.len());
    let text_height = egui::TextStyle::Body.resolve(ui.style()).size + 4.0;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(60.0).clip(true), columns.len())
        .min_scrolled_height(0.0)
        .header(text_height + 4.0, |mut header| {
            for key in columns.iter() {
                header.col(|ui: &mut Ui| {
                    ui.strong(key);
                });
            }
        })
        .body(|body| {
            body.rows(text_height, page.len(), |mut table_row| {
                let Some(row) = rows.get(page.start + table_row.index()) else {
                    return;
                };
                for key in columns.iter() {
                    table_row.col(|ui: &mut Ui| {
                        ui.label(row.value(key));
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Pager bar (bottom panel)
// ---------------------------------------------------------------------------

/// Render the page controls and the "showing x–y of n" line.
pub fn pager_bar(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    let loaded = table.raw_data().len();
    let total = state.visible_len();
    let page_sizes = &state.config.page_sizes;
    let mut pager = *state.pager.borrow();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Show");
        let mut page_size = pager.page_size;
        egui::ComboBox::from_id_salt("page_size")
            .selected_text(page_size.to_string())
            .width(60.0)
            .show_ui(ui, |ui: &mut Ui| {
                for size in page_sizes {
                    ui.selectable_value(&mut page_size, *size, size.to_string());
                }
            });
        ui.label("entries");
        if page_size != pager.page_size {
            pager.set_page_size(page_size);
        }

        ui.separator();

        let range = pager.range(total);
        let mut info = if total == 0 {
            "Showing 0 entries".to_string()
        } else {
            format!("Showing {} to {} of {total} entries", range.start + 1, range.end)
        };
        if total != loaded {
            info.push_str(&format!(" (filtered from {loaded} total entries)"));
        }
        ui.label(info);

        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let pages = pager.page_count(total);
            if ui
                .add_enabled(pager.page + 1 < pages, egui::Button::new("Next »"))
                .clicked()
            {
                pager.page += 1;
            }
            ui.label(format!("Page {} of {pages}", pager.page + 1));
            if ui
                .add_enabled(pager.page > 0, egui::Button::new("« Prev"))
                .clicked()
            {
                pager.page -= 1;
            }
        });
    });

    *state.pager.borrow_mut() = pager;
}
