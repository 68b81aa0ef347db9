use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FacetGridApp {
    pub state: AppState,
}

impl FacetGridApp {
    pub fn new(config: ViewerConfig) -> Self {
        let startup_file = config.data_file.clone();
        let mut state = AppState::new(config);
        if let Some(path) = startup_file {
            panels::open_path(&mut state, &path);
        }
        Self { state }
    }
}

impl eframe::App for FacetGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + quick filter ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: pager ----
        egui::TopBottomPanel::bottom("pager").show(ctx, |ui| {
            table::pager_bar(ui, &self.state);
        });

        // ---- Left side panel: column filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: grid ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::data_grid(ui, &self.state);
        });
    }
}
