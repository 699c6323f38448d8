use std::path::PathBuf;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BolsasApp {
    pub state: AppState,
    title: String,
    logo_path: Option<PathBuf>,
}

impl BolsasApp {
    /// Build the app and open the configured dataset if it exists.
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config.metrics);
        match &config.data_path {
            Some(path) if path.exists() => state.open(path),
            Some(path) => log::info!("{} not found, waiting for File → Open", path.display()),
            None => {}
        }
        Self {
            state,
            title: config.title,
            logo_path: config.logo_path,
        }
    }
}

impl eframe::App for BolsasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, self.logo_path.as_ref());
            });

        // ---- Central panel: metrics + table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::central_panel(ui, &self.state, &self.title);
        });
    }
}
