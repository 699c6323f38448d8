use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, logo: Option<&PathBuf>) {
    // ---- Logo (centered) ----
    if let Some(path) = logo {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add(
                egui::Image::new(format!("file://{}", path.display()))
                    .max_width(120.0)
                    .max_height(120.0)
                    .rounding(4.0),
            );
        });
        ui.add_space(4.0);
    }

    ui.heading("Filtros");
    ui.separator();

    let options = match &state.dataset {
        Some(ds) => ds.options.clone(),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Ano (single select) ----
            ui.strong("Ano");
            let current = state.draft.year.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("ano")
                .selected_text(current.as_str())
                .show_ui(ui, |ui: &mut Ui| {
                    for year in &options.years {
                        if ui.selectable_label(current == *year, year.as_str()).clicked() {
                            state.select_year(year.clone());
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- Semestre (single select) ----
            ui.strong("Semestre");
            let current = state.draft.semester.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("semestre")
                .selected_text(current.as_str())
                .show_ui(ui, |ui: &mut Ui| {
                    for semester in &options.semesters {
                        if ui.selectable_label(current == *semester, semester.as_str()).clicked() {
                            state.select_semester(semester.clone());
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- Turma (multi select) ----
            let n_selected = state.draft.class_groups.len();
            let header_text = format!("Turma  ({n_selected}/{})", options.class_groups.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("turma")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_class_groups();
                    }
                    for group in &options.class_groups {
                        let mut checked = state.draft.class_groups.contains(group);
                        if ui.checkbox(&mut checked, group.as_str()).changed() {
                            state.toggle_class_group(group);
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- RM (exact match) ----
            ui.strong("Digite o RM:");
            let mut query = state.draft.student_id_query.clone();
            if ui.text_edit_singleline(&mut query).changed() {
                state.set_student_id_query(query);
            }
        });
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

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} shown",
                ds.len(),
                state.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open scholarship data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
