use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::metrics::MetricsSnapshot;
use crate::data::model::{Column, Dataset};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – metric tiles and the "Contemplados" table
// ---------------------------------------------------------------------------

/// Render the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState, title: &str) {
    ui.heading(RichText::new(title).size(26.0));
    ui.add_space(8.0);

    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view scholarships  (File → Open…)");
        });
        return;
    }

    if let Some(metrics) = &state.metrics {
        metric_tiles(ui, metrics);
    }
    ui.add_space(12.0);

    ui.heading("Contemplados");
    records_table(ui, &state.filtered);
}

fn tile(ui: &mut Ui, label: &str, value: String) -> egui::Response {
    ui.group(|ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).size(28.0).strong());
    })
    .response
}

fn metric_tiles(ui: &mut Ui, metrics: &MetricsSnapshot) {
    ui.columns(4, |cols| {
        tile(
            &mut cols[0],
            "# Alunos c/bolsa mérito",
            metrics.total_scholarship_count.to_string(),
        );
        tile(
            &mut cols[1],
            "# Alunos c/acesso alura",
            metrics.alura_high_access_count.to_string(),
        );
        tile(
            &mut cols[2],
            "# Quantidade de turmas",
            metrics.distinct_class_group_count.to_string(),
        );
        let mean = tile(&mut cols[3], "Nota média", metrics.mean_merit_score.to_string());
        if let Err(e) = metrics.mean_merit_score.score() {
            mean.on_hover_text(e.to_string());
        }
    });
}

fn records_table(ui: &mut Ui, filtered: &Dataset) {
    if filtered.is_empty() {
        ui.label("No records match the current filters.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(TableColumn::auto().at_least(70.0), Column::ALL.len())
        .header(20.0, |mut header| {
            for column in Column::ALL {
                header.col(|ui| {
                    ui.strong(column.header());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, filtered.len(), |mut row| {
                let record = &filtered.records[row.index()];
                for column in Column::ALL {
                    row.col(|ui| {
                        ui.label(record.cell_text(column));
                    });
                }
            });
        });
}
