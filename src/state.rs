use std::path::Path;

use crate::data::filter::{apply, SelectionDraft};
use crate::data::loader::load_file;
use crate::data::metrics::{compute_with, MetricsConfig, MetricsSnapshot};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. One per window; nothing is
/// shared between sessions.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Never mutated after load.
    pub dataset: Option<Dataset>,

    /// What the sidebar widgets hold.
    pub draft: SelectionDraft,

    /// Records passing the current filters (cached).
    pub filtered: Dataset,

    /// Headline figures for the current dataset and filter.
    pub metrics: Option<MetricsSnapshot>,

    pub metrics_config: MetricsConfig,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(metrics_config: MetricsConfig) -> Self {
        Self {
            metrics_config,
            ..Self::default()
        }
    }

    /// Ingest a newly loaded dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.draft = SelectionDraft::default();
        self.status_message = None;
        self.refilter();
    }

    /// Load a file, reporting failures in `status_message`.
    pub fn open(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!("Loaded {} records from {}", dataset.len(), path.display());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Recompute the filtered view and the metrics after any change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };

        self.filtered = match self.draft.resolve(&ds.options) {
            Ok(selection) => {
                // Pin the defaults so the widgets show what is applied.
                self.draft.year = Some(selection.year.clone());
                self.draft.semester = Some(selection.semester.clone());
                apply(ds, &selection)
            }
            Err(e) => {
                log::warn!("{e}");
                Dataset::default()
            }
        };
        self.metrics = Some(compute_with(&self.metrics_config, ds, &self.filtered));
        log::debug!("{} of {} records visible", self.filtered.len(), ds.len());
    }

    /// Choose the single `Ano` value.
    pub fn select_year(&mut self, year: String) {
        self.draft.year = Some(year);
        self.refilter();
    }

    /// Choose the single `Semestre` value.
    pub fn select_semester(&mut self, semester: String) {
        self.draft.semester = Some(semester);
        self.refilter();
    }

    /// Toggle a single `Turma` in the multi-select.
    pub fn toggle_class_group(&mut self, group: &str) {
        if !self.draft.class_groups.remove(group) {
            self.draft.class_groups.insert(group.to_string());
        }
        self.refilter();
    }

    /// Clear the `Turma` multi-select (no restriction).
    pub fn clear_class_groups(&mut self) {
        self.draft.class_groups.clear();
        self.refilter();
    }

    /// Replace the `RM` query.
    pub fn set_student_id_query(&mut self, query: String) {
        self.draft.student_id_query = query;
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metrics::MeritMean;
    use crate::data::model::Record;
    use pretty_assertions::assert_eq;

    fn rec(rm: &str, ano: &str, sem: &str, turma: &str) -> Record {
        Record {
            student_id: rm.into(),
            year: ano.into(),
            semester: sem.into(),
            class_group: turma.into(),
            alura_access_average: Some(90.0),
            merit_scholarship_average: Some(8.0),
        }
    }

    fn loaded() -> AppState {
        let mut state = AppState::new(MetricsConfig::default());
        state.set_dataset(Dataset::from_records(vec![
            rec("001", "2023", "1", "A"),
            rec("002", "2023", "1", "B"),
            rec("003", "2024", "2", "A"),
        ]));
        state
    }

    #[test]
    fn loading_applies_first_year_and_semester() {
        let state = loaded();
        assert_eq!(state.draft.year.as_deref(), Some("2023"));
        assert_eq!(state.draft.semester.as_deref(), Some("1"));
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn widget_changes_refilter_but_keep_headline_counts() {
        let mut state = loaded();
        let before = state.metrics.clone().unwrap();

        state.toggle_class_group("B");
        assert_eq!(state.filtered.records[0].student_id, "002");
        assert_eq!(state.filtered.len(), 1);

        state.toggle_class_group("B");
        assert_eq!(state.filtered.len(), 2);

        state.select_year("2024".into());
        state.select_semester("2".into());
        state.set_student_id_query("003".into());
        assert_eq!(state.filtered.len(), 1);

        let after = state.metrics.clone().unwrap();
        assert_eq!(before.total_scholarship_count, after.total_scholarship_count);
        assert_eq!(before.alura_high_access_count, after.alura_high_access_count);
        assert_eq!(after.mean_merit_score, MeritMean::Score(8.0));
        assert_eq!(after.filtered_count, 1);
    }

    #[test]
    fn empty_dataset_yields_no_rows_and_no_mean() {
        let mut state = AppState::default();
        state.set_dataset(Dataset::default());
        assert!(state.filtered.is_empty());
        let metrics = state.metrics.unwrap();
        assert_eq!(metrics.mean_merit_score, MeritMean::NoData);
    }

    #[test]
    fn failed_open_keeps_previous_dataset() {
        let mut state = loaded();
        state.open(Path::new("does-not-exist.csv"));
        assert!(state.status_message.is_some());
        assert_eq!(state.dataset.as_ref().map(Dataset::len), Some(3));
    }
}
