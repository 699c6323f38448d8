use std::collections::BTreeSet;

use super::model::{DataError, Dataset, FilterOptions, Record};

// ---------------------------------------------------------------------------
// FilterSelection – a complete, ready-to-apply selection
// ---------------------------------------------------------------------------

/// Predicate parameters chosen by the user.
///
/// `year` and `semester` are mandatory and always hold a value. The
/// class-group set and the student id query only restrict when non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub year: String,
    pub semester: String,
    pub class_groups: BTreeSet<String>,
    pub student_id_query: String,
}

impl FilterSelection {
    pub fn new(year: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            semester: semester.into(),
            class_groups: BTreeSet::new(),
            student_id_query: String::new(),
        }
    }

    pub fn with_class_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_student_id(mut self, query: impl Into<String>) -> Self {
        self.student_id_query = query.into();
        self
    }

    /// Whether a record satisfies every active predicate.
    pub fn matches(&self, record: &Record) -> bool {
        if record.year != self.year || record.semester != self.semester {
            return false;
        }
        if !self.class_groups.is_empty() && !self.class_groups.contains(&record.class_group) {
            return false;
        }
        // Exact comparison: "001" must not match "0010".
        if !self.student_id_query.is_empty() && record.student_id != self.student_id_query {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// SelectionDraft – widget state before mandatory values are settled
// ---------------------------------------------------------------------------

/// What the sidebar widgets currently hold. The mandatory filters may still
/// be unset (first frame) or point at a value the loaded dataset lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDraft {
    pub year: Option<String>,
    pub semester: Option<String>,
    pub class_groups: BTreeSet<String>,
    pub student_id_query: String,
}

/// Keep `chosen` when it is still offered, otherwise fall back to the first
/// available value.
fn settle(
    chosen: Option<&String>,
    available: &[String],
    field: &'static str,
) -> Result<String, DataError> {
    match chosen {
        Some(v) if available.contains(v) => Ok(v.clone()),
        _ => available
            .first()
            .cloned()
            .ok_or(DataError::InvalidSelection { field }),
    }
}

impl SelectionDraft {
    /// Turn the draft into a concrete [`FilterSelection`].
    ///
    /// Fails with [`DataError::InvalidSelection`] only when a mandatory
    /// column has no values at all, i.e. the dataset is empty.
    pub fn resolve(&self, options: &FilterOptions) -> Result<FilterSelection, DataError> {
        let year = settle(self.year.as_ref(), &options.years, "Ano")?;
        let semester = settle(self.semester.as_ref(), &options.semesters, "Semestre")?;
        Ok(FilterSelection::new(year, semester)
            .with_class_groups(self.class_groups.iter().cloned())
            .with_student_id(self.student_id_query.clone()))
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return indices of records that pass all active filters, in source order.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect()
}

/// Produce the filtered subset as a dataset of its own, order preserved.
pub fn apply(dataset: &Dataset, selection: &FilterSelection) -> Dataset {
    let records = filtered_indices(dataset, selection)
        .into_iter()
        .map(|i| dataset.records[i].clone())
        .collect();
    Dataset::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(rm: &str, ano: &str, sem: &str, turma: &str, alura: f64, merito: f64) -> Record {
        Record {
            student_id: rm.into(),
            year: ano.into(),
            semester: sem.into(),
            class_group: turma.into(),
            alura_access_average: Some(alura),
            merit_scholarship_average: Some(merito),
        }
    }

    /// Five records, three of them in 2023/1, one of those in class A.
    fn scenario() -> Dataset {
        Dataset::from_records(vec![
            rec("001", "2023", "1", "A", 85.0, 7.2),
            rec("002", "2023", "1", "B", 60.0, 8.0),
            rec("0010", "2023", "1", "C", 90.0, 6.5),
            rec("003", "2023", "2", "A", 70.0, 9.1),
            rec("004", "2024", "1", "D", 95.0, 7.7),
        ])
    }

    fn ids(ds: &Dataset) -> Vec<&str> {
        ds.records.iter().map(|r| r.student_id.as_str()).collect()
    }

    #[test]
    fn mandatory_filters_keep_order() {
        let out = apply(&scenario(), &FilterSelection::new("2023", "1"));
        assert_eq!(ids(&out), vec!["001", "002", "0010"]);
    }

    #[test]
    fn class_group_narrows_to_one() {
        let sel = FilterSelection::new("2023", "1").with_class_groups(["A"]);
        let out = apply(&scenario(), &sel);
        assert_eq!(ids(&out), vec!["001"]);
    }

    #[test]
    fn class_groups_are_or_within_and_across() {
        let sel = FilterSelection::new("2023", "1").with_class_groups(["A", "C", "D"]);
        assert_eq!(filtered_indices(&scenario(), &sel), vec![0, 2]);
    }

    #[test]
    fn unknown_class_group_contributes_nothing() {
        let sel = FilterSelection::new("2023", "1").with_class_groups(["Z"]);
        assert!(apply(&scenario(), &sel).is_empty());

        let sel = FilterSelection::new("2023", "1").with_class_groups(["Z", "B"]);
        assert_eq!(ids(&apply(&scenario(), &sel)), vec!["002"]);
    }

    #[test]
    fn empty_class_groups_equals_no_class_filter() {
        let ds = scenario();
        let omitted = FilterSelection::new("2023", "1");
        let empty = FilterSelection::new("2023", "1").with_class_groups(Vec::<String>::new());
        assert_eq!(apply(&ds, &omitted), apply(&ds, &empty));
    }

    #[test]
    fn student_id_is_exact_not_prefix() {
        let sel = FilterSelection::new("2023", "1").with_student_id("001");
        assert_eq!(ids(&apply(&scenario(), &sel)), vec!["001"]);

        let sel = FilterSelection::new("2023", "1").with_student_id("00");
        assert!(apply(&scenario(), &sel).is_empty());
    }

    #[test]
    fn student_id_is_not_trimmed() {
        let sel = FilterSelection::new("2023", "1").with_student_id(" 001");
        assert!(apply(&scenario(), &sel).is_empty());
    }

    #[test]
    fn no_year_match_is_empty_not_error() {
        let out = apply(&scenario(), &FilterSelection::new("1999", "1"));
        assert!(out.is_empty());
    }

    #[test]
    fn numeric_looking_year_needs_string_equality() {
        // "2023.0" is not the canonical form of the year and never matches.
        let out = apply(&scenario(), &FilterSelection::new("2023.0", "1"));
        assert!(out.is_empty());
    }

    #[test]
    fn result_is_subset_satisfying_predicates() {
        let ds = scenario();
        let selections = [
            FilterSelection::new("2023", "1"),
            FilterSelection::new("2023", "2").with_class_groups(["A"]),
            FilterSelection::new("2024", "1").with_student_id("004"),
            FilterSelection::new("2023", "1").with_class_groups(["B", "C"]),
        ];
        for sel in &selections {
            let out = apply(&ds, sel);
            for r in &out.records {
                assert!(ds.records.contains(r));
                assert!(sel.matches(r));
            }
            let expected = ds.records.iter().filter(|r| sel.matches(r)).count();
            assert_eq!(out.len(), expected);
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let ds = scenario();
        let sel = FilterSelection::new("2023", "1").with_class_groups(["A", "B"]);
        let once = apply(&ds, &sel);
        let twice = apply(&once, &sel);
        assert_eq!(once, twice);
    }

    #[test]
    fn draft_defaults_to_first_available_values() {
        let ds = scenario();
        let sel = SelectionDraft::default().resolve(&ds.options).unwrap();
        assert_eq!(sel, FilterSelection::new("2023", "1"));
    }

    #[test]
    fn draft_keeps_valid_choice_and_replaces_stale_one() {
        let ds = scenario();
        let draft = SelectionDraft {
            year: Some("2024".into()),
            semester: Some("9".into()),
            class_groups: ["D".to_string()].into_iter().collect(),
            student_id_query: "004".into(),
        };
        let sel = draft.resolve(&ds.options).unwrap();
        assert_eq!(
            sel,
            FilterSelection::new("2024", "1")
                .with_class_groups(["D"])
                .with_student_id("004")
        );
    }

    #[test]
    fn draft_on_empty_dataset_is_invalid_selection() {
        let err = SelectionDraft::default()
            .resolve(&Dataset::default().options)
            .unwrap_err();
        assert_eq!(err, DataError::InvalidSelection { field: "Ano" });
    }
}
