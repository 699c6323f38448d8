use std::collections::HashSet;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors raised by the data layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A required column is absent from the source header row.
    #[error("required column '{column}' is missing")]
    MissingColumn { column: &'static str },

    /// There are no values to aggregate.
    #[error("no data available")]
    NoData,

    /// A mandatory filter has no value to select.
    #[error("no value available for mandatory filter '{field}'")]
    InvalidSelection { field: &'static str },

    /// A numeric column holds text that is not a number. `row` counts the
    /// header as row 1, as a spreadsheet does.
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// The source has no header row at all.
    #[error("source contains no header row")]
    EmptySheet,
}

// ---------------------------------------------------------------------------
// Column – the fixed input schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Rm,
    Ano,
    Semestre,
    Turma,
    MediaAcessoAlura,
    MediaBolsaMerito,
}

impl Column {
    /// All required columns in display order.
    pub const ALL: [Column; 6] = [
        Column::Rm,
        Column::Ano,
        Column::Semestre,
        Column::Turma,
        Column::MediaAcessoAlura,
        Column::MediaBolsaMerito,
    ];

    /// Header text as it appears in the source spreadsheet.
    pub fn header(self) -> &'static str {
        match self {
            Column::Rm => "RM",
            Column::Ano => "Ano",
            Column::Semestre => "Semestre",
            Column::Turma => "Turma",
            Column::MediaAcessoAlura => "MediaAcessoAlura",
            Column::MediaBolsaMerito => "MediaBolsaMerito",
        }
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as produced by a loader
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet readers hand back.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Canonical text form used for every identifier/category comparison.
    ///
    /// Integral floats drop their fraction (`2023.0` → `"2023"`) so a year
    /// typed as a number in one file and as text in another compares equal.
    /// Text is kept verbatim, leading zeros included.
    pub fn to_canonical_string(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                format!("{}", *v as i64)
            }
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// Numeric reading of the cell. Blank cells are `Ok(None)`.
    ///
    /// Text accepts both `7.2` and `7,2`.
    pub fn to_number(&self) -> Result<Option<f64>, String> {
        match self {
            CellValue::Integer(i) => Ok(Some(*i as f64)),
            CellValue::Float(v) if v.is_nan() => Ok(None),
            CellValue::Float(v) => Ok(Some(*v)),
            CellValue::Null => Ok(None),
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .replace(',', ".")
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| s.clone())
            }
            CellValue::Bool(b) => Err(b.to_string()),
        }
    }
}

/// Stand-in for cells past the end of a short row.
static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// RawTable – loader output before validation
// ---------------------------------------------------------------------------

/// Header row plus untyped data rows, exactly as read from a file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    fn column_index(&self, column: Column) -> Result<usize, DataError> {
        self.headers
            .iter()
            .position(|h| h.trim() == column.header())
            .ok_or(DataError::MissingColumn {
                column: column.header(),
            })
    }
}

// ---------------------------------------------------------------------------
// Record – one scholarship entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// `RM`, kept as text so `"001"` never collapses to `1`.
    pub student_id: String,
    /// `Ano`.
    pub year: String,
    /// `Semestre`.
    pub semester: String,
    /// `Turma`.
    pub class_group: String,
    /// `MediaAcessoAlura`, a percentage. `None` for a blank cell.
    pub alura_access_average: Option<f64>,
    /// `MediaBolsaMerito`. `None` for a blank cell.
    pub merit_scholarship_average: Option<f64>,
}

impl Record {
    /// Display text for a column of this record.
    pub fn cell_text(&self, column: Column) -> String {
        fn number(v: Option<f64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }
        match column {
            Column::Rm => self.student_id.clone(),
            Column::Ano => self.year.clone(),
            Column::Semestre => self.semester.clone(),
            Column::Turma => self.class_group.clone(),
            Column::MediaAcessoAlura => number(self.alura_access_average),
            Column::MediaBolsaMerito => number(self.merit_scholarship_average),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterOptions – values offered by the selection widgets
// ---------------------------------------------------------------------------

/// Distinct values per filterable column, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub semesters: Vec<String>,
    pub class_groups: Vec<String>,
}

fn push_distinct(seen: &mut HashSet<String>, out: &mut Vec<String>, value: &str) {
    if !value.is_empty() && seen.insert(value.to_string()) {
        out.push(value.to_string());
    }
}

impl FilterOptions {
    fn from_records(records: &[Record]) -> Self {
        let mut options = FilterOptions::default();
        let (mut years, mut semesters, mut groups) =
            (HashSet::new(), HashSet::new(), HashSet::new());
        for r in records {
            push_distinct(&mut years, &mut options.years, &r.year);
            push_distinct(&mut semesters, &mut options.semesters, &r.semester);
            push_distinct(&mut groups, &mut options.class_groups, &r.class_group);
        }
        options
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full ingested dataset with pre-computed filter options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All records in source order.
    pub records: Vec<Record>,
    /// Distinct `Ano` / `Semestre` / `Turma` values.
    pub options: FilterOptions,
}

impl Dataset {
    /// Build the option index from already-normalised records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let options = FilterOptions::from_records(&records);
        Dataset { records, options }
    }

    /// Validate the fixed schema and normalise every row.
    ///
    /// This is the only place raw cells are interpreted: identifiers and
    /// categories become canonical strings, averages become numbers.
    pub fn from_table(table: RawTable) -> Result<Self, DataError> {
        if table.headers.is_empty() {
            return Err(DataError::EmptySheet);
        }

        let rm = table.column_index(Column::Rm)?;
        let ano = table.column_index(Column::Ano)?;
        let semestre = table.column_index(Column::Semestre)?;
        let turma = table.column_index(Column::Turma)?;
        let alura = table.column_index(Column::MediaAcessoAlura)?;
        let merito = table.column_index(Column::MediaBolsaMerito)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).unwrap_or(&NULL_CELL);
            let number = |idx: usize, column: Column| {
                cell(idx).to_number().map_err(|value| DataError::InvalidNumber {
                    row: row_no + 2,
                    column: column.header(),
                    value,
                })
            };

            records.push(Record {
                student_id: cell(rm).to_canonical_string(),
                year: cell(ano).to_canonical_string(),
                semester: cell(semestre).to_canonical_string(),
                class_group: cell(turma).to_canonical_string(),
                alura_access_average: number(alura, Column::MediaAcessoAlura)?,
                merit_scholarship_average: number(merito, Column::MediaBolsaMerito)?,
            });
        }

        Ok(Dataset::from_records(records))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
