use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, NullArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Dataset, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a scholarship dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row, every cell read as text
/// * `.json`    – `[{ "RM": "001", "Ano": 2023, ... }, ...]`
/// * `.parquet` – integer, float, boolean and string columns of any width;
///   dictionaries, decimals and dates are read through their text form
///
/// The raw table is validated and normalised by [`Dataset::from_table`], so a
/// missing required column fails the whole load.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let dataset = Dataset::from_table(table)
        .with_context(|| format!("validating {}", path.display()))?;
    log::debug!(
        "{}: {} records, {} years, {} class groups",
        path.display(),
        dataset.len(),
        dataset.options.years.len(),
        dataset.options.class_groups.len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;
    Ok(range_to_table(&range))
}

/// First row is the header; fully empty rows are dropped.
fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };

    let rows = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    RawTable { headers, rows }
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV cells stay text: guessing types here would turn `"001"` into `1`
/// before normalisation gets a chance to see it.
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::String(value.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "RM": "001", "Ano": 2023, "Semestre": 1, "Turma": "1TDSPA",
///     "MediaAcessoAlura": 85.0, "MediaBolsaMerito": 7.2 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers = BTreeSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        headers.extend(obj.keys().cloned());
    }
    let headers: Vec<String> = headers.into_iter().collect();

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns are the scholarship fields.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`, including
/// categoricals) and **Polars** (`df.write_parquet()`, including string
/// views), as well as the `generate_sample` binary.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = headers
            .iter()
            .zip(batch.columns())
            .map(|(name, col)| prepare_column(name, col))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }

    Ok(RawTable { headers, rows })
}

/// Bring a column into a shape [`extract_cell`] reads directly.
///
/// Scalar strings, integers, floats and booleans pass through. Anything
/// arrow can render as text (dictionaries, decimals, dates) is cast to
/// `Utf8`. Other types fail the load when the column is one of the required
/// ones and are blanked otherwise, since extra columns are never read.
fn prepare_column(name: &str, col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Null
        | DataType::Boolean
        | DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => Ok(col.clone()),
        other if can_cast_types(other, &DataType::Utf8) => cast(col, &DataType::Utf8)
            .with_context(|| format!("converting parquet column '{name}' to text")),
        other => {
            if Column::ALL.iter().any(|c| c.header() == name.trim()) {
                bail!("parquet column '{name}' has unsupported type {other:?}");
            }
            log::warn!("ignoring parquet column '{name}' of unsupported type {other:?}");
            Ok(Arc::new(NullArray::new(col.len())))
        }
    }
}

fn unsigned(v: u64) -> CellValue {
    i64::try_from(v)
        .map(CellValue::Integer)
        .unwrap_or(CellValue::Float(v as f64))
}

/// Extract a single cell from a prepared Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => CellValue::String(col.as_string_view().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => unsigned(col.as_primitive::<UInt64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        // `DataType::Null` and blanked columns; see `prepare_column`.
        _ => CellValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DataError;
    use arrow::array::{
        DictionaryArray, Float32Array, Float64Array, Int16Array, Int32Array, StringArray,
        StringViewArray, StructArray, UInt64Array, UInt8Array,
    };
    use arrow::datatypes::Field;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_keeps_leading_zeros() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "results.csv",
            "RM,Ano,Semestre,Turma,MediaAcessoAlura,MediaBolsaMerito,Nome\n\
             001,2023,1,A,85,7.2,Ana\n\
             0010,2023,1,B,,\"6,5\",Bia\n",
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].student_id, "001");
        assert_eq!(ds.records[1].student_id, "0010");
        assert_eq!(ds.records[1].alura_access_average, None);
        assert_eq!(ds.records[1].merit_scholarship_average, Some(6.5));
        assert_eq!(ds.options.class_groups, vec!["A", "B"]);
    }

    #[test]
    fn json_numbers_are_normalised() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "results.json",
            r#"[
                {"RM": 1001, "Ano": 2023, "Semestre": 1, "Turma": "A",
                 "MediaAcessoAlura": 91.5, "MediaBolsaMerito": 8},
                {"RM": "0042", "Ano": "2023", "Semestre": "2", "Turma": "B",
                 "MediaAcessoAlura": null, "MediaBolsaMerito": 6.4}
            ]"#,
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records[0].student_id, "1001");
        assert_eq!(ds.records[0].year, "2023");
        assert_eq!(ds.records[0].semester, "1");
        assert_eq!(ds.records[0].merit_scholarship_average, Some(8.0));
        assert_eq!(ds.records[1].student_id, "0042");
        assert_eq!(ds.records[1].alura_access_average, None);
        assert_eq!(ds.options.years, vec!["2023"]);
    }

    #[test]
    fn missing_column_fails_the_load() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.csv", "RM,Ano,Semestre,Turma,MediaAcessoAlura\n1,2023,1,A,90\n");

        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn {
                column: "MediaBolsaMerito"
            })
        );
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "results.txt", "RM\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn spreadsheet_rows_skip_blanks_and_keep_numeric_years() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 5));
        for (col, header) in Column::ALL.iter().enumerate() {
            range.set_value((0, col as u32), Data::String(header.header().to_string()));
        }
        let first = [
            Data::String("001".into()),
            Data::Float(2023.0),
            Data::Int(1),
            Data::String("A".into()),
            Data::Float(85.0),
            Data::Float(7.2),
        ];
        for (col, cell) in first.into_iter().enumerate() {
            range.set_value((1, col as u32), cell);
        }
        // Row 2 stays empty.
        range.set_value((3, 0), Data::String("0010".into()));
        range.set_value((3, 1), Data::Float(2024.0));

        let table = range_to_table(&range);
        assert_eq!(table.headers[0], "RM");
        assert_eq!(table.rows.len(), 2);

        let ds = Dataset::from_table(table).unwrap();
        assert_eq!(ds.records[0].student_id, "001");
        assert_eq!(ds.records[0].year, "2023");
        assert_eq!(ds.records[0].semester, "1");
        assert_eq!(ds.records[1].year, "2024");
        assert_eq!(ds.records[1].merit_scholarship_average, None);
    }

    #[test]
    fn xlsx_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/results.xlsx");
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].student_id, "001");
        assert_eq!(ds.records[0].year, "2023");
        assert_eq!(ds.records[0].merit_scholarship_average, Some(7.2));
        assert_eq!(ds.records[1].student_id, "0010");
        assert_eq!(ds.records[1].semester, "2");
        assert_eq!(ds.records[1].alura_access_average, Some(60.5));
        assert_eq!(ds.options.semesters, vec!["1", "2"]);
    }

    fn write_parquet(dir: &TempDir, columns: Vec<(&str, ArrayRef)>) -> std::path::PathBuf {
        let path = dir.path().join("results.parquet");
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn parquet_narrow_ints_and_categoricals() {
        let dir = TempDir::new().unwrap();
        let turma: DictionaryArray<Int32Type> = vec!["A", "B"].into_iter().collect();
        let path = write_parquet(
            &dir,
            vec![
                ("RM", Arc::new(StringArray::from(vec!["001", "0010"])) as ArrayRef),
                ("Ano", Arc::new(Int16Array::from(vec![2023, 2023])) as ArrayRef),
                ("Semestre", Arc::new(UInt8Array::from(vec![1, 2])) as ArrayRef),
                ("Turma", Arc::new(turma) as ArrayRef),
                ("MediaAcessoAlura", Arc::new(Float32Array::from(vec![85.0, 60.0])) as ArrayRef),
                ("MediaBolsaMerito", Arc::new(Float64Array::from(vec![Some(7.5), None])) as ArrayRef),
            ],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].student_id, "001");
        assert_eq!(ds.records[0].year, "2023");
        assert_eq!(ds.records[0].semester, "1");
        assert_eq!(ds.records[1].semester, "2");
        assert_eq!(ds.records[0].class_group, "A");
        assert_eq!(ds.records[1].class_group, "B");
        assert_eq!(ds.records[0].alura_access_average, Some(85.0));
        assert_eq!(ds.records[0].merit_scholarship_average, Some(7.5));
        assert_eq!(ds.records[1].merit_scholarship_average, None);
        assert_eq!(ds.options.years, vec!["2023"]);
    }

    #[test]
    fn string_views_and_wide_unsigned_are_read() {
        let view: ArrayRef = Arc::new(StringViewArray::from(vec!["0042"]));
        let col = prepare_column("RM", &view).unwrap();
        assert_eq!(extract_cell(&col, 0), CellValue::String("0042".into()));

        let big: ArrayRef = Arc::new(UInt64Array::from(vec![u64::MAX, 7]));
        let col = prepare_column("Ano", &big).unwrap();
        assert_eq!(extract_cell(&col, 0), CellValue::Float(u64::MAX as f64));
        assert_eq!(extract_cell(&col, 1), CellValue::Integer(7));
    }

    #[test]
    fn unreadable_required_column_fails_and_extra_one_is_blanked() {
        let inner: ArrayRef = Arc::new(Int32Array::from(vec![1]));
        let nested: ArrayRef = Arc::new(StructArray::from(vec![(
            Arc::new(Field::new("x", DataType::Int32, false)),
            inner,
        )]));

        let err = prepare_column("Semestre", &nested).unwrap_err();
        assert!(err.to_string().contains("Semestre"));

        let col = prepare_column("Notas", &nested).unwrap();
        assert_eq!(extract_cell(&col, 0), CellValue::Null);
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "results.json", r#"{"RM": "1"}"#);
        assert!(load_file(&path).is_err());
    }
}
