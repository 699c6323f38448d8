use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SampleRng {
    state: [u64; 4],
}

impl SampleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SampleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in `[lo, hi)`, rounded to one decimal like a grade sheet.
    fn grade(&mut self, lo: f64, hi: f64) -> f64 {
        ((lo + (hi - lo) * self.next_f64()) * 10.0).round() / 10.0
    }
}

struct Row {
    rm: String,
    ano: i64,
    semestre: i64,
    turma: String,
    alura: f64,
    merito: f64,
}

fn main() -> Result<()> {
    let mut rng = SampleRng::new(42);

    let years = [2022, 2023, 2024];
    let semesters = [1, 2];
    let classes = ["1TDSPA", "1TDSPB", "2TDSPF", "2TDSPK"];
    let per_class = 4;

    let mut rows = Vec::new();
    let mut rm: u32 = 90_001;
    for &ano in &years {
        for &semestre in &semesters {
            for turma in &classes {
                for _ in 0..per_class {
                    rows.push(Row {
                        // RMs are zero-padded so loaders must keep them as text.
                        rm: format!("{rm:06}"),
                        ano,
                        semestre,
                        turma: turma.to_string(),
                        alura: rng.grade(40.0, 100.0),
                        merito: rng.grade(5.0, 10.0),
                    });
                    rm += 1;
                }
            }
        }
    }

    write_parquet("results.parquet", &rows)?;
    write_csv("results.csv", &rows)?;

    println!("Wrote {} scholarship records to results.parquet and results.csv", rows.len());
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("RM", DataType::Utf8, false),
        Field::new("Ano", DataType::Int64, false),
        Field::new("Semestre", DataType::Int64, false),
        Field::new("Turma", DataType::Utf8, false),
        Field::new("MediaAcessoAlura", DataType::Float64, false),
        Field::new("MediaBolsaMerito", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.rm.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.ano))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.semestre))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.turma.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.alura))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.merito))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "RM",
        "Ano",
        "Semestre",
        "Turma",
        "MediaAcessoAlura",
        "MediaBolsaMerito",
    ])?;
    for r in rows {
        writer.write_record([
            r.rm.clone(),
            r.ano.to_string(),
            r.semestre.to_string(),
            r.turma.clone(),
            r.alura.to_string(),
            r.merito.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
