//! Writes a synthetic availability sheet for local runs of the dashboard.
//!
//! Usage: `generate_sample [OUTPUT] [SITES]`. The output format follows the
//! extension: `.parquet`/`.pq` write Parquet, anything else writes CSV.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const REGIONS: &[&str] = &["CENTRAL", "EAST", "NORTH", "SOUTH", "WEST"];
const TECHNOLOGIES: &[&str] = &["2G/3G", "2G/3G/4G", "4G", "4G/5G"];
const CATEGORIES: &[&str] = &["Macro", "Micro", "Rooftop", "Indoor"];
const REVENUE: &[&str] = &["Platinum", "Gold", "Silver", "Bronze"];
const MONTHS: &[&str] = &["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
const DAYS: i64 = 10;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One generated column: either labels or (possibly missing) readings.
enum SampleColumn {
    Text(Vec<String>),
    Number(Vec<Option<f64>>),
}

struct Sheet {
    names: Vec<String>,
    columns: Vec<SampleColumn>,
}

impl Sheet {
    fn rows(&self) -> usize {
        match self.columns.first() {
            Some(SampleColumn::Text(v)) => v.len(),
            Some(SampleColumn::Number(v)) => v.len(),
            None => 0,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Availability around a per-site baseline; a few sites have bad days.
fn availability(rng: &mut SimpleRng, baseline: f64) -> Option<f64> {
    if rng.chance(0.03) {
        return None;
    }
    let dip = if rng.chance(0.05) { rng.next_f64() * 40.0 } else { 0.0 };
    Some(round2((baseline - dip - rng.next_f64() * 2.0).clamp(0.0, 100.0)))
}

fn generate(sites: usize, rng: &mut SimpleRng) -> Sheet {
    let mut text: Vec<(&str, Vec<String>)> = [
        "SID",
        "REGION",
        "TGL",
        "GRID",
        "TECHNOLOGY",
        "SITE CATEGORY",
        "NEW USF SITES",
        "REVENUE CAT",
        "ONAIRDATE",
        "SOLAR SITES",
    ]
    .into_iter()
    .map(|name| (name, Vec::with_capacity(sites)))
    .collect();

    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
    let day_names: Vec<String> = (0..DAYS)
        .map(|d| (start + Duration::days(d)).format("%Y-%m-%d").to_string())
        .collect();
    let mut numbers: Vec<(String, Vec<Option<f64>>)> = day_names
        .iter()
        .cloned()
        .chain(MONTHS.iter().map(|m| format!("TCH% {m}")))
        .chain(MONTHS.iter().map(|m| format!("{m} (Fuel)")))
        .map(|name| (name, Vec::with_capacity(sites)))
        .collect();

    for i in 0..sites {
        let region = rng.pick(REGIONS);
        let on_air = start - Duration::days(30 + (rng.next_u64() % 3000) as i64);
        let row = [
            format!("S{:04}", i + 1),
            region.to_string(),
            format!("TGL-{}{}", &region[..1], 1 + rng.next_u64() % 4),
            format!("G{:03}", rng.next_u64() % 120),
            rng.pick(TECHNOLOGIES).to_string(),
            rng.pick(CATEGORIES).to_string(),
            if rng.chance(0.2) { "Yes" } else { "No" }.to_string(),
            rng.pick(REVENUE).to_string(),
            on_air.format("%Y-%m-%d").to_string(),
            if rng.chance(0.3) { "Yes" } else { "No" }.to_string(),
        ];
        for ((_, column), value) in text.iter_mut().zip(row) {
            column.push(value);
        }

        let baseline = 95.0 + rng.next_f64() * 5.0;
        let litres = 80.0 + rng.next_f64() * 200.0;
        let daily = DAYS as usize;
        for (j, (_, column)) in numbers.iter_mut().enumerate() {
            let value = if j < daily {
                availability(rng, baseline)
            } else if j < daily + MONTHS.len() {
                availability(rng, baseline + 1.0)
            } else if rng.chance(0.1) {
                None
            } else {
                Some(round2(litres * (0.85 + rng.next_f64() * 0.3)))
            };
            column.push(value);
        }
    }

    let mut names = Vec::new();
    let mut columns = Vec::new();
    for (name, values) in text {
        names.push(name.to_string());
        columns.push(SampleColumn::Text(values));
    }
    for (name, values) in numbers {
        names.push(name);
        columns.push(SampleColumn::Number(values));
    }
    Sheet { names, columns }
}

fn write_csv(sheet: &Sheet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(&sheet.names)?;
    for r in 0..sheet.rows() {
        let record = sheet.columns.iter().map(|c| match c {
            SampleColumn::Text(v) => v[r].clone(),
            SampleColumn::Number(v) => v[r].map(|x| x.to_string()).unwrap_or_default(),
        });
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(sheet: &Sheet, path: &Path) -> Result<()> {
    let fields: Vec<Field> = sheet
        .names
        .iter()
        .zip(&sheet.columns)
        .map(|(name, c)| match c {
            SampleColumn::Text(_) => Field::new(name, DataType::Utf8, false),
            SampleColumn::Number(_) => Field::new(name, DataType::Float64, true),
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays: Vec<ArrayRef> = sheet
        .columns
        .iter()
        .map(|c| -> ArrayRef {
            match c {
                SampleColumn::Text(v) => Arc::new(StringArray::from(v.clone())),
                SampleColumn::Number(v) => Arc::new(Float64Array::from(v.clone())),
            }
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/current_availability.csv"));
    let sites: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("Invalid site count: {n}"))?,
        None => 250,
    };

    let mut rng = SimpleRng::new(42);
    let sheet = generate(sites, &mut rng);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&sheet, &output)?,
        _ => write_csv(&sheet, &output)?,
    }

    println!(
        "Wrote {} sites ({} columns) to {}",
        sheet.rows(),
        sheet.names.len(),
        output.display()
    );
    Ok(())
}
