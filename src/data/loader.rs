use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Table};

/// Extensions accepted by [`load_file`], for file dialogs.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls", "json", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sheet from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`           – header row followed by data rows
/// * `.xlsx` / `.xls` – first worksheet, first row is the header
/// * `.json`          – `[{ "SID": "A", "REGION": "North", ... }, ...]`
/// * `.parquet`       – flat columns of strings, numbers or booleans
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)
        }
        "xlsx" | "xls" | "xlsm" => load_workbook(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.column_names().len(),
        path.display()
    );
    Ok(table)
}

/// Blank header cells get a positional `Unnamed: N` name.
fn header_or_unnamed(raw: String, idx: usize) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {idx}")
    } else {
        raw
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse CSV text with a header row. Cells are typed with
/// [`CellValue::from_raw`]; short rows are padded with missing cells.
pub fn read_csv<R: Read>(input: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| header_or_unnamed(h.to_string(), i))
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(CellValue::from_raw).collect());
    }

    Ok(Table::from_rows(&headers, rows)?)
}

/// Write a table as CSV. Missing cells become empty fields.
pub fn write_csv<W: Write>(table: &Table, output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;
    for row in 0..table.len() {
        writer
            .write_record(table.row(row).map(CellValue::as_text))
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Excel workbooks
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().context("worksheet is empty")?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| header_or_unnamed(excel_text(cell), i))
        .collect();

    let rows = rows_iter
        .map(|row| row.iter().map(excel_cell).collect())
        .collect();

    Ok(Table::from_rows(&headers, rows)?)
}

/// Text of a header cell. Date headers come back as `YYYY-MM-DD` so the
/// classifier sees them as daily columns.
fn excel_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => ts.format("%Y-%m-%d").to_string(),
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        other => excel_cell(other).as_text(),
    }
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::from_f64(*f),
        Data::String(s) => CellValue::from_raw(s),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Missing,
        other => CellValue::Text(excel_text(other)),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (one object per row):
///
/// ```json
/// [
///   { "SID": "A101", "REGION": "North", "2024-01-01": 99.5 },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance; keys absent from a record are
/// missing cells.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Missing, json_to_cell))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(&headers, rows)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::from_raw(s),
        JsonValue::Number(n) => n.as_f64().map_or(CellValue::Missing, CellValue::from_f64),
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Null => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per sheet column.
///
/// Nested columns are not expected; any type without a direct mapping is
/// cast to text.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(idx);
            column.reserve(batch.num_rows());
            for row in 0..batch.num_rows() {
                column.push(arrow_cell(array, row)?);
            }
        }
    }

    Ok(Table::from_columns(&headers, columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Missing);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::from_raw(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::from_raw(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => CellValue::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => {
            CellValue::from_f64(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::from_f64(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Text(col.as_boolean().value(row).to_string()),
        _ => {
            let text = arrow::compute::cast(&col.slice(row, 1), &DataType::Utf8)
                .with_context(|| format!("converting {:?} to text", col.data_type()))?;
            CellValue::from_raw(text.as_string::<i32>().value(0))
        }
    };
    Ok(cell)
}
