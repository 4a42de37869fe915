use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Item;

/// Default column holding recipient addresses.
pub const DEFAULT_COLUMN: &str = "EMAIL";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read one column of identifiers from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; the named column is read
/// * `.json`    – `["a@x.com", ...]` or `[{ "EMAIL": "a@x.com", ... }, ...]`
/// * `.parquet` – a Utf8 / LargeUtf8 column with the given name
///
/// Values are trimmed and empty cells are skipped.
pub fn load_column(path: &Path, column: &str) -> Result<Vec<Item>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => load_csv(path, column),
        "json" => load_json(path, column),
        "parquet" | "pq" => load_parquet(path, column),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading column '{column}' from {}", path.display()))?;

    Ok(raw
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

/// Concatenate [`load_column`] over several files, in order.
pub fn load_columns(paths: &[impl AsRef<Path>], column: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for path in paths {
        items.extend(load_column(path.as_ref(), column)?);
    }
    Ok(items)
}

/// Like [`load_column`], but a missing file yields an empty list.
/// Used for the done log, which does not exist before the first run.
pub fn load_column_if_exists(path: &Path, column: &str) -> Result<Vec<Item>> {
    if !path.exists() {
        log::info!("{} not found, treating as empty", path.display());
        return Ok(Vec::new());
    }
    load_column(path, column)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let col_idx = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .position(|h| h.trim() == column)
        .with_context(|| format!("CSV missing '{column}' column"))?;

    let mut values = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        values.push(record.get(col_idx).unwrap_or("").to_string());
    }
    Ok(values)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path, column: &str) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| match rec {
            JsonValue::String(s) => Ok(s.clone()),
            JsonValue::Object(obj) => match obj.get(column) {
                Some(JsonValue::String(s)) => Ok(s.clone()),
                Some(JsonValue::Null) | None => Ok(String::new()),
                Some(other) => bail!("Row {i}: '{column}' is not a string: {other}"),
            },
            other => bail!("Row {i}: expected string or object, got {other}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by **Pandas** (`df.to_parquet()`), **Polars**
/// and the bundled `generate_sample` binary.
fn load_parquet(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut values = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let idx = batch
            .schema()
            .index_of(column)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{column}' column"))?;
        let col = batch.column(idx);

        match col.data_type() {
            DataType::Utf8 => {
                let arr = col.as_string::<i32>();
                values.extend(arr.iter().map(|v| v.unwrap_or("").to_string()));
            }
            DataType::LargeUtf8 => {
                let arr = col.as_string::<i64>();
                values.extend(arr.iter().map(|v| v.unwrap_or("").to_string()));
            }
            other => bail!("Column '{column}' has type {other:?}, expected Utf8"),
        }
    }

    Ok(values)
}
