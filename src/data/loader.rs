use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray, ArrayRef};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RawDataset, RawRecord, RawValue};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one scalar column per field (recommended for large tables)
/// * `.json`    – `[{ "reg_no": "...", "status": "...", ... }, ...]`
/// * `.csv`     – header row with column names, one record per line
pub fn load_file(path: &Path) -> Result<RawDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} records with columns {:?} from {}",
        raw.len(),
        raw.columns,
        path.display()
    );
    Ok(raw)
}

/// Records in first-seen column order while building a [`RawDataset`].
#[derive(Default)]
struct ColumnOrder {
    seen: HashSet<String>,
    columns: Vec<String>,
}

impl ColumnOrder {
    fn note(&mut self, key: &str) {
        if !self.seen.contains(key) {
            self.seen.insert(key.to_string());
            self.columns.push(key.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "reg_no": "R001", "status": "Placed", "ctc": 6.5, "reason": null },
///   ...
/// ]
/// ```
///
/// Column order follows the first record that mentions each key.
fn load_json(path: &Path) -> Result<RawDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<RawDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut order = ColumnOrder::default();
    let mut out = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = RawRecord::new();
        for (key, val) in obj {
            order.note(key);
            record.insert(key.clone(), json_to_raw(val));
        }
        out.push(record);
    }

    Ok(RawDataset {
        columns: order.columns,
        records: out,
    })
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, every cell kept as text.
/// Short records leave their trailing fields missing.
fn load_csv(path: &Path) -> Result<RawDataset> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawDataset> {
    let mut order = ColumnOrder::default();
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    for h in &headers {
        order.note(h);
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let fields: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), RawValue::from(value)))
            .collect();
        records.push(fields);
    }

    Ok(RawDataset {
        columns: order.columns,
        records,
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Strings, integers, floats and booleans map onto the matching
/// [`RawValue`]; other types (dates, decimals, …) are rendered with Arrow's
/// display formatting. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let mut record = RawRecord::new();
            for (name, col) in columns.iter().zip(batch.columns()) {
                let value = extract_raw_value(col, row)
                    .with_context(|| format!("Row {row}: failed to read '{name}'"))?;
                record.insert(name.clone(), value);
            }
            records.push(record);
        }
    }

    Ok(RawDataset { columns, records })
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &ArrayRef, row: usize) -> Result<RawValue> {
    if col.is_null(row) {
        return Ok(RawValue::Null);
    }

    let value: Option<RawValue> = match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|a| a.value(row).into()),
        DataType::LargeUtf8 => col.as_string_opt::<i64>().map(|a| a.value(row).into()),
        DataType::Boolean => col.as_boolean_opt().map(|a| a.value(row).into()),
        DataType::Int8 => col.as_primitive_opt::<Int8Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::Int16 => col.as_primitive_opt::<Int16Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::Int32 => col.as_primitive_opt::<Int32Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::Int64 => col.as_primitive_opt::<Int64Type>().map(|a| a.value(row).into()),
        DataType::UInt8 => col.as_primitive_opt::<UInt8Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::UInt16 => col.as_primitive_opt::<UInt16Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::UInt32 => col.as_primitive_opt::<UInt32Type>().map(|a| i64::from(a.value(row)).into()),
        DataType::UInt64 => col
            .as_primitive_opt::<UInt64Type>()
            .map(|a| match i64::try_from(a.value(row)) {
                Ok(i) => RawValue::Integer(i),
                Err(_) => RawValue::String(a.value(row).to_string()),
            }),
        DataType::Float32 => col.as_primitive_opt::<Float32Type>().map(|a| f64::from(a.value(row)).into()),
        DataType::Float64 => col.as_primitive_opt::<Float64Type>().map(|a| a.value(row).into()),
        _ => None,
    };

    match value {
        Some(v) => Ok(v),
        None => {
            let text = array_value_to_string(col.as_ref(), row)
                .with_context(|| format!("formatting {:?} value", col.data_type()))?;
            Ok(RawValue::String(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn json_keeps_key_order_and_scalar_types() {
        let file = write_temp(
            ".json",
            r#"[
                {"reg_no": "R1", "status": "Placed", "ctc": 6.5, "backlogs": 0},
                {"reg_no": "R2", "status": null, "reason": "Higher studies"}
            ]"#,
        );
        let raw = load_file(file.path()).unwrap();

        assert_eq!(raw.columns, vec!["reg_no", "status", "ctc", "backlogs", "reason"]);
        assert_eq!(raw.records[0]["ctc"], RawValue::Float(6.5));
        assert_eq!(raw.records[0]["backlogs"], RawValue::Integer(0));
        assert_eq!(raw.records[1]["status"], RawValue::Null);
        assert!(!raw.records[1].contains_key("ctc"));
    }

    #[test]
    fn json_rejects_non_object_rows() {
        let err = parse_json(r#"[{"a": 1}, 5]"#).unwrap_err();
        assert!(format!("{err:#}").contains("Row 1"));
    }

    #[test]
    fn csv_reads_cells_as_text() {
        let file = write_temp(".csv", "Sr No,Status, Course \n1,Placed,CS\n2,,EE\n3,Open\n");
        let raw = load_file(file.path()).unwrap();

        assert_eq!(raw.columns, vec!["Sr No", "Status", "Course"]);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.records[0]["Sr No"], RawValue::from("1"));
        assert_eq!(raw.records[1]["Status"], RawValue::from(""));
        assert!(!raw.records[2].contains_key("Course"));
    }

    #[test]
    fn parquet_maps_scalar_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("reg_no", DataType::Utf8, false),
            Field::new("backlogs", DataType::Int64, true),
            Field::new("ctc", DataType::Float64, true),
            Field::new("seeking", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["R1", "R2"])),
                Arc::new(Int64Array::from(vec![Some(0), None])),
                Arc::new(Float64Array::from(vec![Some(4.5), Some(12.0)])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let raw = load_file(file.path()).unwrap();
        assert_eq!(raw.columns, vec!["reg_no", "backlogs", "ctc", "seeking"]);
        assert_eq!(raw.records[0]["reg_no"], RawValue::from("R1"));
        assert_eq!(raw.records[1]["backlogs"], RawValue::Null);
        assert_eq!(raw.records[1]["ctc"], RawValue::Float(12.0));
        assert_eq!(raw.records[0]["seeking"], RawValue::Bool(true));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".xlsx", "");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
