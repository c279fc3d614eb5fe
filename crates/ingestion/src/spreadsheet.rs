//! Spreadsheet extraction
//!
//! Reads the first worksheet into header-keyed rows with calamine. Files
//! calamine cannot open are retried as comma-separated text, with the same
//! header and cell normalization so both paths yield identical rows.

use crate::errors::ExtractionError;
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use docqa_common::types::Row;
use serde_json::{Number, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Extract rows from the staged spreadsheet at `path`
pub fn extract_rows(path: &Path) -> Result<Vec<Row>, ExtractionError> {
    match read_workbook(path) {
        Ok(rows) => Ok(rows),
        Err(spreadsheet) => {
            warn!(error = %spreadsheet, "Workbook parse failed, falling back to CSV");
            read_csv(path).map_err(|csv| ExtractionError::Spreadsheet { spreadsheet, csv })
        }
    }
}

fn read_workbook(path: &Path) -> Result<Vec<Row>, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| e.to_string())?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => header_names(cells.iter().map(header_text)),
        None => return Ok(Vec::new()),
    };

    let table = build_rows(&header, rows.map(|cells| cells.iter().map(cell_value).collect()));
    debug!(rows = table.len(), columns = header.len(), "Read worksheet");
    Ok(table)
}

fn read_csv(path: &Path) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    let header = header_names(
        reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.trim().to_string()),
    );

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        records.push(record.iter().map(text_value).collect::<Vec<_>>());
    }

    let table = build_rows(&header, records.into_iter());
    debug!(rows = table.len(), columns = header.len(), "Read CSV");
    Ok(table)
}

/// Column names from raw header cells.
///
/// Blank names become `Unnamed: {index}`; repeats get a `.{n}` suffix.
fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for (index, name) in raw.enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, n);
            n += 1;
        }
        names.push(candidate);
    }

    names
}

fn build_rows(header: &[String], records: impl Iterator<Item = Vec<Value>>) -> Vec<Row> {
    let mut rows = Vec::new();

    for cells in records {
        if cells.iter().all(Value::is_null) {
            continue;
        }

        let mut row = Row::new();
        for (index, name) in header.iter().enumerate() {
            row.insert(name.clone(), cells.get(index).cloned().unwrap_or(Value::Null));
        }
        // cells past the header still carry data
        for (index, value) in cells.into_iter().enumerate().skip(header.len()) {
            row.insert(format!("Unnamed: {}", index), value);
        }
        rows.push(row);
    }

    rows
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => datetime_value(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

fn text_value(raw: &str) -> Value {
    let raw = raw.trim();

    if raw.is_empty() {
        Value::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::from(i)
    } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
        float_value(f)
    } else if raw.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::String(raw.to_string())
    }
}

/// Dates render as ISO-8601, date-only at midnight; durations and
/// out-of-range serials keep the serial number
fn datetime_value(dt: &ExcelDateTime) -> Value {
    let datetime = if dt.is_datetime() { dt.as_datetime() } else { None };

    match datetime {
        Some(dt) if dt.time() == NaiveTime::MIN => {
            Value::String(dt.format("%Y-%m-%d").to_string())
        }
        Some(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => float_value(dt.as_f64()),
    }
}

/// Whole floats become integers; NaN and infinities become null
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_names() {
        let names = header_names(
            ["id", "", "name", "id", "id"].into_iter().map(String::from),
        );
        assert_eq!(names, vec!["id", "Unnamed: 1", "name", "id.1", "id.2"]);
    }

    #[test]
    fn test_text_value_normalization() {
        assert_eq!(text_value(""), Value::Null);
        assert_eq!(text_value(" 42 "), json!(42));
        assert_eq!(text_value("3.0"), json!(3));
        assert_eq!(text_value("2.5"), json!(2.5));
        assert_eq!(text_value("TRUE"), json!(true));
        assert_eq!(text_value("Ada"), json!("Ada"));
        assert_eq!(text_value("1e3"), json!(1000));
    }

    #[test]
    fn test_non_finite_literals_stay_text() {
        assert_eq!(text_value("Nan"), json!("Nan"));
        assert_eq!(text_value("Inf"), json!("Inf"));
        assert_eq!(text_value("-infinity"), json!("-infinity"));
        assert_eq!(text_value("1e999"), json!("1e999"));
    }

    #[test]
    fn test_datetime_cells_render_iso() {
        use calamine::ExcelDateTimeType;

        let date = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_value(&Data::DateTime(date)), json!("2024-01-01"));
        assert_eq!(cell_value(&Data::DateTime(date)), text_value("2024-01-01"));

        let noon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_value(&Data::DateTime(noon)), json!("2024-01-01T12:00:00"));

        let duration = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(cell_value(&Data::DateTime(duration)), json!(1.5));
    }

    #[test]
    fn test_cell_value_matches_text_value() {
        assert_eq!(cell_value(&Data::Float(30.0)), text_value("30"));
        assert_eq!(cell_value(&Data::Float(1.25)), text_value("1.25"));
        assert_eq!(cell_value(&Data::String("Ada".into())), text_value("Ada"));
        assert_eq!(cell_value(&Data::Empty), text_value(""));
        assert_eq!(cell_value(&Data::Bool(false)), text_value("false"));
    }

    #[test]
    fn test_build_rows_skips_blank_and_pads_short() {
        let header = vec!["a".to_string(), "b".to_string()];
        let rows = build_rows(
            &header,
            vec![
                vec![json!(1), json!("x")],
                vec![Value::Null, Value::Null],
                vec![json!(2)],
                vec![json!(3), json!("y"), json!("extra")],
            ]
            .into_iter(),
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(Value::Object(rows[1].clone()), json!({"a": 2, "b": null}));
        assert_eq!(
            Value::Object(rows[2].clone()),
            json!({"a": 3, "b": "y", "Unnamed: 2": "extra"})
        );
    }

    #[test]
    fn test_csv_fallback_reads_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xls");
        std::fs::write(&path, "name,age\nAda,36\n,\nLin,\n").unwrap();

        let rows = extract_rows(&path).unwrap();
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([{"name": "Ada", "age": 36}, {"name": "Lin", "age": null}])
        );
    }

    #[test]
    fn test_csv_rows_of_nan_like_words_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xls");
        std::fs::write(&path, "name,note\nNan,Infinity\nInf,nan\n").unwrap();

        let rows = extract_rows(&path).unwrap();
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([
                {"name": "Nan", "note": "Infinity"},
                {"name": "Inf", "note": "nan"}
            ])
        );
    }

    #[test]
    fn test_unreadable_file_reports_both_parsers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, [0xff, 0xfe, 0x00, b'\n', 0xc3]).unwrap();

        match extract_rows(&path) {
            Err(ExtractionError::Spreadsheet { spreadsheet, csv }) => {
                assert!(!spreadsheet.is_empty());
                assert!(!csv.is_empty());
            }
            other => panic!("expected spreadsheet error, got {:?}", other),
        }
    }
}
