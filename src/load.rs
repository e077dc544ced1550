/// Loaders turning CSV text or a JSON array of objects into a `TabularStore`.
///
/// Column types are inferred over every non-empty value of a column and widened
/// as needed: `Int32 → Int64 → Float64`, `Date → DateTime`, and anything that
/// disagrees falls back to `String`. Empty CSV fields and JSON nulls are null.
/// All loaded columns are nullable.
///
/// ```
/// use gridview::load::from_csv;
/// use gridview::{CellValue, ColumnType};
///
/// let store = from_csv("scores", "name,score\nAlice,95\nBob,87.5\n", false).unwrap();
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.schema().get_column_type("score"), Some(ColumnType::Float64));
/// assert_eq!(store.get_value(0, "score").unwrap(), CellValue::Float64(95.0));
/// ```

use crate::column::{CellValue, ColumnType};
use crate::error::{GridError, GridResult};
use crate::store::{Schema, StoreBuilder, TabularStore};
use crate::temporal::{has_time_part, parse_date, parse_datetime};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Load CSV text with a header row.
pub fn from_csv(name: &str, csv: &str, intern_strings: bool) -> GridResult<TabularStore> {
    let mut all_rows = parse_csv_rows(csv);
    if all_rows.is_empty() {
        return Err(GridError::Load("CSV is empty".to_string()));
    }

    let header = all_rows.remove(0);
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(GridError::Load("CSV header is empty".to_string()));
    }
    let column_names: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    let rows: Vec<Vec<String>> = all_rows
        .into_iter()
        .filter(|row| !row.iter().all(|f| f.trim().is_empty()))
        .collect();

    for (line, row) in rows.iter().enumerate() {
        if row.len() > column_names.len() {
            return Err(GridError::Load(format!(
                "Data row {} has {} values, but the header has {} columns",
                line + 1,
                row.len(),
                column_names.len()
            )));
        }
    }

    let types: Vec<ColumnType> = (0..column_names.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .filter_map(|v| infer_type_from_text(v))
                .reduce(widen)
                .unwrap_or(ColumnType::String)
        })
        .collect();

    let schema = Schema::new(
        column_names
            .iter()
            .zip(&types)
            .map(|(name, ty)| (name.clone(), *ty, true))
            .collect(),
    );
    let mut builder = StoreBuilder::new(name, schema)
        .map_err(|e| GridError::Load(e.to_string()))?
        .intern_strings(intern_strings);

    for row in &rows {
        let values = types
            .iter()
            .enumerate()
            .map(|(col, ty)| parse_text_value(row.get(col).map(String::as_str).unwrap_or(""), *ty))
            .collect::<GridResult<Vec<_>>>()?;
        builder.append_values(values)?;
    }

    builder.build()
}

/// Load a JSON array of objects. Columns appear in order of first occurrence;
/// keys missing from an object are null.
pub fn from_json(name: &str, json: &str, intern_strings: bool) -> GridResult<TabularStore> {
    let parsed: Vec<Value> =
        serde_json::from_str(json).map_err(|e| GridError::Load(format!("JSON parse error: {}", e)))?;

    let objects = parsed
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| GridError::Load("Expected array of objects".to_string()))
        })
        .collect::<GridResult<Vec<&Map<String, Value>>>>()?;

    let mut column_names: Vec<String> = Vec::new();
    let mut types: Vec<Option<ColumnType>> = Vec::new();
    let mut raw_rows: Vec<Vec<(usize, &Value, CellValue)>> = Vec::with_capacity(objects.len());

    for obj in &objects {
        let mut raw = Vec::with_capacity(obj.len());
        for (key, value) in obj.iter() {
            let col = match column_names.iter().position(|n| n == key) {
                Some(col) => col,
                None => {
                    column_names.push(key.clone());
                    types.push(None);
                    column_names.len() - 1
                }
            };
            let cell = json_to_cell(key, value)?;
            if let Some(ty) = cell.column_type() {
                types[col] = Some(match types[col] {
                    Some(current) => widen(current, ty),
                    None => ty,
                });
            }
            raw.push((col, value, cell));
        }
        raw_rows.push(raw);
    }

    if column_names.is_empty() {
        return Err(GridError::Load("JSON input has no columns".to_string()));
    }

    let types: Vec<ColumnType> = types
        .into_iter()
        .map(|ty| ty.unwrap_or(ColumnType::String))
        .collect();
    let schema = Schema::new(
        column_names
            .iter()
            .zip(&types)
            .map(|(name, ty)| (name.clone(), *ty, true))
            .collect(),
    );
    let mut builder = StoreBuilder::new(name, schema)
        .map_err(|e| GridError::Load(e.to_string()))?
        .intern_strings(intern_strings);

    for raw in raw_rows {
        let mut values = vec![CellValue::Null; types.len()];
        for (col, value, cell) in raw {
            values[col] = match (types[col], value) {
                // Text columns keep strings as written, not re-rendered dates
                (ColumnType::String, Value::String(text)) => CellValue::String(text.clone()),
                (ty, _) => coerce(cell, ty),
            };
        }
        builder.append_values(values)?;
    }

    builder.build()
}

pub fn from_csv_file(path: impl AsRef<Path>, intern_strings: bool) -> GridResult<TabularStore> {
    let (name, text) = read_source(path.as_ref())?;
    from_csv(&name, &text, intern_strings)
}

pub fn from_json_file(path: impl AsRef<Path>, intern_strings: bool) -> GridResult<TabularStore> {
    let (name, text) = read_source(path.as_ref())?;
    from_json(&name, &text, intern_strings)
}

/// Pick the loader from the file extension (`.json`, anything else as CSV).
pub fn from_path(path: impl AsRef<Path>, intern_strings: bool) -> GridResult<TabularStore> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_file(path, intern_strings)
    } else {
        from_csv_file(path, intern_strings)
    }
}

fn read_source(path: &Path) -> GridResult<(String, String)> {
    let text = fs::read_to_string(path)
        .map_err(|e| GridError::Load(format!("{}: {}", path.display(), e)))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string();
    Ok((name, text))
}

/// Parse CSV text into rows, handling quoted fields with embedded newlines and
/// doubled quotes.
fn parse_csv_rows(csv: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current_row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current_field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => current_row.push(std::mem::take(&mut current_field)),
            '\n' if !in_quotes => {
                current_row.push(std::mem::take(&mut current_field));
                rows.push(std::mem::take(&mut current_row));
            }
            '\r' if !in_quotes => {}
            _ => current_field.push(c),
        }
    }

    if !current_field.is_empty() || !current_row.is_empty() {
        current_row.push(current_field);
        rows.push(current_row);
    }

    rows
}

/// Narrowest type for one text value; None for empty values.
fn infer_type_from_text(value: &str) -> Option<ColumnType> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        ColumnType::Bool
    } else if has_time_part(trimmed) && parse_datetime(trimmed).is_some() {
        ColumnType::DateTime
    } else if parse_date(trimmed).is_some() {
        ColumnType::Date
    } else if let Ok(n) = trimmed.parse::<i64>() {
        if i32::try_from(n).is_ok() {
            ColumnType::Int32
        } else {
            ColumnType::Int64
        }
    } else if trimmed.parse::<f64>().is_ok() {
        ColumnType::Float64
    } else {
        ColumnType::String
    })
}

/// Smallest type holding values of both `a` and `b`.
fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    match (a, b) {
        (a, b) if a == b => a,
        (ColumnType::Int32, ColumnType::Int64) | (ColumnType::Int64, ColumnType::Int32) => {
            ColumnType::Int64
        }
        (a, b) if a.is_numeric() && b.is_numeric() => ColumnType::Float64,
        (ColumnType::Date, ColumnType::DateTime) | (ColumnType::DateTime, ColumnType::Date) => {
            ColumnType::DateTime
        }
        _ => ColumnType::String,
    }
}

fn parse_text_value(value: &str, column_type: ColumnType) -> GridResult<CellValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(CellValue::Null);
    }

    let fail = || GridError::Load(format!("Cannot parse '{}' as {}", trimmed, column_type));
    match column_type {
        ColumnType::Int32 => trimmed.parse().map(CellValue::Int32).map_err(|_| fail()),
        ColumnType::Int64 => trimmed.parse().map(CellValue::Int64).map_err(|_| fail()),
        ColumnType::Float32 => trimmed.parse().map(CellValue::Float32).map_err(|_| fail()),
        ColumnType::Float64 => trimmed.parse().map(CellValue::Float64).map_err(|_| fail()),
        ColumnType::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(CellValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(CellValue::Bool(false))
            } else {
                Err(fail())
            }
        }
        ColumnType::String => Ok(CellValue::String(trimmed.to_string())),
        ColumnType::Date => parse_date(trimmed).map(CellValue::Date).ok_or_else(fail),
        ColumnType::DateTime => parse_datetime(trimmed)
            .map(CellValue::DateTime)
            .ok_or_else(fail),
    }
}

fn json_to_cell(key: &str, value: &Value) -> GridResult<CellValue> {
    Ok(match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => match i32::try_from(v) {
                Ok(small) => CellValue::Int32(small),
                Err(_) => CellValue::Int64(v),
            },
            None => CellValue::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => {
            if has_time_part(s) {
                parse_datetime(s)
                    .map(CellValue::DateTime)
                    .unwrap_or_else(|| CellValue::String(s.clone()))
            } else {
                parse_date(s)
                    .map(CellValue::Date)
                    .unwrap_or_else(|| CellValue::String(s.clone()))
            }
        }
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Null => CellValue::Null,
        _ => {
            return Err(GridError::Load(format!(
                "Unsupported JSON value type for key '{}'",
                key
            )))
        }
    })
}

/// Convert a value to a column type produced by `widen` from its own type.
fn coerce(value: CellValue, column_type: ColumnType) -> CellValue {
    if value.is_null() || value.column_type() == Some(column_type) {
        return value;
    }
    match (column_type, value) {
        (ColumnType::Int64, CellValue::Int32(v)) => CellValue::Int64(v as i64),
        (ColumnType::Float64, v) if v.as_f64().is_some() => {
            CellValue::Float64(v.as_f64().unwrap_or(f64::NAN))
        }
        (ColumnType::DateTime, CellValue::Date(d)) => CellValue::DateTime(d.and_time(Default::default())),
        (_, v) => CellValue::String(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_csv_types_widen_across_rows() {
        let csv = "id,score,flag,when,label\n\
                   1,90,true,2024-01-05,a\n\
                   3000000000,87.5,false,2024-01-06 10:30,7\n\
                   ,,,,\"quoted, text\"\n";
        let store = from_csv("t", csv, false).unwrap();
        let schema = store.schema();
        assert_eq!(store.len(), 3);
        assert_eq!(schema.get_column_type("id"), Some(ColumnType::Int64));
        assert_eq!(schema.get_column_type("score"), Some(ColumnType::Float64));
        assert_eq!(schema.get_column_type("flag"), Some(ColumnType::Bool));
        assert_eq!(schema.get_column_type("when"), Some(ColumnType::DateTime));
        assert_eq!(schema.get_column_type("label"), Some(ColumnType::String));

        assert_eq!(store.get_value(0, "id").unwrap(), CellValue::Int64(1));
        assert!(store.get_value(2, "score").unwrap().is_null());
        assert_eq!(
            store.get_value(2, "label").unwrap(),
            CellValue::String("quoted, text".to_string())
        );
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(store.get_value(0, "when").unwrap(), CellValue::DateTime(midnight));
    }

    #[test]
    fn test_csv_short_rows_padded_and_long_rows_rejected() {
        let store = from_csv("t", "a,b\n1\n2,3\n", false).unwrap();
        assert!(store.get_value(0, "b").unwrap().is_null());
        assert_eq!(store.get_value(1, "b").unwrap(), CellValue::Int32(3));

        assert!(matches!(from_csv("t", "a\n1,2\n", false), Err(GridError::Load(_))));
        assert!(matches!(from_csv("t", "", false), Err(GridError::Load(_))));
    }

    #[test]
    fn test_csv_header_only() {
        let store = from_csv("t", "a,b\n", false).unwrap();
        assert_eq!(store.len(), 0);
        assert_eq!(store.schema().get_column_type("a"), Some(ColumnType::String));
    }

    #[test]
    fn test_csv_interned() {
        let store = from_csv("t", "city\nOslo\nRome\nOslo\n", true).unwrap();
        assert!(store.uses_string_interning());
        assert_eq!(store.interner_stats().map(|s| s.unique_strings), Some(2));
        assert_eq!(store.get_value(2, "city").unwrap().as_str(), Some("Oslo"));
    }

    #[test]
    fn test_json_columns_and_coercion() {
        let json = r#"[
            {"id": 1, "score": 9, "day": "2024-03-01"},
            {"id": 2, "score": 9.5, "note": "late", "day": "2024-03-02T08:00:00"},
            {"id": 3, "score": null}
        ]"#;
        let store = from_json("j", json, false).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.column_count(), 4);
        assert_eq!(store.schema().get_column_type("id"), Some(ColumnType::Int32));
        assert_eq!(store.schema().get_column_type("score"), Some(ColumnType::Float64));
        assert_eq!(store.schema().get_column_type("day"), Some(ColumnType::DateTime));
        assert_eq!(store.get_value(0, "score").unwrap(), CellValue::Float64(9.0));
        assert!(store.get_value(0, "note").unwrap().is_null());
        assert!(store.get_value(2, "day").unwrap().is_null());
    }

    #[test]
    fn test_json_mixed_falls_back_to_string() {
        let store = from_json("j", r#"[{"v": 1}, {"v": "one"}]"#, false).unwrap();
        assert_eq!(store.schema().get_column_type("v"), Some(ColumnType::String));
        assert_eq!(store.get_value(0, "v").unwrap().as_str(), Some("1"));
        assert!(store.column("v").unwrap().is_nullable());
    }

    #[test]
    fn test_json_text_column_keeps_written_dates() {
        let json = r#"[{"at": "2024-03-02 08:00"}, {"at": "2024-03-05"}, {"at": "soon"}]"#;
        let store = from_json("j", json, false).unwrap();
        assert_eq!(store.schema().get_column_type("at"), Some(ColumnType::String));
        let texts: Vec<_> = (0..3)
            .map(|row| store.get_value(row, "at").unwrap())
            .collect();
        assert_eq!(
            texts,
            vec![
                CellValue::String("2024-03-02 08:00".to_string()),
                CellValue::String("2024-03-05".to_string()),
                CellValue::String("soon".to_string()),
            ]
        );

        let csv = from_csv("c", "at
2024-03-02 08:00
2024-03-05
soon
", false).unwrap();
        for row in 0..3 {
            assert_eq!(csv.get_value(row, "at").unwrap(), texts[row]);
        }
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(from_json("j", "{", false), Err(GridError::Load(_))));
        assert!(matches!(from_json("j", "[1, 2]", false), Err(GridError::Load(_))));
        assert!(matches!(from_json("j", "[]", false), Err(GridError::Load(_))));
        assert!(matches!(
            from_json("j", r#"[{"v": [1]}]"#, false),
            Err(GridError::Load(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            from_path("/nonexistent/data.csv", false),
            Err(GridError::Load(_))
        ));
    }
}
