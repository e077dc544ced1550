/// GridView Column Implementation
///
/// A Column is an immutable, random-access array of typed cells. Every cell is
/// either a value of the column's declared type or null (when the column is
/// nullable).
///
/// # String Interning
///
/// Text columns built with a shared `StringInterner` store one `StringId` per
/// cell instead of an owned `String`. Reads resolve ids transparently, and
/// `cell_ref` hands out borrowed `&str` without cloning either way.

use crate::error::{GridError, GridResult};
use crate::interner::{StringId, StringInterner};
use crate::temporal::{format_date, format_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declared column types: integer, floating-point, text, boolean and temporal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
    Date,
    DateTime,
}

impl ColumnType {
    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Int32 | ColumnType::Int64)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int32 | ColumnType::Int64 | ColumnType::Float32 | ColumnType::Float64
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int32 => "Int32",
            ColumnType::Int64 => "Int64",
            ColumnType::Float32 => "Float32",
            ColumnType::Float64 => "Float64",
            ColumnType::String => "String",
            ColumnType::Bool => "Bool",
            ColumnType::Date => "Date",
            ColumnType::DateTime => "DateTime",
        };
        f.write_str(name)
    }
}

/// An owned cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Any numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int32(v) => Some(*v as f64),
            CellValue::Int64(v) => Some(*v as f64),
            CellValue::Float32(v) => Some(*v as f64),
            CellValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// The type this value belongs to, or None for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            CellValue::Int32(_) => Some(ColumnType::Int32),
            CellValue::Int64(_) => Some(ColumnType::Int64),
            CellValue::Float32(_) => Some(ColumnType::Float32),
            CellValue::Float64(_) => Some(ColumnType::Float64),
            CellValue::String(_) => Some(ColumnType::String),
            CellValue::Bool(_) => Some(ColumnType::Bool),
            CellValue::Date(_) => Some(ColumnType::Date),
            CellValue::DateTime(_) => Some(ColumnType::DateTime),
            CellValue::Null => None,
        }
    }

    /// JSON representation; non-finite floats and nulls map to `null`,
    /// temporal values to ISO 8601 strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            CellValue::Int32(n) => Value::Number((*n).into()),
            CellValue::Int64(n) => Value::Number((*n).into()),
            CellValue::Float32(f) => serde_json::Number::from_f64(*f as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::String(s) => Value::String(s.clone()),
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Date(d) => Value::String(format_date(d)),
            CellValue::DateTime(dt) => Value::String(format_datetime(dt)),
            CellValue::Null => Value::Null,
        }
    }
}

/// Cell text as shown in the grid. Null renders as an empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int32(v) => write!(f, "{}", v),
            CellValue::Int64(v) => write!(f, "{}", v),
            CellValue::Float32(v) => write!(f, "{}", v),
            CellValue::Float64(v) => write!(f, "{}", v),
            CellValue::String(v) => f.write_str(v),
            CellValue::Bool(v) => write!(f, "{}", v),
            CellValue::Date(d) => f.write_str(&format_date(d)),
            CellValue::DateTime(dt) => f.write_str(&format_datetime(dt)),
            CellValue::Null => Ok(()),
        }
    }
}

/// A borrowed view of a cell used on the hot paths (mask evaluation, sorting).
/// Integers are widened to i64 and floats to f64.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Int(i64),
    Float(f64),
    Text(&'a str),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl CellRef<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, CellRef::Null)
    }

    /// Numeric value as f64, integers included.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellRef::Int(v) => Some(*v as f64),
            CellRef::Float(v) => Some(*v),
            _ => None,
        }
    }
}

enum ColumnData {
    Values(Vec<CellValue>),
    /// `None` marks a null cell
    Interned(Vec<Option<StringId>>),
}

/// An immutable typed column.
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    data: ColumnData,
    /// Shared with every other interned column of the same store
    interner: Option<Arc<StringInterner>>,
}

impl Column {
    /// Build a column from owned values, validating every value against the
    /// declared type and nullability.
    pub fn from_values(
        name: impl Into<String>,
        column_type: ColumnType,
        nullable: bool,
        values: Vec<CellValue>,
    ) -> GridResult<Self> {
        let name = name.into();
        for (row, value) in values.iter().enumerate() {
            validate_value(&name, column_type, nullable, row, value)?;
        }
        Ok(Column {
            name,
            column_type,
            nullable,
            data: ColumnData::Values(values),
            interner: None,
        })
    }

    /// Build a text column whose strings are interned into `interner`.
    ///
    /// The column cannot be read until `attach_interner` hands it the frozen
    /// interner; the store builder does this once every column is built.
    pub(crate) fn interned(
        name: impl Into<String>,
        nullable: bool,
        values: Vec<CellValue>,
        interner: &mut StringInterner,
    ) -> GridResult<Self> {
        let name = name.into();
        let mut ids = Vec::with_capacity(values.len());
        for (row, value) in values.iter().enumerate() {
            validate_value(&name, ColumnType::String, nullable, row, value)?;
            ids.push(value.as_str().map(|s| interner.intern(s)));
        }
        Ok(Column {
            name,
            column_type: ColumnType::String,
            nullable,
            data: ColumnData::Interned(ids),
            interner: None,
        })
    }

    pub(crate) fn attach_interner(&mut self, interner: Arc<StringInterner>) {
        if matches!(self.data, ColumnData::Interned(_)) {
            self.interner = Some(interner);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn uses_interning(&self) -> bool {
        matches!(self.data, ColumnData::Interned(_))
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Values(v) => v.len(),
            ColumnData::Interned(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrowed cell at `index`, or None past the end.
    #[inline]
    pub fn cell_ref(&self, index: usize) -> Option<CellRef<'_>> {
        match &self.data {
            ColumnData::Values(values) => values.get(index).map(|v| match v {
                CellValue::Int32(n) => CellRef::Int(*n as i64),
                CellValue::Int64(n) => CellRef::Int(*n),
                CellValue::Float32(f) => CellRef::Float(*f as f64),
                CellValue::Float64(f) => CellRef::Float(*f),
                CellValue::String(s) => CellRef::Text(s),
                CellValue::Bool(b) => CellRef::Bool(*b),
                CellValue::Date(d) => CellRef::Date(*d),
                CellValue::DateTime(dt) => CellRef::DateTime(*dt),
                CellValue::Null => CellRef::Null,
            }),
            ColumnData::Interned(ids) => ids.get(index).map(|id| {
                id.and_then(|id| self.interner.as_ref().and_then(|i| i.resolve(id)))
                    .map(CellRef::Text)
                    .unwrap_or(CellRef::Null)
            }),
        }
    }

    /// Owned cell at `index`, or None past the end.
    pub fn get(&self, index: usize) -> Option<CellValue> {
        match &self.data {
            ColumnData::Values(values) => values.get(index).cloned(),
            ColumnData::Interned(_) => self.cell_ref(index).map(|cell| match cell {
                CellRef::Text(s) => CellValue::String(s.to_string()),
                _ => CellValue::Null,
            }),
        }
    }

    /// Numeric access without cloning; None for null, non-numeric, or out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.cell_ref(index).and_then(|cell| cell.as_f64())
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        matches!(self.cell_ref(index), Some(CellRef::Null))
    }

    pub fn iter(&self) -> ColumnIterator<'_> {
        ColumnIterator {
            column: self,
            index: 0,
        }
    }
}

fn validate_value(
    column: &str,
    column_type: ColumnType,
    nullable: bool,
    row: usize,
    value: &CellValue,
) -> GridResult<()> {
    match value.column_type() {
        None if nullable => Ok(()),
        None => Err(GridError::Schema(format!(
            "Column '{}' is not nullable (row {})",
            column, row
        ))),
        Some(t) if t == column_type => Ok(()),
        Some(t) => Err(GridError::Schema(format!(
            "Type mismatch in column '{}' at row {}: expected {}, got {}",
            column, row, column_type, t
        ))),
    }
}

pub struct ColumnIterator<'a> {
    column: &'a Column,
    index: usize,
}

impl Iterator for ColumnIterator<'_> {
    type Item = CellValue;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.column.get(self.index)?;
        self.index += 1;
        Some(value)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}
