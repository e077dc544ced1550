/// GridView Tabular Store
///
/// The store owns the immutable source dataset: an ordered list of typed
/// columns of equal length. It is built once through `StoreBuilder` at session
/// start and never mutated afterwards; filtering, sorting and projection are
/// all derived state living in the view.
///
/// # Examples
///
/// ```
/// use gridview::{CellValue, ColumnType, Schema, StoreBuilder};
/// use std::collections::HashMap;
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int32, false),
///     ("name".to_string(), ColumnType::String, false),
///     ("age".to_string(), ColumnType::Int32, true),
/// ]);
///
/// let mut builder = StoreBuilder::new("users", schema).unwrap();
///
/// let mut row = HashMap::new();
/// row.insert("id".to_string(), CellValue::Int32(1));
/// row.insert("name".to_string(), CellValue::String("Alice".to_string()));
/// builder.append_row(row).unwrap();
///
/// let store = builder.build().unwrap();
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.get_value(0, "name").unwrap().as_str(), Some("Alice"));
/// assert!(store.get_value(0, "age").unwrap().is_null());
/// ```

use crate::column::{CellValue, Column, ColumnType};
use crate::error::{GridError, GridResult};
use crate::interner::{InternerStats, StringInterner};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Stable identity of a source row: its index in the store.
pub type RowId = usize;

/// Schema definition with column names, types and nullability.
///
/// ```
/// use gridview::{ColumnType, Schema};
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int32, false),
///     ("email".to_string(), ColumnType::String, false),
///     ("age".to_string(), ColumnType::Int32, true),
/// ]);
///
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.get_column_index("email"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }

    fn validate(&self) -> GridResult<()> {
        let mut seen = HashSet::new();
        for (name, _, _) in &self.columns {
            if !seen.insert(name.as_str()) {
                return Err(GridError::Schema(format!("Duplicate column name '{}'", name)));
            }
        }
        Ok(())
    }
}

/// Accumulates rows column by column and freezes them into a `TabularStore`.
#[derive(Debug)]
pub struct StoreBuilder {
    name: String,
    schema: Schema,
    values: Vec<Vec<CellValue>>,
    intern_strings: bool,
}

impl StoreBuilder {
    /// Fails when the schema repeats a column name.
    pub fn new(name: impl Into<String>, schema: Schema) -> GridResult<Self> {
        schema.validate()?;
        let values = vec![Vec::new(); schema.len()];
        Ok(StoreBuilder {
            name: name.into(),
            schema,
            values,
            intern_strings: false,
        })
    }

    /// Store text columns through a shared string interner.
    pub fn intern_strings(mut self, enabled: bool) -> Self {
        self.intern_strings = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.values.first().map_or(0, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a row given as column name → value. Columns missing from the map
    /// are null; names not in the schema are rejected.
    pub fn append_row(&mut self, mut row: HashMap<String, CellValue>) -> GridResult<()> {
        let mut ordered = Vec::with_capacity(self.schema.len());
        for name in self.schema.get_column_names() {
            ordered.push(row.remove(name).unwrap_or(CellValue::Null));
        }
        if let Some(extra) = row.keys().next() {
            return Err(GridError::Schema(format!(
                "Row names column '{}' which is not in the schema",
                extra
            )));
        }
        self.push_ordered(ordered);
        Ok(())
    }

    /// Append a row given in schema column order.
    pub fn append_values(&mut self, values: Vec<CellValue>) -> GridResult<()> {
        if values.len() != self.schema.len() {
            return Err(GridError::Schema(format!(
                "Row has {} values but the schema has {} columns",
                values.len(),
                self.schema.len()
            )));
        }
        self.push_ordered(values);
        Ok(())
    }

    fn push_ordered(&mut self, values: Vec<CellValue>) {
        for (column, value) in self.values.iter_mut().zip(values) {
            column.push(value);
        }
    }

    /// Validate every cell and freeze the store.
    pub fn build(self) -> GridResult<TabularStore> {
        let row_count = self.len();
        let mut interner = StringInterner::new();
        let mut columns = Vec::with_capacity(self.schema.len());

        for ((name, ty, nullable), values) in self.schema.columns.iter().zip(self.values) {
            let column = if self.intern_strings && *ty == ColumnType::String {
                Column::interned(name.clone(), *nullable, values, &mut interner)?
            } else {
                Column::from_values(name.clone(), *ty, *nullable, values)?
            };
            columns.push(column);
        }

        let interner = if self.intern_strings {
            let shared = Arc::new(interner);
            for column in &mut columns {
                column.attach_interner(shared.clone());
            }
            Some(shared)
        } else {
            None
        };

        log::debug!(
            "built store '{}': {} rows x {} columns (interning: {})",
            self.name,
            row_count,
            columns.len(),
            interner.is_some()
        );

        Ok(TabularStore {
            name: self.name,
            schema: self.schema,
            columns,
            row_count,
            interner,
        })
    }
}

/// The immutable source dataset.
pub struct TabularStore {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
    interner: Option<Arc<StringInterner>>,
}

impl TabularStore {
    /// Build a non-nullable store from whole columns of equal length.
    ///
    /// ```
    /// use gridview::{CellValue, ColumnType, TabularStore};
    ///
    /// let store = TabularStore::from_columns("demo", vec![
    ///     ("A", ColumnType::Int32, vec![CellValue::Int32(1), CellValue::Int32(2)]),
    /// ]).unwrap();
    /// assert_eq!(store.len(), 2);
    /// ```
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<(&str, ColumnType, Vec<CellValue>)>,
    ) -> GridResult<Self> {
        let schema = Schema::new(
            columns
                .iter()
                .map(|(n, ty, values)| (n.to_string(), *ty, values.iter().any(|v| v.is_null())))
                .collect(),
        );
        let lengths: HashSet<usize> = columns.iter().map(|(_, _, v)| v.len()).collect();
        if lengths.len() > 1 {
            return Err(GridError::Schema("Columns have different lengths".to_string()));
        }

        let mut builder = StoreBuilder::new(name, schema)?;
        builder.values = columns.into_iter().map(|(_, _, values)| values).collect();
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of source rows (N)
    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in original order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.get_column_names()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.get_column_index(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn get_value(&self, row: RowId, column: &str) -> GridResult<CellValue> {
        let col_idx = self
            .column_index(column)
            .ok_or_else(|| GridError::UnknownColumn(column.to_string()))?;
        self.get_value_by_index(row, col_idx)
    }

    /// Faster than `get_value` when the column index is already known.
    #[inline]
    pub fn get_value_by_index(&self, row: RowId, col_idx: usize) -> GridResult<CellValue> {
        let column = self
            .columns
            .get(col_idx)
            .ok_or_else(|| GridError::out_of_range(col_idx, self.columns.len()))?;
        column
            .get(row)
            .ok_or_else(|| GridError::out_of_range(row, self.row_count))
    }

    /// All values of one source row, keyed by column name.
    pub fn get_row(&self, row: RowId) -> GridResult<HashMap<String, CellValue>> {
        if row >= self.row_count {
            return Err(GridError::out_of_range(row, self.row_count));
        }
        Ok(self
            .columns
            .iter()
            .map(|col| (col.name().to_string(), col.get(row).unwrap_or(CellValue::Null)))
            .collect())
    }

    pub fn uses_string_interning(&self) -> bool {
        self.interner.is_some()
    }

    pub fn interner_stats(&self) -> Option<InternerStats> {
        self.interner.as_ref().map(|i| i.stats())
    }
}

impl std::fmt::Debug for TabularStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TabularStore {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            ("A".to_string(), ColumnType::Int32, false),
            ("B".to_string(), ColumnType::String, false),
        ])
    }

    #[test]
    fn test_store_basic() {
        let mut builder = StoreBuilder::new("sample", sample_schema()).unwrap();
        for (a, b) in [(1, "x"), (2, "y"), (3, "x"), (2, "z")] {
            builder
                .append_values(vec![CellValue::Int32(a), CellValue::String(b.to_string())])
                .unwrap();
        }
        let store = builder.build().unwrap();

        assert_eq!(store.len(), 4);
        assert_eq!(store.column_count(), 2);
        assert_eq!(store.column_names(), vec!["A", "B"]);
        assert_eq!(store.get_value(3, "B").unwrap().as_str(), Some("z"));
        assert_eq!(store.get_row(1).unwrap()["A"], CellValue::Int32(2));
    }

    #[test]
    fn test_store_errors() {
        let store = TabularStore::from_columns(
            "t",
            vec![("A", ColumnType::Int32, vec![CellValue::Int32(1)])],
        )
        .unwrap();

        assert_eq!(
            store.get_value(0, "missing"),
            Err(GridError::UnknownColumn("missing".to_string()))
        );
        assert_eq!(
            store.get_value(5, "A"),
            Err(GridError::IndexOutOfRange { index: 5, bound: 1 })
        );
        assert!(store.get_row(1).is_err());
    }

    #[test]
    fn test_builder_rejects_bad_rows() {
        let mut builder = StoreBuilder::new("t", sample_schema()).unwrap();
        assert!(builder.append_values(vec![CellValue::Int32(1)]).is_err());

        let mut row = HashMap::new();
        row.insert("A".to_string(), CellValue::Int32(1));
        row.insert("C".to_string(), CellValue::Int32(1));
        assert!(builder.append_row(row).is_err());

        // Missing non-nullable value only fails at build time
        let mut row = HashMap::new();
        row.insert("A".to_string(), CellValue::Int32(1));
        builder.append_row(row).unwrap();
        assert!(matches!(builder.build(), Err(GridError::Schema(_))));
    }

    #[test]
    fn test_duplicate_schema_column() {
        let schema = Schema::new(vec![
            ("A".to_string(), ColumnType::Int32, false),
            ("A".to_string(), ColumnType::String, false),
        ]);
        assert!(StoreBuilder::new("dup", schema).is_err());
    }

    #[test]
    fn test_store_with_interning() {
        let mut builder = StoreBuilder::new("t", sample_schema())
            .unwrap()
            .intern_strings(true);
        for i in 0..30 {
            let b = ["A", "B", "C"][i % 3];
            builder
                .append_values(vec![CellValue::Int32(i as i32), CellValue::String(b.to_string())])
                .unwrap();
        }
        let store = builder.build().unwrap();

        assert!(store.uses_string_interning());
        assert!(store.column("B").unwrap().uses_interning());
        assert!(!store.column("A").unwrap().uses_interning());
        assert_eq!(store.get_value(4, "B").unwrap().as_str(), Some("B"));

        let stats = store.interner_stats().unwrap();
        assert_eq!(stats.unique_strings, 3);
        assert_eq!(stats.total_references, 30);
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let result = TabularStore::from_columns(
            "t",
            vec![
                ("A", ColumnType::Int32, vec![CellValue::Int32(1)]),
                ("B", ColumnType::Bool, vec![]),
            ],
        );
        assert!(result.is_err());
    }
}
