/// Filtered snapshots for plot consumers.
///
/// A snapshot holds the rows passing the mask, in source order, over the full
/// column set. Projection and sort never affect it. It shares the store through
/// `Arc` and copies only the row list, so it stays valid after the view moves on.

use crate::column::{CellValue, Column};
use crate::error::{GridError, GridResult};
use crate::store::{RowId, TabularStore};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Equal-width bins over the finite values of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct FilteredSnapshot {
    store: Arc<TabularStore>,
    rows: Vec<RowId>,
    generation: u64,
}

impl FilteredSnapshot {
    pub(crate) fn new(store: Arc<TabularStore>, rows: Vec<RowId>, generation: u64) -> Self {
        FilteredSnapshot {
            store,
            rows,
            generation,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source row identities, ascending
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    /// Row-set generation of the view when the snapshot was taken
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.store.column_names()
    }

    /// Value of `column` in the `index`-th snapshot row.
    pub fn value(&self, index: usize, column: &str) -> GridResult<CellValue> {
        let row = *self
            .rows
            .get(index)
            .ok_or_else(|| GridError::out_of_range(index, self.rows.len()))?;
        self.store.get_value(row, column)
    }

    /// All values of `column` for the snapshot rows, nulls included.
    pub fn column_values(&self, column: &str) -> GridResult<Vec<CellValue>> {
        let col = self.lookup(column)?;
        Ok(self
            .rows
            .iter()
            .map(|&row| col.get(row).unwrap_or(CellValue::Null))
            .collect())
    }

    fn lookup(&self, column: &str) -> GridResult<&Column> {
        self.store
            .column(column)
            .ok_or_else(|| GridError::UnknownColumn(column.to_string()))
    }

    fn numeric_column(&self, column: &str) -> GridResult<&Column> {
        let col = self.lookup(column)?;
        if !col.column_type().is_numeric() {
            return Err(GridError::NotNumeric(column.to_string()));
        }
        Ok(col)
    }

    /// Non-null values of a numeric column as f64, in source order.
    pub fn numeric_values(&self, column: &str) -> GridResult<Vec<f64>> {
        let col = self.numeric_column(column)?;
        Ok(self.rows.iter().filter_map(|&row| col.get_f64(row)).collect())
    }

    /// Bin the finite values of `column` into `bins` equal-width buckets.
    /// A column with a single distinct value gets one unit-wide range centred
    /// on it. No finite values, or zero bins, yields an empty histogram.
    pub fn histogram(&self, column: &str, bins: usize) -> GridResult<Histogram> {
        let values: Vec<f64> = self
            .numeric_values(column)?
            .into_iter()
            .filter(|v| v.is_finite())
            .collect();

        if values.is_empty() || bins == 0 {
            return Ok(Histogram {
                edges: Vec::new(),
                counts: Vec::new(),
            });
        }

        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        // Halved and interpolated so a range wider than f64::MAX stays finite
        let span = max / 2.0 - min / 2.0;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| {
                let t = i as f64 / bins as f64;
                min * (1.0 - t) + max * t
            })
            .collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let fraction = (v / 2.0 - min / 2.0) / span;
            // Right edge belongs to the last bin
            let bin = ((fraction * bins as f64) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Histogram { edges, counts })
    }

    /// (x, y) pairs for rows where both columns hold a value.
    pub fn scatter(&self, x: &str, y: &str) -> GridResult<Vec<(f64, f64)>> {
        let xs = self.numeric_column(x)?;
        let ys = self.numeric_column(y)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|&row| Some((xs.get_f64(row)?, ys.get_f64(row)?)))
            .collect())
    }

    /// `{"columns": [...], "rows": [{...}, ...]}` with nulls as JSON null.
    pub fn to_json(&self) -> Value {
        let names = self.store.column_names();
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|&row| {
                let mut object = Map::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    let value = self
                        .store
                        .column_at(idx)
                        .and_then(|col| col.get(row))
                        .map(|v| v.to_json())
                        .unwrap_or(Value::Null);
                    object.insert(name.to_string(), value);
                }
                Value::Object(object)
            })
            .collect();

        json!({
            "columns": names,
            "rows": rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    fn snapshot(rows: Vec<RowId>) -> FilteredSnapshot {
        let store = TabularStore::from_columns(
            "plot",
            vec![
                (
                    "x",
                    ColumnType::Float64,
                    vec![
                        CellValue::Float64(0.0),
                        CellValue::Float64(1.0),
                        CellValue::Null,
                        CellValue::Float64(4.0),
                        CellValue::Float64(10.0),
                    ],
                ),
                (
                    "y",
                    ColumnType::Int32,
                    vec![1, 2, 3, 4, 5].into_iter().map(CellValue::Int32).collect(),
                ),
                (
                    "label",
                    ColumnType::String,
                    ["a", "b", "c", "d", "e"]
                        .iter()
                        .map(|s| CellValue::String(s.to_string()))
                        .collect(),
                ),
            ],
        )
        .unwrap();
        FilteredSnapshot::new(Arc::new(store), rows, 3)
    }

    #[test]
    fn test_numeric_values_skip_nulls() {
        let snap = snapshot(vec![0, 2, 3]);
        assert_eq!(snap.numeric_values("x").unwrap(), vec![0.0, 4.0]);
        assert_eq!(snap.numeric_values("y").unwrap(), vec![1.0, 3.0, 4.0]);
        assert_eq!(snap.generation(), 3);
    }

    #[test]
    fn test_numeric_errors() {
        let snap = snapshot(vec![0]);
        assert_eq!(
            snap.numeric_values("label"),
            Err(GridError::NotNumeric("label".to_string()))
        );
        assert_eq!(
            snap.numeric_values("nope"),
            Err(GridError::UnknownColumn("nope".to_string()))
        );
    }

    #[test]
    fn test_histogram() {
        let snap = snapshot(vec![0, 1, 2, 3, 4]);
        let hist = snap.histogram("x", 2).unwrap();
        assert_eq!(hist.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(hist.counts, vec![3, 1]);
        assert_eq!(hist.total(), 4);

        let single = snapshot(vec![3]).histogram("x", 4).unwrap();
        assert_eq!(single.total(), 1);
        assert_eq!(single.edges.first(), Some(&3.5));

        let empty = snapshot(vec![2]).histogram("x", 4).unwrap();
        assert!(empty.counts.is_empty());

        assert_eq!(snap.histogram("x", 0).unwrap().total(), 0);
        assert!(snap.histogram("label", 3).is_err());
    }

    #[test]
    fn test_histogram_wider_than_f64_range() {
        let store = TabularStore::from_columns(
            "extremes",
            vec![(
                "v",
                ColumnType::Float64,
                vec![
                    CellValue::Float64(-1e308),
                    CellValue::Float64(0.0),
                    CellValue::Float64(1e308),
                ],
            )],
        )
        .unwrap();
        let snap = FilteredSnapshot::new(Arc::new(store), vec![0, 1, 2], 0);

        let hist = snap.histogram("v", 4).unwrap();
        assert!(hist.edges.iter().all(|e| e.is_finite()));
        assert!(hist.edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(hist.edges[0], -1e308);
        assert_eq!(hist.edges[2], 0.0);
        assert_eq!(hist.edges[4], 1e308);
        assert_eq!(hist.counts, vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_scatter_drops_incomplete_pairs() {
        let snap = snapshot(vec![1, 2, 4]);
        assert_eq!(snap.scatter("x", "y").unwrap(), vec![(1.0, 2.0), (10.0, 5.0)]);
    }

    #[test]
    fn test_to_json() {
        let snap = snapshot(vec![2]);
        let value = snap.to_json();
        assert_eq!(value["columns"], json!(["x", "y", "label"]));
        assert_eq!(value["rows"][0]["x"], Value::Null);
        assert_eq!(value["rows"][0]["y"], json!(3));
        assert_eq!(value["rows"][0]["label"], json!("c"));
    }

    #[test]
    fn test_value_access() {
        let snap = snapshot(vec![1, 3]);
        assert_eq!(snap.value(1, "label").unwrap(), CellValue::String("d".to_string()));
        assert!(snap.value(2, "label").is_err());
        assert_eq!(
            snap.column_values("y").unwrap(),
            vec![CellValue::Int32(2), CellValue::Int32(4)]
        );
    }
}
