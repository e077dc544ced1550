/// Sort Controller
///
/// A two-state machine driving the order of the visible rows:
///
/// ```text
/// Unsorted             --request_sort(c)--> SortedBy(c, ascending)
/// SortedBy(c, asc)     --request_sort(c)--> SortedBy(c, !asc)
/// SortedBy(other, _)   --request_sort(c)--> SortedBy(c, ascending)
/// ```
///
/// Ordering is type-aware (numeric, lexicographic, chronological,
/// `false < true`). Ties are broken by row identity ascending in both
/// directions, so repeated sorts with equal keys are deterministic. Nulls are
/// placed last (or first, when configured) regardless of direction.

use crate::column::{CellRef, Column};
use crate::error::{GridError, GridResult};
use crate::store::{RowId, Schema};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum SortState {
    #[default]
    Unsorted,
    SortedBy { column: String, ascending: bool },
}

impl SortState {
    pub fn column(&self) -> Option<&str> {
        match self {
            SortState::Unsorted => None,
            SortState::SortedBy { column, .. } => Some(column),
        }
    }

    pub fn is_ascending(&self) -> Option<bool> {
        match self {
            SortState::Unsorted => None,
            SortState::SortedBy { ascending, .. } => Some(*ascending),
        }
    }

    /// The state after a sort request on `column`.
    pub fn next(&self, column: &str) -> SortState {
        let ascending = match self {
            SortState::SortedBy {
                column: current,
                ascending,
            } if current == column => !ascending,
            _ => true,
        };
        SortState::SortedBy {
            column: column.to_string(),
            ascending,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortController {
    state: SortState,
}

impl SortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    /// Advance the state machine for a click on `column`. An unknown column
    /// leaves the state untouched.
    pub fn request_sort(&mut self, column: &str, schema: &Schema) -> GridResult<&SortState> {
        if schema.get_column_index(column).is_none() {
            return Err(GridError::UnknownColumn(column.to_string()));
        }
        self.state = self.state.next(column);
        Ok(&self.state)
    }

    /// Return to source order.
    pub fn clear(&mut self) {
        self.state = SortState::Unsorted;
    }
}

/// Compare two non-null cells of the same column. Floats use a total order
/// (NaN after +inf).
fn compare_present(a: &CellRef<'_>, b: &CellRef<'_>) -> Ordering {
    match (a, b) {
        (CellRef::Int(a), CellRef::Int(b)) => a.cmp(b),
        (CellRef::Float(a), CellRef::Float(b)) => a.total_cmp(b),
        (CellRef::Int(a), CellRef::Float(b)) => (*a as f64).total_cmp(b),
        (CellRef::Float(a), CellRef::Int(b)) => a.total_cmp(&(*b as f64)),
        (CellRef::Text(a), CellRef::Text(b)) => a.cmp(b),
        (CellRef::Bool(a), CellRef::Bool(b)) => a.cmp(b),
        (CellRef::Date(a), CellRef::Date(b)) => a.cmp(b),
        (CellRef::DateTime(a), CellRef::DateTime(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Key ordering for one direction, nulls placed per `nulls_first`.
pub fn compare_cells(
    a: &CellRef<'_>,
    b: &CellRef<'_>,
    ascending: bool,
    nulls_first: bool,
) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) if nulls_first => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, true) if nulls_first => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let base = compare_present(a, b);
            if ascending {
                base
            } else {
                base.reverse()
            }
        }
    }
}

/// Reorder `rows` by the values of `column`, ties by row identity ascending.
/// Keys are extracted once, so the cost is O(M log M) comparisons on borrowed
/// cells.
pub fn sort_rows(column: &Column, rows: &mut [RowId], ascending: bool, nulls_first: bool) {
    let mut keyed: Vec<(CellRef<'_>, RowId)> = rows
        .iter()
        .map(|&row| (column.cell_ref(row).unwrap_or(CellRef::Null), row))
        .collect();

    keyed.sort_unstable_by(|(a, ra), (b, rb)| {
        compare_cells(a, b, ascending, nulls_first).then_with(|| ra.cmp(rb))
    });

    for (slot, (_, row)) in rows.iter_mut().zip(keyed) {
        *slot = row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{CellValue, ColumnType};

    fn schema() -> Schema {
        Schema::new(vec![
            ("A".to_string(), ColumnType::Int32, false),
            ("B".to_string(), ColumnType::String, false),
        ])
    }

    #[test]
    fn test_state_transitions() {
        let mut controller = SortController::new();
        assert_eq!(controller.state(), &SortState::Unsorted);

        let s = controller.request_sort("A", &schema()).unwrap().clone();
        assert_eq!(s.column(), Some("A"));
        assert_eq!(s.is_ascending(), Some(true));

        let s = controller.request_sort("A", &schema()).unwrap().clone();
        assert_eq!(s.is_ascending(), Some(false));

        let s = controller.request_sort("B", &schema()).unwrap().clone();
        assert_eq!(
            s,
            SortState::SortedBy {
                column: "B".to_string(),
                ascending: true
            }
        );

        controller.clear();
        assert_eq!(controller.state(), &SortState::Unsorted);
    }

    #[test]
    fn test_unknown_column_keeps_state() {
        let mut controller = SortController::new();
        controller.request_sort("A", &schema()).unwrap();
        let before = controller.state().clone();

        let err = controller.request_sort("nope", &schema()).unwrap_err();
        assert_eq!(err, GridError::UnknownColumn("nope".to_string()));
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn test_sort_rows_ties_by_identity() {
        let column = Column::from_values(
            "A",
            ColumnType::Int32,
            false,
            vec![3, 1, 2, 1, 3].into_iter().map(CellValue::Int32).collect(),
        )
        .unwrap();

        let mut rows: Vec<RowId> = vec![4, 3, 2, 1, 0];
        sort_rows(&column, &mut rows, true, false);
        assert_eq!(rows, vec![1, 3, 2, 0, 4]);

        sort_rows(&column, &mut rows, false, false);
        assert_eq!(rows, vec![0, 4, 2, 1, 3]);
    }

    #[test]
    fn test_sort_nulls_and_floats() {
        let column = Column::from_values(
            "F",
            ColumnType::Float64,
            true,
            vec![
                CellValue::Float64(2.5),
                CellValue::Null,
                CellValue::Float64(f64::NAN),
                CellValue::Float64(-1.0),
            ],
        )
        .unwrap();

        let mut rows: Vec<RowId> = (0..4).collect();
        sort_rows(&column, &mut rows, true, false);
        assert_eq!(rows, vec![3, 0, 2, 1]);

        sort_rows(&column, &mut rows, false, false);
        assert_eq!(rows, vec![2, 0, 3, 1]);

        sort_rows(&column, &mut rows, true, true);
        assert_eq!(rows, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_sort_text_and_bool() {
        let text = Column::from_values(
            "B",
            ColumnType::String,
            false,
            ["y", "Z", "x"]
                .iter()
                .map(|s| CellValue::String(s.to_string()))
                .collect(),
        )
        .unwrap();
        let mut rows: Vec<RowId> = vec![0, 1, 2];
        sort_rows(&text, &mut rows, true, false);
        // Byte-wise: uppercase before lowercase
        assert_eq!(rows, vec![1, 2, 0]);

        let flags = Column::from_values(
            "C",
            ColumnType::Bool,
            false,
            vec![CellValue::Bool(true), CellValue::Bool(false)],
        )
        .unwrap();
        let mut rows: Vec<RowId> = vec![0, 1];
        sort_rows(&flags, &mut rows, true, false);
        assert_eq!(rows, vec![1, 0]);
    }
}
