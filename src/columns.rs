/// Column Order and Visibility
///
/// Every store column is tracked as an entry carrying an `included` flag.
/// The visible projection is the included entries in entry order. Reordering
/// moves an entry (and its flag) as a unit; toggling inclusion never changes
/// the order.
///
/// Display positions always refer to positions in `current_order()`.

use crate::error::{GridError, GridResult};
use crate::store::Schema;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub name: String,
    /// Position of the column in the store schema
    pub source_index: usize,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnController {
    entries: Vec<ColumnEntry>,
}

impl ColumnController {
    /// All schema columns, included, in schema order.
    pub fn new(schema: &Schema) -> Self {
        let entries = schema
            .get_column_names()
            .into_iter()
            .enumerate()
            .map(|(source_index, name)| ColumnEntry {
                name: name.to_string(),
                source_index,
                included: true,
            })
            .collect();
        ColumnController { entries }
    }

    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    /// Included column names in display order
    pub fn current_order(&self) -> Vec<String> {
        self.included().map(|e| e.name.clone()).collect()
    }

    /// Store column indices of the visible columns, in display order
    pub fn visible_indices(&self) -> Vec<usize> {
        self.included().map(|e| e.source_index).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.included().count()
    }

    fn included(&self) -> impl Iterator<Item = &ColumnEntry> + '_ {
        self.entries.iter().filter(|e| e.included)
    }

    fn entry_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Entry index of the column shown at `position`.
    fn entry_at_display(&self, position: usize) -> GridResult<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.included)
            .nth(position)
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                GridError::projection(format!(
                    "display position {} out of range [0, {})",
                    position,
                    self.visible_len()
                ))
            })
    }

    /// Make exactly `columns` visible, in the given order. Columns not listed
    /// become excluded and keep their previous relative order after the
    /// listed ones. Returns true when the visible order changed.
    pub fn set_visible<S: AsRef<str>>(&mut self, columns: &[S]) -> GridResult<bool> {
        let mut seen = HashSet::with_capacity(columns.len());
        let mut listed = Vec::with_capacity(columns.len());
        for name in columns {
            let name = name.as_ref();
            let idx = self
                .entry_index(name)
                .ok_or_else(|| GridError::projection(format!("unknown column '{}'", name)))?;
            if !seen.insert(idx) {
                return Err(GridError::projection(format!("duplicate column '{}'", name)));
            }
            listed.push(idx);
        }

        let before = self.current_order();
        let mut reordered: Vec<ColumnEntry> = listed
            .iter()
            .map(|&idx| ColumnEntry {
                included: true,
                ..self.entries[idx].clone()
            })
            .collect();
        reordered.extend(
            self.entries
                .iter()
                .enumerate()
                .filter(|(idx, _)| !seen.contains(idx))
                .map(|(_, e)| ColumnEntry {
                    included: false,
                    ..e.clone()
                }),
        );
        self.entries = reordered;

        Ok(self.current_order() != before)
    }

    /// Swap the columns shown at display positions `i` and `j`, which must be
    /// adjacent.
    pub fn swap_adjacent_by_display_position(&mut self, i: usize, j: usize) -> GridResult<()> {
        if i.abs_diff(j) != 1 {
            return Err(GridError::projection(format!(
                "positions {} and {} are not adjacent",
                i, j
            )));
        }
        let a = self.entry_at_display(i)?;
        let b = self.entry_at_display(j)?;
        self.entries.swap(a, b);
        Ok(())
    }

    /// Drag the column at display position `from` to `to` as a sequence of
    /// adjacent swaps. Returns true when anything moved.
    pub fn move_column(&mut self, from: usize, to: usize) -> GridResult<bool> {
        let len = self.visible_len();
        for position in [from, to] {
            if position >= len {
                return Err(GridError::projection(format!(
                    "display position {} out of range [0, {})",
                    position, len
                )));
            }
        }

        let mut current = from;
        while current < to {
            self.swap_adjacent_by_display_position(current, current + 1)?;
            current += 1;
        }
        while current > to {
            self.swap_adjacent_by_display_position(current, current - 1)?;
            current -= 1;
        }
        Ok(from != to)
    }

    /// Flip inclusion of `name`. Returns the new inclusion state.
    pub fn toggle_included(&mut self, name: &str) -> GridResult<bool> {
        let idx = self
            .entry_index(name)
            .ok_or_else(|| GridError::projection(format!("unknown column '{}'", name)))?;
        let entry = &mut self.entries[idx];
        entry.included = !entry.included;
        Ok(entry.included)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    fn controller() -> ColumnController {
        let schema = Schema::new(
            ["A", "B", "C", "D"]
                .iter()
                .map(|n| (n.to_string(), ColumnType::Int64, false))
                .collect(),
        );
        ColumnController::new(&schema)
    }

    #[test]
    fn test_default_is_schema_order() {
        let c = controller();
        assert_eq!(c.current_order(), vec!["A", "B", "C", "D"]);
        assert_eq!(c.visible_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_set_visible() {
        let mut c = controller();
        assert!(c.set_visible(&["C", "A"]).unwrap());
        assert_eq!(c.current_order(), vec!["C", "A"]);
        assert_eq!(c.visible_indices(), vec![2, 0]);

        let names: Vec<_> = c.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B", "D"]);

        assert!(!c.set_visible(&["C", "A"]).unwrap());
    }

    #[test]
    fn test_set_visible_rejects_bad_lists() {
        let mut c = controller();
        c.set_visible(&["B", "A"]).unwrap();
        let before = c.clone();

        assert!(matches!(
            c.set_visible(&["A", "X"]),
            Err(GridError::InvalidProjection { .. })
        ));
        assert!(matches!(
            c.set_visible(&["A", "A"]),
            Err(GridError::InvalidProjection { .. })
        ));
        assert_eq!(c, before);
    }

    #[test]
    fn test_swap_adjacent() {
        let mut c = controller();
        c.swap_adjacent_by_display_position(1, 2).unwrap();
        assert_eq!(c.current_order(), vec!["A", "C", "B", "D"]);

        c.swap_adjacent_by_display_position(1, 0).unwrap();
        assert_eq!(c.current_order(), vec!["C", "A", "B", "D"]);

        assert!(c.swap_adjacent_by_display_position(0, 2).is_err());
        assert!(c.swap_adjacent_by_display_position(3, 4).is_err());
        assert_eq!(c.current_order(), vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_swap_skips_excluded_columns() {
        let mut c = controller();
        c.toggle_included("B").unwrap();
        assert_eq!(c.current_order(), vec!["A", "C", "D"]);

        c.swap_adjacent_by_display_position(0, 1).unwrap();
        assert_eq!(c.current_order(), vec!["C", "A", "D"]);

        // Excluded column keeps its slot; flag travels with the entry
        c.toggle_included("B").unwrap();
        assert_eq!(c.current_order(), vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_move_column() {
        let mut c = controller();
        assert!(c.move_column(0, 3).unwrap());
        assert_eq!(c.current_order(), vec!["B", "C", "D", "A"]);

        assert!(c.move_column(3, 1).unwrap());
        assert_eq!(c.current_order(), vec!["B", "A", "C", "D"]);

        assert!(!c.move_column(2, 2).unwrap());
        assert!(c.move_column(0, 4).is_err());
    }

    #[test]
    fn test_toggle_included() {
        let mut c = controller();
        assert!(!c.toggle_included("D").unwrap());
        assert_eq!(c.visible_len(), 3);
        assert!(c.toggle_included("D").unwrap());
        assert!(c.toggle_included("nope").is_err());
    }
}
