/// Selection Tracker
///
/// Selection is stored as a set of source row identities, never as view
/// positions, so it survives sorting and column projection unchanged. View
/// positions are derived on demand through the view's inverse index.
///
/// Only rows passing the current mask can be selected. When the mask is
/// rebuilt, identities that no longer pass are pruned.

use crate::error::{GridError, GridResult};
use crate::mask::RowMask;
use crate::store::RowId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<RowId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `row`. Returns true when the selection changed.
    pub fn select(&mut self, row: RowId, mask: &RowMask) -> GridResult<bool> {
        if !mask.get(row) {
            return Err(GridError::RowNotVisible(row));
        }
        Ok(self.selected.insert(row))
    }

    /// Deselect `row`. Deselecting a row that is not selected is a no-op.
    pub fn deselect(&mut self, row: RowId) -> bool {
        self.selected.remove(&row)
    }

    /// Flip membership of `row`. Returns the new membership.
    pub fn toggle(&mut self, row: RowId, mask: &RowMask) -> GridResult<bool> {
        if self.selected.remove(&row) {
            return Ok(false);
        }
        self.select(row, mask)?;
        Ok(true)
    }

    /// Returns true when anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.selected.is_empty();
        self.selected.clear();
        had_any
    }

    pub fn is_selected(&self, row: RowId) -> bool {
        self.selected.contains(&row)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected identities in ascending order
    pub fn selected_identities(&self) -> Vec<RowId> {
        self.selected.iter().copied().collect()
    }

    /// Map the selection to view positions using `position_of`, ascending.
    /// Identities without a position are skipped.
    pub fn selected_view_positions<F>(&self, position_of: F) -> Vec<usize>
    where
        F: Fn(RowId) -> Option<usize>,
    {
        let mut positions: Vec<usize> = self
            .selected
            .iter()
            .filter_map(|&row| position_of(row))
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Drop identities that no longer pass `mask`. Returns the dropped rows.
    pub fn prune(&mut self, mask: &RowMask) -> Vec<RowId> {
        let dropped: Vec<RowId> = self
            .selected
            .iter()
            .copied()
            .filter(|&row| !mask.get(row))
            .collect();
        for row in &dropped {
            self.selected.remove(row);
        }
        dropped
    }
}
