/// GridView
///
/// The derived, user-facing state over an immutable `TabularStore`: the row
/// mask built from filter conditions, the sort order, the column projection
/// and the selection. The view maps view positions to source rows through
/// `view_to_source`, and back through an inverse index, both rebuilt whenever
/// the mask or the sort changes. Projection changes never touch the row list.
///
/// Every mutation notifies subscribers synchronously before returning.
///
/// # Examples
///
/// ```
/// use gridview::{CellValue, ColumnType, FilterCondition, GridView, TabularStore};
/// use std::sync::Arc;
///
/// let store = TabularStore::from_columns("t", vec![
///     ("A", ColumnType::Int32, vec![1, 2, 3, 2].into_iter().map(CellValue::Int32).collect()),
///     ("B", ColumnType::String, ["x", "y", "x", "z"].iter().map(|s| CellValue::String(s.to_string())).collect()),
/// ]).unwrap();
///
/// let mut view = GridView::new(Arc::new(store));
/// let report = view.apply_filter(&[FilterCondition::new("A", "== 2")]);
/// assert_eq!(report.match_count, 2);
///
/// view.request_sort("B").unwrap();
/// assert_eq!(view.cell(0, 1).unwrap(), CellValue::String("y".to_string()));
/// assert_eq!(view.source_row_identity(1).unwrap(), 3);
/// ```

use crate::column::{CellRef, CellValue};
use crate::columns::ColumnController;
use crate::config::ViewConfig;
use crate::error::{ConditionError, GridError, GridResult};
use crate::mask::{evaluate, FilterCondition, RowMask};
use crate::notify::{Notifier, SubscriptionId, ViewEvent};
use crate::selection::SelectionTracker;
use crate::snapshot::FilteredSnapshot;
use crate::sort::{sort_rows, SortController, SortState};
use crate::store::{RowId, TabularStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of `apply_filter`, for the filter UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    /// Rows passing the mask after the rebuild
    pub match_count: usize,
    pub count_changed: bool,
    /// Lines that contributed no constraint, in condition order
    pub errors: Vec<ConditionError>,
}

/// How the renderer should shade a view row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStyle {
    Plain,
    Striped,
    Selected,
}

/// Read access a grid widget needs to draw the view. Positions are view
/// positions; access may be sparse and out of order.
pub trait DataSource {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn column_name(&self, col: usize) -> Option<&str>;

    /// None when either position is out of bounds.
    fn cell(&self, row: usize, col: usize) -> Option<CellValue>;

    fn row_style(&self, row: usize) -> RowStyle;

    /// Cell text as the grid shows it. Null renders empty.
    fn cell_text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(|v| v.to_string()).unwrap_or_default()
    }
}

pub struct GridView {
    store: Arc<TabularStore>,
    config: ViewConfig,
    conditions: Vec<FilterCondition>,
    condition_errors: Vec<ConditionError>,
    mask: RowMask,
    /// View position -> source row
    view_to_source: Vec<RowId>,
    /// Source row -> view position
    source_to_view: Vec<Option<usize>>,
    columns: ColumnController,
    /// Store column indices of the visible columns, in display order
    visible_columns: Vec<usize>,
    sort: SortController,
    selection: SelectionTracker,
    notifier: Notifier,
}

impl GridView {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self::with_config(store, ViewConfig::default())
    }

    pub fn with_config(store: Arc<TabularStore>, config: ViewConfig) -> Self {
        let columns = ColumnController::new(store.schema());
        let visible_columns = columns.visible_indices();
        let mut view = GridView {
            mask: RowMask::all(store.len()),
            view_to_source: Vec::new(),
            source_to_view: Vec::new(),
            conditions: Vec::new(),
            condition_errors: Vec::new(),
            columns,
            visible_columns,
            sort: SortController::new(),
            selection: SelectionTracker::new(),
            notifier: Notifier::new(),
            config,
            store,
        };
        view.rebuild_rows();
        view
    }

    pub fn store(&self) -> &Arc<TabularStore> {
        &self.store
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Plot style for the presentation layer to apply.
    pub fn plot_style(&self) -> Option<&str> {
        self.config.plot_style.as_deref()
    }

    /// Mask-filter then sort. O(N + M log M).
    fn rebuild_rows(&mut self) {
        let started = Instant::now();
        self.view_to_source.clear();
        self.view_to_source.extend(self.mask.passing_rows());

        if let SortState::SortedBy { column, ascending } = self.sort.state() {
            if let Some(col) = self.store.column(column) {
                sort_rows(col, &mut self.view_to_source, *ascending, self.config.nulls_first);
            }
        }

        self.source_to_view.clear();
        self.source_to_view.resize(self.store.len(), None);
        for (position, &row) in self.view_to_source.iter().enumerate() {
            self.source_to_view[row] = Some(position);
        }

        log::debug!(
            "rebuilt {} visible rows ({:?}) in {:?}",
            self.view_to_source.len(),
            self.sort.state(),
            started.elapsed()
        );
    }

    // --- Filtering ---

    /// Rebuild the mask from `conditions`. Re-applying the current list is a
    /// no-op and fires nothing.
    pub fn apply_filter(&mut self, conditions: &[FilterCondition]) -> FilterReport {
        let previous = self.mask.count();
        if conditions == self.conditions.as_slice() {
            return FilterReport {
                match_count: previous,
                count_changed: false,
                errors: self.condition_errors.clone(),
            };
        }

        let outcome = evaluate(&self.store, conditions);
        self.conditions = conditions.to_vec();
        self.condition_errors = outcome.errors;

        for err in &self.condition_errors {
            self.notifier.emit(ViewEvent::ConditionFailed {
                line: err.line,
                column: err.column.clone(),
                message: err.message.clone(),
            });
        }

        let current = outcome.mask.count();
        if outcome.mask != self.mask {
            self.mask = outcome.mask;
            self.rebuild_rows();

            let generation = self.notifier.bump_generation();
            self.notifier.emit(ViewEvent::RowSetChanged { generation });
            if current != previous {
                self.notifier
                    .emit(ViewEvent::RowCountChanged { previous, current });
            }

            let dropped = self.selection.prune(&self.mask);
            if !dropped.is_empty() {
                log::debug!("pruned {} selected rows hidden by the filter", dropped.len());
                self.emit_selection();
            }
        }

        FilterReport {
            match_count: current,
            count_changed: current != previous,
            errors: self.condition_errors.clone(),
        }
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn condition_errors(&self) -> &[ConditionError] {
        &self.condition_errors
    }

    pub fn mask(&self) -> &RowMask {
        &self.mask
    }

    /// Row-set generation, bumped on every material mask change
    pub fn generation(&self) -> u64 {
        self.notifier.generation()
    }

    // --- Sorting ---

    /// Advance the sort state machine for `column` and reorder the rows.
    pub fn request_sort(&mut self, column: &str) -> GridResult<SortState> {
        let state = self.sort.request_sort(column, self.store.schema())?.clone();
        self.rebuild_rows();
        self.notifier.emit(ViewEvent::RowOrderChanged {
            sort: state.clone(),
        });
        Ok(state)
    }

    /// Back to source order. Returns false when already unsorted.
    pub fn clear_sort(&mut self) -> bool {
        if self.sort.state() == &SortState::Unsorted {
            return false;
        }
        self.sort.clear();
        self.rebuild_rows();
        self.notifier.emit(ViewEvent::RowOrderChanged {
            sort: SortState::Unsorted,
        });
        true
    }

    pub fn sort_state(&self) -> &SortState {
        self.sort.state()
    }

    // --- Projection ---

    fn columns_changed(&mut self) {
        self.visible_columns = self.columns.visible_indices();
        self.notifier.emit(ViewEvent::ColumnsChanged {
            columns: self.columns.current_order(),
        });
    }

    /// Show exactly `columns`, in order. On error the projection is unchanged.
    pub fn set_visible_columns<S: AsRef<str>>(&mut self, columns: &[S]) -> GridResult<()> {
        if self.columns.set_visible(columns)? {
            self.columns_changed();
        }
        Ok(())
    }

    pub fn swap_adjacent_by_display_position(&mut self, i: usize, j: usize) -> GridResult<()> {
        self.columns.swap_adjacent_by_display_position(i, j)?;
        self.columns_changed();
        Ok(())
    }

    pub fn move_column(&mut self, from: usize, to: usize) -> GridResult<()> {
        if self.columns.move_column(from, to)? {
            self.columns_changed();
        }
        Ok(())
    }

    /// Flip whether `column` is shown. Returns the new state.
    pub fn toggle_included(&mut self, column: &str) -> GridResult<bool> {
        let included = self.columns.toggle_included(column)?;
        self.columns_changed();
        Ok(included)
    }

    pub fn current_order(&self) -> Vec<String> {
        self.columns.current_order()
    }

    pub fn column_controller(&self) -> &ColumnController {
        &self.columns
    }

    /// Visible column names in display order
    pub fn visible_columns(&self) -> Vec<&str> {
        self.visible_columns
            .iter()
            .filter_map(|&idx| self.store.column_at(idx).map(|c| c.name()))
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.visible_columns.len()
    }

    // --- Positional access ---

    pub fn visible_row_count(&self) -> usize {
        self.view_to_source.len()
    }

    pub fn source_row_identity(&self, view_row: usize) -> GridResult<RowId> {
        self.view_to_source
            .get(view_row)
            .copied()
            .ok_or_else(|| GridError::out_of_range(view_row, self.view_to_source.len()))
    }

    /// View position of a source row, None when it does not pass the mask.
    pub fn view_position_of(&self, row: RowId) -> Option<usize> {
        self.source_to_view.get(row).copied().flatten()
    }

    pub fn cell_ref(&self, view_row: usize, view_col: usize) -> GridResult<CellRef<'_>> {
        let row = self.source_row_identity(view_row)?;
        let col = *self
            .visible_columns
            .get(view_col)
            .ok_or_else(|| GridError::out_of_range(view_col, self.visible_columns.len()))?;
        self.store
            .column_at(col)
            .and_then(|c| c.cell_ref(row))
            .ok_or_else(|| GridError::out_of_range(row, self.store.len()))
    }

    pub fn cell(&self, view_row: usize, view_col: usize) -> GridResult<CellValue> {
        let row = self.source_row_identity(view_row)?;
        let col = *self
            .visible_columns
            .get(view_col)
            .ok_or_else(|| GridError::out_of_range(view_col, self.visible_columns.len()))?;
        self.store.get_value_by_index(row, col)
    }

    pub fn row_style(&self, view_row: usize) -> GridResult<RowStyle> {
        let row = self.source_row_identity(view_row)?;
        Ok(if self.selection.is_selected(row) {
            RowStyle::Selected
        } else if self.config.stripe_rows && view_row % 2 == 0 {
            RowStyle::Striped
        } else {
            RowStyle::Plain
        })
    }

    // --- Selection ---

    fn emit_selection(&mut self) {
        self.notifier.emit(ViewEvent::SelectionChanged {
            selected: self.selection.selected_identities(),
        });
    }

    /// Select a visible source row. Hidden rows are rejected.
    pub fn select(&mut self, row: RowId) -> GridResult<()> {
        if self.selection.select(row, &self.mask)? {
            self.emit_selection();
        }
        Ok(())
    }

    pub fn deselect(&mut self, row: RowId) {
        if self.selection.deselect(row) {
            self.emit_selection();
        }
    }

    /// Returns the new membership of `row`.
    pub fn toggle(&mut self, row: RowId) -> GridResult<bool> {
        let selected = self.selection.toggle(row, &self.mask)?;
        self.emit_selection();
        Ok(selected)
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection();
        }
    }

    pub fn select_position(&mut self, view_row: usize) -> GridResult<()> {
        let row = self.source_row_identity(view_row)?;
        self.select(row)
    }

    pub fn toggle_position(&mut self, view_row: usize) -> GridResult<bool> {
        let row = self.source_row_identity(view_row)?;
        self.toggle(row)
    }

    /// Select every row between two view positions, inclusive, in either order.
    pub fn select_range(&mut self, from: usize, to: usize) -> GridResult<()> {
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        self.source_row_identity(hi)?;

        let mut changed = false;
        for position in lo..=hi {
            let row = self.view_to_source[position];
            changed |= self.selection.select(row, &self.mask)?;
        }
        if changed {
            self.emit_selection();
        }
        Ok(())
    }

    pub fn is_selected(&self, row: RowId) -> bool {
        self.selection.is_selected(row)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Selected source rows, ascending
    pub fn selected_identities(&self) -> Vec<RowId> {
        self.selection.selected_identities()
    }

    /// View positions of the selected rows, ascending
    pub fn selected_view_positions(&self) -> Vec<usize> {
        self.selection
            .selected_view_positions(|row| self.view_position_of(row))
    }

    // --- Notification ---

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // --- Plot consumers ---

    /// Rows passing the mask in source order over all columns.
    pub fn filtered_snapshot(&self) -> FilteredSnapshot {
        FilteredSnapshot::new(
            Arc::clone(&self.store),
            self.mask.passing_rows().collect(),
            self.notifier.generation(),
        )
    }
}

impl DataSource for GridView {
    fn row_count(&self) -> usize {
        self.visible_row_count()
    }

    fn column_count(&self) -> usize {
        self.visible_columns.len()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        let idx = *self.visible_columns.get(col)?;
        self.store.column_at(idx).map(|c| c.name())
    }

    fn cell(&self, row: usize, col: usize) -> Option<CellValue> {
        GridView::cell(self, row, col).ok()
    }

    fn row_style(&self, row: usize) -> RowStyle {
        GridView::row_style(self, row).unwrap_or(RowStyle::Plain)
    }
}

impl std::fmt::Debug for GridView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridView")
            .field("store", &self.store.name())
            .field("visible_rows", &self.view_to_source.len())
            .field("columns", &self.columns.current_order())
            .field("sort", self.sort.state())
            .field("selected", &self.selection.len())
            .finish()
    }
}
