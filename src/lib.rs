/// GridView - Filterable, Sortable Data Grid Engine
///
/// The model behind an interactive table viewer: an immutable columnar store,
/// a view that filters rows with per-column predicate expressions, sorts them
/// by a clicked column, projects and reorders columns, and tracks a selection
/// by stable row identity. Plot consumers read filtered snapshots; displays
/// subscribe to synchronous change events.

pub mod column;
pub mod columns;
pub mod config;
pub mod error;
pub mod expr;
pub mod interner;
pub mod load;
pub mod mask;
pub mod notify;
pub mod selection;
pub mod snapshot;
pub mod sort;
pub mod store;
pub mod temporal;
pub mod view;

pub use column::{CellRef, CellValue, Column, ColumnType};
pub use columns::{ColumnController, ColumnEntry};
pub use config::ViewConfig;
pub use error::{ConditionError, ConditionErrorKind, GridError, GridResult};
pub use expr::{
    compile, parse_for_column, parse_predicate, CompareOp, ExprError, Literal, Predicate,
    TypedPredicate,
};
pub use interner::{InternerStats, StringId, StringInterner};
pub use mask::{evaluate, FilterCondition, MaskOutcome, RowMask};
pub use notify::{SubscriptionId, ViewEvent};
pub use selection::SelectionTracker;
pub use snapshot::{FilteredSnapshot, Histogram};
pub use sort::{SortController, SortState};
pub use store::{RowId, Schema, StoreBuilder, TabularStore};
pub use view::{DataSource, FilterReport, GridView, RowStyle};
