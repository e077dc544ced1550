/// GridView error types
///
/// Request-level failures (projection, sort, selection, positional access) are
/// `GridError` values returned through `GridResult`. Failures of a single filter
/// line are not errors of the request: they are collected as `ConditionError`
/// values next to the mask so that every other line still applies.

use serde::Serialize;
use thiserror::Error;

/// Errors returned by store construction and view requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// A projection request named an unknown or duplicate column, or used
    /// display positions that do not exist.
    #[error("Invalid projection: {reason}")]
    InvalidProjection { reason: String },

    /// Positional access beyond the current bound of the view.
    #[error("Index {index} out of range [0, {bound})")]
    IndexOutOfRange { index: usize, bound: usize },

    /// A request named a column the store does not have.
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    /// A numeric extraction named a column that holds no numbers.
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// A selection request named a row that does not pass the current mask.
    #[error("Row {0} is not visible under the current filter")]
    RowNotVisible(usize),

    /// The store could not be built from the supplied rows.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Input handed to a loader could not be turned into a store.
    #[error("Load error: {0}")]
    Load(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl GridError {
    pub(crate) fn projection(reason: impl Into<String>) -> Self {
        GridError::InvalidProjection {
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(index: usize, bound: usize) -> Self {
        GridError::IndexOutOfRange { index, bound }
    }
}

pub type GridResult<T> = Result<T, GridError>;

/// Why a single filter line failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionErrorKind {
    /// The expression does not match the predicate grammar.
    Parse,
    /// The condition names a column the store does not have.
    UnknownColumn,
    /// The literal or operator cannot be applied to the column's type.
    TypeMismatch,
}

/// A filter line that contributed no constraint, with a message for the field
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("filter line {line} ({column}): {message}")]
pub struct ConditionError {
    /// Position of the condition in the list handed to the mask engine
    pub line: usize,
    pub column: String,
    pub expression: String,
    pub kind: ConditionErrorKind,
    pub message: String,
}
