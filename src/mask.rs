/// Row Mask Engine
///
/// Turns an ordered list of per-column filter conditions into a boolean mask
/// over the source rows. Conditions combine with AND. A line that fails to
/// parse, names an unknown column, or does not type-check contributes no
/// constraint and is reported; the remaining lines still apply.
///
/// The mask is always rebuilt wholesale from the full condition list.

use crate::error::{ConditionError, ConditionErrorKind};
use crate::expr::{parse_for_column, ExprError};
use crate::store::{RowId, TabularStore};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One filter line: a column and a predicate expression on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub expression: String,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, expression: impl Into<String>) -> Self {
        FilterCondition {
            column: column.into(),
            expression: expression.into(),
        }
    }

    /// Blank expressions are inert.
    pub fn is_blank(&self) -> bool {
        self.expression.trim().is_empty()
    }
}

impl<C: Into<String>, E: Into<String>> From<(C, E)> for FilterCondition {
    fn from((column, expression): (C, E)) -> Self {
        FilterCondition::new(column, expression)
    }
}

/// Boolean vector over source rows; `true` means the row passes every active
/// condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMask {
    bits: Vec<bool>,
    passing: usize,
}

impl RowMask {
    pub fn all(len: usize) -> Self {
        RowMask {
            bits: vec![true; len],
            passing: len,
        }
    }

    fn from_bits(bits: Vec<bool>) -> Self {
        let passing = bits.iter().filter(|b| **b).count();
        RowMask { bits, passing }
    }

    /// Number of source rows (N)
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of rows passing (M)
    pub fn count(&self) -> usize {
        self.passing
    }

    pub fn get(&self, row: RowId) -> bool {
        self.bits.get(row).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Passing row identities in source order
    pub fn passing_rows(&self) -> impl Iterator<Item = RowId> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(row, pass)| pass.then_some(row))
    }
}

/// Result of evaluating a condition list.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOutcome {
    pub mask: RowMask,
    /// Failed lines in condition order
    pub errors: Vec<ConditionError>,
    /// Number of lines that constrained the mask
    pub applied: usize,
}

/// Evaluate `conditions` against `store`.
///
/// ```
/// use gridview::{evaluate, CellValue, ColumnType, FilterCondition, TabularStore};
///
/// let store = TabularStore::from_columns("t", vec![
///     ("A", ColumnType::Int32, vec![1, 2, 3, 2].into_iter().map(CellValue::Int32).collect()),
/// ]).unwrap();
///
/// let outcome = evaluate(&store, &[FilterCondition::new("A", "== 2")]);
/// assert_eq!(outcome.mask.as_slice(), &[false, true, false, true]);
/// assert!(outcome.errors.is_empty());
/// ```
pub fn evaluate(store: &TabularStore, conditions: &[FilterCondition]) -> MaskOutcome {
    let started = Instant::now();
    let mut bits = vec![true; store.len()];
    let mut errors = Vec::new();
    let mut applied = 0;

    for (line, condition) in conditions.iter().enumerate() {
        if condition.is_blank() {
            continue;
        }

        let fail = |kind: ConditionErrorKind, message: String| ConditionError {
            line,
            column: condition.column.clone(),
            expression: condition.expression.clone(),
            kind,
            message,
        };

        let column = match store.column(&condition.column) {
            Some(column) => column,
            None => {
                let err = fail(
                    ConditionErrorKind::UnknownColumn,
                    format!("Column '{}' not found", condition.column),
                );
                log::warn!("{}", err);
                errors.push(err);
                continue;
            }
        };

        let predicate = match parse_for_column(&condition.expression, column.column_type()) {
            Ok(predicate) => predicate,
            Err(e) => {
                let kind = match e {
                    ExprError::Parse(_) => ConditionErrorKind::Parse,
                    ExprError::TypeMismatch(_) => ConditionErrorKind::TypeMismatch,
                };
                let err = fail(kind, e.to_string());
                log::warn!("{}", err);
                errors.push(err);
                continue;
            }
        };

        for (row, bit) in bits.iter_mut().enumerate() {
            if *bit {
                *bit = column
                    .cell_ref(row)
                    .is_some_and(|cell| predicate.matches(cell));
            }
        }
        applied += 1;
    }

    let mask = RowMask::from_bits(bits);
    log::debug!(
        "mask rebuilt: {}/{} rows pass, {} conditions applied, {} failed ({:?})",
        mask.count(),
        mask.len(),
        applied,
        errors.len(),
        started.elapsed()
    );

    MaskOutcome {
        mask,
        errors,
        applied,
    }
}
