/// Change Notification for GridView
///
/// Dependent displays (plot panels, the status line) subscribe to a view and
/// are called back synchronously, inside the operation that changed the view
/// and before that operation returns. There is no buffering and no async
/// delivery.
///
/// # Event Types
///
/// - `RowCountChanged`: the number of visible rows changed after a mask rebuild
/// - `RowSetChanged`: the set of rows passing the mask changed
/// - `RowOrderChanged`: the visible rows were reordered by a sort change
/// - `ColumnsChanged`: the visible columns or their order changed
/// - `ConditionFailed`: a filter line was rejected
/// - `SelectionChanged`: the selected row identities changed
///
/// Every material row-set change bumps a generation counter, so consumers that
/// cache derived data (histogram bins, scatter points) can tell whether their
/// cache is stale without comparing masks.

use crate::sort::SortState;
use crate::store::RowId;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    RowCountChanged {
        previous: usize,
        current: usize,
    },
    RowSetChanged {
        generation: u64,
    },
    RowOrderChanged {
        sort: SortState,
    },
    ColumnsChanged {
        columns: Vec<String>,
    },
    ConditionFailed {
        line: usize,
        column: String,
        message: String,
    },
    SelectionChanged {
        selected: Vec<RowId>,
    },
}

impl ViewEvent {
    /// True for events that change which rows a plot consumer would read.
    pub fn affects_snapshot(&self) -> bool {
        matches!(
            self,
            ViewEvent::RowCountChanged { .. } | ViewEvent::RowSetChanged { .. }
        )
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&ViewEvent)>;

/// Synchronous fan-out of view events to subscribed listeners, in
/// subscription order.
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    generation: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Current row-set generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance the row-set generation and return the new value.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn emit(&mut self, event: ViewEvent) {
        log::trace!("view event: {:?}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_all_listeners_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::new();

        for tag in ["first", "second"] {
            let log = log.clone();
            notifier.subscribe(move |event| {
                if let ViewEvent::RowCountChanged { current, .. } = event {
                    log.borrow_mut().push((tag, *current));
                }
            });
        }

        notifier.emit(ViewEvent::RowCountChanged {
            previous: 4,
            current: 2,
        });
        assert_eq!(*log.borrow(), vec![("first", 2), ("second", 2)]);
    }

    #[test]
    fn test_unsubscribe() {
        let hits = Rc::new(RefCell::new(0));
        let mut notifier = Notifier::new();

        let counter = hits.clone();
        let id = notifier.subscribe(move |_| *counter.borrow_mut() += 1);
        notifier.emit(ViewEvent::RowSetChanged { generation: 1 });

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.emit(ViewEvent::RowSetChanged { generation: 2 });

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_generation() {
        let mut notifier = Notifier::new();
        assert_eq!(notifier.generation(), 0);
        assert_eq!(notifier.bump_generation(), 1);
        assert_eq!(notifier.generation(), 1);
        assert!(ViewEvent::RowSetChanged { generation: 1 }.affects_snapshot());
        assert!(!ViewEvent::ColumnsChanged { columns: vec![] }.affects_snapshot());
    }
}
