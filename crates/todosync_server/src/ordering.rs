//! Canonical item ordering.
//!
//! Priority items come first, most recently prioritized at the front.
//! Everything else keeps its relative order. The store calls [`reorder`]
//! exactly once per priority flip, inside the same write as the flip.

use std::cmp::Ordering;
use todosync_protocol::TodoItem;

/// Compares two items for the canonical order.
///
/// Two non-priority items compare equal, so a stable sort leaves them in
/// insertion order. Equal priority stamps also compare equal.
pub fn compare(a: &TodoItem, b: &TodoItem) -> Ordering {
    match (a.priority, b.priority) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => b.priority_timestamp.cmp(&a.priority_timestamp),
        (false, false) => Ordering::Equal,
    }
}

/// Returns the items in canonical order.
pub fn reorder(mut items: Vec<TodoItem>) -> Vec<TodoItem> {
    reorder_in_place(&mut items);
    items
}

/// Sorts a slice into canonical order. `sort_by` is stable.
pub fn reorder_in_place(items: &mut [TodoItem]) {
    items.sort_by(compare);
}

/// Returns true if the items already satisfy the canonical order and every
/// item's priority stamp agrees with its flag.
pub fn is_canonical(items: &[TodoItem]) -> bool {
    items.iter().all(TodoItem::priority_is_consistent)
        && items
            .windows(2)
            .all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater)
}
