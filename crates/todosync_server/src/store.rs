//! Server-side list and item store.

use crate::clock::{Clock, SystemClock};
use crate::error::{ServerError, ServerResult};
use crate::ordering;
use parking_lot::RwLock;
use std::sync::Arc;
use todosync_protocol::{ItemId, ItemPatch, ListId, TodoItem, TodoList, UserId};
use tracing::debug;

struct StoreState {
    /// Lists in creation order.
    lists: Vec<TodoList>,
    /// Last priority stamp handed out.
    last_stamp: i64,
}

/// Authoritative mapping of users to lists to items.
///
/// Every operation takes the caller's verified `uid`. A list that exists but
/// belongs to someone else fails with `NotAuthorized` before any item lookup
/// or field validation. Each mutation holds the write lock for its whole
/// unit of work, including any reorder it triggers.
pub struct ListStore {
    state: RwLock<StoreState>,
    clock: Arc<dyn Clock>,
}

impl ListStore {
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(StoreState {
                lists: Vec::new(),
                last_stamp: 0,
            }),
            clock,
        }
    }

    /// Returns every list owned by `uid`, in stored order.
    pub fn list_all(&self, uid: UserId) -> Vec<TodoList> {
        self.state
            .read()
            .lists
            .iter()
            .filter(|list| list.owner == uid)
            .cloned()
            .collect()
    }

    /// Returns one list.
    pub fn get(&self, uid: UserId, list_id: ListId) -> ServerResult<TodoList> {
        let state = self.state.read();
        let list = state
            .lists
            .iter()
            .find(|list| list.id == list_id)
            .ok_or_else(list_not_found)?;
        check_owner(list, uid)?;
        Ok(list.clone())
    }

    /// Creates an empty list.
    pub fn create_list(&self, uid: UserId, name: &str) -> ServerResult<TodoList> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::Validation(
                "please provide a name for the todo list".into(),
            ));
        }

        let list = TodoList::new(uid, name);
        debug!(list = %list.id, owner = %uid, "created list");
        self.state.write().lists.push(list.clone());
        Ok(list)
    }

    /// Removes a list and all of its items.
    pub fn delete_list(&self, uid: UserId, list_id: ListId) -> ServerResult<()> {
        let mut state = self.state.write();
        let index = state
            .lists
            .iter()
            .position(|list| list.id == list_id)
            .ok_or_else(list_not_found)?;
        check_owner(&state.lists[index], uid)?;

        state.lists.remove(index);
        debug!(list = %list_id, "deleted list");
        Ok(())
    }

    /// Appends an open, non-priority item.
    ///
    /// New items land at the tail of the non-priority group, which is
    /// already canonical, so no reorder runs.
    pub fn add_item(&self, uid: UserId, list_id: ListId, text: &str) -> ServerResult<TodoList> {
        self.mutate(uid, list_id, |_, list| {
            let text = text.trim();
            if text.is_empty() {
                return Err(ServerError::Validation(
                    "please provide text for the todo item".into(),
                ));
            }
            list.items.push(TodoItem::new(text));
            Ok(())
        })
    }

    /// Applies a partial update to an item.
    ///
    /// Only a `priority` value that differs from the current flag sets or
    /// clears the stamp and reorders the list. Other fields are written in
    /// place. The patch is validated before anything is written.
    pub fn update_item(
        &self,
        uid: UserId,
        list_id: ListId,
        item_id: ItemId,
        patch: &ItemPatch,
    ) -> ServerResult<TodoList> {
        let clock = Arc::clone(&self.clock);
        self.mutate(uid, list_id, |last_stamp, list| {
            let text = match patch.text.as_deref().map(str::trim) {
                Some("") => {
                    return Err(ServerError::Validation("todo text cannot be empty".into()))
                }
                other => other,
            };

            let item = list.item_mut(&item_id).ok_or_else(item_not_found)?;

            if let Some(text) = text {
                item.text = text.to_string();
            }
            if let Some(completed) = patch.completed {
                item.completed = completed;
            }
            if let Some(due_date) = patch.due_date {
                item.due_date = due_date;
            }
            if let Some(due_time) = patch.due_time {
                item.due_time = due_time;
            }

            let flipped = match patch.priority {
                Some(priority) if priority != item.priority => {
                    item.priority = priority;
                    item.priority_timestamp =
                        priority.then(|| next_stamp(last_stamp, clock.now_millis()));
                    true
                }
                _ => false,
            };

            if flipped {
                ordering::reorder_in_place(&mut list.items);
                debug!(list = %list.id, item = %item_id, "priority changed, list reordered");
            }
            Ok(())
        })
    }

    /// Removes an item. Removal cannot break the canonical order.
    pub fn delete_item(
        &self,
        uid: UserId,
        list_id: ListId,
        item_id: ItemId,
    ) -> ServerResult<TodoList> {
        self.mutate(uid, list_id, |_, list| {
            let before = list.items.len();
            list.items.retain(|item| item.id != item_id);
            if list.items.len() == before {
                return Err(item_not_found());
            }
            Ok(())
        })
    }

    /// Returns every list, for snapshots.
    pub fn export(&self) -> (Vec<TodoList>, i64) {
        let state = self.state.read();
        (state.lists.clone(), state.last_stamp)
    }

    /// Replaces all contents, for snapshot restore.
    pub fn import(&self, lists: Vec<TodoList>, last_stamp: i64) {
        let mut state = self.state.write();
        state.lists = lists;
        state.last_stamp = last_stamp;
    }

    /// Runs `apply` on an owned list under the write lock and returns the
    /// list's new state. The list is left untouched if `apply` fails.
    fn mutate<F>(&self, uid: UserId, list_id: ListId, apply: F) -> ServerResult<TodoList>
    where
        F: FnOnce(&mut i64, &mut TodoList) -> ServerResult<()>,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let list = state
            .lists
            .iter_mut()
            .find(|list| list.id == list_id)
            .ok_or_else(list_not_found)?;
        check_owner(list, uid)?;

        let mut draft = list.clone();
        let mut stamp = state.last_stamp;
        apply(&mut stamp, &mut draft)?;

        *list = draft;
        state.last_stamp = stamp;
        Ok(list.clone())
    }
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a stamp strictly greater than every earlier one.
fn next_stamp(last: &mut i64, now: i64) -> i64 {
    *last = now.max(last.saturating_add(1));
    *last
}

fn check_owner(list: &TodoList, uid: UserId) -> ServerResult<()> {
    if list.owner == uid {
        Ok(())
    } else {
        Err(ServerError::NotAuthorized("user not authorized".into()))
    }
}

fn list_not_found() -> ServerError {
    ServerError::NotFound("todo list not found".into())
}

fn item_not_found() -> ServerError {
    ServerError::NotFound("todo item not found".into())
}
