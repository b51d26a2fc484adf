//! List and item documents.

use crate::ids::{ItemId, ListId, UserId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A single task entry.
///
/// `priority_timestamp` holds the epoch milliseconds at which `priority`
/// was last switched on, and is `None` whenever `priority` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Item identifier.
    pub id: ItemId,
    /// Task text, never empty.
    pub text: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Optional due time.
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    /// Priority flag.
    #[serde(default)]
    pub priority: bool,
    /// When priority was last assigned.
    #[serde(default)]
    pub priority_timestamp: Option<i64>,
}

impl TodoItem {
    /// Creates an open, non-priority item.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            completed: false,
            due_date: None,
            due_time: None,
            priority: false,
            priority_timestamp: None,
        }
    }

    /// Returns true if the priority flag and its timestamp agree.
    pub fn priority_is_consistent(&self) -> bool {
        self.priority == self.priority_timestamp.is_some()
    }
}

/// A named, ordered collection of items owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    /// List identifier.
    pub id: ListId,
    /// Display name.
    pub name: String,
    /// Owning user.
    pub owner: UserId,
    /// Items in canonical order.
    #[serde(default)]
    pub items: Vec<TodoItem>,
}

impl TodoList {
    /// Creates an empty list.
    pub fn new(owner: UserId, name: impl Into<String>) -> Self {
        Self {
            id: ListId::new(),
            name: name.into(),
            owner,
            items: Vec::new(),
        }
    }

    /// Looks up an item.
    pub fn item(&self, id: &ItemId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Looks up an item mutably.
    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut TodoItem> {
        self.items.iter_mut().find(|item| item.id == *id)
    }

    /// Returns the item identifiers in their current order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// A partial update to an item.
///
/// Absent fields are left untouched. `due_date` and `due_time` distinguish
/// "absent" (`None`) from "clear" (`Some(None)`, sent as JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    /// New text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// New due date, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    /// New due time, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_time: Option<Option<NaiveTime>>,
    /// New priority flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,
}

impl ItemPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the completion flag.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Sets or clears the due date.
    pub fn with_due_date(mut self, date: Option<NaiveDate>) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Sets or clears the due time.
    pub fn with_due_time(mut self, time: Option<NaiveTime>) -> Self {
        self.due_time = Some(time);
        self
    }

    /// Sets the priority flag.
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
            && self.due_time.is_none()
            && self.priority.is_none()
    }
}

/// A present JSON `null` becomes `Some(None)`; absence is handled by `default`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_defaults() {
        let item = TodoItem::new("buy milk");
        assert!(!item.completed);
        assert!(!item.priority);
        assert!(item.priority_timestamp.is_none());
        assert!(item.priority_is_consistent());
    }

    #[test]
    fn item_uses_camel_case_fields() {
        let mut item = TodoItem::new("call mom");
        item.priority = true;
        item.priority_timestamp = Some(42);
        item.due_date = NaiveDate::from_ymd_opt(2024, 5, 1);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["priorityTimestamp"], 42);
        assert_eq!(json["dueDate"], "2024-05-01");
        assert!(json["dueTime"].is_null());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let absent: ItemPatch = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(absent.due_date, None);
        assert_eq!(absent.completed, Some(true));

        let cleared: ItemPatch = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: ItemPatch = serde_json::from_str(r#"{"dueDate":"2024-02-29"}"#).unwrap();
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2024, 2, 29)));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = ItemPatch::new().with_priority(true).with_due_time(None);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"dueTime":null,"priority":true}"#);
    }

    #[test]
    fn empty_patch() {
        assert!(ItemPatch::new().is_empty());
        assert!(!ItemPatch::new().with_completed(false).is_empty());
    }

    #[test]
    fn list_item_lookup() {
        let mut list = TodoList::new(UserId::new(), "Main");
        let item = TodoItem::new("a");
        let id = item.id;
        list.items.push(item);

        assert_eq!(list.item(&id).map(|i| i.text.as_str()), Some("a"));
        list.item_mut(&id).unwrap().completed = true;
        assert!(list.item(&id).unwrap().completed);
        assert!(list.item(&ItemId::new()).is_none());
        assert_eq!(list.item_ids(), vec![id]);
    }
}
