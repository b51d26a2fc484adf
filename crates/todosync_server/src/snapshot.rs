//! JSON snapshot persistence.

use crate::error::ServerResult;
use crate::store::ListStore;
use crate::users::{User, UserRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use todosync_protocol::TodoList;
use tracing::{debug, info};

/// Everything the server persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Registered users.
    pub users: Vec<User>,
    /// All lists, in stored order.
    pub lists: Vec<TodoList>,
    /// Last priority stamp issued.
    pub last_stamp: i64,
}

impl Snapshot {
    /// Captures the current state.
    pub fn capture(users: &UserRegistry, store: &ListStore) -> Self {
        let (lists, last_stamp) = store.export();
        Self {
            users: users.export(),
            lists,
            last_stamp,
        }
    }

    /// Loads the state back into a registry and store.
    pub fn restore(self, users: &UserRegistry, store: &ListStore) {
        users.import(self.users);
        store.import(self.lists, self.last_stamp);
    }

    /// Reads a snapshot; a missing file yields `None`.
    pub fn load(path: &Path) -> ServerResult<Option<Self>> {
        match fs::read(path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                info!(
                    path = %path.display(),
                    users = snapshot.users.len(),
                    lists = snapshot.lists.len(),
                    "loaded snapshot"
                );
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the snapshot next to `path` and renames it into place.
    pub fn save(&self, path: &Path) -> ServerResult<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "saved snapshot");
        Ok(())
    }
}
