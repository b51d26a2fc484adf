//! Registered users.

use crate::error::{ServerError, ServerResult};
use crate::password::{hash_password, verify_password};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use todosync_protocol::{Profile, UserId};
use tracing::info;

/// A registered user. Never mutated by list operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique, lower-cased email.
    pub email: String,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
}

impl User {
    /// Returns the public view of this user.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// In-memory user registry.
#[derive(Default)]
pub struct UserRegistry {
    users: RwLock<Vec<User>>,
}

impl UserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user.
    pub fn register(&self, name: &str, email: &str, password: &str) -> ServerResult<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || password.is_empty() || !email.contains('@') {
            return Err(ServerError::Validation("invalid user data".into()));
        }
        if self.find_by_email(&email).is_some() {
            return Err(ServerError::Conflict("user already exists".into()));
        }

        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
        };

        let mut users = self.users.write();
        // Re-check under the write lock; hashing ran unlocked.
        if users.iter().any(|u| u.email == user.email) {
            return Err(ServerError::Conflict("user already exists".into()));
        }
        users.push(user.clone());
        info!(user = %user.id, "registered user");
        Ok(user)
    }

    /// Checks a login. Unknown email and wrong password fail identically.
    pub fn authenticate(&self, email: &str, password: &str) -> ServerResult<User> {
        let invalid = || ServerError::AuthenticationFailed("invalid credentials".into());
        let user = self.find_by_email(&normalize_email(email)).ok_or_else(invalid)?;
        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(invalid())
        }
    }

    /// Looks up a user by id.
    pub fn get(&self, id: UserId) -> ServerResult<User> {
        self.users
            .read()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ServerError::NotFound("user not found".into()))
    }

    /// Returns every user, for snapshots.
    pub fn export(&self) -> Vec<User> {
        self.users.read().clone()
    }

    /// Replaces all users, for snapshot restore.
    pub fn import(&self, users: Vec<User>) {
        *self.users.write() = users;
    }

    /// Returns the number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns true if nobody has registered.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().iter().find(|u| u.email == email).cloned()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_login() {
        let registry = UserRegistry::new();
        let user = registry.register("Ada", " Ada@Example.com ", "secret").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password_hash, "secret");

        let logged_in = registry.authenticate("ADA@example.com", "secret").unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(registry.get(user.id).unwrap().profile().name, "Ada");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let registry = UserRegistry::new();
        registry.register("Ada", "ada@example.com", "secret").unwrap();
        let err = registry.register("Other", "ADA@example.com", "x").unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_registration() {
        let registry = UserRegistry::new();
        for (name, email, password) in [
            ("", "a@b.c", "pw"),
            ("Ada", "no-at-sign", "pw"),
            ("Ada", "a@b.c", ""),
        ] {
            assert!(matches!(
                registry.register(name, email, password),
                Err(ServerError::Validation(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn bad_credentials() {
        let registry = UserRegistry::new();
        registry.register("Ada", "ada@example.com", "secret").unwrap();

        let wrong_password = registry.authenticate("ada@example.com", "nope").unwrap_err();
        let unknown = registry.authenticate("bob@example.com", "secret").unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown.to_string());
        assert_eq!(unknown.status_code(), 401);
    }

    #[test]
    fn unknown_user_lookup() {
        let registry = UserRegistry::new();
        assert_eq!(registry.get(UserId::new()).unwrap_err().status_code(), 404);
    }
}
