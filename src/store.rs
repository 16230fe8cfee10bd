//! The fixed in-memory user directory.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// A user record. Immutable once seeded; identified by `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Read-only mapping from user id to [`User`].
///
/// Populated once before the first request is served and never written to
/// afterward, so it can be shared across request handlers without locking.
#[derive(Clone, Debug, Default)]
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    /// The fixed records served by this deployment.
    pub fn seeded() -> Self {
        Self::from_users([
            User {
                id: "1".to_string(),
                name: "Alice".to_string(),
            },
            User {
                id: "2".to_string(),
                name: "Bob".to_string(),
            },
        ])
    }

    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
        }
    }

    /// Look a user up by id. Absence is not an error.
    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_contains_the_fixed_records() {
        let store = UserStore::seeded();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("1").map(|user| user.name.as_str()), Some("Alice"));
        assert_eq!(store.get("2").map(|user| user.name.as_str()), Some("Bob"));
    }

    #[test]
    fn missing_ids_resolve_to_none() {
        let store = UserStore::seeded();
        assert_eq!(store.get("3"), None);
        assert_eq!(store.get(""), None);
    }
}
