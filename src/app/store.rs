//! In-memory user records.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Kept as the client sent it (integer or float).
    pub age: serde_json::Number,
    pub hobbies: Vec<String>,
}

/// Fields of a user that may be replaced by an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub age: Option<serde_json::Number>,
    pub hobbies: Option<Vec<String>>,
}

/// Insertion-ordered user collection.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    /// Store a new user under a fresh v4 id.
    pub async fn create(&self, username: String, age: serde_json::Number, hobbies: Vec<String>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username,
            age,
            hobbies,
        };
        self.users.write().await.push(user.clone());
        user
    }

    /// Apply `patch` to the user with `id`. Returns the updated user.
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.iter_mut().find(|u| u.id == id)?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(age) = patch.age {
            user.age = age;
        }
        if let Some(hobbies) = patch.hobbies {
            user.hobbies = hobbies;
        }
        Some(user.clone())
    }

    /// Remove the user with `id`. Returns false when absent.
    pub async fn delete(&self, id: Uuid) -> bool {
        let mut users = self.users.write().await;
        match users.iter().position(|u| u.id == id) {
            Some(pos) => {
                users.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crud_cycle() {
        let store = UserStore::new();
        let created = store
            .create("john_doe".into(), 25.into(), vec!["reading".into()])
            .await;
        assert_eq!(store.list().await, vec![created.clone()]);
        assert_eq!(store.get(created.id).await, Some(created.clone()));

        let updated = store
            .update(
                created.id,
                UserPatch {
                    age: Some(26.into()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "john_doe");
        assert_eq!(updated.age, serde_json::Number::from(26));

        assert!(store.delete(created.id).await);
        assert!(!store.delete(created.id).await);
        assert!(store.get(created.id).await.is_none());
        assert!(store.update(created.id, UserPatch::default()).await.is_none());
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = UserStore::new();
        let a = store.create("a".into(), 1.into(), vec![]).await;
        let b = store.create("b".into(), 2.into(), vec![]).await;
        let ids: Vec<Uuid> = store.list().await.into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }
}
