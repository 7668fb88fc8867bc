use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::users::{NewUser, StoreError, User, UserStore};

/// In-memory store keyed by username, used by unit and HTTP tests.
/// Matches the Postgres store's upsert semantics; one mutex guards the
/// map so the email-uniqueness check and the insert are a single step,
/// as the database's unique constraint makes them in production.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    next_id: AtomicI32,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().expect("user map lock poisoned")
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.locked().get(username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let needle = email.to_lowercase();
        Ok(self
            .locked()
            .values()
            .find(|user| user.email == needle)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.locked().contains_key(username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let needle = email.to_lowercase();
        Ok(self.locked().values().any(|user| user.email == needle))
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let email = user.email.to_lowercase();
        let mut users = self.locked();

        let taken_by_other = users
            .values()
            .any(|existing| existing.email == email && existing.username != user.username);
        if taken_by_other {
            return Err(StoreError::DuplicateEmail);
        }

        let saved = match users.get(&user.username) {
            Some(existing) => User {
                id: existing.id,
                username: user.username.clone(),
                email,
                password_hash: user.password_hash,
                roles: user.roles,
                created_at: existing.created_at,
            },
            None => User {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                username: user.username.clone(),
                email,
                password_hash: user.password_hash,
                roles: user.roles,
                created_at: Utc::now(),
            },
        };

        users.insert(user.username, saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::responses::Role;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "digest".into(),
            roles: vec![Role::User],
        }
    }

    #[tokio::test]
    async fn save_assigns_ids_and_finds_by_either_key() {
        let store = MemoryUserStore::new();
        let alice = store.save(new_user("alice", "Alice@x.com")).await.expect("save");
        assert_eq!(alice.id, 1);
        assert_eq!(alice.email, "alice@x.com");

        assert!(store.exists_by_username("alice").await.expect("exists"));
        assert!(store.exists_by_email("ALICE@X.COM").await.expect("exists"));
        let found = store
            .find_by_email("alice@x.com")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn upsert_keeps_id_and_rejects_stolen_email() {
        let store = MemoryUserStore::new();
        let alice = store.save(new_user("alice", "alice@x.com")).await.expect("save");
        store.save(new_user("bob", "bob@x.com")).await.expect("save");

        let mut update = new_user("alice", "alice@x.com");
        update.roles = vec![Role::User, Role::Admin];
        let updated = store.save(update).await.expect("upsert");
        assert_eq!(updated.id, alice.id);
        assert_eq!(updated.roles, vec![Role::User, Role::Admin]);

        let stolen = store.save(new_user("bob", "alice@x.com")).await;
        assert!(matches!(stolen, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_saves_of_one_email_admit_one_account() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .save(new_user(&format!("user-{i}"), "shared@x.com"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("task join") {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
