use dashmap::DashMap;

/// In-process map from refresh-token string to owning username.
///
/// Registry membership is the sole liveness authority for refresh tokens:
/// a token is valid exactly while its entry exists. There is no expiry
/// sweep, no capacity bound, and no persistence; a process restart drops
/// every entry and with it every outstanding refresh token. The registry
/// is built once at startup and injected, never reached through a global.
#[derive(Debug, Default)]
pub struct RefreshTokenRegistry {
    entries: DashMap<String, String>,
}

impl RefreshTokenRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Unconditional insert; an existing entry for the token is overwritten.
    pub fn put(&self, token: impl Into<String>, username: impl Into<String>) {
        self.entries.insert(token.into(), username.into());
    }

    pub fn get(&self, token: &str) -> Option<String> {
        self.entries.get(token).map(|entry| entry.value().clone())
    }

    /// Atomic remove-and-return. This is the gating operation for token
    /// rotation: of any number of concurrent callers presenting the same
    /// token, exactly one observes `Some`.
    pub fn take(&self, token: &str) -> Option<String> {
        self.entries.remove(token).map(|(_, username)| username)
    }

    /// Idempotent; removing an absent token is a no-op.
    pub fn remove(&self, token: &str) {
        self.entries.remove(token);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Revokes every session owned by the username, returning the number
    /// of entries dropped. Counted per removed entry, so concurrent
    /// inserts and removals of other users' tokens cannot skew it.
    pub fn remove_user(&self, username: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, owner| {
            if owner == username {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
