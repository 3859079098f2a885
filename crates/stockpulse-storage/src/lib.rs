//! Local storage for the StockPulse client.
//!
//! This crate provides:
//! - A `LocalStore` trait over simple key/value persistence
//! - A JSON-file-backed implementation under `~/.stockpulse`
//! - A `SessionStore` high-level API for the persisted session and the
//!   per-user cached organization snapshot

mod file;
mod keys;
mod session;
mod traits;

pub use file::FileStore;
pub use keys::StoreKeys;
pub use session::{OrganizationSnapshot, SessionMeta, SessionStore};
pub use traits::LocalStore;

use stockpulse_config_and_utils::Paths;
use thiserror::Error;

/// Error type for local store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path error
    #[error("Path error: {0}")]
    Path(String),
}

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Create a SessionStore backed by the default file store location.
pub fn create_session_store(paths: &Paths) -> StoreResult<SessionStore> {
    let store = FileStore::new(paths.store_file())?;
    Ok(SessionStore::new(Box::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory store for testing
    pub struct MemoryStore {
        data: std::sync::Mutex<std::collections::HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                data: std::sync::Mutex::new(std::collections::HashMap::new()),
            }
        }
    }

    impl LocalStore for MemoryStore {
        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            let mut data = self.data.lock().unwrap();
            data.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            let data = self.data.lock().unwrap();
            Ok(data.get(key).cloned())
        }

        fn delete(&self, key: &str) -> StoreResult<bool> {
            let mut data = self.data.lock().unwrap();
            Ok(data.remove(key).is_some())
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();

        store.set("test_key", "test_value").unwrap();
        assert_eq!(store.get("test_key").unwrap(), Some("test_value".to_string()));

        assert!(store.has("test_key").unwrap());
        assert!(!store.has("nonexistent").unwrap());

        assert!(store.delete("test_key").unwrap());
        assert!(!store.delete("test_key").unwrap());
        assert_eq!(store.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_session_store_session_lifecycle() {
        let store = SessionStore::new(Box::new(MemoryStore::new()));

        assert!(!store.has_session().unwrap());

        let expires_at = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        store
            .set_session(
                "access-token",
                "refresh-token",
                "user-123",
                Some("test@example.com"),
                &expires_at,
            )
            .unwrap();

        assert!(store.has_session().unwrap());
        assert_eq!(
            store.get_access_token().unwrap(),
            Some("access-token".to_string())
        );
        assert_eq!(
            store.get_refresh_token().unwrap(),
            Some("refresh-token".to_string())
        );

        let meta = store.get_session_meta().unwrap().unwrap();
        assert_eq!(meta.user_id, "user-123");
        assert_eq!(meta.email.as_deref(), Some("test@example.com"));

        store.clear_session().unwrap();
        assert!(!store.has_session().unwrap());
        assert!(store.get_access_token().unwrap().is_none());
    }

    #[test]
    fn test_session_store_expiry_leeway() {
        let store = SessionStore::new(Box::new(MemoryStore::new()));

        // Expired an hour ago
        let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        store
            .set_session("a", "r", "user-123", None, &past)
            .unwrap();
        assert!(store.is_session_expired().unwrap());

        // Expires in 30 seconds: inside the 60s leeway, counts as expired
        let soon = (chrono::Utc::now() + chrono::Duration::seconds(30)).to_rfc3339();
        store
            .set_session("a", "r", "user-123", None, &soon)
            .unwrap();
        assert!(store.is_session_expired().unwrap());

        // Expires in an hour: valid
        let future = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        store
            .set_session("a", "r", "user-123", None, &future)
            .unwrap();
        assert!(!store.is_session_expired().unwrap());
    }

    #[test]
    fn test_session_store_no_session_counts_as_expired() {
        let store = SessionStore::new(Box::new(MemoryStore::new()));
        assert!(store.is_session_expired().unwrap());
    }

    #[test]
    fn test_organization_snapshot_scoped_by_user() {
        let store = SessionStore::new(Box::new(MemoryStore::new()));

        let snapshot = OrganizationSnapshot {
            id: "org-1".to_string(),
            name: "Green Fork".to_string(),
            slug: "green-fork".to_string(),
        };
        store.set_organization_snapshot("user-a", &snapshot).unwrap();

        // Visible only under the owning user's key
        let cached = store.get_organization_snapshot("user-a").unwrap().unwrap();
        assert_eq!(cached.id, "org-1");
        assert!(store.get_organization_snapshot("user-b").unwrap().is_none());
    }

    #[test]
    fn test_clear_session_drops_organization_snapshot() {
        let store = SessionStore::new(Box::new(MemoryStore::new()));

        let expires_at = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        store
            .set_session("a", "r", "user-a", None, &expires_at)
            .unwrap();

        let snapshot = OrganizationSnapshot {
            id: "org-1".to_string(),
            name: "Green Fork".to_string(),
            slug: "green-fork".to_string(),
        };
        store.set_organization_snapshot("user-a", &snapshot).unwrap();

        store.clear_session().unwrap();

        // Sign-out must not leak the previous tenant to the next session
        assert!(store.get_organization_snapshot("user-a").unwrap().is_none());
    }
}
