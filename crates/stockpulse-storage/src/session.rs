//! High-level API for the persisted session and cached tenant snapshot.

use crate::{LocalStore, StoreKeys, StoreResult};
use serde::{Deserialize, Serialize};

/// Session metadata persisted alongside the tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// User ID from the auth backend
    pub user_id: String,
    /// User email
    #[serde(default)]
    pub email: Option<String>,
    /// When the access token expires (RFC 3339 timestamp)
    pub expires_at: String,
}

/// Cached organization snapshot for instant display while the
/// authoritative lookup runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSnapshot {
    /// Organization ID
    pub id: String,
    /// Display name
    pub name: String,
    /// URL-safe slug
    pub slug: String,
}

/// High-level API for storing and retrieving the session state
pub struct SessionStore {
    store: Box<dyn LocalStore>,
}

impl SessionStore {
    /// Create a new session store with the given backend
    pub fn new(store: Box<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn org_snapshot_key(user_id: &str) -> String {
        format!("{}{}", StoreKeys::ORG_SNAPSHOT_PREFIX, user_id)
    }

    // ==========================================
    // Session
    // ==========================================

    /// Store the access token
    pub fn set_access_token(&self, token: &str) -> StoreResult<()> {
        self.store.set(StoreKeys::ACCESS_TOKEN, token)
    }

    /// Retrieve the access token
    pub fn get_access_token(&self) -> StoreResult<Option<String>> {
        self.store.get(StoreKeys::ACCESS_TOKEN)
    }

    /// Store the refresh token
    pub fn set_refresh_token(&self, token: &str) -> StoreResult<()> {
        self.store.set(StoreKeys::REFRESH_TOKEN, token)
    }

    /// Retrieve the refresh token
    pub fn get_refresh_token(&self) -> StoreResult<Option<String>> {
        self.store.get(StoreKeys::REFRESH_TOKEN)
    }

    /// Store the session metadata
    pub fn set_session_meta(&self, meta: &SessionMeta) -> StoreResult<()> {
        let json = serde_json::to_string(meta)
            .map_err(|e| crate::StoreError::Encoding(e.to_string()))?;
        self.store.set(StoreKeys::SESSION_META, &json)
    }

    /// Retrieve the session metadata
    pub fn get_session_meta(&self) -> StoreResult<Option<SessionMeta>> {
        match self.store.get(StoreKeys::SESSION_META)? {
            Some(json) => {
                let meta: SessionMeta = serde_json::from_str(&json)
                    .map_err(|e| crate::StoreError::Encoding(e.to_string()))?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    /// Check if a session exists
    pub fn has_session(&self) -> StoreResult<bool> {
        let has_token = self.store.has(StoreKeys::ACCESS_TOKEN)?;
        let has_meta = self.store.has(StoreKeys::SESSION_META)?;
        Ok(has_token && has_meta)
    }

    /// Check if the stored session is expired.
    ///
    /// A session within 60 seconds of expiry counts as expired so a token
    /// is never presented right at its validity edge.
    pub fn is_session_expired(&self) -> StoreResult<bool> {
        match self.get_session_meta()? {
            Some(meta) => {
                let expires_at = chrono::DateTime::parse_from_rfc3339(&meta.expires_at)
                    .map_err(|e| crate::StoreError::Encoding(e.to_string()))?;
                let now = chrono::Utc::now();
                Ok(expires_at.signed_duration_since(now).num_seconds() < 60)
            }
            None => Ok(true),
        }
    }

    /// Store a complete session (tokens + metadata)
    pub fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
        email: Option<&str>,
        expires_at: &str,
    ) -> StoreResult<()> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)?;
        self.set_session_meta(&SessionMeta {
            user_id: user_id.to_string(),
            email: email.map(String::from),
            expires_at: expires_at.to_string(),
        })?;
        Ok(())
    }

    /// Clear the session, including the signed-in user's cached
    /// organization snapshot. The snapshot must not survive sign-out.
    pub fn clear_session(&self) -> StoreResult<()> {
        if let Ok(Some(meta)) = self.get_session_meta() {
            let _ = self.store.delete(&Self::org_snapshot_key(&meta.user_id));
        }
        let _ = self.store.delete(StoreKeys::ACCESS_TOKEN);
        let _ = self.store.delete(StoreKeys::REFRESH_TOKEN);
        let _ = self.store.delete(StoreKeys::SESSION_META);
        Ok(())
    }

    // ==========================================
    // Organization snapshot
    // ==========================================

    /// Store the organization snapshot for a user
    pub fn set_organization_snapshot(
        &self,
        user_id: &str,
        snapshot: &OrganizationSnapshot,
    ) -> StoreResult<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| crate::StoreError::Encoding(e.to_string()))?;
        self.store.set(&Self::org_snapshot_key(user_id), &json)
    }

    /// Retrieve the organization snapshot for a user
    pub fn get_organization_snapshot(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<OrganizationSnapshot>> {
        match self.store.get(&Self::org_snapshot_key(user_id))? {
            Some(json) => {
                let snapshot: OrganizationSnapshot = serde_json::from_str(&json)
                    .map_err(|e| crate::StoreError::Encoding(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Delete the organization snapshot for a user
    pub fn clear_organization_snapshot(&self, user_id: &str) -> StoreResult<bool> {
        self.store.delete(&Self::org_snapshot_key(user_id))
    }
}
