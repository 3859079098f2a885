//! Storage key constants.

/// Storage keys used by the client
pub struct StoreKeys;

impl StoreKeys {
    /// Session access token
    pub const ACCESS_TOKEN: &'static str = "session_access_token";

    /// Session refresh token
    pub const REFRESH_TOKEN: &'static str = "session_refresh_token";

    /// Session metadata (JSON)
    pub const SESSION_META: &'static str = "session_meta";

    /// Per-user cached organization snapshot; always suffixed with the
    /// user id so one user's tenant never leaks into another's session.
    pub const ORG_SNAPSHOT_PREFIX: &'static str = "org_snapshot.";
}
