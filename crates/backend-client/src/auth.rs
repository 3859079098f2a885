//! Auth endpoint operations.

use crate::events::AuthEvent;
use crate::types::{Session, SignUpOutcome, User};
use crate::{ApiError, ApiResult, BackendClient};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Token grant response (password grant, refresh grant, auto-confirm
/// sign-up).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            id: wire.id,
            email: wire.email,
        }
    }
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user: self.user.into(),
        }
    }
}

/// Pull a human-readable message out of an auth error body.
fn auth_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.to_string()
}

/// True when the backend's rejection is about password strength.
fn is_password_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("password") && (lower.contains("weak") || lower.contains("at least"))
}

impl BackendClient {
    /// Register a new account.
    ///
    /// Depending on project settings the backend either opens a session
    /// immediately (published as a sign-in event) or sends a confirmation
    /// email first.
    pub async fn sign_up(&self, email: &str, password: &str) -> ApiResult<SignUpOutcome> {
        let url = self.auth_url("signup");

        debug!(email = %email, "Signing up");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = auth_error_message(&body);
            warn!(status = %status, message = %message, "Sign-up failed");

            if is_password_rejection(&message) {
                return Err(ApiError::WeakPassword(message));
            }
            return Err(ApiError::Auth(format!("HTTP {}: {}", status, message)));
        }

        let body = response.text().await?;

        // Auto-confirm projects answer with a full token grant; projects
        // requiring email confirmation answer with just the user record.
        if let Ok(grant) = serde_json::from_str::<TokenResponse>(&body) {
            let session = grant.into_session();
            info!(user_id = %session.user.id, "Signed up with immediate session");
            self.events().publish(AuthEvent::SignedIn(session.clone()));
            return Ok(SignUpOutcome::SessionCreated(session));
        }

        let _user: WireUser = serde_json::from_str(&body)?;
        info!(email = %email, "Sign-up accepted, confirmation email sent");
        Ok(SignUpOutcome::ConfirmationRequired {
            email: email.to_string(),
        })
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let url = self.auth_url("token?grant_type=password");

        debug!(email = %email, "Attempting email/password sign-in");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = auth_error_message(&body);
            warn!(status = %status, message = %message, "Sign-in failed");
            return Err(ApiError::InvalidCredentials(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let grant: TokenResponse = response.json().await?;
        let session = grant.into_session();

        info!(user_id = %session.user.id, "Signed in");
        self.events().publish(AuthEvent::SignedIn(session.clone()));

        Ok(session)
    }

    /// End the session server-side.
    ///
    /// The sign-out event fires only on success; a failed sign-out leaves
    /// every subscriber's local state untouched.
    pub async fn sign_out(&self, access_token: &str) -> ApiResult<()> {
        let url = self.auth_url("logout");

        debug!("Signing out");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Sign-out failed");
            return Err(ApiError::Auth(format!(
                "Sign-out failed: HTTP {}: {}",
                status,
                auth_error_message(&body)
            )));
        }

        info!("Signed out");
        self.events().publish(AuthEvent::SignedOut);

        Ok(())
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<Session> {
        let url = self.auth_url("token?grant_type=refresh_token");

        debug!("Refreshing token");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "refresh_token": refresh_token,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token refresh failed");
            return Err(ApiError::TokenRefresh(format!(
                "HTTP {}: {}",
                status,
                auth_error_message(&body)
            )));
        }

        let grant: TokenResponse = response.json().await?;
        let session = grant.into_session();

        info!(user_id = %session.user.id, "Token refreshed");
        self.events()
            .publish(AuthEvent::TokenRefreshed(session.clone()));

        Ok(session)
    }

    /// Validate a session by fetching its user from the backend.
    ///
    /// This catches sessions revoked server-side that still look valid
    /// locally.
    pub async fn current_user(&self, access_token: &str) -> ApiResult<User> {
        let url = self.auth_url("user");

        debug!("Validating session with backend");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Session validation failed");
            return Err(ApiError::SessionInvalid(format!(
                "HTTP {}: {}",
                status,
                auth_error_message(&body)
            )));
        }

        let user: WireUser = response.json().await?;
        debug!(user_id = %user.id, "Session validated");

        Ok(user.into())
    }

    /// Request a password recovery email.
    pub async fn reset_password(&self, email: &str) -> ApiResult<()> {
        let url = self.auth_url("recover");

        debug!(email = %email, "Requesting password recovery");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Password recovery request failed");
            return Err(ApiError::Auth(format!(
                "HTTP {}: {}",
                status,
                auth_error_message(&body)
            )));
        }

        info!(email = %email, "Password recovery email requested");
        Ok(())
    }

    /// Set a new password for the session's user.
    pub async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> ApiResult<User> {
        let url = self.auth_url("user");

        debug!("Updating password");

        let response = self
            .http
            .put(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = auth_error_message(&body);
            warn!(status = %status, message = %message, "Password update failed");

            if is_password_rejection(&message) {
                return Err(ApiError::WeakPassword(message));
            }
            return Err(ApiError::Auth(format!("HTTP {}: {}", status, message)));
        }

        let user: WireUser = response.json().await?;
        info!(user_id = %user.id, "Password updated");

        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_message_prefers_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(auth_error_message(body), "Invalid login credentials");
    }

    #[test]
    fn auth_error_message_reads_msg_key() {
        let body = r#"{"code":422,"msg":"Password should be at least 6 characters"}"#;
        assert_eq!(
            auth_error_message(body),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn auth_error_message_falls_back_to_raw_body() {
        assert_eq!(auth_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn password_rejection_detection() {
        assert!(is_password_rejection(
            "Password should be at least 6 characters"
        ));
        assert!(is_password_rejection("password is too weak"));
        assert!(!is_password_rejection("Invalid login credentials"));
        assert!(!is_password_rejection("user already registered"));
    }

    #[test]
    fn token_response_computes_expiry_window() {
        let wire = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": {"id": "00000000-0000-0000-0000-000000000000", "email": "a@x.com"}
        }"#;

        let grant: TokenResponse = serde_json::from_str(wire).unwrap();
        let session = grant.into_session();

        assert_eq!(session.access_token, "at");
        assert_eq!(session.user.email.as_deref(), Some("a@x.com"));
        let remaining = (session.expires_at - Utc::now()).num_seconds();
        assert!(remaining > 3500 && remaining <= 3600);
        assert!(!session.is_expired());
    }
}
