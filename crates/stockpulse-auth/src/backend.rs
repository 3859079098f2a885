//! Backend seam consumed by the auth context.
//!
//! The context is generic over this trait so its ordering and supersession
//! behavior can be exercised against a scriptable in-process backend. The
//! production implementation is [`BackendClient`].

use backend_client::{
    ApiResult, AuthEvent, BackendClient, Membership, Organization, Session, SignUpOutcome, User,
};
use std::future::Future;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Operations the auth context needs from the hosted backend.
pub trait AuthBackend: Send + Sync + 'static {
    /// Subscribe to the auth event stream. Delivery order matches
    /// emission order for the lifetime of the receiver.
    fn auth_events(&self) -> broadcast::Receiver<AuthEvent>;

    /// Register a new account.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<SignUpOutcome>> + Send;

    /// Sign in with email and password.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<Session>> + Send;

    /// End the session server-side.
    fn sign_out(&self, access_token: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Exchange a refresh token for a new session.
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = ApiResult<Session>> + Send;

    /// Validate a session by fetching its user.
    fn current_user(&self, access_token: &str) -> impl Future<Output = ApiResult<User>> + Send;

    /// Request a password recovery email.
    fn reset_password(&self, email: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Set a new password for the session's user.
    fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> impl Future<Output = ApiResult<User>> + Send;

    /// Look up the organization a user belongs to.
    fn find_membership(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> impl Future<Output = ApiResult<Option<(Membership, Organization)>>> + Send;

    /// Create an organization owned by the given user.
    fn create_organization(
        &self,
        access_token: &str,
        user_id: Uuid,
        name: &str,
        slug: &str,
    ) -> impl Future<Output = ApiResult<Organization>> + Send;
}

impl AuthBackend for BackendClient {
    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events().subscribe()
    }

    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<SignUpOutcome> {
        BackendClient::sign_up(self, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        BackendClient::sign_in(self, email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> ApiResult<()> {
        BackendClient::sign_out(self, access_token).await
    }

    async fn refresh(&self, refresh_token: &str) -> ApiResult<Session> {
        BackendClient::refresh(self, refresh_token).await
    }

    async fn current_user(&self, access_token: &str) -> ApiResult<User> {
        BackendClient::current_user(self, access_token).await
    }

    async fn reset_password(&self, email: &str) -> ApiResult<()> {
        BackendClient::reset_password(self, email).await
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> ApiResult<User> {
        BackendClient::update_password(self, access_token, new_password).await
    }

    async fn find_membership(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> ApiResult<Option<(Membership, Organization)>> {
        BackendClient::find_membership(self, access_token, user_id).await
    }

    async fn create_organization(
        &self,
        access_token: &str,
        user_id: Uuid,
        name: &str,
        slug: &str,
    ) -> ApiResult<Organization> {
        BackendClient::create_organization(self, access_token, user_id, name, slug).await
    }
}
