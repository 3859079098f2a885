//! The auth context: session bootstrap, auth event listening, organization
//! resolution, and the derived state projection.
//!
//! This is an explicit context object created at application start and
//! passed down, not a hidden singleton. Three writers mutate the shared
//! state cell: the one-shot bootstrap, the event listener task, and the
//! organization resolver tasks. Everyone else reads the projection through
//! [`AuthContext::snapshot`].
//!
//! Ordering rules:
//! - Auth events are consumed from one broadcast receiver, so they apply in
//!   emission order.
//! - The state cell carries an epoch. Sign-in and sign-out bump it; an
//!   organization lookup captures the epoch when triggered and its result
//!   is applied only while that epoch is still current. A sign-out
//!   therefore always beats a late-arriving lookup from a prior sign-in.
//! - The same epoch check doubles as the "mounted" guard: `shutdown()`
//!   bumps the epoch and marks the cell closed, so nothing is applied
//!   afterwards.

use crate::backend::AuthBackend;
use crate::fsm::{AuthChangedPayload, AuthPhase, PhaseInput, PhaseMachine};
use crate::{AuthError, AuthResult};
use backend_client::{ApiError, AuthEvent, Organization, Session, SignUpOutcome, User};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stockpulse_storage::{OrganizationSnapshot, SessionStore};
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Read-only projection of the auth state.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    /// The signed-in user, if any.
    pub user: Option<User>,
    /// The resolved (or cached) organization, if any.
    pub organization: Option<Organization>,
    /// True until the startup session fetch has resolved.
    pub loading: bool,
}

/// Callback type for auth state change notifications.
pub type AuthChangeCallback = Box<dyn Fn(AuthChangedPayload) + Send + Sync>;

/// The shared state cell. Mutated only under the mutex, never across an
/// await point.
struct Inner {
    user: Option<User>,
    organization: Option<Organization>,
    loading: bool,
    epoch: u64,
    closed: bool,
    fsm: PhaseMachine,
}

/// Auth context coordinating session bootstrap, auth events, and
/// organization resolution over a backend.
pub struct AuthContext<B: AuthBackend> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    inner: Mutex<Inner>,
    stop: broadcast::Sender<()>,
    callback: Mutex<Option<AuthChangeCallback>>,
    pending_lookups: AtomicUsize,
    settled_notify: Notify,
}

impl<B: AuthBackend> AuthContext<B> {
    /// Create a new context. `loading` starts true and flips false once
    /// [`bootstrap`](Self::bootstrap) resolves.
    pub fn new(backend: Arc<B>, store: Arc<SessionStore>) -> Self {
        let (stop, _) = broadcast::channel(1);
        Self {
            backend,
            store,
            inner: Mutex::new(Inner {
                user: None,
                organization: None,
                loading: true,
                epoch: 0,
                closed: false,
                fsm: PhaseMachine::new(),
            }),
            stop,
            callback: Mutex::new(None),
            pending_lookups: AtomicUsize::new(0),
            settled_notify: Notify::new(),
        }
    }

    /// Wait until no organization lookup is in flight.
    ///
    /// Short-lived consumers (a CLI command deciding where to send the
    /// user) call this after [`bootstrap`](Self::bootstrap) so the
    /// route-guard decision reads a quiescent projection.
    pub async fn wait_settled(&self) {
        loop {
            let notified = self.settled_notify.notified();
            tokio::pin!(notified);
            // Register for wakeups before re-checking, so a lookup that
            // completes between the check and the await is not missed.
            notified.as_mut().enable();
            if self.pending_lookups.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Current projection.
    pub fn snapshot(&self) -> AuthSnapshot {
        let inner = self.inner.lock().unwrap();
        AuthSnapshot {
            user: inner.user.clone(),
            organization: inner.organization.clone(),
            loading: inner.loading,
        }
    }

    /// Current projection phase.
    pub fn phase(&self) -> AuthPhase {
        let inner = self.inner.lock().unwrap();
        AuthPhase::from(inner.fsm.state())
    }

    /// Set a callback to be notified whenever the projection changes.
    pub fn set_change_callback(&self, callback: AuthChangeCallback) {
        let mut cb = self.callback.lock().unwrap();
        *cb = Some(callback);
    }

    /// The access token of the persisted session, if any.
    pub fn access_token(&self) -> AuthResult<Option<String>> {
        Ok(self.store.get_access_token()?)
    }

    fn transition(inner: &mut Inner, input: &PhaseInput) -> AuthResult<()> {
        inner.fsm.consume(input).map_err(|_| {
            AuthError::InvalidTransition(format!(
                "Cannot apply {:?} in phase {:?}",
                input,
                inner.fsm.state()
            ))
        })?;
        Ok(())
    }

    fn notify(&self) {
        let payload = {
            let inner = self.inner.lock().unwrap();
            AuthChangedPayload {
                phase: AuthPhase::from(inner.fsm.state()),
                user_id: inner.user.as_ref().map(|u| u.id),
                email: inner.user.as_ref().and_then(|u| u.email.clone()),
                organization_slug: inner.organization.as_ref().map(|o| o.slug.clone()),
            }
        };
        let cb = self.callback.lock().unwrap();
        if let Some(callback) = cb.as_ref() {
            callback(payload);
        }
    }

    // ==========================================
    // Session bootstrap
    // ==========================================

    /// Run the one startup session fetch and seed the projection.
    ///
    /// Exactly-once: a second call fails with an invalid-transition error.
    /// `loading` flips false when this resolves, success or failure. If the
    /// context was shut down or an auth event superseded the bootstrap
    /// while the fetch was in flight, the result is discarded.
    pub async fn bootstrap(self: &Arc<Self>) -> AuthResult<()> {
        let epoch = {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed {
                return Err(AuthError::Closed);
            }
            Self::transition(&mut inner, &PhaseInput::BootstrapStarted)?;
            inner.epoch
        };
        self.notify();

        let loaded = self.load_stored_session().await;

        let mut inner = self.inner.lock().unwrap();
        // The startup fetch has resolved; the projection stops loading even
        // when its result is discarded below.
        inner.loading = false;

        if inner.closed || inner.epoch != epoch {
            debug!("Discarding superseded bootstrap result");
            drop(inner);
            self.notify();
            return Ok(());
        }

        match loaded {
            Ok(Some(session)) => {
                let user = session.user.clone();
                Self::transition(&mut inner, &PhaseInput::SessionFound)?;
                inner.user = Some(user.clone());

                // Cached snapshot for instant display; the authoritative
                // lookup below supersedes it either way.
                if let Ok(Some(snapshot)) =
                    self.store.get_organization_snapshot(&user.id.to_string())
                {
                    if let Some(organization) = organization_from_snapshot(&snapshot) {
                        inner.organization = Some(organization);
                        let _ = inner.fsm.consume(&PhaseInput::OrgResolved);
                    }
                }
                self.spawn_resolver(session.access_token.clone(), user.id, epoch);
                drop(inner);
                self.notify();

                info!(user_id = %user.id, "Session restored on startup");
                Ok(())
            }
            Ok(None) => {
                Self::transition(&mut inner, &PhaseInput::SessionMissing)?;
                drop(inner);
                self.notify();

                info!("No session found on startup");
                Ok(())
            }
            Err(e) => {
                let _ = inner.fsm.consume(&PhaseInput::SessionMissing);
                drop(inner);
                self.notify();

                warn!(error = %e, "Session bootstrap failed");
                Err(e)
            }
        }
    }

    /// Load and validate the persisted session.
    ///
    /// A session that is expired gets one refresh attempt; one that looks
    /// valid locally is still verified with the backend, since it may have
    /// been revoked server-side. Unrecoverable sessions are cleared and
    /// reported as absent; transient network failures surface as errors
    /// without touching the stored session.
    async fn load_stored_session(&self) -> AuthResult<Option<Session>> {
        if !self.store.has_session()? {
            return Ok(None);
        }

        let meta = match self.store.get_session_meta()? {
            Some(m) => m,
            None => {
                info!("Session tokens exist but metadata is missing, clearing session");
                self.store.clear_session()?;
                return Ok(None);
            }
        };
        let access_token = match self.store.get_access_token()? {
            Some(t) => t,
            None => {
                self.store.clear_session()?;
                return Ok(None);
            }
        };
        let refresh_token = match self.store.get_refresh_token()? {
            Some(t) => t,
            None => {
                info!("Session exists but refresh token is missing, clearing session");
                self.store.clear_session()?;
                return Ok(None);
            }
        };

        if self.store.is_session_expired()? {
            info!(user_id = %meta.user_id, "Stored session expired, attempting refresh");
            return match self.backend.refresh(&refresh_token).await {
                Ok(session) => {
                    self.persist_session(&session)?;
                    Ok(Some(session))
                }
                Err(e) if e.is_transient() => Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "Session refresh failed, clearing stored session");
                    self.store.clear_session()?;
                    Ok(None)
                }
            };
        }

        match self.backend.current_user(&access_token).await {
            Ok(user) => {
                let expires_at = match chrono::DateTime::parse_from_rfc3339(&meta.expires_at) {
                    Ok(t) => t.with_timezone(&chrono::Utc),
                    Err(_) => {
                        self.store.clear_session()?;
                        return Ok(None);
                    }
                };
                Ok(Some(Session {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            Err(ApiError::SessionInvalid(reason)) => {
                warn!(reason = %reason, "Stored session rejected by backend, clearing");
                self.store.clear_session()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn persist_session(&self, session: &Session) -> AuthResult<()> {
        self.store.set_session(
            &session.access_token,
            &session.refresh_token,
            &session.user.id.to_string(),
            session.user.email.as_deref(),
            &session.expires_at.to_rfc3339(),
        )?;
        Ok(())
    }

    // ==========================================
    // Auth event listener
    // ==========================================

    /// Subscribe to the backend's auth events for the lifetime of the
    /// context. Registered once; [`shutdown`](Self::shutdown) stops it.
    pub fn listen(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut events = self.backend.auth_events();
        let mut stop = self.stop.subscribe();
        let ctx = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    event = events.recv() => match event {
                        Ok(event) => ctx.handle_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Auth event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("Auth event listener stopped");
        })
    }

    /// Tear down the context: no further state writes are applied and the
    /// listener task exits.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.closed = true;
            inner.epoch += 1;
        }
        let _ = self.stop.send(());
        info!("Auth context shut down");
    }

    fn handle_event(self: &Arc<Self>, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                if let Err(e) = self.persist_session(&session) {
                    warn!(error = %e, "Failed to persist session");
                }
                let user = session.user.clone();
                {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.closed {
                        return;
                    }
                    // A fresh sign-in invalidates any in-flight lookup.
                    inner.epoch += 1;
                    inner.user = Some(user.clone());
                    inner.organization = None;
                    if inner.fsm.consume(&PhaseInput::SignedIn).is_err() {
                        warn!(phase = ?inner.fsm.state(), "Sign-in event in unexpected phase");
                    }
                    if let Ok(Some(snapshot)) =
                        self.store.get_organization_snapshot(&user.id.to_string())
                    {
                        if let Some(organization) = organization_from_snapshot(&snapshot) {
                            inner.organization = Some(organization);
                            let _ = inner.fsm.consume(&PhaseInput::OrgResolved);
                        }
                    }
                    // Spawn before the new state is visible, so a settled
                    // projection always reflects this lookup's outcome.
                    let epoch = inner.epoch;
                    self.spawn_resolver(session.access_token.clone(), user.id, epoch);
                }
                self.notify();

                debug!(user_id = %user.id, "Signed in, resolving organization");
            }
            AuthEvent::TokenRefreshed(session) => {
                if let Err(e) = self.persist_session(&session) {
                    warn!(error = %e, "Failed to persist refreshed session");
                }
                let changed = {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.closed {
                        return;
                    }
                    let changed = inner.user.as_ref() != Some(&session.user);
                    inner.user = Some(session.user.clone());
                    changed
                };
                if changed {
                    self.notify();
                }
            }
            AuthEvent::SignedOut => {
                // Clearing the store also drops the signed-out user's
                // cached organization snapshot.
                if let Err(e) = self.store.clear_session() {
                    warn!(error = %e, "Failed to clear stored session");
                }
                {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.closed {
                        return;
                    }
                    // The bump makes any in-flight lookup result stale
                    // before the cleared state becomes visible.
                    inner.epoch += 1;
                    inner.user = None;
                    inner.organization = None;
                    if inner.fsm.consume(&PhaseInput::SignedOut).is_err() {
                        debug!("Sign-out event in unauthenticated phase");
                    }
                }
                self.notify();
                info!("Signed out");
            }
        }
    }

    // ==========================================
    // Organization resolver
    // ==========================================

    fn spawn_resolver(self: &Arc<Self>, access_token: String, user_id: Uuid, epoch: u64) {
        self.pending_lookups.fetch_add(1, Ordering::SeqCst);
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            let resolved = match ctx.backend.find_membership(&access_token, user_id).await {
                Ok(Some((_, organization))) => Some(organization),
                Ok(None) => None,
                Err(e) => {
                    // Lookup failure leaves the organization empty;
                    // onboarding is the caller's next step.
                    warn!(error = %e, user_id = %user_id, "Organization lookup failed");
                    None
                }
            };
            ctx.apply_organization(user_id, epoch, resolved);
            ctx.pending_lookups.fetch_sub(1, Ordering::SeqCst);
            ctx.settled_notify.notify_waiters();
        });
    }

    /// Apply an authoritative organization result, unless superseded.
    fn apply_organization(&self, user_id: Uuid, epoch: u64, organization: Option<Organization>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed || inner.epoch != epoch {
            debug!(user_id = %user_id, "Discarding superseded organization result");
            return;
        }

        match organization {
            Some(organization) => {
                if let Err(e) = self.store.set_organization_snapshot(
                    &user_id.to_string(),
                    &snapshot_from_organization(&organization),
                ) {
                    warn!(error = %e, "Failed to cache organization snapshot");
                }
                debug!(
                    user_id = %user_id,
                    organization_id = %organization.id,
                    "Organization resolved"
                );
                inner.organization = Some(organization);
                let _ = inner.fsm.consume(&PhaseInput::OrgResolved);
            }
            None => {
                let _ = self.store.clear_organization_snapshot(&user_id.to_string());
                inner.organization = None;
                let _ = inner.fsm.consume(&PhaseInput::OrgMissing);
            }
        }
        drop(inner);
        self.notify();
    }

    // ==========================================
    // Mutation entry points
    // ==========================================

    /// Register a new account.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        Ok(self.backend.sign_up(email, password).await?)
    }

    /// Sign in. The resulting state change arrives through the event
    /// listener, in order with every other auth event.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        Ok(self.backend.sign_in(email, password).await?)
    }

    /// Sign out. A failure leaves local state untouched — "logged out
    /// locally but still logged in on the backend" is worse than surfacing
    /// the error.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let access_token = self
            .store
            .get_access_token()?
            .ok_or(AuthError::NotSignedIn)?;
        self.backend.sign_out(&access_token).await?;
        Ok(())
    }

    /// Request a password recovery email.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        Ok(self.backend.reset_password(email).await?)
    }

    /// Set a new password for the signed-in (or recovery) session.
    pub async fn update_password(&self, new_password: &str) -> AuthResult<User> {
        let access_token = self
            .store
            .get_access_token()?
            .ok_or(AuthError::NotSignedIn)?;
        Ok(self.backend.update_password(&access_token, new_password).await?)
    }

    /// Create an organization owned by the signed-in user and apply it as
    /// the authoritative result.
    pub async fn create_organization(&self, name: &str, slug: &str) -> AuthResult<Organization> {
        let (user, epoch) = {
            let inner = self.inner.lock().unwrap();
            if inner.closed {
                return Err(AuthError::Closed);
            }
            let user = inner.user.clone().ok_or(AuthError::NotSignedIn)?;
            (user, inner.epoch)
        };
        let access_token = self
            .store
            .get_access_token()?
            .ok_or(AuthError::NotSignedIn)?;

        let organization = self
            .backend
            .create_organization(&access_token, user.id, name, slug)
            .await?;

        self.apply_organization(user.id, epoch, Some(organization.clone()));
        Ok(organization)
    }
}

fn organization_from_snapshot(snapshot: &OrganizationSnapshot) -> Option<Organization> {
    let id = Uuid::parse_str(&snapshot.id).ok()?;
    Some(Organization {
        id,
        name: snapshot.name.clone(),
        slug: snapshot.slug.clone(),
    })
}

fn snapshot_from_organization(organization: &Organization) -> OrganizationSnapshot {
    OrganizationSnapshot {
        id: organization.id.to_string(),
        name: organization.name.clone(),
        slug: organization.slug.clone(),
    }
}
