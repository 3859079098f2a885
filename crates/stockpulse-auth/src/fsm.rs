//! Session/organization projection state machine using rust-fsm.
//!
//! The projection the rest of the application consumes is an explicit
//! finite state machine rather than a pair of nullable fields inspected
//! ad hoc.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────┐
//! │   Unknown   │ (initial)
//! └──────┬──────┘
//!        │ BootstrapStarted
//!        ▼
//! ┌───────────────┐  SessionMissing   ┌─────────────┐
//! │ LoadingSession│ ────────────────► │  Anonymous  │
//! └──────┬────────┘                   └──────┬──────┘
//!        │ SessionFound                      │ SignedIn
//!        ▼                                   ▼
//! ┌────────────────────┐  OrgResolved  ┌──────────────────────┐
//! │ AuthenticatedNoOrg │ ────────────► │ AuthenticatedWithOrg │
//! └────────┬───────────┘ ◄──────────── └──────────┬───────────┘
//!          │               OrgMissing             │
//!          │ SignedOut                            │ SignedOut
//!          ▼                                      ▼
//!      Anonymous                              Anonymous
//! ```
//!
//! A sign-in while already authenticated lands back in
//! `AuthenticatedNoOrg`: the replacement user's organization must
//! re-resolve. There is no terminal state; the machine runs for the
//! application's lifetime.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro.
// This generates a module `session_phase` with:
// - session_phase::State (enum)
// - session_phase::Input (enum)
// - session_phase::StateMachine (type alias)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_phase(Unknown)

    Unknown => {
        BootstrapStarted => LoadingSession
    },
    LoadingSession => {
        SessionMissing => Anonymous,
        SessionFound => AuthenticatedNoOrg,
        // Auth events may land while the bootstrap call is still in
        // flight; the bootstrap result is then superseded.
        SignedIn => AuthenticatedNoOrg,
        SignedOut => Anonymous
    },
    Anonymous => {
        SignedIn => AuthenticatedNoOrg
    },
    AuthenticatedNoOrg => {
        OrgResolved => AuthenticatedWithOrg,
        OrgMissing => AuthenticatedNoOrg,
        SignedIn => AuthenticatedNoOrg,
        SignedOut => Anonymous
    },
    AuthenticatedWithOrg => {
        OrgResolved => AuthenticatedWithOrg,
        OrgMissing => AuthenticatedNoOrg,
        SignedIn => AuthenticatedNoOrg,
        SignedOut => Anonymous
    }
}

// Re-export the generated types with clearer names
pub use session_phase::Input as PhaseInput;
pub use session_phase::State as MachineState;
pub use session_phase::StateMachine as PhaseMachine;

/// Projection phase for external consumption (route guards, status output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Nothing known yet; bootstrap has not started.
    Unknown,
    /// The one startup session fetch is in flight.
    LoadingSession,
    /// No session.
    Anonymous,
    /// Signed in; organization lookup pending or came back empty.
    AuthenticatedNoOrg,
    /// Signed in with a resolved organization.
    AuthenticatedWithOrg,
}

impl AuthPhase {
    /// Returns true when a user is signed in (with or without a tenant).
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            AuthPhase::AuthenticatedNoOrg | AuthPhase::AuthenticatedWithOrg
        )
    }

    /// Returns true once the startup session fetch has resolved.
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthPhase::Unknown | AuthPhase::LoadingSession)
    }
}

impl From<&MachineState> for AuthPhase {
    fn from(state: &MachineState) -> Self {
        match state {
            MachineState::Unknown => AuthPhase::Unknown,
            MachineState::LoadingSession => AuthPhase::LoadingSession,
            MachineState::Anonymous => AuthPhase::Anonymous,
            MachineState::AuthenticatedNoOrg => AuthPhase::AuthenticatedNoOrg,
            MachineState::AuthenticatedWithOrg => AuthPhase::AuthenticatedWithOrg,
        }
    }
}

/// Payload for auth phase change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthChangedPayload {
    /// Current phase.
    pub phase: AuthPhase,
    /// User ID if signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<uuid::Uuid>,
    /// User email if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Organization slug if resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_slug: Option<String>,
}
