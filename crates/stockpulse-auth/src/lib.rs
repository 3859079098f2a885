//! Authentication context for the StockPulse client.
//!
//! This crate provides:
//! - The explicit session/organization projection state machine
//! - One-shot session bootstrap with validation and refresh
//! - The auth event listener updating shared state in delivery order
//! - Asynchronous organization resolution with supersession guards
//! - The derived `{user, organization, loading}` projection and the
//!   route-guard decision consumed by the application layer

mod backend;
mod context;
mod error;
mod fsm;
mod guard;

#[cfg(test)]
mod tests;

pub use backend::AuthBackend;
pub use context::{AuthChangeCallback, AuthContext, AuthSnapshot};
pub use error::{AuthError, AuthResult};
pub use fsm::{AuthChangedPayload, AuthPhase, MachineState, PhaseInput, PhaseMachine};
pub use guard::{route_decision, RouteDecision};
