//! Typed client for the hosted auth/data backend.
//!
//! This crate wraps the backend's REST surface:
//! - Auth endpoints under `/auth/v1/*` (sign-up, password grant, logout,
//!   token refresh, session validation, password recovery)
//! - Row endpoints under `/rest/v1/*` (organizations, memberships,
//!   inventory), always filtered by tenant or owner
//! - An in-process auth event bus broadcasting sign-in/sign-out/refresh
//!   in emission order
//!
//! Every failure is a typed [`ApiError`]; nothing here substitutes
//! placeholder data for a failed call.

mod auth;
mod client;
mod error;
mod events;
mod rest;
mod types;

pub use client::BackendClient;
pub use error::{ApiError, ApiResult};
pub use events::{AuthEvent, AuthEventBus};
pub use types::{
    InventoryRecord, Membership, NewItem, Organization, Session, SignUpOutcome, User,
};
