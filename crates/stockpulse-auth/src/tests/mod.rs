//! Integration tests for the auth context.
//!
//! Test organization:
//!
//! - `harness.rs`    - Scriptable in-process backend and wait helpers
//! - `bootstrap.rs`  - Startup session fetch, validation, refresh, guards
//! - `ordering.rs`   - Event-order fidelity and supersession rules
//! - `resolution.rs` - Organization lookup outcomes and snapshot caching
//! - `scenario.rs`   - End-to-end flows (onboarding, sign-out failure)

mod ordering;
