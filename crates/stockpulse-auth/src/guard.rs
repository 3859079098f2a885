//! Route-guard decision over the derived auth state.

use crate::context::AuthSnapshot;
use serde::Serialize;

/// Where the application layer should send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// No user: sign in first.
    Login,
    /// User without a tenant: create the restaurant.
    Onboarding,
    /// User and tenant present: the main application.
    Dashboard,
}

/// Evaluate the redirect for a projection snapshot.
///
/// Returns `None` while the startup session fetch is unresolved — deciding
/// earlier causes a redirect flicker before the session is known. Callers
/// re-evaluate whenever `loading` flips or user/organization change.
pub fn route_decision(snapshot: &AuthSnapshot) -> Option<RouteDecision> {
    if snapshot.loading {
        return None;
    }
    match (&snapshot.user, &snapshot.organization) {
        (None, _) => Some(RouteDecision::Login),
        (Some(_), None) => Some(RouteDecision::Onboarding),
        (Some(_), Some(_)) => Some(RouteDecision::Dashboard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_client::{Organization, User};
    use uuid::Uuid;

    fn user() -> Option<User> {
        Some(User {
            id: Uuid::nil(),
            email: Some("a@x.com".to_string()),
        })
    }

    fn organization() -> Option<Organization> {
        Some(Organization {
            id: Uuid::nil(),
            name: "Green Fork".to_string(),
            slug: "green-fork".to_string(),
        })
    }

    #[test]
    fn no_decision_while_loading() {
        let snapshot = AuthSnapshot {
            user: None,
            organization: None,
            loading: true,
        };
        assert_eq!(route_decision(&snapshot), None);

        // Even a fully-populated snapshot defers while loading
        let snapshot = AuthSnapshot {
            user: user(),
            organization: organization(),
            loading: true,
        };
        assert_eq!(route_decision(&snapshot), None);
    }

    #[test]
    fn anonymous_goes_to_login() {
        let snapshot = AuthSnapshot {
            user: None,
            organization: None,
            loading: false,
        };
        assert_eq!(route_decision(&snapshot), Some(RouteDecision::Login));
    }

    #[test]
    fn user_without_org_goes_to_onboarding() {
        let snapshot = AuthSnapshot {
            user: user(),
            organization: None,
            loading: false,
        };
        assert_eq!(route_decision(&snapshot), Some(RouteDecision::Onboarding));
    }

    #[test]
    fn user_with_org_goes_to_dashboard() {
        let snapshot = AuthSnapshot {
            user: user(),
            organization: organization(),
            loading: false,
        };
        assert_eq!(route_decision(&snapshot), Some(RouteDecision::Dashboard));
    }
}
