//! In-process auth event bus.
//!
//! The hosted SDKs surface login/logout/refresh through an auth-state-change
//! subscription; this is the Rust rendition. The adapter publishes an event
//! after every successful auth mutation, and subscribers receive them in
//! emission order. Dropping a receiver unsubscribes it.

use crate::types::Session;
use tokio::sync::broadcast;

/// A change in authentication state.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A session was opened (password grant or auto-confirmed sign-up)
    SignedIn(Session),
    /// The session's tokens were replaced; same or re-validated user
    TokenRefreshed(Session),
    /// The session ended
    SignedOut,
}

/// Broadcast bus for [`AuthEvent`]s.
///
/// Backed by a tokio broadcast channel, so delivery order matches emission
/// order for every subscriber. A subscriber that falls more than
/// `capacity` events behind observes a lag error rather than reordered
/// events.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: AuthEvent) {
        // Err means no subscribers, which is fine: nobody is listening yet.
        let _ = self.tx.send(event);
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: User {
                id: Uuid::nil(),
                email: None,
            },
        }
    }

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let bus = AuthEventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(AuthEvent::SignedIn(session("one")));
        bus.publish(AuthEvent::SignedOut);
        bus.publish(AuthEvent::SignedIn(session("two")));

        match rx.recv().await.unwrap() {
            AuthEvent::SignedIn(s) => assert_eq!(s.access_token, "one"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(rx.recv().await.unwrap(), AuthEvent::SignedOut));
        match rx.recv().await.unwrap() {
            AuthEvent::SignedIn(s) => assert_eq!(s.access_token, "two"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = AuthEventBus::default();
        bus.publish(AuthEvent::SignedOut);

        // A subscriber created afterwards sees only later events
        let mut rx = bus.subscribe();
        bus.publish(AuthEvent::SignedIn(session("later")));
        assert!(matches!(rx.recv().await.unwrap(), AuthEvent::SignedIn(_)));
    }
}
