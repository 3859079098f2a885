//! Event-order fidelity and supersession tests.

use super::harness::{org, settle, test_context, wait_until, FakeBackend};
use crate::fsm::AuthPhase;
use backend_client::AuthEvent;
use std::sync::Arc;

#[tokio::test]
async fn user_matches_most_recently_delivered_event() {
    let backend = FakeBackend::new();
    let alice = backend.add_confirmed_account("alice@x.com", "pw-alice");
    let bob = backend.add_confirmed_account("bob@x.com", "pw-bob");
    let carol = backend.add_confirmed_account("carol@x.com", "pw-carol");

    let (ctx, _store) = test_context(Arc::clone(&backend));
    ctx.listen();
    ctx.bootstrap().await.unwrap();

    let s1 = backend.issue_session(&alice);
    let s2 = backend.issue_session(&bob);
    let s3 = backend.issue_session(&carol);

    backend.publish(AuthEvent::SignedIn(s1));
    backend.publish(AuthEvent::SignedIn(s2));
    backend.publish(AuthEvent::SignedOut);
    backend.publish(AuthEvent::SignedIn(s3));

    wait_until(&ctx, "last event's user", |snapshot, _| {
        snapshot.user.as_ref().map(|u| u.id) == Some(carol.id)
    })
    .await;

    // Delivery order held: the final user is the last event's user
    assert_eq!(ctx.phase(), AuthPhase::AuthenticatedNoOrg);
}

#[tokio::test]
async fn sign_out_beats_in_flight_organization_lookup() {
    let backend = FakeBackend::gated();
    let user = backend.add_confirmed_account("a@x.com", "hunter22");
    backend.set_membership(user.id, org("Green Fork", "green-fork"));

    let (ctx, _store) = test_context(Arc::clone(&backend));
    ctx.listen();
    ctx.bootstrap().await.unwrap();

    // Sign in; the organization lookup starts and blocks in flight
    ctx.sign_in("a@x.com", "hunter22").await.unwrap();
    wait_until(&ctx, "signed-in user", |snapshot, _| {
        snapshot.user.is_some()
    })
    .await;

    // Sign out while the lookup is still pending
    ctx.sign_out().await.unwrap();
    wait_until(&ctx, "anonymous after sign-out", |_, phase| {
        phase == AuthPhase::Anonymous
    })
    .await;

    // Let the stale lookup complete; its result must be discarded
    backend.release_lookup();
    ctx.wait_settled().await;
    settle().await;

    let snapshot = ctx.snapshot();
    assert!(snapshot.user.is_none());
    assert!(snapshot.organization.is_none());
    assert_eq!(ctx.phase(), AuthPhase::Anonymous);
    assert_eq!(backend.lookup_count(), 1);
}

#[tokio::test]
async fn second_sign_in_supersedes_first_lookup() {
    let backend = FakeBackend::gated();
    let alice = backend.add_confirmed_account("alice@x.com", "pw-alice");
    let bob = backend.add_confirmed_account("bob@x.com", "pw-bob");
    backend.set_membership(alice.id, org("Alice's Diner", "alices-diner"));
    backend.set_membership(bob.id, org("Bob's Burgers", "bobs-burgers"));

    let (ctx, _store) = test_context(Arc::clone(&backend));
    ctx.listen();
    ctx.bootstrap().await.unwrap();

    // Two sign-ins; both lookups block in flight
    ctx.sign_in("alice@x.com", "pw-alice").await.unwrap();
    ctx.sign_in("bob@x.com", "pw-bob").await.unwrap();
    wait_until(&ctx, "bob to be current", |snapshot, _| {
        snapshot.user.as_ref().map(|u| u.id) == Some(bob.id)
    })
    .await;

    // Both lookups complete; the gate hands permits out in request order,
    // so Alice's stale result lands first and must be discarded
    backend.release_lookup();
    backend.release_lookup();

    wait_until(&ctx, "bob's organization", |snapshot, phase| {
        phase == AuthPhase::AuthenticatedWithOrg
            && snapshot
                .organization
                .as_ref()
                .is_some_and(|o| o.slug == "bobs-burgers")
    })
    .await;

    // Alice's organization never leaked into Bob's session
    assert_eq!(
        ctx.snapshot().organization.unwrap().name,
        "Bob's Burgers"
    );
}

#[tokio::test]
async fn sign_out_clears_cached_snapshot() {
    let backend = FakeBackend::new();
    let user = backend.add_confirmed_account("a@x.com", "hunter22");
    backend.set_membership(user.id, org("Green Fork", "green-fork"));

    let (ctx, store) = test_context(Arc::clone(&backend));
    ctx.listen();
    ctx.bootstrap().await.unwrap();

    ctx.sign_in("a@x.com", "hunter22").await.unwrap();
    wait_until(&ctx, "organization resolved", |_, phase| {
        phase == AuthPhase::AuthenticatedWithOrg
    })
    .await;
    assert!(store
        .get_organization_snapshot(&user.id.to_string())
        .unwrap()
        .is_some());

    ctx.sign_out().await.unwrap();
    wait_until(&ctx, "anonymous after sign-out", |_, phase| {
        phase == AuthPhase::Anonymous
    })
    .await;

    // The cached tenant must not survive into the next session
    assert!(store
        .get_organization_snapshot(&user.id.to_string())
        .unwrap()
        .is_none());
    assert!(!store.has_session().unwrap());
}
