//! Login decision procedure tests.
//!
//! The decision order is strict: tenant resolution, credential check,
//! profile lookup, tenant match, force-reset gate. Each test pins one of
//! the rejection points or the ordering between them.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use lg_platform::auth::login_service::{LoginOutcome, LoginService};
use lg_platform::profile::entity::{Profile, Role};
use lg_platform::profile::repository::ProfileStore;
use lg_platform::tenant::entity::Tenant;

use common::{InMemoryCredentialStore, InMemoryProfileStore, InMemoryTenantDirectory};

struct Fixture {
    credentials: Arc<InMemoryCredentialStore>,
    profiles: Arc<InMemoryProfileStore>,
    service: LoginService,
    acme: Tenant,
}

fn fixture() -> Fixture {
    let acme = Tenant::new("acme", "Acme Training");
    let globex = Tenant::new("globex", "Globex Learning");
    let tenants = Arc::new(InMemoryTenantDirectory::with_tenants(vec![
        acme.clone(),
        globex,
    ]));
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let service = LoginService::new(tenants, credentials.clone(), profiles.clone());

    Fixture { credentials, profiles, service, acme }
}

async fn seed_user(f: &Fixture, email: &str, password: &str, role: Role, tenant_id: &str) -> String {
    let user_id = f.credentials.seed_identity(email, password);
    f.profiles
        .insert(&Profile::new(&user_id, role, tenant_id))
        .await
        .unwrap();
    user_id
}

#[tokio::test]
async fn unknown_tenant_rejected_before_credentials_are_checked() {
    let f = fixture();
    seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let outcome = f
        .service
        .attempt_login("bob@acme.test", "CorrectHorse1", "no-such-tenant")
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::InvalidTenant));
    // The credential store was never consulted.
    assert_eq!(f.credentials.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_password_yields_auth_error() {
    let f = fixture();
    seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let outcome = f
        .service
        .attempt_login("bob@acme.test", "wrong-password", "acme")
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::AuthError { .. }));
}

#[tokio::test]
async fn email_casing_and_whitespace_are_ignored() {
    let f = fixture();
    seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let outcome = f
        .service
        .attempt_login("  Bob@ACME.Test ", "CorrectHorse1", "acme")
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::Success { .. }));
}

#[tokio::test]
async fn unknown_email_and_bad_password_are_indistinguishable() {
    let f = fixture();
    seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let unknown = f
        .service
        .attempt_login("nobody@acme.test", "whatever", "acme")
        .await
        .unwrap();
    let wrong = f
        .service
        .attempt_login("bob@acme.test", "wrong-password", "acme")
        .await
        .unwrap();

    let (LoginOutcome::AuthError { code: c1, message: m1 },
         LoginOutcome::AuthError { code: c2, message: m2 }) = (unknown, wrong)
    else {
        panic!("expected AuthError for both");
    };
    assert_eq!(c1, c2);
    assert_eq!(m1, m2);
}

#[tokio::test]
async fn verified_identity_without_profile_is_profile_not_found() {
    let f = fixture();
    let user_id = f.credentials.seed_identity("ghost@acme.test", "CorrectHorse1");

    let outcome = f
        .service
        .attempt_login("ghost@acme.test", "CorrectHorse1", "acme")
        .await
        .unwrap();

    match outcome {
        LoginOutcome::ProfileNotFound { user_id: found } => assert_eq!(found, user_id),
        other => panic!("expected ProfileNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn tenant_scoped_user_cannot_log_into_foreign_tenant() {
    let f = fixture();
    seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let outcome = f
        .service
        .attempt_login("bob@acme.test", "CorrectHorse1", "globex")
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::WrongTenant));
}

#[tokio::test]
async fn master_logs_in_through_any_tenant() {
    let f = fixture();
    let user_id = f.credentials.seed_identity("root@portal.test", "CorrectHorse1");
    f.profiles
        .insert(&Profile::new_master(&user_id))
        .await
        .unwrap();

    for slug in ["acme", "globex"] {
        let outcome = f
            .service
            .attempt_login("root@portal.test", "CorrectHorse1", slug)
            .await
            .unwrap();
        match outcome {
            LoginOutcome::Success { role, tenant_id, .. } => {
                assert_eq!(role, Role::Master);
                assert!(tenant_id.is_none());
            }
            other => panic!("expected Success via {}, got {:?}", slug, other),
        }
    }
}

#[tokio::test]
async fn force_reset_gate_blocks_login_without_issuing_a_token() {
    let f = fixture();
    let user_id = seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;
    f.profiles.set_force_reset(&user_id, true).await.unwrap();

    let outcome = f
        .service
        .attempt_login("bob@acme.test", "CorrectHorse1", "acme")
        .await
        .unwrap();

    match outcome {
        LoginOutcome::ForceResetRequired { user_id: found } => assert_eq!(found, user_id),
        other => panic!("expected ForceResetRequired, got {:?}", other),
    }
}

#[tokio::test]
async fn wrong_tenant_checked_before_force_reset() {
    let f = fixture();
    let user_id = seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;
    f.profiles.set_force_reset(&user_id, true).await.unwrap();

    // Both gates would fire; tenant mismatch must win.
    let outcome = f
        .service
        .attempt_login("bob@acme.test", "CorrectHorse1", "globex")
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::WrongTenant));
}

#[tokio::test]
async fn successful_login_carries_identity_and_session() {
    let f = fixture();
    let user_id = seed_user(&f, "bob@acme.test", "CorrectHorse1", Role::User, &f.acme.id).await;

    let outcome = f
        .service
        .attempt_login("bob@acme.test", "CorrectHorse1", "acme")
        .await
        .unwrap();

    match outcome {
        LoginOutcome::Success { user_id: id, email, role, tenant_id, token } => {
            assert_eq!(id, user_id);
            assert_eq!(email, "bob@acme.test");
            assert_eq!(role, Role::User);
            assert_eq!(tenant_id.as_deref(), Some(f.acme.id.as_str()));
            assert!(!token.is_empty());
        }
        other => panic!("expected Success, got {:?}", other),
    }
}
