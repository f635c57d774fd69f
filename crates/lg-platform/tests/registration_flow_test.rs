//! Two-phase registration tests: intake queues an encrypted request, admin
//! approval promotes it into an identity plus profile, atomically.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lg_platform::audit::entity::AuthEventType;
use lg_platform::audit::service::AuditService;
use lg_platform::auth::login_service::{LoginOutcome, LoginService};
use lg_platform::profile::entity::{Profile, ProfileStatus, Role};
use lg_platform::profile::repository::ProfileStore;
use lg_platform::registration::cipher::{self, RegistrationCipher};
use lg_platform::registration::repository::PendingRegistrationStore;
use lg_platform::registration::rate_limit::{IntakePolicy, IntakeRateLimiter};
use lg_platform::registration::service::{
    ApprovalDenial, ApprovalOutcome, IntakeOutcome, RegistrationService, SubmitRegistration,
};
use lg_platform::shared::error::PortalError;
use lg_platform::tenant::entity::Tenant;

use common::{
    InMemoryAuthLogStore, InMemoryCredentialStore, InMemoryPendingStore, InMemoryProfileStore,
    InMemoryTenantDirectory,
};

struct Fixture {
    tenants: Arc<InMemoryTenantDirectory>,
    pending: Arc<InMemoryPendingStore>,
    profiles: Arc<InMemoryProfileStore>,
    credentials: Arc<InMemoryCredentialStore>,
    auth_logs: Arc<InMemoryAuthLogStore>,
    service: RegistrationService,
    acme: Tenant,
    globex: Tenant,
}

fn fixture_with_policy(policy: IntakePolicy) -> Fixture {
    let acme = Tenant::new("acme", "Acme Training");
    let globex = Tenant::new("globex", "Globex Learning");
    let tenants = Arc::new(InMemoryTenantDirectory::with_tenants(vec![
        acme.clone(),
        globex.clone(),
    ]));
    let pending = Arc::new(InMemoryPendingStore::default());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let auth_logs = Arc::new(InMemoryAuthLogStore::default());

    let service = RegistrationService::new(
        pending.clone(),
        tenants.clone(),
        profiles.clone(),
        credentials.clone(),
        AuditService::new(auth_logs.clone()),
        Arc::new(RegistrationCipher::new(&cipher::generate_key()).unwrap()),
        Arc::new(IntakeRateLimiter::new(policy).unwrap()),
        45,
    );

    Fixture { tenants, pending, profiles, credentials, auth_logs, service, acme, globex }
}

fn fixture() -> Fixture {
    // Generous quota so intake tests never trip the limiter by accident.
    fixture_with_policy(IntakePolicy {
        max_attempts: 1000,
        window: Duration::from_secs(900),
    })
}

fn submission(email: &str, tenant_slug: &str) -> SubmitRegistration {
    SubmitRegistration {
        email: email.to_string(),
        password: "SwordfishAbc1".to_string(),
        full_name: "Test Person".to_string(),
        tenant_slug: tenant_slug.to_string(),
        user_type: None,
        metadata: None,
    }
}

async fn seed_admin(f: &Fixture, role: Role, tenant_id: Option<&str>) -> String {
    let user_id = f.credentials.seed_identity("admin@portal.test", "AdminPass1x");
    let profile = match tenant_id {
        Some(tenant_id) => Profile::new(&user_id, role, tenant_id),
        None => Profile::new_master(&user_id),
    };
    f.profiles.insert(&profile).await.unwrap();
    user_id
}

async fn submit_pending(f: &Fixture, email: &str, tenant_slug: &str) -> String {
    match f.service.submit(submission(email, tenant_slug)).await.unwrap() {
        IntakeOutcome::Accepted { pending_id } => pending_id,
        other => panic!("expected Accepted, got {:?}", other),
    }
}

#[tokio::test]
async fn intake_queues_without_creating_an_account() {
    let f = fixture();
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let record = f.pending.find_by_id(&pending_id).await.unwrap().unwrap();
    assert_eq!(record.email, "new@acme.test");
    // Password is encrypted at rest.
    assert_ne!(record.encrypted_password, "SwordfishAbc1");
    assert!(!record.encrypted_password.contains("Swordfish"));
    // No identity or profile exists yet.
    assert_eq!(f.credentials.verify_calls.load(Ordering::SeqCst), 0);
    assert!(f.credentials.password_of("user-1").is_none());
}

#[tokio::test]
async fn intake_normalizes_email_to_lowercase() {
    let f = fixture();
    let pending_id = submit_pending(&f, "  New@ACME.Test ", "acme").await;

    let record = f.pending.find_by_id(&pending_id).await.unwrap().unwrap();
    assert_eq!(record.email, "new@acme.test");
}

#[tokio::test]
async fn intake_rejects_incomplete_submissions() {
    let f = fixture();
    let mut incomplete = submission("new@acme.test", "acme");
    incomplete.password = String::new();
    incomplete.full_name = "   ".to_string();

    let outcome = f.service.submit(incomplete).await.unwrap();
    match outcome {
        IntakeOutcome::Invalid { message } => {
            assert!(message.contains("password"));
            assert!(message.contains("fullName"));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
    assert_eq!(f.pending.count(), 0);
}

#[tokio::test]
async fn intake_rate_limits_per_email() {
    let f = fixture_with_policy(IntakePolicy {
        max_attempts: 3,
        window: Duration::from_secs(900),
    });

    for _ in 0..3 {
        let outcome = f.service.submit(submission("eager@acme.test", "acme")).await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Accepted { .. }));
    }
    let fourth = f.service.submit(submission("eager@acme.test", "acme")).await.unwrap();
    assert!(matches!(fourth, IntakeOutcome::RateLimited));

    // A different applicant is unaffected.
    let other = f.service.submit(submission("patient@acme.test", "acme")).await.unwrap();
    assert!(matches!(other, IntakeOutcome::Accepted { .. }));
}

#[tokio::test]
async fn approval_creates_identity_and_active_profile() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Admin, Some(&f.acme.id)).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    let ApprovalOutcome::Approved { user_id, email, role, tenant_id } = outcome else {
        panic!("expected Approved");
    };
    assert_eq!(email, "new@acme.test");
    assert_eq!(role, Role::User);
    assert_eq!(tenant_id, f.acme.id);

    // Identity holds the originally submitted password, decrypted.
    assert_eq!(f.credentials.password_of(&user_id).as_deref(), Some("SwordfishAbc1"));

    let profile = f.profiles.get(&user_id).unwrap();
    assert_eq!(profile.status, ProfileStatus::Active);
    assert_eq!(profile.tenant_id.as_deref(), Some(f.acme.id.as_str()));

    // Pending record consumed, audit trail written.
    assert!(f.pending.find_by_id(&pending_id).await.unwrap().is_none());
    let entries = f.auth_logs.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, AuthEventType::RegistrationApproved);
    assert_eq!(entries[0].actor_id.as_deref(), Some(actor.as_str()));
}

#[tokio::test]
async fn non_admin_cannot_approve() {
    let f = fixture();
    let actor = seed_admin(&f, Role::User, Some(&f.acme.id)).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(
        outcome,
        ApprovalOutcome::Denied(ApprovalDenial::Unauthorized)
    ));
    // Nothing was consumed.
    assert!(f.pending.find_by_id(&pending_id).await.unwrap().is_some());
}

#[tokio::test]
async fn tenant_admin_cannot_approve_into_foreign_tenant() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Admin, Some(&f.globex.id)).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(
        outcome,
        ApprovalOutcome::Denied(ApprovalDenial::CrossTenant)
    ));
}

#[tokio::test]
async fn master_approves_across_tenants() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Master, None).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(outcome, ApprovalOutcome::Approved { .. }));
}

#[tokio::test]
async fn unknown_pending_id_is_not_found() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Admin, Some(&f.acme.id)).await;

    let outcome = f.service.approve(&actor, "no-such-id", Role::User).await.unwrap();
    assert!(matches!(outcome, ApprovalOutcome::NotFound));
}

#[tokio::test]
async fn tenant_deleted_after_intake_surfaces_at_approval() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Master, None).await;

    // The slug is never resolved at intake, so a bogus one is accepted.
    let pending_id = submit_pending(&f, "new@vanished.test", "vanished").await;

    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    match outcome {
        ApprovalOutcome::TenantMissing { slug } => assert_eq!(slug, "vanished"),
        other => panic!("expected TenantMissing, got {:?}", other),
    }
    // The record stays for operator inspection; the reaper will take it.
    assert!(f.pending.find_by_id(&pending_id).await.unwrap().is_some());
}

#[tokio::test]
async fn profile_failure_rolls_back_the_identity() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Admin, Some(&f.acme.id)).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    f.profiles.fail_inserts.store(true, Ordering::SeqCst);
    let result = f.service.approve(&actor, &pending_id, Role::User).await;
    assert!(result.is_err());

    // No orphaned credential, and the pending record is untouched so the
    // approval can be retried.
    assert!(!f.credentials.has_identity("user-2"));
    assert!(f.pending.find_by_id(&pending_id).await.unwrap().is_some());
    assert_eq!(f.auth_logs.entries().len(), 0);
}

#[tokio::test]
async fn second_approval_of_same_pending_is_not_found() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Master, None).await;
    let pending_id = submit_pending(&f, "new@acme.test", "acme").await;

    let first = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(first, ApprovalOutcome::Approved { .. }));

    let second = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(second, ApprovalOutcome::NotFound));

    // Exactly one account and one audit entry.
    assert_eq!(f.auth_logs.entries().len(), 1);
}

#[tokio::test]
async fn approved_registrant_logs_in_with_the_email_they_typed() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Admin, Some(&f.acme.id)).await;

    // Intake normalizes the address; login must accept the original casing.
    let pending_id = submit_pending(&f, "New.Person@Acme.Test", "acme").await;
    let outcome = f.service.approve(&actor, &pending_id, Role::User).await.unwrap();
    assert!(matches!(outcome, ApprovalOutcome::Approved { .. }));

    let login = LoginService::new(
        f.tenants.clone(),
        f.credentials.clone(),
        f.profiles.clone(),
    );
    let outcome = login
        .attempt_login("New.Person@Acme.Test", "SwordfishAbc1", "acme")
        .await
        .unwrap();
    match outcome {
        LoginOutcome::Success { email, role, tenant_id, token, .. } => {
            assert_eq!(email, "new.person@acme.test");
            assert_eq!(role, Role::User);
            assert_eq!(tenant_id.as_deref(), Some(f.acme.id.as_str()));
            assert!(!token.is_empty());
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[tokio::test]
async fn approval_conflicts_when_the_email_already_has_an_account() {
    let f = fixture();
    let actor = seed_admin(&f, Role::Master, None).await;
    f.credentials.seed_identity("taken@acme.test", "ExistingPass1");
    let pending_id = submit_pending(&f, "taken@acme.test", "acme").await;

    let result = f.service.approve(&actor, &pending_id, Role::User).await;
    assert!(matches!(result, Err(PortalError::Conflict { .. })));

    // The record stays so the admin can resolve the duplicate by hand.
    assert!(f.pending.find_by_id(&pending_id).await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_removes_only_expired_records() {
    let f = fixture();
    submit_pending(&f, "fresh@acme.test", "acme").await;
    submit_pending(&f, "stale@acme.test", "acme").await;

    // Nothing has expired yet.
    assert_eq!(f.service.sweep(Utc::now()).await.unwrap(), 0);
    assert_eq!(f.pending.count(), 2);

    // Jump past the retention window; both go.
    let later = Utc::now() + chrono::Duration::days(46);
    assert_eq!(f.service.sweep(later).await.unwrap(), 2);
    assert_eq!(f.pending.count(), 0);
}
