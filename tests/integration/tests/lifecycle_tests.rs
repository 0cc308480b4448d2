//! Token lifecycle integration tests
//!
//! Every scenario runs on the in-memory backend. The shared scenarios also
//! run on PostgreSQL when DATABASE_URL is set.
//!
//! Run with: cargo test -p integration-tests --test lifecycle_tests

use std::sync::Arc;

use chrono::Duration;
use devauth_core::{LogoutOutcome, Validation};
use devauth_service::ServiceError;
use integration_tests::{token_key, TestApp};

// ============================================================================
// Shared scenarios
// ============================================================================

/// phoneA, then phoneB, then phoneA again always ends with a new phoneA key
async fn device_switch_scenario(app: &TestApp) {
    let account = app.create_account().await.unwrap();

    let on_a = app.login(&account, "phoneA").await.unwrap();
    let k1 = token_key(&on_a).unwrap();
    assert!(on_a.created);

    let on_b = app.login(&account, "phoneB").await.unwrap();
    assert!(on_b.created);
    assert_ne!(on_a.token, on_b.token);

    assert_eq!(app.auth().validate_token(&k1).await.unwrap(), Validation::DeviceChanged);

    let again = app.login(&account, "phoneA").await.unwrap();
    let k2 = token_key(&again).unwrap();
    assert!(again.created);
    assert_ne!(k1, k2);

    // K1 is physically gone, not just rejected
    assert!(app.tokens().lookup(&k1).await.unwrap().is_none());
    assert!(app.auth().validate_token(&k2).await.unwrap().is_valid());

    // phoneB's token is now on a non-current device
    let kb = token_key(&on_b).unwrap();
    assert_eq!(app.auth().validate_token(&kb).await.unwrap(), Validation::DeviceChanged);

    // Same round trip with nobody presenting the old key in between
    app.login(&account, "phoneB").await.unwrap();
    let third = app.login(&account, "phoneA").await.unwrap();
    let k3 = token_key(&third).unwrap();
    assert!(third.created);
    assert_ne!(k3, k2);
    assert!(app.tokens().lookup(&k2).await.unwrap().is_none());
    assert_eq!(app.auth().validate_token(&k2).await.unwrap(), Validation::NotFound);
    assert!(app.auth().validate_token(&k3).await.unwrap().is_valid());
}

/// Repeat logins reuse a live key; expiry forces a new one
async fn reuse_and_expiry_scenario(app: &TestApp) {
    let account = app.create_account().await.unwrap();

    let first = app.login(&account, "tablet").await.unwrap();
    app.clock.advance(Duration::days(6));
    let second = app.login(&account, "tablet").await.unwrap();
    assert!(!second.created);
    assert_eq!(first.token, second.token);
    assert_eq!(first.expires_at, second.expires_at);

    app.clock.advance(Duration::days(1));
    let key = token_key(&first).unwrap();
    assert_eq!(app.auth().validate_token(&key).await.unwrap(), Validation::Expired);
    assert_eq!(app.auth().validate_token(&key).await.unwrap(), Validation::NotFound);
}

/// Logout is idempotent and clears the active-token reference
async fn logout_scenario(app: &TestApp) {
    let account = app.create_account().await.unwrap();
    let response = app.login(&account, "laptop").await.unwrap();
    let key = token_key(&response).unwrap();

    let user = app.auth().current_user(&key).await.unwrap();
    assert!(user.holds_token(&key));

    assert_eq!(app.auth().logout(&key).await.unwrap(), LogoutOutcome::Revoked);
    assert_eq!(app.auth().logout(&key).await.unwrap(), LogoutOutcome::NotFound);

    let err = app.auth().current_user(&key).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));

    let stored = app.ctx.user_repo().find_by_id(account.user.id).await.unwrap().unwrap();
    assert!(stored.active_token.is_none());
}

/// N concurrent logins for one pair produce exactly one row
async fn concurrent_login_scenario(app: Arc<TestApp>) {
    let account = app.create_account().await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let app = Arc::clone(&app);
            let account = account.clone();
            tokio::spawn(async move { app.login(&account, "phoneA").await })
        })
        .collect();

    let responses: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(responses.iter().filter(|r| r.created).count(), 1);
    let winner = &responses[0].token;
    assert!(responses.iter().all(|r| &r.token == winner));

    let devices = app.devices().devices_of(account.user.id).await.unwrap();
    assert_eq!(devices.len(), 1);
    let stored = app
        .ctx
        .token_repo()
        .find_by_pair(account.user.id, devices[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&stored.key.to_string(), winner);
}

// ============================================================================
// In-memory backend
// ============================================================================

#[tokio::test]
async fn test_device_switch_in_memory() {
    device_switch_scenario(&TestApp::start().unwrap()).await;
}

#[tokio::test]
async fn test_reuse_and_expiry_in_memory() {
    reuse_and_expiry_scenario(&TestApp::start().unwrap()).await;
}

#[tokio::test]
async fn test_logout_in_memory() {
    logout_scenario(&TestApp::start().unwrap()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_login_in_memory() {
    concurrent_login_scenario(Arc::new(TestApp::start().unwrap())).await;
}

#[tokio::test]
async fn test_users_do_not_share_tokens() {
    let app = TestApp::start().unwrap();
    let alice = app.create_account().await.unwrap();
    let bob = app.create_account().await.unwrap();

    let a = app.login(&alice, "shared-kiosk").await.unwrap();
    let b = app.login(&bob, "shared-kiosk").await.unwrap();
    assert_ne!(a.token, b.token);

    // Bob's login on the same identifier does not move Alice's current device
    assert!(app.auth().validate_token(&token_key(&a).unwrap()).await.unwrap().is_valid());
    assert!(app.auth().validate_token(&token_key(&b).unwrap()).await.unwrap().is_valid());
}

#[tokio::test]
async fn test_authenticate_end_to_end() {
    let app = TestApp::start().unwrap();
    let account = app.create_account().await.unwrap();
    let response = app.login(&account, "phoneA").await.unwrap();

    let header = format!("Token {}", response.token);
    let user = app
        .auth()
        .authenticate(Some(&header))
        .await
        .unwrap()
        .into_user()
        .unwrap();
    assert_eq!(user.id, account.user.id);

    let err = app.auth().authenticate(None).await.unwrap_err();
    assert_eq!(err.error_code(), "UNAUTHENTICATED");
    assert_ne!(err.to_string(), ServiceError::InvalidCredentials.to_string());
}

#[tokio::test]
async fn test_login_in_user_time_zone() {
    let app = TestApp::start().unwrap();
    let account = integration_tests::TestAccount::unique().with_time_zone("America/New_York");
    app.register(&account).await.unwrap();

    let response = app.login(&account, "phoneA").await.unwrap();
    let offset = response.user.last_login.unwrap().offset().local_minus_utc();
    assert!(offset == -5 * 3600 || offset == -4 * 3600);
}

// ============================================================================
// PostgreSQL backend
// ============================================================================

macro_rules! postgres_or_skip {
    () => {
        match TestApp::start_postgres().await.unwrap() {
            Some(app) => app,
            None => return,
        }
    };
}

#[tokio::test]
async fn test_device_switch_postgres() {
    let app = postgres_or_skip!();
    device_switch_scenario(&app).await;
}

#[tokio::test]
async fn test_reuse_and_expiry_postgres() {
    let app = postgres_or_skip!();
    reuse_and_expiry_scenario(&app).await;
}

#[tokio::test]
async fn test_logout_postgres() {
    let app = postgres_or_skip!();
    logout_scenario(&app).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_login_postgres() {
    let app = postgres_or_skip!();
    concurrent_login_scenario(Arc::new(app)).await;
}
