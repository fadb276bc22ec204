//! Store-level tests for the session flag upsert and OTP claim semantics.

use doorman::config::SecurityConfig;
use doorman::db::{NewUser, Store};

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("doorman-store-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store")
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        fullname: "Store Test".to_string(),
        username: None,
        email: email.to_string(),
        password: "store-test-password".to_string(),
        avatar: None,
        phone_number: Some("555-0100".to_string()),
        bio: None,
        facebook: None,
        instagram: None,
        x: None,
        linked_in: None,
    }
}

// Cheap parameters keep hashing fast in tests.
fn security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

#[tokio::test]
async fn test_create_user_always_has_profile() {
    let store = test_store().await;

    let (user, profile) = store
        .create_user_with_profile(new_user("pair@example.com"), &security())
        .await
        .unwrap();
    assert_eq!(profile.user_id, user.id);

    let (fetched, fetched_profile) = store
        .get_user_with_profile(user.id)
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(fetched.email, "pair@example.com");
    assert_eq!(
        fetched_profile.expect("profile row must exist").phone_number,
        Some("555-0100".to_string())
    );
}

#[tokio::test]
async fn test_session_upserts_do_not_clobber_each_other() {
    let store = test_store().await;
    let (user, _) = store
        .create_user_with_profile(new_user("flags@example.com"), &security())
        .await
        .unwrap();

    assert!(!store.is_user_logged_in(user.id).await.unwrap());

    store.set_user_logged_in(user.id, true).await.unwrap();
    store.set_session_otp(user.id, "123456").await.unwrap();

    // Setting the OTP must not log the user out.
    assert!(store.is_user_logged_in(user.id).await.unwrap());

    // Flipping the login flag must not clear the OTP.
    store.set_user_logged_in(user.id, false).await.unwrap();
    let flag = store
        .get_session_by_user(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(flag.otp_code.as_deref(), Some("123456"));
    assert!(flag.otp_created_at.is_some());
}

#[tokio::test]
async fn test_otp_claim_succeeds_exactly_once() {
    let store = test_store().await;
    let (user, _) = store
        .create_user_with_profile(new_user("claim@example.com"), &security())
        .await
        .unwrap();

    store.set_session_otp(user.id, "654321").await.unwrap();

    assert!(store.claim_session_otp("654321").await.unwrap());
    assert!(!store.claim_session_otp("654321").await.unwrap());

    let flag = store
        .get_session_by_user(user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(flag.otp_code.is_none());
    assert!(flag.otp_created_at.is_none());
}

#[tokio::test]
async fn test_clear_otp_is_idempotent() {
    let store = test_store().await;
    let (user, _) = store
        .create_user_with_profile(new_user("clear@example.com"), &security())
        .await
        .unwrap();

    store.set_session_otp(user.id, "111222").await.unwrap();
    store.clear_session_otp(user.id).await.unwrap();
    store.clear_session_otp(user.id).await.unwrap();

    assert!(store.find_session_by_otp("111222").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_pagination_metadata() {
    let store = test_store().await;
    for i in 0..5 {
        store
            .create_user_with_profile(new_user(&format!("page{i}@example.com")), &security())
            .await
            .unwrap();
    }

    let page = store.list_users_paginated(1, 2).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.previous_page, None);
    assert_eq!(page.next_page, Some(2));

    let last = store.list_users_paginated(3, 2).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.previous_page, Some(2));
    assert_eq!(last.next_page, None);
}
