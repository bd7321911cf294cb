//! Integration tests for the registration flow.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use portal_core::Email;
use portal_integration_tests::{
    FailingNotifier, TestApp, location, unreachable_smtp_notifier,
};

#[tokio::test]
async fn test_register_page_renders_form() {
    let (app, _) = TestApp::spawn_recording().await;

    let resp = app.get("/register").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"action="/register""#));
    for field in ["name", "address", "phone", "email", "password"] {
        assert!(body.contains(&format!(r#"name="{field}""#)), "missing {field}");
    }
}

#[tokio::test]
async fn test_register_creates_user_and_redirects_to_login() {
    let (app, notifier) = TestApp::spawn_recording().await;

    let resp = app
        .register("Grace Hopper", "grace@example.com", "cobol")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let users = app.users.all();
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user.name, "Grace Hopper");
    assert_eq!(user.address, "1 Compiler Rd");
    assert_eq!(user.phone, "555-0199");
    assert_eq!(user.email, Email::parse("grace@example.com").unwrap());
    assert_ne!(user.password_hash, "cobol");
    assert!(!user.password_hash.contains("cobol"));

    let sent = notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "Grace Hopper");
    assert_eq!(sent[0].email.as_str(), "grace@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (app, notifier) = TestApp::spawn_recording().await;
    app.register("Grace Hopper", "grace@example.com", "cobol")
        .await;

    let resp = app
        .register("Someone Else", "grace@example.com", "fortran")
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Email already registered!");

    assert_eq!(app.users.len(), 1);
    assert_eq!(app.users.all()[0].name, "Grace Hopper");

    // Give a stray notice for the rejected attempt time to land
    notifier.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "Grace Hopper");
}

#[tokio::test]
async fn test_register_email_match_is_exact() {
    let (app, _) = TestApp::spawn_recording().await;
    app.register("Grace Hopper", "grace@example.com", "cobol")
        .await;

    let resp = app
        .register("Grace Again", "Grace@Example.com", "cobol")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.users.len(), 2);
}

#[tokio::test]
async fn test_register_succeeds_when_notifier_fails() {
    let app = TestApp::spawn(Arc::new(FailingNotifier)).await;

    let resp = app
        .register("Grace Hopper", "grace@example.com", "cobol")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn test_register_succeeds_when_smtp_unreachable() {
    let app = TestApp::spawn(unreachable_smtp_notifier()).await;

    let resp = app
        .register("Grace Hopper", "grace@example.com", "cobol")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.users.len(), 1);

    // The account is usable right away
    let resp = app.login("grace@example.com", "cobol").await;
    assert_eq!(location(&resp), Some("/dashboard"));
}

#[tokio::test]
async fn test_register_field_too_long() {
    let (app, notifier) = TestApp::spawn_recording().await;
    let name = "n".repeat(101);

    let resp = app.register(&name, "grace@example.com", "cobol").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(app.users.is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_register_empty_email() {
    let (app, _) = TestApp::spawn_recording().await;

    let resp = app.register("Grace Hopper", "", "cobol").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(app.users.is_empty());
}

#[tokio::test]
async fn test_register_missing_field_is_rejected() {
    let (app, _) = TestApp::spawn_recording().await;

    let resp = app
        .post_form(
            "/register",
            &[("name", "Grace Hopper"), ("email", "grace@example.com")],
        )
        .await;
    assert!(resp.status().is_client_error());
    assert!(app.users.is_empty());
}

#[tokio::test]
async fn test_register_same_password_different_hashes() {
    let (app, _) = TestApp::spawn_recording().await;
    app.register("Grace Hopper", "grace@example.com", "cobol")
        .await;
    app.register("Ada Lovelace", "ada@example.com", "cobol")
        .await;

    let users = app.users.all();
    assert_eq!(users.len(), 2);
    assert_ne!(users[0].password_hash, users[1].password_hash);
}
