// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP surface tests, driven through the router without a socket.

mod harness;

use axum::{body::Body, extract::connect_info::MockConnectInfo, Router};
use harness::{
    config_in,
    generators::{booking_form, bot_form, contact_form, encode},
    mailers::RecordingMailer,
    pipeline_with,
};
use http::{header, Request, StatusCode};
use parish_intake::{
    admin::{hash_password, AdminAuth},
    config::Config,
    form::FormKind,
    handlers::{router, AnnouncementChange, AnnouncementFeed, AppState, LoginResponse},
    response::Envelope,
    store::AnnouncementStore,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "st-patrick-office";

struct TestApp {
    _dir: TempDir,
    app: Router,
}

fn app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    adjust(&mut config);

    let state = Arc::new(AppState {
        pipeline: pipeline_with(&config, Arc::new(RecordingMailer::default())),
        announcements: AnnouncementStore::new(&config.data_dir),
        admin: AdminAuth::new(&config.admin),
        config,
    });

    let peer = SocketAddr::from(([203, 0, 113, 7], 51000));
    TestApp {
        _dir: dir,
        app: router(state).layer(MockConnectInfo(peer)),
    }
}

fn app() -> TestApp {
    app_with(|_| {})
}

fn admin_app() -> TestApp {
    app_with(|config| config.admin.password_hash = Some(hash_password(ADMIN_PASSWORD).unwrap()))
}

fn form_request(method: &str, uri: &str, raw: &HashMap<String, String>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encode(raw)))
        .unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

async fn send<T: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, T) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("bad body {:?}: {e}", String::from_utf8_lossy(&bytes)));
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body): (_, LoginResponse) = send(
        app,
        form_request("POST", "/admin/login", &fields(&[("password", ADMIN_PASSWORD)])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.success);
    body.token
}

#[tokio::test]
async fn test_health() {
    let test = app();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body): (_, serde_json::Value) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_get_on_intake_endpoint_is_405_json() {
    let test = app();
    for uri in ["/contact", "/mass-booking", "/parish-register"] {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body): (_, Envelope) = send(&test.app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert!(!body.success);
        assert_eq!(body.message, "Method not allowed. Please use POST.");
    }
}

#[tokio::test]
async fn test_contact_accepted() {
    let test = app();
    let (status, body): (_, Envelope) =
        send(&test.app, form_request("POST", "/contact", &contact_form())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.success);
    assert_eq!(body.message, FormKind::Contact.success_message());
    assert!(body.errors.is_none());
}

#[tokio::test]
async fn test_booking_then_repeat_is_429() {
    let test = app();

    let (status, _): (_, Envelope) =
        send(&test.app, form_request("POST", "/mass-booking", &booking_form())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body): (_, Envelope) =
        send(&test.app, form_request("POST", "/mass-booking", &booking_form())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(!body.success);
    assert_eq!(body.message, "Please wait a few minutes before submitting again");
}

#[tokio::test]
async fn test_missing_email_is_400_with_errors() {
    let test = app();
    let mut raw = booking_form();
    raw.remove("email");

    let (status, body): (_, Envelope) =
        send(&test.app, form_request("POST", "/mass-booking", &raw)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.success);
    assert_eq!(body.message, "Validation failed");
    assert_eq!(body.errors, Some(vec!["Email is required".to_string()]));
}

#[tokio::test]
async fn test_honeypot_is_400_spam() {
    let test = app();
    let (status, body): (_, Envelope) = send(
        &test.app,
        form_request("POST", "/parish-register", &bot_form(FormKind::Registration)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.message, "Spam detected");
    assert!(body.errors.is_none());
}

#[tokio::test]
async fn test_unreadable_body_reports_required_fields() {
    let test = app();
    let request = Request::post("/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"x"}"#))
        .unwrap();

    let (status, body): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.errors,
        Some(vec![
            "Name is required".to_string(),
            "Email is required".to_string(),
            "Message is required".to_string(),
        ])
    );
}

#[tokio::test]
async fn test_forwarded_for_ignored_unless_trusted() {
    let forwarded = |ip: &str| {
        let mut request = form_request("POST", "/contact", &contact_form());
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    let untrusted = app();
    let (status, _): (_, Envelope) = send(&untrusted.app, forwarded("198.51.100.1")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _): (_, Envelope) = send(&untrusted.app, forwarded("198.51.100.2")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let trusted = app_with(|config| config.trust_forwarded_for = true);
    let (status, _): (_, Envelope) = send(&trusted.app, forwarded("198.51.100.1, 10.0.0.1")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _): (_, Envelope) = send(&trusted.app, forwarded("198.51.100.2")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_requires_session() {
    let test = admin_app();

    let (status, body): (_, Envelope) = send(
        &test.app,
        form_request("POST", "/admin/login", &fields(&[("password", "guess")])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.message, "Authentication required");

    let draft = fields(&[("title", "Notice"), ("date", "2025-03-01"), ("message", "Hello")]);
    let (status, _): (_, Envelope) =
        send(&test.app, form_request("POST", "/admin/announcements", &draft)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = with_bearer(form_request("POST", "/admin/announcements", &draft), "not-a-session");
    let (status, _): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::delete("/admin/announcements/1").body(Body::empty()).unwrap();
    let (status, _): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_disabled_without_password_hash() {
    let test = app();
    let (status, _): (_, Envelope) = send(
        &test.app,
        form_request("POST", "/admin/login", &fields(&[("password", "")])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_announcement_lifecycle() {
    let test = admin_app();
    let token = login(&test.app).await;

    let older = fields(&[
        ("title", "Harvest Thanksgiving"),
        ("date", "2025-02-01"),
        ("category", "Event"),
        ("message", "Bring your offerings"),
    ]);
    let newer = fields(&[
        ("title", "Holy Week <schedule>"),
        ("date", "2025-04-13"),
        ("category", "Liturgy"),
        ("priority", "high"),
        ("message", "Palm Sunday Mass at 7am"),
    ]);

    let (status, first): (_, AnnouncementChange) = send(
        &test.app,
        with_bearer(form_request("POST", "/admin/announcements", &older), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first.message, "Announcement added successfully!");
    assert_eq!(first.announcement.id, 1);

    let (_, second): (_, AnnouncementChange) = send(
        &test.app,
        with_bearer(form_request("POST", "/admin/announcements", &newer), &token),
    )
    .await;
    assert_eq!(second.announcement.id, 2);
    assert_eq!(second.announcement.title, "Holy Week &lt;schedule&gt;");

    // Public feed: newest date first
    let request = Request::get("/announcements").body(Body::empty()).unwrap();
    let (status, feed): (_, AnnouncementFeed) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = feed.announcements.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let request = with_bearer(
        Request::delete("/admin/announcements/2").body(Body::empty()).unwrap(),
        &token,
    );
    let (status, deleted): (_, AnnouncementChange) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted.message, "Announcement deleted successfully!");

    let request = with_bearer(
        Request::delete("/admin/announcements/2").body(Body::empty()).unwrap(),
        &token,
    );
    let (status, body): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.message, "Announcement not found");

    // Deleted ids are not handed out again
    let (_, third): (_, AnnouncementChange) = send(
        &test.app,
        with_bearer(form_request("POST", "/admin/announcements", &newer), &token),
    )
    .await;
    assert_eq!(third.announcement.id, 3);

    let request = with_bearer(
        Request::get("/admin/announcements").body(Body::empty()).unwrap(),
        &token,
    );
    let (status, curated): (_, AnnouncementFeed) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = curated.announcements.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn test_invalid_announcement_is_400() {
    let test = admin_app();
    let token = login(&test.app).await;

    let draft = fields(&[("title", "Notice"), ("date", "next sunday"), ("message", "")]);
    let (status, body): (_, Envelope) = send(
        &test.app,
        with_bearer(form_request("POST", "/admin/announcements", &draft), &token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body.errors.unwrap();
    assert!(errors.contains(&"Message is required".to_string()), "{errors:?}");
    assert!(errors.contains(&"Invalid date, expected YYYY-MM-DD".to_string()), "{errors:?}");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let test = admin_app();
    let token = login(&test.app).await;

    let request = with_bearer(
        Request::post("/admin/logout").body(Body::empty()).unwrap(),
        &token,
    );
    let (status, _): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = with_bearer(
        Request::get("/admin/announcements").body(Body::empty()).unwrap(),
        &token,
    );
    let (status, _): (_, Envelope) = send(&test.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_outcomes() {
    let test = app();
    let (_, _): (_, Envelope) =
        send(&test.app, form_request("POST", "/contact", &contact_form())).await;

    let response = test
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"intake_submissions_total{form="contact",outcome="accepted"} 1"#), "{text}");
}
