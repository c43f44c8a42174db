// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the intake service.
//!
//! Public intake endpoints accept form-encoded POSTs and always answer with
//! the JSON envelope; any other verb gets 405 in the same shape. The admin
//! endpoints manage announcements behind a bearer session token.

use crate::admin::{AdminAuth, AdminSession};
use crate::config::Config;
use crate::error::IntakeError;
use crate::form::FormKind;
use crate::models::Announcement;
use crate::pipeline::IntakePipeline;
use crate::response::{IntakeResponse, ResponseBuilder};
use crate::store::AnnouncementStore;
use crate::validator::SchemaValidator;
use axum::{
    extract::{rejection::FormRejection, ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Shared application state.
pub struct AppState {
    pub pipeline: IntakePipeline,
    pub announcements: AnnouncementStore,
    pub admin: AdminAuth,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Public announcement feed, in the shape the site script reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnouncementFeed {
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnnouncementChange {
    pub success: bool,
    pub message: String,
    pub announcement: Announcement,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(contact).fallback(method_not_allowed))
        .route("/mass-booking", post(mass_booking).fallback(method_not_allowed))
        .route("/parish-register", post(parish_register).fallback(method_not_allowed))
        .route("/announcements", get(public_announcements))
        .route("/admin/login", post(admin_login))
        .route("/admin/logout", post(admin_logout))
        .route(
            "/admin/announcements",
            get(admin_list_announcements).post(add_announcement),
        )
        .route("/admin/announcements/:id", delete(delete_announcement));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let origins: Vec<HeaderValue> = state
        .config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    if !origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        );
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "parish-intake",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Any non-POST verb on an intake endpoint.
pub async fn method_not_allowed() -> IntakeResponse {
    ResponseBuilder::rejected(&IntakeError::MethodNotAllowed, "")
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> IntakeResponse {
    intake(&state, FormKind::Contact, client_ip(&state, addr, &headers), form).await
}

pub async fn mass_booking(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> IntakeResponse {
    intake(&state, FormKind::Booking, client_ip(&state, addr, &headers), form).await
}

pub async fn parish_register(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> IntakeResponse {
    intake(&state, FormKind::Registration, client_ip(&state, addr, &headers), form).await
}

/// An unreadable body is treated as an empty form, so the submitter gets
/// the usual validation errors.
async fn intake(
    state: &AppState,
    kind: FormKind,
    origin: IpAddr,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> IntakeResponse {
    let raw = match form {
        Ok(Form(raw)) => raw,
        Err(rejection) => {
            debug!(form = %kind, %origin, error = %rejection.body_text(), "Unreadable form body");
            HashMap::new()
        }
    };

    match state.pipeline.submit(kind, &raw, origin).await {
        Ok(_) => ResponseBuilder::accepted(kind.success_message()),
        Err(e) => ResponseBuilder::rejected(&e, &state.pipeline.failure_message(kind)),
    }
}

/// Peer address, or the first `X-Forwarded-For` hop when configured to
/// trust it.
fn client_ip(state: &AppState, peer: SocketAddr, headers: &HeaderMap) -> IpAddr {
    if state.config.trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}

/// Announcements for the public site, newest date first.
pub async fn public_announcements(State(state): State<Arc<AppState>>) -> Json<AnnouncementFeed> {
    Json(AnnouncementFeed {
        announcements: state.announcements.public_feed().await,
    })
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<LoginResponse>, IntakeError> {
    let Ok(Form(LoginForm { password })) = form else {
        return Err(IntakeError::Unauthorized);
    };

    let grant = state
        .admin
        .login(&password)
        .await
        .ok_or(IntakeError::Unauthorized)?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Logged in".to_string(),
        token: grant.token,
        expires_at: grant.expires_at,
    }))
}

pub async fn admin_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer_token(&headers) {
        state.admin.logout(token).await;
    }
    ResponseBuilder::accepted("Logged out").into_response()
}

/// Announcements in curated order, for the management screen.
pub async fn admin_list_announcements(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnnouncementFeed>, IntakeError> {
    require_session(&state, &headers).await?;
    Ok(Json(AnnouncementFeed {
        announcements: state.announcements.list().await,
    }))
}

pub async fn add_announcement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<AnnouncementChange>, IntakeError> {
    let session = require_session(&state, &headers).await?;
    let raw = form.map(|Form(raw)| raw).unwrap_or_default();

    let draft = SchemaValidator::new()
        .parse_announcement(&raw)
        .map_err(|invalid| IntakeError::Validation(invalid.messages()))?;

    let announcement = state.announcements.add(&session, draft).await?;
    Ok(Json(AnnouncementChange {
        success: true,
        message: "Announcement added successfully!".to_string(),
        announcement,
    }))
}

pub async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AnnouncementChange>, IntakeError> {
    let session = require_session(&state, &headers).await?;

    let announcement = state
        .announcements
        .delete(&session, id)
        .await?
        .ok_or(IntakeError::NotFound(id))?;

    Ok(Json(AnnouncementChange {
        success: true,
        message: "Announcement deleted successfully!".to_string(),
        announcement,
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.metrics().render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<AdminSession, IntakeError> {
    let token = bearer_token(headers).ok_or(IntakeError::Unauthorized)?;
    state
        .admin
        .session(token)
        .await
        .ok_or(IntakeError::Unauthorized)
}
