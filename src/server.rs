//!
//! agricoach HTTP server
//! ---------------------
//! Axum-based HTTP API for the coaching site: public informational routes,
//! registration/login with a cookie + CSRF token session model, and the
//! authenticated profile, enrollment and password-change endpoints.
//!
//! Every application error is turned into a non-fatal JSON body with the
//! taxonomy's status code; nothing here terminates the process.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use getrandom::getrandom;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::catalog::{CourseId, COURSES, SYLLABUS};
use crate::credential::PasswordChange;
use crate::enroll::EnrollmentManager;
use crate::error::AppError;
use crate::identity::{
    AuthProvider, Identity, LocalAuthProvider, RegistrationForm, SessionContext,
};
use crate::locations::{district_names, taluks_for};
use crate::profile::{ProfileManager, ProfileUpdate};
use crate::store::{DocumentStore, LocalDocStore};

const SESSION_COOKIE: &str = "agricoach_session";

/// Shared server state injected into all handlers.
///
/// Holds the core managers plus the cookie session maps: session id to
/// identity, and session id to CSRF token. Mutating authenticated routes
/// require the `x-csrf-token` header to match.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn AuthProvider>,
    pub profiles: Arc<ProfileManager>,
    pub session: Arc<SessionContext>,
    pub enroll: Arc<EnrollmentManager>,
    pub sessions: Arc<RwLock<HashMap<String, Identity>>>,
    pub csrf_tokens: Arc<RwLock<HashMap<String, String>>>,
}

/// Start the agricoach HTTP server bound to the given port, with document
/// and account data rooted at `db_root`.
pub async fn run_with_port(http_port: u16, db_root: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(db_root)?;

    let store: Arc<dyn DocumentStore> = Arc::new(LocalDocStore::new(db_root)?);
    let provider: Arc<dyn AuthProvider> = Arc::new(LocalAuthProvider::new(store.clone()));
    let profiles = Arc::new(ProfileManager::new(provider.clone(), store.clone()));
    let session = Arc::new(SessionContext::new(provider.clone(), profiles.clone()));
    let enroll = Arc::new(EnrollmentManager::new(store.clone()));

    info!(
        target: "startup",
        "agricoach starting: db_root='{}', courses={}, districts={}",
        db_root,
        COURSES.len(),
        district_names().len()
    );

    let app_state = AppState {
        provider,
        profiles,
        session,
        enroll,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        csrf_tokens: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = router(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience entry point using the default port and data root.
pub async fn run() -> anyhow::Result<()> {
    run_with_port(7878, "data").await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/courses", get(courses))
        .route("/syllabus", get(syllabus))
        .route("/contact", get(contact))
        .route("/privacy-policy", get(privacy_policy))
        .route("/terms-of-service", get(terms_of_service))
        .route("/cookie-policy", get(cookie_policy))
        .route("/locations/districts", get(districts))
        .route("/locations/{district}/taluks", get(taluks))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/csrf", get(get_csrf))
        .route("/profile", get(profile_get).post(profile_post))
        .route("/profile/password", post(password_post))
        .route("/my-courses", get(my_courses))
        .route("/enroll/{course_id}", post(enroll_course))
        .with_state(state)
}

fn error_body(e: &AppError) -> (StatusCode, Json<serde_json::Value>) {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"status": "error", "error": e.code_str(), "message": e.to_string()})),
    )
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

fn hex_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    let _ = getrandom(&mut bytes);
    let mut out = String::with_capacity(len * 2);
    use std::fmt::Write as _;
    for b in &bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn csrf_token() -> String {
    // 256-bit random token, base64url without padding
    let mut bytes = [0u8; 32];
    let _ = getrandom(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn set_session_cookie(sid: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE, sid
    ))
    .unwrap()
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE
    ))
    .unwrap()
}

async fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let sid = parse_cookie(headers, SESSION_COOKIE)?;
    let map = state.sessions.read().await;
    map.get(&sid).cloned()
}

async fn validate_csrf(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(sid) = parse_cookie(headers, SESSION_COOKIE) else {
        return false;
    };
    let Some(provided) = headers
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
    else {
        return false;
    };
    let cmap = state.csrf_tokens.read().await;
    match cmap.get(&sid) {
        Some(expected) => expected == &provided,
        None => false,
    }
}

// --- Public informational routes -------------------------------------------

async fn home() -> impl IntoResponse {
    Json(json!({
        "page": "home",
        "title": "Agricoach",
        "tagline": "Coaching for agriculture entrance exams and careers",
    }))
}

async fn about() -> impl IntoResponse {
    Json(json!({
        "page": "about",
        "title": "About Agricoach",
        "body": "Specialised coaching for K-CET and ICAR agriculture aspirants across Karnataka.",
    }))
}

async fn courses() -> impl IntoResponse {
    Json(json!({ "courses": &*COURSES }))
}

async fn syllabus() -> impl IntoResponse {
    Json(json!({ "sections": &*SYLLABUS }))
}

async fn contact() -> impl IntoResponse {
    Json(json!({
        "page": "contact",
        "email": "hello@agricoach.example",
        "whatsapp": "+91 98765 43210",
    }))
}

async fn privacy_policy() -> impl IntoResponse {
    Json(json!({ "page": "privacy-policy" }))
}

async fn terms_of_service() -> impl IntoResponse {
    Json(json!({ "page": "terms-of-service" }))
}

async fn cookie_policy() -> impl IntoResponse {
    Json(json!({ "page": "cookie-policy" }))
}

async fn districts() -> impl IntoResponse {
    Json(json!({ "districts": district_names() }))
}

async fn taluks(Path(district): Path<String>) -> impl IntoResponse {
    match taluks_for(&district) {
        Some(t) => (StatusCode::OK, Json(json!({ "district": district, "taluks": t }))),
        None => error_body(&AppError::NotFound),
    }
}

// --- Session lifecycle ------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> impl IntoResponse {
    match state.session.sign_up(&form) {
        Ok(identity) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "uid": identity.uid})),
        ),
        Err(e) => error_body(&e),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> impl IntoResponse {
    match state.session.sign_in(&payload.email, &payload.password) {
        Ok(identity) => {
            let sid = hex_token(16);
            let csrf = csrf_token();
            {
                let mut map = state.sessions.write().await;
                map.insert(sid.clone(), identity);
            }
            {
                let mut cmap = state.csrf_tokens.write().await;
                cmap.insert(sid.clone(), csrf);
            }
            let mut headers = HeaderMap::new();
            headers.insert("Set-Cookie", set_session_cookie(&sid));
            (StatusCode::OK, headers, Json(json!({"status": "ok"})))
        }
        Err(e) => {
            if matches!(e, AppError::ProviderUnavailable(_)) {
                error!("login error: {e}");
            }
            let (status, body) = error_body(&e);
            (status, HeaderMap::new(), body)
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if !validate_csrf(&state, &headers).await {
        return (
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            Json(json!({"status": "forbidden", "error": "invalid csrf"})),
        );
    }
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        let mut map = state.sessions.write().await;
        map.remove(&sid);
        let mut cmap = state.csrf_tokens.write().await;
        cmap.remove(&sid);
    }
    // Local clear always wins even if remote revocation fails.
    let _ = state.session.sign_out();
    let mut h = HeaderMap::new();
    h.insert("Set-Cookie", clear_session_cookie());
    (StatusCode::OK, h, Json(json!({"status": "ok"})))
}

async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(_identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) else {
        return error_body(&AppError::NotAuthenticated);
    };
    let cmap = state.csrf_tokens.read().await;
    match cmap.get(&sid) {
        Some(token) => (StatusCode::OK, Json(json!({"status": "ok", "csrf": token}))),
        None => error_body(&AppError::unavailable("csrf not available")),
    }
}

// --- Authenticated routes ---------------------------------------------------

async fn profile_get(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    match state.profiles.load(&identity) {
        Ok(rec) => (StatusCode::OK, Json(json!({"status": "ok", "profile": rec}))),
        Err(e) => error_body(&e),
    }
}

async fn profile_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(fields): Json<ProfileUpdate>,
) -> impl IntoResponse {
    let Some(identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    if !validate_csrf(&state, &headers).await {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"status": "forbidden", "error": "invalid csrf"})),
        );
    }
    match state.profiles.save(&identity, &fields) {
        Ok(refreshed) => {
            // Keep both cached views of the identity current.
            state.session.update_cached_identity(refreshed.clone());
            if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
                let mut map = state.sessions.write().await;
                map.insert(sid, refreshed);
            }
            (StatusCode::OK, Json(json!({"status": "ok"})))
        }
        Err(e) => error_body(&e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordPayload {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

async fn password_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PasswordPayload>,
) -> impl IntoResponse {
    let Some(identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    if !validate_csrf(&state, &headers).await {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"status": "forbidden", "error": "invalid csrf"})),
        );
    }
    let mut flow = PasswordChange::new();
    match flow.run(
        state.provider.as_ref(),
        &identity,
        &payload.current_password,
        &payload.new_password,
        &payload.confirm_password,
    ) {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(e) => error_body(&e),
    }
}

async fn my_courses(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    let courses = state.enroll.my_courses(&identity);
    (StatusCode::OK, Json(json!({"status": "ok", "courses": courses})))
}

async fn enroll_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(course_id): Path<CourseId>,
) -> impl IntoResponse {
    let Some(identity) = identity_from_headers(&state, &headers).await else {
        return error_body(&AppError::NotAuthenticated);
    };
    if !validate_csrf(&state, &headers).await {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"status": "forbidden", "error": "invalid csrf"})),
        );
    }
    match state.enroll.enroll(&identity, course_id) {
        Ok(outcome) => (StatusCode::OK, Json(json!({"status": outcome.as_str()}))),
        Err(e) => error_body(&e),
    }
}
