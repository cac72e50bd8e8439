//! Session-cookie authentication
//!
//! Two hardcoded demo accounts; a successful login lazily creates the
//! user record, mints an auth-session id, and hands it back in an
//! HTTP-only `sid` cookie. The guard filter resolves that cookie back to
//! a `User` for every protected route.

use std::convert::Infallible;
use std::sync::Arc;

use uuid::Uuid;
use warp::Filter;

use crate::error::{reject, ApiError};
use crate::models::{AuthResponse, LoginRequest, Role, User};
use crate::store::ChatStore;

/// Name of the auth-session cookie
pub const SESSION_COOKIE: &str = "sid";

/// The demo accounts accepted by `POST /auth/demo-login`
const DEMO_ACCOUNTS: &[(&str, &str, Role)] = &[
    ("demo@tecace.com", "demo1234", Role::User),
    ("admin@tecace.com", "admin1234", Role::Admin),
];

fn find_account(email: &str, password: &str) -> Option<(&'static str, Role)> {
    DEMO_ACCOUNTS
        .iter()
        .find(|(account_email, account_password, _)| {
            *account_email == email && *account_password == password
        })
        .map(|(account_email, _, role)| (*account_email, *role))
}

/// Guard filter for protected routes: resolves the `sid` cookie to a
/// user, rejecting with 401 when absent or unknown
pub fn with_auth(
    store: Arc<ChatStore>,
) -> impl Filter<Extract = (User,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::any().map(move || store.clone()))
        .and_then(authenticate)
}

async fn authenticate(
    sid: Option<String>,
    store: Arc<ChatStore>,
) -> Result<User, warp::Rejection> {
    let sid = sid
        .and_then(|raw| Uuid::parse_str(&raw).ok())
        .ok_or_else(|| reject(ApiError::Unauthorized))?;
    store
        .resolve_auth_session(sid)
        .await
        .ok_or_else(|| reject(ApiError::Unauthorized))
}

/// POST /api/auth/demo-login
pub async fn login_handler(
    request: LoginRequest,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (email, role) = find_account(&request.email, &request.password)
        .ok_or_else(|| reject(ApiError::Unauthorized))?;

    let user = store.upsert_user(email, role).await;
    let sid = store.create_auth_session(user.id).await;
    tracing::info!(email = %user.email, "demo login");

    let body = warp::reply::json(&AuthResponse {
        email: user.email,
        role: user.role,
    });
    Ok(warp::reply::with_header(
        body,
        "set-cookie",
        format!("{}={}; HttpOnly; Path=/; SameSite=Lax", SESSION_COOKIE, sid),
    ))
}

/// GET /api/auth/me
pub async fn me_handler(user: User) -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&AuthResponse {
        email: user.email,
        role: user.role,
    }))
}

/// POST /api/auth/logout
pub async fn logout_handler(
    user: User,
    sid: Option<String>,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, Infallible> {
    if let Some(sid) = sid.and_then(|raw| Uuid::parse_str(&raw).ok()) {
        store.remove_auth_session(sid).await;
    }
    tracing::info!(email = %user.email, "logout");

    let body = warp::reply::json(&serde_json::json!({"success": true}));
    Ok(warp::reply::with_header(
        body,
        "set-cookie",
        format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE),
    ))
}
