//! Router assembly.
//!
//! The two page surfaces (`/` and `/admin`) answer with whatever their auth
//! gate decides at request time. The JSON endpoints under `/api` drive the
//! session store and the network login.
//!
//! SINGLE OPERATOR
//! ===============
//! Every request shares one `AppContext` and therefore one session: a sign-in
//! through any caller is the session every other caller sees. The router
//! carries no per-request identity, so the binary binds to loopback unless
//! `BIND_ADDR` says otherwise.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::identity::IdentityError;
use crate::services::admin::AdminLoginError;
use crate::services::gate::{GateOutcome, Surface};
use crate::state::AppContext;
use crate::validation::{self, ValidationError};

/// Seconds a client should wait before re-requesting a loading surface.
pub const RETRY_AFTER_SECS: &str = "1";

#[must_use]
pub fn app(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/admin", get(admin_dashboard))
        .route("/api/me", get(me))
        .route("/api/menu", get(menu))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/admin/login", post(admin_login))
        .route("/api/auth/network/login", post(network_login))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// GATED SURFACES
// =============================================================================

impl IntoResponse for GateOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Render => StatusCode::OK.into_response(),
            Self::Redirect(to) => Redirect::to(&to).into_response(),
            Self::ShowLoading => {
                let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
                response
            }
        }
    }
}

fn surface_response(ctx: &AppContext, surface: Surface) -> Response {
    match ctx.gate(surface).outcome() {
        GateOutcome::Render => Json(json!({
            "surface": match surface {
                Surface::General => "general",
                Surface::Admin => "admin",
            },
            "identity": ctx.display_identity(),
            "admin_user": ctx.roles.snapshot().admin_user,
        }))
        .into_response(),
        other => other.into_response(),
    }
}

/// `GET /`: general surface, any signed-in user.
async fn home(State(ctx): State<AppContext>) -> Response {
    surface_response(&ctx, Surface::General)
}

/// `GET /admin`: privileged users only.
async fn admin_dashboard(State(ctx): State<AppContext>) -> Response {
    surface_response(&ctx, Surface::Admin)
}

/// `GET /api/me`: display identity of whoever is active.
async fn me(State(ctx): State<AppContext>) -> Response {
    match ctx.display_identity() {
        Some(identity) => Json(identity).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// `GET /api/menu`
async fn menu(State(ctx): State<AppContext>) -> Response {
    let nav = &ctx.navigation;
    let entries: Vec<_> = ctx
        .user_menu()
        .into_iter()
        .map(|entry| json!({ "entry": entry, "path": entry.path(nav) }))
        .collect();
    Json(entries).into_response()
}

// =============================================================================
// AUTH API
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Admin(#[from] AdminLoginError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Identity(e) | Self::Admin(AdminLoginError::Identity(e)) => identity_status(e),
            Self::Admin(AdminLoginError::NotPrivileged | AdminLoginError::NotPrivilegedSessionKept(_)) => {
                StatusCode::FORBIDDEN
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Identity(e) => e.error_code(),
            Self::Admin(e) => e.error_code(),
        }
    }
}

fn identity_status(e: &IdentityError) -> StatusCode {
    match e {
        IdentityError::CredentialRejected(_) => StatusCode::UNAUTHORIZED,
        IdentityError::Transport(_) => StatusCode::BAD_GATEWAY,
        IdentityError::NotFound => StatusCode::NOT_FOUND,
        IdentityError::ConfirmationRequired { .. } => StatusCode::ACCEPTED,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, code = self.error_code(), "auth request failed upstream");
        }
        (status, Json(json!({ "error": self.to_string(), "code": self.error_code() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: String,
}

/// `POST /api/auth/login`
async fn login(State(ctx): State<AppContext>, Json(body): Json<LoginRequest>) -> Result<Response, ApiError> {
    let credentials = validation::login_form(&body.email, &body.password)?;
    let session = ctx.store.sign_in(&credentials).await?;
    Ok(Json(json!({ "user": session.user })).into_response())
}

/// `POST /api/auth/register`
async fn register(State(ctx): State<AppContext>, Json(body): Json<RegisterRequest>) -> Result<Response, ApiError> {
    let (credentials, attributes) =
        validation::register_form(&body.email, &body.password, &body.username, &body.full_name)?;
    let session = ctx.store.sign_up(&credentials, &attributes).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": session.user }))).into_response())
}

/// `POST /api/auth/logout`: signs out the primary session, or the network
/// user when there is none.
async fn logout(State(ctx): State<AppContext>) -> Result<StatusCode, ApiError> {
    ctx.logout_active().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/admin/login`
async fn admin_login(State(ctx): State<AppContext>, Json(body): Json<LoginRequest>) -> Result<Response, ApiError> {
    let credentials = validation::login_form(&body.email, &body.password)?;
    let login = ctx.admin_login(&credentials).await?;
    Ok(Json(login).into_response())
}

/// `POST /api/auth/network/login`
async fn network_login(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    let user = ctx.network.login().await?;
    Ok(Json(user).into_response())
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
