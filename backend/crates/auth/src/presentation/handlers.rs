//! HTTP Handlers

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use serde::de::DeserializeOwned;

use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::service::AuthService;
use crate::domain::entity::{claims::AccessClaims, session::TokenPair};
use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, TokenResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<S>
where
    S: CredentialStore,
{
    pub service: AuthService<S>,
}

impl<S> Clone for AuthAppState<S>
where
    S: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /login
pub async fn login<S>(
    State(state): State<AuthAppState<S>>,
    body: Bytes,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Send + Sync + 'static,
{
    let req: LoginRequest = parse_body(&body)?;
    let output = state.service.login(req.identifier, req.password).await?;
    let cookies = session_cookies(state.service.config(), &output.tokens);

    Ok((
        StatusCode::OK,
        cookies,
        Json(LoginResponse {
            user: output.user,
            access_token: output.tokens.access_token,
            refresh_token: output.tokens.refresh_token,
        }),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /refresh-token
///
/// Takes the refresh token from its cookie, falling back to the JSON body.
pub async fn refresh_token<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Send + Sync + 'static,
{
    let config = state.service.config();

    let presented = match extract_cookie(&headers, &config.refresh_cookie_name) {
        Some(token) => token,
        None => parse_body::<RefreshRequest>(&body)?
            .refresh_token
            .unwrap_or_default(),
    };

    let tokens = state.service.refresh(&presented).await?;
    let cookies = session_cookies(config, &tokens);

    Ok((StatusCode::OK, cookies, Json(TokenResponse::from(tokens))))
}

// ============================================================================
// Logout (requires access token)
// ============================================================================

/// POST /logout
pub async fn logout<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Send + Sync + 'static,
{
    state.service.logout(&claims.id).await?;

    Ok((StatusCode::NO_CONTENT, clear_cookies(state.service.config())))
}

// ============================================================================
// Change Password (requires access token)
// ============================================================================

/// POST /change-password
///
/// The session is revoked as part of the change, so cookies are cleared.
pub async fn change_password<S>(
    State(state): State<AuthAppState<S>>,
    Extension(claims): Extension<AccessClaims>,
    body: Bytes,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Send + Sync + 'static,
{
    let req: ChangePasswordRequest = parse_body(&body)?;
    state
        .service
        .change_password(claims.id, req.old_password, req.new_password)
        .await?;

    Ok((StatusCode::NO_CONTENT, clear_cookies(state.service.config())))
}

// ============================================================================
// Current User (requires access token)
// ============================================================================

/// GET /current-user
pub async fn current_user(Extension(claims): Extension<AccessClaims>) -> Json<AccessClaims> {
    Json(claims)
}

// ============================================================================
// Helper Functions
// ============================================================================

type CookieHeaders = AppendHeaders<[(header::HeaderName, String); 2]>;

fn session_cookies(config: &AuthConfig, tokens: &TokenPair) -> CookieHeaders {
    let policy = config.cookie_policy();
    AppendHeaders([
        (
            header::SET_COOKIE,
            policy.build_set_cookie(
                &config.access_cookie_name,
                &tokens.access_token,
                config.access_token_ttl,
            ),
        ),
        (
            header::SET_COOKIE,
            policy.build_set_cookie(
                &config.refresh_cookie_name,
                &tokens.refresh_token,
                config.refresh_token_ttl,
            ),
        ),
    ])
}

fn clear_cookies(config: &AuthConfig) -> CookieHeaders {
    let policy = config.cookie_policy();
    AppendHeaders([
        (
            header::SET_COOKIE,
            policy.build_clear_cookie(&config.access_cookie_name),
        ),
        (
            header::SET_COOKIE,
            policy.build_clear_cookie(&config.refresh_cookie_name),
        ),
    ])
}

/// Parse a JSON request body; an empty body yields the defaults
fn parse_body<T>(body: &[u8]) -> AuthResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|_| AuthError::Validation("Malformed request body".to_string()))
}
