//! Auth Middleware
//!
//! Stateless access-token check for protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{extract_bearer, extract_cookie};

use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AuthAppState;

/// Require a valid access token and expose its claims to handlers
///
/// Accepts `Authorization: Bearer <token>` or the access token cookie. On
/// success the [`AccessClaims`](crate::domain::entity::claims::AccessClaims)
/// are inserted into the request extensions.
pub async fn require_access_token<S>(
    State(state): State<AuthAppState<S>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response>
where
    S: CredentialStore + Send + Sync + 'static,
{
    let headers = req.headers();
    let token = extract_bearer(headers)
        .or_else(|| extract_cookie(headers, &state.service.config().access_cookie_name))
        .ok_or(AuthError::TokenInvalid)?;

    let claims = state.service.authenticate(&token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
