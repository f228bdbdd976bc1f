//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::service::AuthService;
use crate::domain::repository::CredentialStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_access_token;

/// Create the Auth router for any credential store
///
/// Mount under `/api/v1/users`.
pub fn auth_router<S>(service: AuthService<S>) -> Router
where
    S: CredentialStore + Send + Sync + 'static,
{
    let state = AuthAppState { service };

    let protected = Router::new()
        .route("/logout", post(handlers::logout::<S>))
        .route("/change-password", post(handlers::change_password::<S>))
        .route("/current-user", get(handlers::current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<S>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<S>))
        .route("/refresh-token", post(handlers::refresh_token::<S>))
        .merge(protected)
        .with_state(state)
}
