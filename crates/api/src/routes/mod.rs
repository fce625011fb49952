//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod account_types;
pub mod accounts;
pub mod auth;
pub mod health;
pub mod operations;
pub mod tags;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// Creates the API router. Everything except health and auth requires a
/// bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(account_types::routes())
        .merge(accounts::routes())
        .merge(tags::routes())
        .merge(operations::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
