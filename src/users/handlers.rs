use axum::{routing::get, Json, Router};
use tracing::instrument;

use crate::auth::dto::UserResponse;
use crate::auth::extractors::CurrentUser;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(me))
}

/// Profile of the authenticated account. Authentication and the user load
/// both happen in the extractor.
#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
