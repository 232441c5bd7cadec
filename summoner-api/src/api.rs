use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use profile::{AggregatedProfile, ProfileAggregator, RiotId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

#[derive(Deserialize, Debug)]
struct ProfileParams {
    riot_id: String,
}

pub fn router(aggregator: Arc<ProfileAggregator>) -> Router {
    Router::new()
        .route("/profile", get(profile_handler))
        .with_state(aggregator)
}

/// A terminal lookup failure is still a 200: the profile carries the error.
async fn profile_handler(
    State(aggregator): State<Arc<ProfileAggregator>>,
    Query(params): Query<ProfileParams>,
) -> Result<Json<AggregatedProfile>, ApiErrorResponse> {
    let riot_id: RiotId = params.riot_id.parse().map_err(|e: profile::ProfileError| {
        tracing::debug!(riot_id = %params.riot_id, error = %e, "Rejected Riot ID");
        ApiErrorResponse {
            error_message: e.to_string(),
        }
    })?;

    let profile = aggregator
        .aggregate(&riot_id.game_name, &riot_id.tag_line)
        .await;
    Ok(Json(profile))
}
