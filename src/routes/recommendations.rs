use axum::{extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::UserInput,
    services::recommendations::{self, RecommendationResponse},
};

use super::AppState;

/// Handler for the recommendation endpoint
///
/// The request id becomes the workflow's session id.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(input): Json<UserInput>,
) -> AppResult<Json<RecommendationResponse>> {
    let response = recommendations::get_recommendations(
        &state.pipeline,
        state.store.as_ref(),
        state.seller_fetch_limit,
        request_id.to_string(),
        input,
    )
    .await?;
    Ok(Json(response))
}
