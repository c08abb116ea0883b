use crate::controller::ApiResponse;
use crate::params::reconnect_interval::UpdateParams;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use log::*;

/// GET the reconnect interval currently sent to clients
pub async fn read(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "millis": app_state.sse_manager.reconnect_interval() }),
    ))
}

/// PUT change the reconnect interval and push it to every live client
pub async fn update(
    State(app_state): State<AppState>,
    Json(params): Json<UpdateParams>,
) -> impl IntoResponse {
    debug!("PUT reconnect interval: {params:?}");

    app_state
        .sse_manager
        .set_reconnect_interval(params.millis)
        .await;

    StatusCode::NO_CONTENT
}
