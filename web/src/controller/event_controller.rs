use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use sse::ServerSentEvent;

use log::*;

/// POST broadcast an event to every connected client.
///
/// Responds with the number of clients that were live when the broadcast
/// started. Clients whose stream breaks during the send are dropped silently.
pub async fn broadcast(
    State(app_state): State<AppState>,
    Json(event): Json<ServerSentEvent>,
) -> impl IntoResponse {
    debug!("POST broadcast SSE event: {event:?}");

    let recipients = app_state.sse_manager.client_count();
    app_state.sse_manager.send_event(&event).await;

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(
            StatusCode::ACCEPTED.into(),
            json!({ "recipients": recipients }),
        )),
    )
}

/// POST send an event to every live connection of one user.
pub async fn send_to_user(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    Json(event): Json<ServerSentEvent>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST SSE event for user {user_id}: {event:?}");

    let recipients = app_state
        .sse_manager
        .send_event_to_user(&user_id, &event)
        .await;
    if recipients == 0 {
        return Err(Error::client_not_found());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(
            StatusCode::ACCEPTED.into(),
            json!({ "recipients": recipients }),
        )),
    ))
}
