use crate::controller::ApiResponse;
use crate::response::client::ClientSummary;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sse::{ConnectionId, ServerSentEvent};

use log::*;

/// GET all live clients
pub async fn index(State(app_state): State<AppState>) -> impl IntoResponse {
    let clients: Vec<ClientSummary> = app_state
        .sse_manager
        .list_clients()
        .iter()
        .map(|connection| ClientSummary::from(connection.as_ref()))
        .collect();

    debug!("GET {} live SSE client(s)", clients.len());

    Json(ApiResponse::new(StatusCode::OK.into(), clients))
}

/// GET a particular live client specified by its connection id.
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let connection = app_state
        .sse_manager
        .get_client(&ConnectionId::from(id.as_str()))
        .ok_or_else(Error::client_not_found)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        ClientSummary::from(connection.as_ref()),
    )))
}

/// POST send an event to one client.
pub async fn send_event(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<ServerSentEvent>,
) -> Result<impl IntoResponse, Error> {
    let connection = app_state
        .sse_manager
        .get_client(&ConnectionId::from(id.as_str()))
        .ok_or_else(Error::client_not_found)?;

    debug!("POST SSE event for client {id}: {event:?}");

    if let Err(e) = connection.send_event(&event).await {
        app_state.sse_manager.evict(&connection).await;
        return Err(e.into());
    }

    Ok(StatusCode::ACCEPTED)
}
