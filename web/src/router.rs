use crate::controller::{
    client_controller, event_controller, health_check_controller, reconnect_interval_controller,
};
use crate::sse::handler::sse_handler;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(sse_routes(app_state.clone()))
        .merge(event_routes(app_state.clone()))
        .merge(client_routes(app_state.clone()))
        .merge(reconnect_interval_routes(app_state))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .with_state(app_state)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", post(event_controller::broadcast))
        .route(
            "/users/:user_id/events",
            post(event_controller::send_to_user),
        )
        .with_state(app_state)
}

fn client_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/clients", get(client_controller::index))
        .route("/clients/:id", get(client_controller::read))
        .route("/clients/:id/events", post(client_controller::send_event))
        .with_state(app_state)
}

fn reconnect_interval_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/reconnect-interval",
            get(reconnect_interval_controller::read).put(reconnect_interval_controller::update),
        )
        .with_state(app_state)
}
