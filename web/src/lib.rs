use axum::http::{header, HeaderName, HeaderValue, Method};
use log::*;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub(crate) use service::AppState;

mod controller;
mod error;
mod params;
mod response;
pub mod router;
mod sse;

pub use error::{Error, Result};

/// Bind the configured interface and port and serve the router until the
/// process is stopped.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = app_state.config.listen_addr();
    let cors_layer = cors_layer(&app_state.config.allowed_origins);

    let app = router::define_routes(app_state).layer(cors_layer);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(crate::sse::handler::LAST_EVENT_ID_HEADER),
            HeaderName::from_static(crate::sse::handler::USER_ID_HEADER),
        ])
        .allow_credentials(true)
}
